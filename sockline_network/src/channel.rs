//! 进程内通道传输
//!
//! 用 Tokio 无界通道模拟一条双向会话：服务端持有 [`ChannelConnection`]，
//! 对端持有 [`ChannelPeer`]。发送缓冲区按“已排队但对端尚未读取”的字节数计量，
//! 超过配置上限的发送会失败，与真实套接字的写缓冲区行为一致。

use crate::callbacks::Callbacks;
use crate::connection::Connection;
use bytes::Bytes;
use sockline_config::ConnectionConfig;
use sockline_core::{
    ConnectionId, ConnectionIdGenerator, ConnectionState, ConnectionStatistics, Result, Session,
    SocklineError, SocklineErrorKind,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// 进程内传输
///
/// 负责分配连接 ID、维护 `connection_count`，并为每个会话创建一对端点。
#[derive(Debug)]
pub struct ChannelTransport {
    config: ConnectionConfig,
    local_addr: SocketAddr,
    statistics: Arc<ConnectionStatistics>,
    id_generator: ConnectionIdGenerator,
}

impl ChannelTransport {
    /// 创建传输，配置不合法时返回错误
    pub fn new(config: ConnectionConfig, statistics: Arc<ConnectionStatistics>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| SocklineError::config(e.to_string()))?;
        let local_addr = config
            .local_addr()
            .map_err(|e| SocklineError::config(e.to_string()))?;

        Ok(Self {
            config,
            local_addr,
            statistics,
            id_generator: ConnectionIdGenerator::new(),
        })
    }

    /// 打开一个来自 `remote_addr` 的会话
    pub fn open<I>(&self, remote_addr: SocketAddr) -> (ChannelConnection<I>, ChannelPeer) {
        let id = self.id_generator.next();
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));

        self.statistics.inc_connections();
        debug!(connection_id = %id, remote = %remote_addr, "连接打开");

        let connection = ChannelConnection {
            id,
            state: ConnectionState::Connected,
            local_addr: self.local_addr,
            remote_addr,
            max_send_buffer_size: self.config.max_send_buffer_size,
            max_package_size: self.config.max_package_size,
            tx: Some(tx),
            pending: Arc::clone(&pending),
            statistics: Arc::clone(&self.statistics),
            session: Session::new(),
            callbacks: Callbacks::new(),
        };
        let peer = ChannelPeer {
            connection_id: id,
            rx,
            pending,
        };

        (connection, peer)
    }

    /// 共享的统计块
    pub fn statistics(&self) -> &Arc<ConnectionStatistics> {
        &self.statistics
    }

    /// 使用的配置
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

/// 服务端持有的连接端点
#[derive(Debug)]
pub struct ChannelConnection<I> {
    id: ConnectionId,
    state: ConnectionState,
    local_addr: SocketAddr,
    remote_addr: SocketAddr,
    max_send_buffer_size: usize,
    max_package_size: usize,
    tx: Option<mpsc::UnboundedSender<Bytes>>,
    pending: Arc<AtomicUsize>,
    statistics: Arc<ConnectionStatistics>,
    session: Session<I>,
    callbacks: Callbacks,
}

impl<I: Send> ChannelConnection<I> {
    /// 对端发来的数据进入这里，由 `on_message` 处理
    ///
    /// 连接已关闭时数据被忽略。
    pub fn deliver(&mut self, data: Bytes) {
        if !self.state.is_open() {
            debug!(connection_id = %self.id, "连接已关闭，丢弃收到的数据");
            return;
        }
        self.callbacks.dispatch_message(data, &self.statistics);
    }

    /// 传输层不可恢复的失败：先触发 `on_error`，再关闭连接
    ///
    /// 转交给 `on_error` 的错误附带连接 ID。
    pub fn abort(&mut self, err: SocklineError) {
        if !self.state.is_open() {
            return;
        }
        let err = err.with_context(self.id);
        warn!(error = %err, "连接异常中止");
        self.callbacks.emit_error(&err);
        self.close(None);
    }

    /// 已排队但对端尚未读取的字节数
    pub fn pending_bytes(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    fn enqueue(&mut self, buffer: Bytes) -> Result<()> {
        if !self.state.is_open() {
            return Err(SocklineError::Closed);
        }
        let tx = self.tx.as_ref().ok_or(SocklineError::Closed)?;
        if tx.is_closed() {
            return Err(peer_gone());
        }

        let size = buffer.len();
        if size > self.max_package_size {
            return Err(SocklineError::PackageTooLarge {
                size,
                limit: self.max_package_size,
            });
        }

        let pending = self.pending.load(Ordering::Acquire);
        if pending + size > self.max_send_buffer_size {
            return Err(SocklineError::BufferFull {
                pending: pending + size,
                limit: self.max_send_buffer_size,
            });
        }

        self.pending.fetch_add(size, Ordering::AcqRel);
        if tx.send(buffer).is_err() {
            self.pending.fetch_sub(size, Ordering::AcqRel);
            return Err(peer_gone());
        }
        Ok(())
    }
}

fn peer_gone() -> SocklineError {
    SocklineError::connection("对端已断开")
}

impl<I: Send> Connection for ChannelConnection<I> {
    type Identity = I;

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn send(&mut self, buffer: Bytes) -> Result<()> {
        let Err(err) = self.enqueue(buffer) else {
            return Ok(());
        };
        self.statistics.record_send_fail();
        warn!(connection_id = %self.id, error = %err, "发送失败");

        // 对端已经丢弃接收端，会话到此结束
        if err.kind() == SocklineErrorKind::Connection {
            self.abort(err);
            return Err(SocklineError::Closed);
        }
        Err(err)
    }

    fn close(&mut self, data: Option<Bytes>) {
        if matches!(self.state, ConnectionState::Closing | ConnectionState::Closed) {
            return;
        }
        self.state = ConnectionState::Closing;

        // 最后一段数据不受发送缓冲区上限约束
        if let (Some(data), Some(tx)) = (data, self.tx.as_ref()) {
            let size = data.len();
            self.pending.fetch_add(size, Ordering::AcqRel);
            if tx.send(data).is_err() {
                self.pending.fetch_sub(size, Ordering::AcqRel);
                self.statistics.record_send_fail();
            }
        }

        // 丢弃发送端，对端读完剩余数据后收到 EOF
        self.tx = None;
        self.state = ConnectionState::Closed;
        self.statistics.dec_connections();
        debug!(connection_id = %self.id, remote = %self.remote_addr, "连接关闭");

        self.callbacks.emit_close();
    }

    fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn session(&self) -> &Session<I> {
        &self.session
    }

    fn session_mut(&mut self) -> &mut Session<I> {
        &mut self.session
    }

    fn callbacks_mut(&mut self) -> &mut Callbacks {
        &mut self.callbacks
    }
}

impl<I> Drop for ChannelConnection<I> {
    fn drop(&mut self) {
        if self.state != ConnectionState::Closed {
            self.tx = None;
            self.state = ConnectionState::Closed;
            self.statistics.dec_connections();
            self.callbacks.emit_close();
        }
    }
}

/// 对端持有的端点
#[derive(Debug)]
pub struct ChannelPeer {
    connection_id: ConnectionId,
    rx: mpsc::UnboundedReceiver<Bytes>,
    pending: Arc<AtomicUsize>,
}

impl ChannelPeer {
    /// 读取下一段数据，连接关闭且数据读完后返回 `None`
    pub async fn recv(&mut self) -> Option<Bytes> {
        let data = self.rx.recv().await?;
        self.pending.fetch_sub(data.len(), Ordering::AcqRel);
        Some(data)
    }

    /// 非阻塞读取
    pub fn try_recv(&mut self) -> Option<Bytes> {
        let data = self.rx.try_recv().ok()?;
        self.pending.fetch_sub(data.len(), Ordering::AcqRel);
        Some(data)
    }

    /// 已排队但尚未读取的字节数
    pub fn pending_bytes(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// 对应的连接 ID
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport_with(config: ConnectionConfig) -> ChannelTransport {
        ChannelTransport::new(config, Arc::new(ConnectionStatistics::new())).unwrap()
    }

    fn remote() -> SocketAddr {
        "192.168.1.20:53000".parse().unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ConnectionConfig {
            max_package_size: 0,
            ..Default::default()
        };
        let result = ChannelTransport::new(config, Arc::new(ConnectionStatistics::new()));
        assert!(matches!(result, Err(SocklineError::Config(_))));
    }

    #[test]
    fn test_open_assigns_ids_and_counts() {
        let transport = transport_with(ConnectionConfig::default());
        let (a, peer_a) = transport.open::<u64>(remote());
        let (b, _peer_b) = transport.open::<u64>(remote());

        assert_eq!(a.id().value(), 1);
        assert_eq!(b.id().value(), 2);
        assert_eq!(peer_a.connection_id(), a.id());
        assert_eq!(transport.statistics().connection_count(), 2);
        assert_eq!(a.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_send_tracks_pending_bytes() {
        let transport = transport_with(ConnectionConfig::default());
        let (mut conn, mut peer) = transport.open::<u64>(remote());

        conn.send(Bytes::from_static(b"hello")).unwrap();
        assert_eq!(conn.pending_bytes(), 5);
        assert_eq!(peer.pending_bytes(), 5);

        assert_eq!(peer.try_recv(), Some(Bytes::from_static(b"hello")));
        assert_eq!(conn.pending_bytes(), 0);
        assert_eq!(peer.try_recv(), None);
    }

    #[test]
    fn test_package_too_large() {
        let transport = transport_with(ConnectionConfig {
            max_package_size: 4,
            ..Default::default()
        });
        let (mut conn, _peer) = transport.open::<u64>(remote());

        let err = conn.send(Bytes::from_static(b"12345")).unwrap_err();
        assert!(matches!(err, SocklineError::PackageTooLarge { size: 5, limit: 4 }));
        assert_eq!(transport.statistics().send_fail(), 1);
        assert_eq!(conn.pending_bytes(), 0);
    }

    #[test]
    fn test_buffer_full_until_peer_reads() {
        let transport = transport_with(ConnectionConfig {
            max_send_buffer_size: 8,
            ..Default::default()
        });
        let (mut conn, mut peer) = transport.open::<u64>(remote());

        conn.send(Bytes::from_static(b"12345")).unwrap();
        let err = conn.send(Bytes::from_static(b"6789")).unwrap_err();
        assert!(matches!(err, SocklineError::BufferFull { pending: 9, limit: 8 }));
        assert_eq!(transport.statistics().send_fail(), 1);

        peer.try_recv().unwrap();
        conn.send(Bytes::from_static(b"6789")).unwrap();
    }

    #[test]
    fn test_send_after_peer_dropped_closes_session() {
        let transport = transport_with(ConnectionConfig::default());
        let (mut conn, peer) = transport.open::<u64>(remote());
        drop(peer);

        let err = conn.send(Bytes::from_static(b"x")).unwrap_err();
        assert!(matches!(err, SocklineError::Closed));
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(transport.statistics().send_fail(), 1);
        assert_eq!(transport.statistics().connection_count(), 0);
        assert_eq!(conn.pending_bytes(), 0);
    }

    #[test]
    fn test_buffer_exactly_full_is_accepted() {
        let transport = transport_with(ConnectionConfig {
            max_send_buffer_size: 8,
            ..Default::default()
        });
        let (mut conn, _peer) = transport.open::<u64>(remote());

        conn.send(Bytes::from_static(b"12345")).unwrap();
        conn.send(Bytes::from_static(b"678")).unwrap();
        assert_eq!(conn.pending_bytes(), 8);

        let err = conn.send(Bytes::from_static(b"9")).unwrap_err();
        assert!(matches!(err, SocklineError::BufferFull { pending: 9, limit: 8 }));
        assert_eq!(transport.statistics().send_fail(), 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let transport = transport_with(ConnectionConfig::default());
        let (mut conn, _peer) = transport.open::<u64>(remote());

        conn.close(None);
        let after_first = transport.statistics().snapshot();
        conn.close(Some(Bytes::from_static(b"late")));

        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(transport.statistics().snapshot(), after_first);
        assert_eq!(transport.statistics().connection_count(), 0);
    }

    #[test]
    fn test_drop_without_close_releases_count() {
        let transport = transport_with(ConnectionConfig::default());
        let (conn, _peer) = transport.open::<u64>(remote());
        assert_eq!(transport.statistics().connection_count(), 1);

        drop(conn);
        assert_eq!(transport.statistics().connection_count(), 0);
    }

    #[test]
    fn test_drop_after_close_does_not_double_count() {
        let transport = transport_with(ConnectionConfig::default());
        let (mut conn, _peer) = transport.open::<u64>(remote());
        let (_other, _other_peer) = transport.open::<u64>(remote());

        conn.close(None);
        drop(conn);
        assert_eq!(transport.statistics().connection_count(), 1);
    }

    #[test]
    fn test_address_helpers() {
        let transport = transport_with(ConnectionConfig {
            local_address: "10.0.0.1:9000".to_string(),
            ..Default::default()
        });
        let (conn, _peer) = transport.open::<u64>(remote());

        assert_eq!(conn.remote_ip(), "192.168.1.20");
        assert_eq!(conn.remote_port(), 53000);
        assert_eq!(conn.remote_address(), "192.168.1.20:53000");
        assert_eq!(conn.local_ip(), "10.0.0.1");
        assert_eq!(conn.local_port(), 9000);
        assert_eq!(conn.local_address(), "10.0.0.1:9000");
        assert!(conn.is_ipv4());
        assert!(!conn.is_ipv6());
    }

    #[test]
    fn test_ipv6_remote() {
        let transport = transport_with(ConnectionConfig::default());
        let (conn, _peer) = transport.open::<u64>("[::1]:4433".parse().unwrap());

        assert!(conn.is_ipv6());
        assert!(!conn.is_ipv4());
        assert_eq!(conn.remote_ip(), "::1");
        assert_eq!(conn.remote_address(), "[::1]:4433");
    }

    #[test]
    fn test_deliver_after_close_is_ignored() {
        let transport = transport_with(ConnectionConfig::default());
        let (mut conn, _peer) = transport.open::<u64>(remote());

        conn.deliver(Bytes::from_static(b"one"));
        conn.close(None);
        conn.deliver(Bytes::from_static(b"two"));

        assert_eq!(transport.statistics().total_request(), 1);
    }
}
