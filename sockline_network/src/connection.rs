//! 连接契约
//!
//! 每种传输（TCP、UDS、进程内通道等）都实现 [`Connection`]。
//! 传输只需提供发送、关闭和端点地址；授权与标识相关的操作由默认方法委托给
//! 内嵌的 [`Session`]，所有传输共享同一份实现。

use crate::callbacks::Callbacks;
use bytes::Bytes;
use sockline_core::{ConnectionId, ConnectionState, Result, Session};
use std::net::SocketAddr;

/// 连接抽象
///
/// 同一连接的状态由事件循环串行访问，因此可变操作都取 `&mut self`。
pub trait Connection: Send {
    /// 上层认证模块使用的身份类型
    type Identity;

    /// 传输层分配的连接 ID
    fn id(&self) -> ConnectionId;

    /// 当前生命周期状态
    fn state(&self) -> ConnectionState;

    /// 发送数据
    ///
    /// 同一连接上的写入保持调用顺序。失败时传输实现负责计入 `send_fail`，
    /// 并以 `Err` 返回，不会 panic。关闭开始后的发送一律失败。
    fn send(&mut self, buffer: Bytes) -> Result<()>;

    /// 关闭连接
    ///
    /// 提供 `data` 时先写出再关闭，之后安排 `on_close` 触发。
    /// 重复调用不产生任何效果。
    fn close(&mut self, data: Option<Bytes>);

    /// 对端地址
    fn remote_addr(&self) -> SocketAddr;

    /// 本地地址
    fn local_addr(&self) -> SocketAddr;

    /// 内嵌的会话状态
    fn session(&self) -> &Session<Self::Identity>;

    /// 内嵌的会话状态（可变）
    fn session_mut(&mut self) -> &mut Session<Self::Identity>;

    /// 回调槽
    fn callbacks_mut(&mut self) -> &mut Callbacks;

    /// 对端 IP
    fn remote_ip(&self) -> String {
        self.remote_addr().ip().to_string()
    }

    /// 对端端口
    fn remote_port(&self) -> u16 {
        self.remote_addr().port()
    }

    /// 对端 `ip:port`，IPv6 地址带方括号
    fn remote_address(&self) -> String {
        self.remote_addr().to_string()
    }

    /// 本地 IP
    fn local_ip(&self) -> String {
        self.local_addr().ip().to_string()
    }

    /// 本地端口
    fn local_port(&self) -> u16 {
        self.local_addr().port()
    }

    /// 本地 `ip:port`
    fn local_address(&self) -> String {
        self.local_addr().to_string()
    }

    /// 对端是否为 IPv4
    fn is_ipv4(&self) -> bool {
        self.remote_addr().is_ipv4()
    }

    /// 对端是否为 IPv6
    fn is_ipv6(&self) -> bool {
        self.remote_addr().is_ipv6()
    }

    /// 绑定身份，始终返回 `true`
    fn authorized(&mut self, user_id: Self::Identity) -> bool {
        self.session_mut().authorized(user_id)
    }

    /// 解除身份绑定，始终返回 `true`
    fn logout(&mut self) -> bool {
        self.session_mut().logout()
    }

    /// 是否已授权
    fn is_authorized(&self) -> bool {
        self.session().is_authorized()
    }

    /// 已授权时返回身份
    fn user_id(&self) -> Option<&Self::Identity> {
        self.session().user_id()
    }

    /// 设置应用层标签，始终返回 `true`
    fn set_identifier(&mut self, identifier: String) -> bool {
        self.session_mut().set_identifier(identifier)
    }

    /// 应用层标签
    fn identifier(&self) -> Option<&str> {
        self.session().identifier()
    }

    /// 设置应用层数值句柄，始终返回 `true`
    fn set_socket_id(&mut self, socket_id: i64) -> bool {
        self.session_mut().set_socket_id(socket_id)
    }

    /// 应用层数值句柄
    fn socket_id(&self) -> Option<i64> {
        self.session().socket_id()
    }
}
