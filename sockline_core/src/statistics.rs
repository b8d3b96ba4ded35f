//! 连接统计
//!
//! 进程级的连接统计计数器，由所有连接共享，供状态查询读取。
//! 统计块在进程启动时显式创建，以 `Arc` 注入到每个传输实现中。

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// 连接统计
///
/// 四个计数器各自原子更新，读取方只需要最终一致，
/// 不保证一次读取到的四个值属于同一时刻。
#[derive(Debug, Default)]
pub struct ConnectionStatistics {
    /// 当前活跃连接数
    connection_count: AtomicU64,
    /// 已处理的请求（消息）总数
    total_request: AtomicU64,
    /// 处理过程中未被处理的失败次数
    throw_exception: AtomicU64,
    /// 发送失败次数
    send_fail: AtomicU64,
}

/// 统计快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    pub connection_count: u64,
    pub total_request: u64,
    pub throw_exception: u64,
    pub send_fail: u64,
}

impl ConnectionStatistics {
    /// 创建新的统计块
    pub fn new() -> Self {
        Self::default()
    }

    /// 连接建立
    pub fn inc_connections(&self) {
        self.connection_count.fetch_add(1, Ordering::Relaxed);
    }

    /// 连接断开，计数不会低于 0
    pub fn dec_connections(&self) {
        let _ = self
            .connection_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// 记录一次请求
    pub fn record_request(&self) {
        self.total_request.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一次未处理的失败
    pub fn record_exception(&self) {
        self.throw_exception.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一次发送失败
    pub fn record_send_fail(&self) {
        self.send_fail.fetch_add(1, Ordering::Relaxed);
    }

    /// 当前活跃连接数
    pub fn connection_count(&self) -> u64 {
        self.connection_count.load(Ordering::Relaxed)
    }

    /// 请求总数
    pub fn total_request(&self) -> u64 {
        self.total_request.load(Ordering::Relaxed)
    }

    /// 未处理失败次数
    pub fn throw_exception(&self) -> u64 {
        self.throw_exception.load(Ordering::Relaxed)
    }

    /// 发送失败次数
    pub fn send_fail(&self) -> u64 {
        self.send_fail.load(Ordering::Relaxed)
    }

    /// 获取当前各计数器的快照
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            connection_count: self.connection_count(),
            total_request: self.total_request(),
            throw_exception: self.throw_exception(),
            send_fail: self.send_fail(),
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> String {
        let s = self.snapshot();
        format!(
            "连接统计:\n\
             - 当前连接: {}\n\
             - 请求总数: {}\n\
             - 未处理异常: {}\n\
             - 发送失败: {}",
            s.connection_count, s.total_request, s.throw_exception, s.send_fail
        )
    }
}
