//! 错误上下文
//!
//! 传输实现把错误转交给 `on_error` 之前，用它标明出错的连接。

use crate::connection::ConnectionId;
use std::fmt;
use std::net::SocketAddr;

/// 错误上下文信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorContext {
    /// 出错的连接
    Connection(ConnectionId),
    /// 出错连接的对端地址
    Remote(SocketAddr),
    /// 其他键值对
    KeyValue(String, String),
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorContext::Connection(id) => write!(f, "connection_id={}", id),
            ErrorContext::Remote(addr) => write!(f, "remote={}", addr),
            ErrorContext::KeyValue(key, value) => write!(f, "{}={}", key, value),
        }
    }
}

impl From<ConnectionId> for ErrorContext {
    fn from(id: ConnectionId) -> Self {
        ErrorContext::Connection(id)
    }
}

impl From<SocketAddr> for ErrorContext {
    fn from(addr: SocketAddr) -> Self {
        ErrorContext::Remote(addr)
    }
}

impl From<(&str, String)> for ErrorContext {
    fn from((key, value): (&str, String)) -> Self {
        ErrorContext::KeyValue(key.to_string(), value)
    }
}
