//! 连接层核心错误类型

use super::context::ErrorContext;
use thiserror::Error;

/// 连接层错误
///
/// 传输实现通过它报告发送失败；应用的消息处理器通过它报告处理失败。
/// 这些错误只作为返回值或 `on_error` 回调参数出现，连接层自身从不因此 panic。
#[derive(Error, Debug)]
pub enum SocklineError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 连接错误
    #[error("连接错误: {0}")]
    Connection(String),

    /// 连接已关闭或正在关闭
    #[error("连接已关闭")]
    Closed,

    /// 发送缓冲区已满
    #[error("发送缓冲区已满: 待发送 {pending} 字节, 上限 {limit} 字节")]
    BufferFull { pending: usize, limit: usize },

    /// 单个数据包过大
    #[error("数据包过大: {size} 字节, 上限 {limit} 字节")]
    PackageTooLarge { size: usize, limit: usize },

    /// 消息处理器返回的错误
    #[error("处理器错误: {0}")]
    Handler(String),

    /// 带上下文的错误
    #[error("{0} ({1})")]
    WithContext(#[source] Box<SocklineError>, ErrorContext),
}

impl SocklineError {
    /// 获取错误类型
    pub fn kind(&self) -> SocklineErrorKind {
        match self {
            SocklineError::Config(_) => SocklineErrorKind::Config,
            SocklineError::Connection(_) => SocklineErrorKind::Connection,
            SocklineError::Closed => SocklineErrorKind::Closed,
            SocklineError::BufferFull { .. } => SocklineErrorKind::BufferFull,
            SocklineError::PackageTooLarge { .. } => SocklineErrorKind::PackageTooLarge,
            SocklineError::Handler(_) => SocklineErrorKind::Handler,
            SocklineError::WithContext(inner, _) => inner.kind(),
        }
    }

    /// 是否属于发送失败（计入 `send_fail`）
    pub fn is_send_failure(&self) -> bool {
        matches!(
            self.kind(),
            SocklineErrorKind::Closed
                | SocklineErrorKind::BufferFull
                | SocklineErrorKind::PackageTooLarge
        )
    }

    /// 添加上下文信息
    pub fn with_context<C>(self, context: C) -> Self
    where
        C: Into<ErrorContext>,
    {
        SocklineError::WithContext(Box::new(self), context.into())
    }

    /// 附带的上下文，没有时返回 `None`
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            SocklineError::WithContext(_, context) => Some(context),
            _ => None,
        }
    }

    /// 创建配置错误
    pub fn config(msg: impl Into<String>) -> Self {
        SocklineError::Config(msg.into())
    }

    /// 创建连接错误
    pub fn connection(msg: impl Into<String>) -> Self {
        SocklineError::Connection(msg.into())
    }

    /// 创建处理器错误
    pub fn handler(msg: impl Into<String>) -> Self {
        SocklineError::Handler(msg.into())
    }
}

/// 错误类型分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocklineErrorKind {
    /// 配置错误
    Config,
    /// 连接错误
    Connection,
    /// 连接已关闭
    Closed,
    /// 发送缓冲区已满
    BufferFull,
    /// 数据包过大
    PackageTooLarge,
    /// 处理器错误
    Handler,
}
