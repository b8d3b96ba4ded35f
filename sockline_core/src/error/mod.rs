//! Sockline 统一错误处理
//!
//! 连接层的错误类型定义。

pub mod context;
pub mod framework;

// 重新导出主要类型
pub use context::ErrorContext;
pub use framework::{SocklineError, SocklineErrorKind};

/// Sockline 统一 Result 类型
pub type Result<T> = std::result::Result<T, SocklineError>;
