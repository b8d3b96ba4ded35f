//! Sockline 核心类型
//!
//! 提供连接层共享的错误类型、连接 ID、会话授权状态和连接统计。

pub mod connection;
pub mod error;
pub mod session;
pub mod statistics;

// 导出主要类型到 crate root
pub use crate::connection::{ConnectionId, ConnectionIdGenerator, ConnectionState};
pub use crate::error::{ErrorContext, Result, SocklineError, SocklineErrorKind};
pub use crate::session::{AuthState, Session};
pub use crate::statistics::{ConnectionStatistics, StatisticsSnapshot};

// 预导出
pub mod prelude {
    pub use crate::connection::{ConnectionId, ConnectionState};
    pub use crate::error::{Result, SocklineError, SocklineErrorKind};
    pub use crate::session::{AuthState, Session};
    pub use crate::statistics::{ConnectionStatistics, StatisticsSnapshot};
}
