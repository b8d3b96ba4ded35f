//! # Sockline - 套接字服务器框架的连接契约层
//!
//! Sockline 定义了事件循环与各类传输实现之间的接缝：
//! 每个连接如何发送数据、报告端点地址、关闭，以及在原始传输之上
//! 携带一层轻量的授权/身份标注。
//!
//! ## 快速开始
//!
//! ```rust
//! use std::sync::Arc;
//! use sockline::prelude::*;
//!
//! let stats = Arc::new(ConnectionStatistics::new());
//! let transport = ChannelTransport::new(ConnectionConfig::default(), stats.clone())?;
//! let (mut conn, mut peer) = transport.open::<String>("127.0.0.1:40000".parse().unwrap());
//!
//! conn.authorized("u1".to_string());
//! conn.send(bytes::Bytes::from_static(b"welcome"))?;
//! assert_eq!(peer.try_recv().as_deref(), Some(&b"welcome"[..]));
//!
//! conn.close(None);
//! assert_eq!(stats.connection_count(), 0);
//! # Ok::<(), sockline::Error>(())
//! ```
//!
//! ## 模块组织
//!
//! - `sockline_config` - 连接配置（TOML + 环境变量覆盖）
//! - `sockline_core` - 错误类型、会话授权状态、连接统计
//! - `sockline_network` - `Connection` 契约、回调槽、进程内通道传输

pub use sockline_config;
pub use sockline_core;
pub use sockline_network;

/// 预导出常用类型
///
/// 通过 `use sockline::prelude::*;` 导入所有常用类型
pub mod prelude {
    pub use sockline_config::{ConfigError, ConnectionConfig};
    pub use sockline_network::prelude::*;
}

/// Sockline 统一 Result 类型
pub type Result<T> = std::result::Result<T, Error>;

/// Sockline 统一错误枚举
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 连接层错误
    #[error(transparent)]
    Connection(#[from] sockline_core::SocklineError),

    /// 配置错误
    #[error(transparent)]
    Config(#[from] sockline_config::ConfigError),

    /// IO 错误
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Sockline 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sockline 包名
pub const NAME: &str = env!("CARGO_PKG_NAME");
