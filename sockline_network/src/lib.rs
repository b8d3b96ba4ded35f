//! Sockline 连接契约
//!
//! 定义所有传输实现必须满足的 [`Connection`] 接口、应用挂载的回调槽，
//! 以及一个基于 Tokio 通道的进程内传输实现。

pub mod callbacks;
pub mod channel;
pub mod connection;

// 导出主要类型到 crate root
pub use crate::callbacks::{Callbacks, CloseHandler, ErrorHandler, MessageHandler};
pub use crate::channel::{ChannelConnection, ChannelPeer, ChannelTransport};
pub use crate::connection::Connection;
// 重新导出 sockline_core 的常用类型
pub use sockline_core::{
    ConnectionId, ConnectionState, ConnectionStatistics, Result, Session, SocklineError,
};

// 预导出
pub mod prelude {
    pub use crate::callbacks::Callbacks;
    pub use crate::channel::{ChannelConnection, ChannelPeer, ChannelTransport};
    pub use crate::connection::Connection;
    pub use sockline_core::prelude::*;
}
