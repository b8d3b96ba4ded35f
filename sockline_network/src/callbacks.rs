//! 连接回调槽
//!
//! 应用在连接建立时挂上 `on_message`、`on_close`、`on_error`，
//! 事件循环通过这里的 `dispatch_message`、`emit_close`、`emit_error` 触发它们。

use bytes::Bytes;
use sockline_core::{ConnectionStatistics, Result, SocklineError};
use std::fmt;
use tracing::warn;

/// 消息处理器
pub type MessageHandler = Box<dyn FnMut(Bytes) -> Result<()> + Send>;
/// 关闭处理器，每个连接最多触发一次
pub type CloseHandler = Box<dyn FnOnce() + Send>;
/// 错误处理器
pub type ErrorHandler = Box<dyn FnMut(&SocklineError) + Send>;

/// 回调槽
#[derive(Default)]
pub struct Callbacks {
    on_message: Option<MessageHandler>,
    on_close: Option<CloseHandler>,
    on_error: Option<ErrorHandler>,
    close_emitted: bool,
}

impl Callbacks {
    /// 创建空回调槽
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置消息处理器
    pub fn on_message<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(Bytes) -> Result<()> + Send + 'static,
    {
        self.on_message = Some(Box::new(handler));
        self
    }

    /// 设置关闭处理器
    pub fn on_close<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_close = Some(Box::new(handler));
        self
    }

    /// 设置错误处理器
    pub fn on_error<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnMut(&SocklineError) + Send + 'static,
    {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// 分发收到的数据
    ///
    /// 每次调用计入一次 `total_request`。处理器返回错误时计入 `throw_exception`，
    /// 并把错误转交给 `on_error`。没有处理器时数据被丢弃。
    pub fn dispatch_message(&mut self, data: Bytes, stats: &ConnectionStatistics) {
        stats.record_request();

        let Some(handler) = self.on_message.as_mut() else {
            return;
        };

        if let Err(err) = handler(data) {
            stats.record_exception();
            warn!(error = %err, "消息处理失败");
            self.emit_error(&err);
        }
    }

    /// 触发关闭回调，返回本次是否真正触发
    pub fn emit_close(&mut self) -> bool {
        if self.close_emitted {
            return false;
        }
        self.close_emitted = true;

        match self.on_close.take() {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    /// 触发错误回调
    pub fn emit_error(&mut self, err: &SocklineError) {
        if let Some(handler) = self.on_error.as_mut() {
            handler(err);
        }
    }

    /// 关闭回调是否已经触发过（或已被跳过）
    pub fn close_emitted(&self) -> bool {
        self.close_emitted
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_message", &self.on_message.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("close_emitted", &self.close_emitted)
            .finish()
    }
}
