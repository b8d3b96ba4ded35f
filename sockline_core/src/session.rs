//! 连接会话状态
//!
//! 每个连接内嵌一个 [`Session`]，承载授权身份、应用层标签和数值句柄。
//! 传输实现通过组合持有它，授权相关操作由 `Connection` trait 的默认方法委托过来。
//!
//! 身份类型 `I` 由上层认证模块决定（例如数据库对象 ID），这里只存储和返回，
//! 从不检查其内容。

/// 授权状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// 未授权（初始状态）
    Unauthorized,
    /// 已绑定身份
    Authorized,
}

/// 连接会话
///
/// 授权标志与身份存放在同一个 `Option` 里，
/// 因此“已授权”与“持有身份”始终同时成立或同时不成立。
#[derive(Debug, Clone)]
pub struct Session<I> {
    user_id: Option<I>,
    identifier: Option<String>,
    socket_id: Option<i64>,
}

impl<I> Session<I> {
    /// 创建未授权的空会话
    pub fn new() -> Self {
        Self {
            user_id: None,
            identifier: None,
            socket_id: None,
        }
    }

    /// 绑定身份并标记为已授权
    ///
    /// 这是无条件的状态转换，凭据校验由调用方在此之前完成。
    /// 已授权时再次调用会覆盖原身份。始终返回 `true`。
    pub fn authorized(&mut self, user_id: I) -> bool {
        self.user_id = Some(user_id);
        true
    }

    /// 清除身份并标记为未授权，始终返回 `true`
    pub fn logout(&mut self) -> bool {
        self.user_id = None;
        true
    }

    /// 是否已授权
    pub fn is_authorized(&self) -> bool {
        self.user_id.is_some()
    }

    /// 当前授权状态
    pub fn auth_state(&self) -> AuthState {
        if self.is_authorized() {
            AuthState::Authorized
        } else {
            AuthState::Unauthorized
        }
    }

    /// 已授权时返回身份，否则返回 `None`
    pub fn user_id(&self) -> Option<&I> {
        self.user_id.as_ref()
    }

    /// 设置应用层标签（如房间、会话标记），始终返回 `true`
    pub fn set_identifier(&mut self, identifier: impl Into<String>) -> bool {
        self.identifier = Some(identifier.into());
        true
    }

    /// 应用层标签
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// 设置应用层数值句柄，始终返回 `true`
    pub fn set_socket_id(&mut self, socket_id: i64) -> bool {
        self.socket_id = Some(socket_id);
        true
    }

    /// 应用层数值句柄
    pub fn socket_id(&self) -> Option<i64> {
        self.socket_id
    }
}

impl<I> Default for Session<I> {
    fn default() -> Self {
        Self::new()
    }
}
