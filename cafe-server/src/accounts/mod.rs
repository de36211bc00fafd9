//! 登录账户
//!
//! 注册、凭证校验与管理员初始化。令牌签发在 HTTP 层完成。

pub mod password;
pub mod service;

pub use service::AccountService;
