//! 核心模块
//!
//! | 类型 | 说明 |
//! |------|------|
//! | [`Config`] | 环境变量配置 |
//! | [`ServerState`] | 存储与全部领域服务 |
//! | [`Server`] | HTTP 服务器与优雅关闭 |
//! | [`BackgroundTasks`] | 邀请清理、变更日志监听 |
//! | [`ServerError`] | 启动阶段错误 |

pub mod config;
pub mod error;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::{AdminSeed, BookingSettings, Config, InviteSettings};
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
pub use tasks::{BackgroundTasks, TaskKind};
