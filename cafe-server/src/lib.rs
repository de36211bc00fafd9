//! Cafe Server - 咖啡馆预订与点单服务
//!
//! # 架构概述
//!
//! - **存储** (`store`): redb 事务存储，每次提交写入变更日志
//! - **消息总线** (`message`): 提交后按序广播变更记录
//! - **领域服务**: 预订、订单、员工与邀请、桌台、支付、通知、评价、顾客状态
//! - **认证** (`auth`): JWT + Argon2，按角色授权
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! cafe-server/src/
//! ├── core/           # 配置、状态、服务器、后台任务
//! ├── auth/           # JWT 认证、权限、登录限流
//! ├── api/            # HTTP 路由和处理器
//! ├── store/          # redb 存储与变更日志
//! ├── message/        # 变更总线
//! ├── accounts/       # 账户与密码
//! ├── bookings/       # 预订生命周期
//! ├── orders/         # 订单生命周期与金额计算
//! ├── staff/          # 员工与邀请
//! ├── tables/         # 桌台状态、使用记录、优先级
//! ├── payments/       # 支付与退款
//! ├── notifications/  # 站内通知
//! ├── feedback/       # 顾客评价
//! ├── sessions/       # 顾客实时状态 (派生)
//! └── utils/          # 错误、日志、时间段
//! ```

pub mod accounts;
pub mod api;
pub mod auth;
pub mod bookings;
pub mod core;
pub mod domain;
pub mod feedback;
pub mod message;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod sessions;
pub mod staff;
pub mod store;
pub mod tables;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use domain::{Actor, DomainError, DomainResult};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 加载 .env 并初始化日志
///
/// 返回加载后的配置。`RUST_LOG` 优先于 `LOG_LEVEL`，生产环境输出 JSON 日志。
pub fn setup_environment() -> Config {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(
        Some(&config.log_level),
        config.is_production(),
        config.log_dir.as_deref(),
    );
    config
}
