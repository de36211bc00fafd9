use std::path::PathBuf;
use std::time::Duration;

use crate::auth::JwtConfig;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 预订规则配置
#[derive(Debug, Clone)]
pub struct BookingSettings {
    /// 未指定时长时的默认占用时长 (分钟)
    pub default_duration_minutes: u32,
    /// 是否禁止同一桌台时间段重叠的有效预订
    pub prevent_double_booking: bool,
    /// 最多可提前预订的天数
    pub max_advance_days: u32,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            default_duration_minutes: 90,
            prevent_double_booking: true,
            max_advance_days: 90,
        }
    }
}

/// 员工邀请配置
#[derive(Debug, Clone)]
pub struct InviteSettings {
    /// 邀请有效期 (小时)
    pub ttl_hours: i64,
    /// 邀请链接前缀，令牌和角色以查询参数附加
    pub link_base: String,
    /// 过期邀请清理间隔
    pub sweep_interval: Duration,
}

impl Default for InviteSettings {
    fn default() -> Self {
        Self {
            ttl_hours: 168,
            link_base: "http://localhost:5173/login".into(),
            sweep_interval: Duration::from_secs(300),
        }
    }
}

/// 首次启动时创建的管理员账户
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库文件) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 (RUST_LOG 优先) |
/// | LOG_DIR | - | 日志目录，存在时按天滚动写文件 |
/// | TAX_RATE | 0.10 | 税率 |
/// | BOOKING_DEFAULT_DURATION_MINUTES | 90 | 默认预订时长 |
/// | BOOKING_PREVENT_DOUBLE_BOOKING | true | 桌台时间段冲突检测 |
/// | BOOKING_MAX_ADVANCE_DAYS | 90 | 最远可预订日期 |
/// | INVITE_TTL_HOURS | 168 | 邀请有效期 |
/// | INVITE_LINK_BASE | http://localhost:5173/login | 邀请链接前缀 |
/// | INVITE_SWEEP_INTERVAL_SECS | 300 | 过期邀请清理间隔 |
/// | BUS_CHANNEL_CAPACITY | 1024 | 变更总线缓冲 |
/// | ADMIN_EMAIL | admin@cafe.local | 初始管理员邮箱 |
/// | ADMIN_PASSWORD | admin | 初始管理员密码 |
/// | ADMIN_NAME | Administrator | 初始管理员名称 |
///
/// JWT 相关变量见 [`JwtConfig`]。
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/cafe HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 税率 (0.10 = 10%)
    pub tax_rate: f64,
    pub booking: BookingSettings,
    pub invites: InviteSettings,
    /// 变更总线 broadcast 容量
    pub bus_channel_capacity: usize,
    pub admin: AdminSeed,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let booking_defaults = BookingSettings::default();
        let invite_defaults = InviteSettings::default();

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            jwt: JwtConfig::default(),
            tax_rate: env_or("TAX_RATE", 0.10),
            booking: BookingSettings {
                default_duration_minutes: env_or(
                    "BOOKING_DEFAULT_DURATION_MINUTES",
                    booking_defaults.default_duration_minutes,
                ),
                prevent_double_booking: env_or(
                    "BOOKING_PREVENT_DOUBLE_BOOKING",
                    booking_defaults.prevent_double_booking,
                ),
                max_advance_days: env_or(
                    "BOOKING_MAX_ADVANCE_DAYS",
                    booking_defaults.max_advance_days,
                ),
            },
            invites: InviteSettings {
                ttl_hours: env_or("INVITE_TTL_HOURS", invite_defaults.ttl_hours),
                link_base: std::env::var("INVITE_LINK_BASE")
                    .unwrap_or(invite_defaults.link_base),
                sweep_interval: Duration::from_secs(env_or(
                    "INVITE_SWEEP_INTERVAL_SECS",
                    invite_defaults.sweep_interval.as_secs(),
                )),
            },
            bus_channel_capacity: env_or("BUS_CHANNEL_CAPACITY", 1024),
            admin: AdminSeed {
                email: std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@cafe.local".into()),
                password: std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".into()),
                name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".into()),
            },
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("cafe.redb")
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 启动前检查配置取值
    pub fn validate(&self) -> Result<(), String> {
        if !self.tax_rate.is_finite() || !(0.0..1.0).contains(&self.tax_rate) {
            return Err(format!("TAX_RATE must be in [0, 1), got {}", self.tax_rate));
        }
        if self.bus_channel_capacity == 0 {
            return Err("BUS_CHANNEL_CAPACITY must be positive".to_string());
        }
        if self.booking.default_duration_minutes == 0 {
            return Err("BOOKING_DEFAULT_DURATION_MINUTES must be positive".to_string());
        }
        if self.is_production() && self.admin.password == "admin" {
            return Err("ADMIN_PASSWORD must be changed in production".to_string());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
