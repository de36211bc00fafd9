use std::sync::Arc;

use crate::accounts::AccountService;
use crate::auth::{JwtService, LoginThrottle};
use crate::bookings::BookingService;
use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind, change_feed_logger, invite_sweeper};
use crate::feedback::FeedbackService;
use crate::message::MessageBus;
use crate::notifications::NotificationService;
use crate::orders::OrderService;
use crate::payments::PaymentService;
use crate::sessions::CustomerSessionService;
use crate::staff::{InviteService, StaffService};
use crate::store::Store;
use crate::tables::TableService;

/// 服务器状态 - 持有所有服务的单例引用
///
/// 所有服务内部只持有 [`Store`] (Arc) 和少量配置，克隆成本极低。
///
/// # 服务组件
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | store | 事务存储 + 变更总线 |
/// | jwt_service | JWT 认证服务 |
/// | login_throttle | 登录失败节流 |
/// | accounts / bookings / orders / staff / invites | 领域服务 |
/// | tables / payments / notifications / feedback | 领域服务 |
/// | sessions | 顾客实时状态 (只读派生) |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub store: Store,
    pub jwt_service: Arc<JwtService>,
    pub login_throttle: Arc<LoginThrottle>,
    pub accounts: AccountService,
    pub bookings: BookingService,
    pub orders: OrderService,
    pub staff: StaffService,
    pub invites: InviteService,
    pub tables: TableService,
    pub payments: PaymentService,
    pub notifications: NotificationService,
    pub feedback: FeedbackService,
    pub sessions: CustomerSessionService,
}

impl ServerState {
    /// 基于已打开的存储构建状态
    pub fn new(config: Config, store: Store) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        Self {
            accounts: AccountService::new(store.clone()),
            bookings: BookingService::new(store.clone(), config.booking.clone()),
            orders: OrderService::new(store.clone(), config.tax_rate),
            staff: StaffService::new(store.clone()),
            invites: InviteService::new(store.clone(), config.invites.clone()),
            tables: TableService::new(store.clone()),
            payments: PaymentService::new(store.clone()),
            notifications: NotificationService::new(store.clone()),
            feedback: FeedbackService::new(store.clone()),
            sessions: CustomerSessionService::new(store.clone()),
            jwt_service,
            login_throttle: Arc::new(LoginThrottle::new()),
            store,
            config,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 0. 配置检查
    /// 1. 工作目录 (确保存在)
    /// 2. 存储 (work_dir/cafe.redb)
    /// 3. 各服务
    /// 4. 初始管理员账户 (首次启动)
    pub fn initialize(config: &Config) -> super::Result<Self> {
        config.validate().map_err(super::ServerError::Config)?;
        std::fs::create_dir_all(&config.work_dir)?;

        let bus = MessageBus::with_capacity(config.bus_channel_capacity);
        let store = Store::open(config.database_path(), bus)?;
        let state = Self::new(config.clone(), store);
        state.seed_admin()?;

        tracing::info!(
            database = %config.database_path().display(),
            sequence = state.store.current_sequence()?,
            "Server state initialized"
        );
        Ok(state)
    }

    /// 内存存储状态 (测试用)
    pub fn in_memory(config: Config) -> super::Result<Self> {
        let bus = MessageBus::with_capacity(config.bus_channel_capacity);
        let state = Self::new(config, Store::open_in_memory(bus)?);
        state.seed_admin()?;
        Ok(state)
    }

    fn seed_admin(&self) -> super::Result<()> {
        if let Some(admin) = self
            .accounts
            .seed_admin(&self.config.admin)
            .map_err(|e| super::ServerError::Internal(e.into()))?
        {
            tracing::info!(email = %admin.email, "Initial admin account created");
            if self.config.admin.password == "admin" {
                tracing::warn!("⚠️  Admin account uses the default password, set ADMIN_PASSWORD");
            }
        }
        Ok(())
    }

    /// 启动后台任务
    ///
    /// 启动的任务：
    /// - 过期邀请清理 (Periodic)
    /// - 变更日志记录 (Listener)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        tasks.spawn(
            "invite_sweeper",
            TaskKind::Periodic,
            invite_sweeper(
                self.invites.clone(),
                self.config.invites.sweep_interval,
                tasks.shutdown_token(),
            ),
        );
        tasks.spawn(
            "change_feed_logger",
            TaskKind::Listener,
            change_feed_logger(self.store.clone(), tasks.shutdown_token()),
        );

        tasks.log_summary();
        tasks
    }

    pub fn bus(&self) -> &MessageBus {
        self.store.bus()
    }
}
