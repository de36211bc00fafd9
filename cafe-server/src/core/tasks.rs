//! 后台任务管理
//!
//! 统一管理所有后台任务的注册、启动和关闭。
//!
//! # 任务类型
//!
//! - [`TaskKind::Listener`] - 变更监听器
//! - [`TaskKind::Periodic`] - 定时任务

use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::message::{BusError, TopicFilter};
use crate::staff::InviteService;
use crate::store::Store;

/// 变更日志补齐时每批读取的条数
const CATCH_UP_BATCH: usize = 256;

/// 任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// 变更监听器
    Listener,
    /// 定时任务
    Periodic,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Listener => write!(f, "Listener"),
            TaskKind::Periodic => write!(f, "Periodic"),
        }
    }
}

/// 已注册的后台任务
struct RegisteredTask {
    name: &'static str,
    kind: TaskKind,
    handle: JoinHandle<()>,
}

/// 后台任务管理器
///
/// ```ignore
/// let mut tasks = BackgroundTasks::new();
/// tasks.spawn("invite_sweeper", TaskKind::Periodic, invite_sweeper(invites, interval, token));
///
/// // Graceful shutdown
/// tasks.shutdown().await;
/// ```
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    /// 全局取消令牌
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// 获取取消令牌（用于任务内部监听 shutdown 信号）
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 注册并启动一个后台任务
    ///
    /// 任务会被包装以捕获 panic，异常退出时记录错误日志。
    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        let wrapped_future = async move {
            let result: Result<(), Box<dyn std::any::Any + Send>> =
                AssertUnwindSafe(future).catch_unwind().await;
            match result {
                Ok(()) if shutdown.is_cancelled() => {}
                Ok(()) => {
                    tracing::warn!(
                        task = %name,
                        kind = %kind,
                        "Background task completed unexpectedly"
                    );
                }
                Err(panic_info) => {
                    let panic_msg: String = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        (*s).to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    tracing::error!(
                        task = %name,
                        kind = %kind,
                        panic = %panic_msg,
                        "Background task panicked! This is a bug that should be reported."
                    );
                }
            }
        };

        let handle = tokio::spawn(wrapped_future);
        tracing::debug!(task = %name, kind = %kind, "Registered background task");
        self.tasks.push(RegisteredTask { name, kind, handle });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 打印任务摘要
    pub fn log_summary(&self) {
        let listeners = self
            .tasks
            .iter()
            .filter(|t| t.kind == TaskKind::Listener)
            .count();
        tracing::info!(
            "Background tasks registered: {} total (Listener: {}, Periodic: {})",
            self.tasks.len(),
            listeners,
            self.tasks.len() - listeners
        );
    }

    /// Graceful shutdown - 取消所有任务并等待完成
    pub async fn shutdown(self) {
        tracing::info!("Shutting down {} background tasks...", self.tasks.len());
        self.shutdown.cancel();

        for task in self.tasks {
            match task.handle.await {
                Ok(()) => tracing::debug!(task = %task.name, "Task completed"),
                Err(e) if e.is_cancelled() => tracing::debug!(task = %task.name, "Task cancelled"),
                Err(e) => tracing::error!(task = %task.name, error = ?e, "Task panicked"),
            }
        }

        tracing::info!("All background tasks stopped");
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

/// 定时把过期的 PENDING 邀请标记为 EXPIRED
pub async fn invite_sweeper(
    invites: InviteService,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => match invites.cleanup_expired() {
                Ok(0) => {}
                Ok(expired) => tracing::info!(expired, "Expired stale invites"),
                Err(e) => tracing::error!(error = %e, "Invite sweep failed"),
            },
        }
    }
}

/// 记录所有已提交的变更
///
/// 订阅者落后时从变更日志补齐，保证按序列号连续输出。
pub async fn change_feed_logger(store: Store, shutdown: CancellationToken) {
    let mut subscription = store.bus().subscribe(TopicFilter::all());
    // 只记录启动之后的变更
    match store.current_sequence() {
        Ok(sequence) => subscription.advance_to(sequence),
        Err(e) => tracing::error!(error = %e, "Failed to read change log head"),
    }

    loop {
        let result = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = subscription.recv() => result,
        };
        match result {
            Ok(change) => tracing::debug!(
                target: "changes",
                sequence = change.sequence,
                collection = %change.collection,
                action = %change.action,
                id = %change.id,
                version = change.version,
                "Change committed"
            ),
            Err(BusError::Lagged { skipped, last_seen }) => {
                tracing::warn!(skipped, last_seen, "Change feed lagged, catching up from log");
                let mut since = last_seen;
                loop {
                    let batch = match store.changes_since(since, CATCH_UP_BATCH) {
                        Ok(batch) => batch,
                        Err(e) => {
                            tracing::error!(error = %e, "Change log catch-up failed");
                            break;
                        }
                    };
                    let Some(last) = batch.last().map(|c| c.sequence) else {
                        break;
                    };
                    for change in &batch {
                        tracing::debug!(
                            target: "changes",
                            sequence = change.sequence,
                            collection = %change.collection,
                            action = %change.action,
                            id = %change.id,
                            "Change committed (replayed)"
                        );
                    }
                    since = last;
                    subscription.advance_to(last);
                    if batch.len() < CATCH_UP_BATCH {
                        break;
                    }
                }
            }
            Err(BusError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::InviteSettings;
    use crate::domain::Actor;
    use crate::message::MessageBus;
    use shared::models::{AccountRole, InviteCreate, InviteStatus, StaffRole};

    #[tokio::test]
    async fn test_invite_sweeper_expires_and_stops() {
        let store = Store::open_in_memory(MessageBus::new()).unwrap();
        let invites = InviteService::new(
            store,
            InviteSettings {
                ttl_hours: -1,
                ..InviteSettings::default()
            },
        );
        let admin = Actor {
            id: "admin-1".to_string(),
            name: "Administrator".to_string(),
            email: "admin@cafe.local".to_string(),
            role: AccountRole::Admin,
        };
        invites
            .create(&admin, InviteCreate { role: StaffRole::Chef, email: None })
            .unwrap();

        let mut tasks = BackgroundTasks::new();
        let token = tasks.shutdown_token();
        tasks.spawn(
            "invite_sweeper",
            TaskKind::Periodic,
            invite_sweeper(invites.clone(), Duration::from_millis(10), token),
        );
        assert_eq!(tasks.len(), 1);

        // first tick fires immediately
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(invites.list().unwrap()[0].status, InviteStatus::Expired);

        tasks.shutdown().await;
    }
}
