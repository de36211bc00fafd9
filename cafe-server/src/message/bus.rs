//! 消息总线核心实现
//!
//! # 架构
//!
//! ```text
//! Store::write ──commit──▶ change_log (redb)
//!        │
//!        └──publish (按 sequence 顺序)──▶ broadcast::Sender<ChangeRecord>
//!                                              │
//!                     ┌────────────────────────┼────────────────────────┐
//!                     ▼                        ▼                        ▼
//!               Subscription            Subscription             subscribe_with
//!               (主题过滤)               (主题过滤)               (后台监听任务)
//! ```
//!
//! 总线只承载已提交的变更。订阅者落后 (lagged) 时会收到
//! [`BusError::Lagged`]，附带最后处理的序列号，可用
//! `Store::changes_since` 从变更日志补齐。

use shared::message::ChangeRecord;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::filter::TopicFilter;

/// 总线配置
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Capacity of the broadcast channel (default: 1024)
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// 订阅错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// 订阅者处理过慢，`skipped` 条变更被覆盖
    #[error("subscriber lagged behind by {skipped} changes (last seen sequence {last_seen})")]
    Lagged { skipped: u64, last_seen: u64 },

    #[error("message bus closed")]
    Closed,
}

/// 消息总线 - 负责已提交变更的有序广播
#[derive(Debug, Clone)]
pub struct MessageBus {
    /// 变更广播通道
    tx: broadcast::Sender<ChangeRecord>,
    /// 总线配置
    config: BusConfig,
    /// 关闭信号令牌
    shutdown_token: CancellationToken,
}

impl MessageBus {
    /// 创建默认配置的消息总线
    pub fn new() -> Self {
        Self::from_config(BusConfig::default())
    }

    /// 从配置创建消息总线
    pub fn from_config(config: BusConfig) -> Self {
        let (tx, _) = broadcast::channel(config.channel_capacity);
        Self {
            tx,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// 创建指定容量的消息总线
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_config(BusConfig {
            channel_capacity: capacity,
        })
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// 发布变更 (仅由 Store 在提交后调用)
    ///
    /// 返回收到该变更的订阅者数量，没有订阅者时为 0
    pub(crate) fn publish(&self, record: ChangeRecord) -> usize {
        self.tx.send(record).unwrap_or(0)
    }

    /// 订阅变更 (按主题过滤)
    pub fn subscribe(&self, filter: impl Into<TopicFilter>) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            filter: filter.into(),
            last_seen: 0,
        }
    }

    /// 订阅变更并在后台任务中回调 `handler`
    ///
    /// 返回的 [`SubscriptionHandle`] 被 drop 或调用 `unsubscribe` 时监听停止。
    /// 总线关闭 (`shutdown`) 时所有监听一并停止。
    pub fn subscribe_with<F>(
        &self,
        filter: impl Into<TopicFilter>,
        mut handler: F,
    ) -> SubscriptionHandle
    where
        F: FnMut(ChangeRecord) + Send + 'static,
    {
        let mut subscription = self.subscribe(filter);
        let token = self.shutdown_token.child_token();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    result = subscription.recv() => match result {
                        Ok(record) => handler(record),
                        Err(BusError::Lagged { skipped, last_seen }) => {
                            tracing::warn!(
                                skipped,
                                last_seen,
                                "Change listener lagged; re-read the change log to catch up"
                            );
                        }
                        Err(BusError::Closed) => break,
                    },
                }
            }
        });

        SubscriptionHandle {
            token,
            handle: Some(handle),
        }
    }

    /// 当前订阅者数量
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// 获取关闭令牌 (用于监控关闭信号)
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// 优雅关闭消息总线
    ///
    /// 停止所有 `subscribe_with` 监听任务
    pub fn shutdown(&self) {
        tracing::info!("Shutting down message bus");
        self.shutdown_token.cancel();
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

/// 单个订阅
pub struct Subscription {
    rx: broadcast::Receiver<ChangeRecord>,
    filter: TopicFilter,
    /// 已处理的最大序列号 (含被过滤掉的变更)
    last_seen: u64,
}

impl Subscription {
    /// 接收下一条匹配的变更
    ///
    /// 序列号不大于 `last_seen` 的变更会被跳过，因此从变更日志补齐后
    /// 调用 [`Subscription::advance_to`] 即可避免重复处理。
    pub async fn recv(&mut self) -> Result<ChangeRecord, BusError> {
        loop {
            match self.rx.recv().await {
                Ok(record) => {
                    if record.sequence <= self.last_seen {
                        continue;
                    }
                    self.last_seen = record.sequence;
                    if self.filter.matches(&record) {
                        return Ok(record);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    return Err(BusError::Lagged {
                        skipped,
                        last_seen: self.last_seen,
                    });
                }
                Err(RecvError::Closed) => return Err(BusError::Closed),
            }
        }
    }

    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// 标记 `sequence` 及之前的变更为已处理
    pub fn advance_to(&mut self, sequence: u64) {
        self.last_seen = self.last_seen.max(sequence);
    }
}

/// 后台监听句柄
pub struct SubscriptionHandle {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    /// 停止监听并等待任务退出
    pub async fn unsubscribe(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
            && self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
