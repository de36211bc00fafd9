//! 登录失败限流
//!
//! 使用 DashMap 按邮箱记录连续失败次数，达到上限后锁定一段时间。
//! 登录成功时清零，过期记录在检查与记录时顺带清除。

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// 连续失败上限
const MAX_FAILED_ATTEMPTS: u32 = 5;

/// 锁定时长 (分钟)
const LOCKOUT_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy)]
struct FailedAttempts {
    count: u32,
    last_failed_at: DateTime<Utc>,
}

impl FailedAttempts {
    /// 距上次失败已超过锁定时长
    fn expired(&self, now: DateTime<Utc>) -> bool {
        now - self.last_failed_at >= Duration::minutes(LOCKOUT_MINUTES)
    }
}

#[derive(Debug, Default)]
pub struct LoginThrottle {
    attempts: DashMap<String, FailedAttempts>,
}

impl LoginThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前是否处于锁定期
    pub fn is_locked(&self, email: &str, now: DateTime<Utc>) -> bool {
        self.attempts.remove_if(email, |_, entry| entry.expired(now));
        self.attempts
            .get(email)
            .is_some_and(|entry| entry.count >= MAX_FAILED_ATTEMPTS)
    }

    /// 记录一次失败，返回累计次数
    ///
    /// 锁定期过后的失败重新计数
    pub fn record_failure(&self, email: &str, now: DateTime<Utc>) -> u32 {
        // 顺带清掉所有过期邮箱，表大小受窗口内失败邮箱数约束
        self.attempts.retain(|_, entry| !entry.expired(now));

        let mut entry = self
            .attempts
            .entry(email.to_string())
            .or_insert(FailedAttempts {
                count: 0,
                last_failed_at: now,
            });
        entry.count += 1;
        entry.last_failed_at = now;
        entry.count
    }

    pub fn reset(&self, email: &str) {
        self.attempts.remove(email);
    }
}
