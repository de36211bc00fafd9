//! Permission Definitions
//!
//! 按角色固定分配的权限，令牌签发时写入 Claims。
//!
//! ## 设计原则
//! - 查看自己的预订、订单、通知无需权限，登录即可
//! - 厨房 / 服务员按工作阶段授权
//! - 管理操作统一由 admin 的 `"all"` 覆盖

use shared::message::Collection;
use shared::models::AccountRole;

use super::CurrentUser;

/// 全部权限（admin 之外的角色从中选取）
pub const ALL_PERMISSIONS: &[&str] = &[
    "bookings:create",  // 提交预订
    "bookings:read",    // 查看所有预订
    "bookings:manage",  // 审批 / 拒绝 / 入座 / 完成 / 未到店
    "orders:create",    // 下单、支付
    "orders:read",      // 查看所有订单及队列
    "orders:prepare",   // 接单 / 开始制作 / 出餐
    "orders:serve",     // 上菜 / 交付
    "orders:assign",    // 指派 / 改派
    "staff:manage",     // 员工与邀请管理
    "accounts:manage",  // 账户列表、启用 / 停用
    "tables:read",      // 桌台视图、优先级队列、使用记录
    "tables:manage",    // 新建桌台
    "payments:manage",  // 退款处理
    "feedback:create",  // 提交评价
    "feedback:manage",  // 回复 / 发布 / 隐藏评价
    "sync:read",        // 拉取变更日志
];

/// Default role permissions
pub const DEFAULT_ADMIN_PERMISSIONS: &[&str] = &["all"];

pub const DEFAULT_CHEF_PERMISSIONS: &[&str] =
    &["orders:read", "orders:prepare", "tables:read", "sync:read"];

pub const DEFAULT_WAITER_PERMISSIONS: &[&str] = &[
    "orders:read",
    "orders:serve",
    "bookings:read",
    "tables:read",
    "sync:read",
];

pub const DEFAULT_CUSTOMER_PERMISSIONS: &[&str] =
    &["bookings:create", "orders:create", "feedback:create"];

/// Get permissions for a role
pub fn role_permissions(role: AccountRole) -> Vec<String> {
    let permissions = match role {
        AccountRole::Admin => DEFAULT_ADMIN_PERMISSIONS,
        AccountRole::Chef => DEFAULT_CHEF_PERMISSIONS,
        AccountRole::Waiter => DEFAULT_WAITER_PERMISSIONS,
        AccountRole::Customer => DEFAULT_CUSTOMER_PERMISSIONS,
    };
    permissions.iter().map(|s| s.to_string()).collect()
}

/// 读取某个集合的变更记录所需的权限，`None` 表示仅管理员
pub fn collection_read_permission(collection: Collection) -> Option<&'static str> {
    match collection {
        Collection::Bookings => Some("bookings:read"),
        Collection::Orders => Some("orders:read"),
        Collection::Tables | Collection::TableHistory => Some("tables:read"),
        Collection::Staff | Collection::Invites => Some("staff:manage"),
        Collection::Payments => Some("payments:manage"),
        Collection::Feedback => Some("feedback:manage"),
        Collection::Accounts => Some("accounts:manage"),
        // 个人收件箱
        Collection::Notifications => None,
    }
}

/// 当前用户能否看到该集合的变更
pub fn can_read_collection(user: &CurrentUser, collection: Collection) -> bool {
    match collection_read_permission(collection) {
        Some(permission) => user.has_permission(permission),
        None => user.is_admin(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: AccountRole) -> CurrentUser {
        CurrentUser {
            id: "u-1".to_string(),
            username: "u".to_string(),
            email: "u@example.com".to_string(),
            role,
            permissions: role_permissions(role),
        }
    }

    #[test]
    fn test_chef_reads_kitchen_collections_only() {
        let chef = user(AccountRole::Chef);
        assert!(can_read_collection(&chef, Collection::Orders));
        assert!(can_read_collection(&chef, Collection::Tables));
        for hidden in [
            Collection::Accounts,
            Collection::Notifications,
            Collection::Payments,
            Collection::Invites,
        ] {
            assert!(!can_read_collection(&chef, hidden), "{hidden}");
        }

        let admin = user(AccountRole::Admin);
        assert!(Collection::ALL.iter().all(|c| can_read_collection(&admin, *c)));
    }

    #[test]
    fn test_role_permissions_are_known() {
        for role in [AccountRole::Chef, AccountRole::Waiter, AccountRole::Customer] {
            for permission in role_permissions(role) {
                assert!(
                    ALL_PERMISSIONS.contains(&permission.as_str()),
                    "{role}: unknown permission {permission}"
                );
            }
        }
        assert_eq!(role_permissions(AccountRole::Admin), vec!["all".to_string()]);
    }
}
