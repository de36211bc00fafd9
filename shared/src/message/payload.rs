//! 同步载荷

use serde::{Deserialize, Serialize};

use super::ChangeRecord;

/// 变更日志拉取请求 (客户端重连 / 落后时使用)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangesQuery {
    /// 客户端已处理到的序列号
    #[serde(default)]
    pub since: u64,
    /// 单次返回上限
    pub limit: Option<usize>,
}

/// 变更日志拉取响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangesResponse {
    /// 本批变更 (按 sequence 升序)
    pub changes: Vec<ChangeRecord>,
    /// 服务器当前序列号
    pub server_sequence: u64,
    /// 下一次请求的 `since` (包含本批中无权查看而被跳过的记录)
    pub next_since: u64,
    /// 是否还有更多变更
    pub has_more: bool,
}
