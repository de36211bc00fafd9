use thiserror::Error;

use crate::store::StoreError;

/// 启动和运行期错误
///
/// 请求级错误使用 [`crate::AppError`]，这里只覆盖服务器本身无法继续运行的情况。
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("内部服务器错误: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
