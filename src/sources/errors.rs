use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("未知的数据源: {0}")]
    UnknownSource(String),
    #[error("HTTP错误: {0}")]
    Http(#[from] reqwest::Error),
    #[error("接口响应无效: {0}")]
    InvalidResponse(String),
    #[error("数据集ID格式错误: {0}")]
    InvalidDatasetId(String),
    #[error("缺少认证信息: {0}")]
    MissingCredentials(String),
}
