use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP错误: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP请求失败, 状态码: {status}, URL: {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("无效的URL: {0}")]
    InvalidUrl(String),
    #[error("传输失败: {0}")]
    Transfer(String),
}
