use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("HTTP错误: {0}")]
    Http(#[from] reqwest::Error),
    #[error("LLM接口错误: {0}")]
    Api(String),
    #[error("LLM输出不符合约定格式: {0}")]
    MalformedResponse(String),
}
