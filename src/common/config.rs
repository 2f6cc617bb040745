use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// 全局配置, 启动时从环境变量读取一次
///
/// 显式构造后注入到需要的地方, 不做全局单例。
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub openai_model: String,
    pub kaggle_username: String,
    pub kaggle_key: String,
    pub huggingface_api_key: Option<String>,
    pub datasets_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub cache_expiry: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env_or("OPENAI_API_KEY", ""),
            openai_api_base: env_or("OPENAI_API_BASE", "https://api.openai.com/v1"),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o"),
            kaggle_username: env_or("KAGGLE_USERNAME", ""),
            kaggle_key: env_or("KAGGLE_KEY", ""),
            huggingface_api_key: env::var("HUGGINGFACE_API_KEY").ok(),
            datasets_dir: PathBuf::from(env_or("DATASETS_DIR", "Datasets")),
            cache_dir: PathBuf::from(env_or("CACHE_DIR", ".cache")),
            cache_expiry: Duration::from_secs(parse_expiry(&env_or("CACHE_EXPIRY", "3600"))),
        }
    }

    /// 校验LLM相关配置, 只有走LLM搜索时才需要
    pub fn validate_llm(&self) -> Result<(), String> {
        if self.openai_api_key.is_empty() {
            return Err("OPENAI_API_KEY未设置, 请在环境变量中配置".to_string());
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// 解析过期秒数, 容忍行尾的 # 注释
fn parse_expiry(raw: &str) -> u64 {
    let value = raw.split('#').next().unwrap_or(raw).trim();
    value.parse().unwrap_or(3600)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expiry() {
        assert_eq!(parse_expiry("3600"), 3600);
        assert_eq!(parse_expiry("600 # 十分钟"), 600);
        assert_eq!(parse_expiry("垃圾输入"), 3600);
    }

    #[test]
    fn test_validate_llm() {
        let mut config = Config::from_env();
        config.openai_api_key = String::new();
        assert!(config.validate_llm().is_err());
        config.openai_api_key = "sk-test".to_string();
        assert!(config.validate_llm().is_ok());
    }
}
