pub mod errors;
pub mod prompts;

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::common::config::Config;
use crate::sources::models::{DatasetInfo, SourceKind};

pub use errors::AgentError;

/// LLM给出的搜索计划
///
/// sources字段直接反序列化成封闭枚举,
/// 模型编造的源名会在解析时被整体拒绝, 不做清洗兜底。
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPlan {
    pub search_terms: Vec<String>,
    pub sources: Vec<SourceKind>,
    #[serde(default)]
    pub explanation: String,
}

/// 调OpenAI兼容接口的轻量Agent
pub struct LlmAgent {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl LlmAgent {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.openai_api_key.clone(),
            api_base: config.openai_api_base.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
        }
    }

    async fn chat(&self, prompt: &str) -> Result<String, AgentError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.7,
            "max_tokens": 1000,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AgentError::Api(format!(
                "接口返回 {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AgentError::Api("响应中没有choices".to_string()))
    }

    /// 把自然语言需求转成搜索计划
    pub async fn plan_search(&self, query: &str) -> Result<SearchPlan, AgentError> {
        info!("请求LLM生成搜索计划: {}", query);
        let raw = self.chat(&prompts::search_plan_prompt(query)).await?;
        debug!("LLM原始输出: {}", raw);
        parse_search_plan(&raw)
    }

    /// 在候选集里推荐最合适的数据集, 返回纯文本说明
    pub async fn recommend(
        &self,
        query: &str,
        datasets: &[DatasetInfo],
    ) -> Result<String, AgentError> {
        let raw = self
            .chat(&prompts::recommendation_prompt(query, datasets))
            .await?;
        Ok(raw.trim().to_string())
    }
}

/// 严格解析LLM输出: 允许剥一层markdown代码栅栏, 之后必须是合法JSON
///
/// 解析失败就报错, 不猜测、不修补。
pub fn parse_search_plan(raw: &str) -> Result<SearchPlan, AgentError> {
    static FENCE_RE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE_RE
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("固定正则"));

    let body = fence
        .captures(raw)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw)
        .trim();

    let plan: SearchPlan = serde_json::from_str(body)
        .map_err(|e| AgentError::MalformedResponse(e.to_string()))?;

    if plan.search_terms.is_empty() {
        return Err(AgentError::MalformedResponse(
            "search_terms不能为空".to_string(),
        ));
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let raw = r#"{"search_terms": ["global temperature"], "sources": ["kaggle"], "explanation": "气候数据多在kaggle"}"#;
        let plan = parse_search_plan(raw).unwrap();
        assert_eq!(plan.search_terms, vec!["global temperature"]);
        assert_eq!(plan.sources, vec![SourceKind::Kaggle]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "Here you go:\n```json\n{\"search_terms\": [\"mnist\"], \"sources\": [\"huggingface\", \"google_dataset\"]}\n```";
        let plan = parse_search_plan(raw).unwrap();
        assert_eq!(
            plan.sources,
            vec![SourceKind::Huggingface, SourceKind::GoogleDataset]
        );
        assert_eq!(plan.explanation, "");
    }

    #[test]
    fn test_reject_prose() {
        let raw = "I think you should search Kaggle for climate data.";
        assert!(matches!(
            parse_search_plan(raw),
            Err(AgentError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_reject_invented_source() {
        // 模型编造的数据源名导致整体拒绝
        let raw = r#"{"search_terms": ["x"], "sources": ["data.gov"]}"#;
        assert!(matches!(
            parse_search_plan(raw),
            Err(AgentError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_reject_empty_terms() {
        let raw = r#"{"search_terms": [], "sources": ["kaggle"]}"#;
        assert!(matches!(
            parse_search_plan(raw),
            Err(AgentError::MalformedResponse(_))
        ));
    }
}
