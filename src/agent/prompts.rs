use crate::sources::models::DatasetInfo;

/// 生成搜索计划的提示词, 要求模型只输出一个JSON对象
pub fn search_plan_prompt(query: &str) -> String {
    format!(
        r#"You are a dataset search assistant. A user describes a data need in natural language; \
propose concrete search terms and the data sources to query.

Respond with a single JSON object and nothing else, no prose, no markdown fence:
{{
  "search_terms": ["term1", "term2"],
  "sources": ["kaggle", "huggingface", "google_dataset"],
  "explanation": "one short sentence on why"
}}

Only the three source names above are valid. Use 1 to 4 search terms.

User request: {query}"#
    )
}

/// 推荐最合适数据集的提示词
pub fn recommendation_prompt(query: &str, datasets: &[DatasetInfo]) -> String {
    let mut listing = String::new();
    for (i, d) in datasets.iter().enumerate() {
        listing.push_str(&format!(
            "{}. [{}] {} ({}): {}\n",
            i + 1,
            d.source,
            d.name,
            d.id,
            d.description
        ));
    }
    format!(
        r#"A user is looking for a dataset. Given the candidates below, recommend the single \
best match and explain briefly in plain text (no JSON).

User request: {query}

Candidates:
{listing}"#
    )
}
