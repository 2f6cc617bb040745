use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use super::connector_trait::SourceConnector;
use super::errors::SourceError;
use super::models::{DatasetInfo, SourceKind};

const SEARCH_URL: &str = "https://datasetsearch.research.google.com/search";

/// Google Dataset Search连接器
///
/// 没有公开API, 只做尽力而为的页面抓取, 抓不到就返回空列表。
/// 搜索结果只有跳转链接, 没有直接下载地址。
pub struct GoogleDatasetConnector {
    client: reqwest::Client,
    docid_re: Regex,
}

impl GoogleDatasetConnector {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            // 结果页里每个数据集卡片带一个docid属性
            docid_re: Regex::new(r#"data-docid="([^"]+)""#).unwrap(),
        }
    }

    fn link_for(docid: &str) -> String {
        format!("{}?docid={}", SEARCH_URL, urlencoding::encode(docid))
    }

    fn make_info(&self, docid: &str) -> DatasetInfo {
        let mut info = DatasetInfo::new(docid, docid, self.kind());
        // 没有直接下载URL, 只能给出详情页链接
        info.metadata
            .insert("link".to_string(), Self::link_for(docid));
        info
    }
}

impl Default for GoogleDatasetConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceConnector for GoogleDatasetConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::GoogleDataset
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<DatasetInfo>, SourceError> {
        let url = format!("{}?query={}", SEARCH_URL, urlencoding::encode(query));
        debug!("Google Dataset Search: {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Google Dataset Search请求失败: {}", e);
                return Ok(Vec::new());
            }
        };
        if !response.status().is_success() {
            warn!("Google Dataset Search返回 {}", response.status());
            return Ok(Vec::new());
        }

        let body = response.text().await.unwrap_or_default();
        let results: Vec<DatasetInfo> = self
            .docid_re
            .captures_iter(&body)
            .take(limit)
            .map(|cap| self.make_info(&cap[1]))
            .collect();

        debug!("Google Dataset Search命中{}条", results.len());
        Ok(results)
    }

    async fn get_dataset(&self, dataset_id: &str) -> Result<Option<DatasetInfo>, SourceError> {
        if dataset_id.is_empty() {
            return Err(SourceError::InvalidDatasetId(dataset_id.to_string()));
        }
        // 详情同样没有API, 按docid拼出链接型的元信息
        Ok(Some(self.make_info(dataset_id)))
    }
}
