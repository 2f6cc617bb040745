use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::downloader::transfer::{HttpStreamTransfer, TransferStrategy, build_client};

use super::connector_trait::SourceConnector;
use super::errors::SourceError;
use super::models::{DatasetInfo, SourceKind};

const API_BASE: &str = "https://huggingface.co/api/datasets";

/// Hugging Face数据集连接器, Token可选, 匿名也能搜公开数据集
pub struct HuggingFaceConnector {
    client: reqwest::Client,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HfDataset {
    id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    downloads: Option<u64>,
    #[serde(default)]
    likes: Option<u64>,
}

impl HuggingFaceConnector {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.get(url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    fn convert(&self, dataset: HfDataset) -> DatasetInfo {
        let mut info = DatasetInfo::new(dataset.id.clone(), dataset.id.clone(), self.kind());
        info.description = dataset.description.unwrap_or_default();
        info.url = Some(format!(
            "https://huggingface.co/datasets/{}/resolve/main/data/dataset.zip",
            dataset.id
        ));
        info.format = Some("zip".to_string());
        info.tags = dataset.tags;
        if let Some(downloads) = dataset.downloads {
            info.metadata
                .insert("downloads".to_string(), downloads.to_string());
        }
        if let Some(likes) = dataset.likes {
            info.metadata.insert("likes".to_string(), likes.to_string());
        }
        info
    }
}

#[async_trait]
impl SourceConnector for HuggingFaceConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Huggingface
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<DatasetInfo>, SourceError> {
        let url = format!(
            "{}?search={}&limit={}",
            API_BASE,
            urlencoding::encode(query),
            limit
        );
        debug!("HuggingFace搜索: {}", url);

        let response = self.request(&url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::InvalidResponse(format!(
                "HuggingFace接口返回 {}",
                response.status()
            )));
        }

        let datasets: Vec<HfDataset> = response.json().await?;
        Ok(datasets
            .into_iter()
            .take(limit)
            .map(|d| self.convert(d))
            .collect())
    }

    async fn get_dataset(&self, dataset_id: &str) -> Result<Option<DatasetInfo>, SourceError> {
        let url = format!("{}/{}", API_BASE, dataset_id);
        let response = self.request(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            warn!("HuggingFace数据集不存在: {}", dataset_id);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(SourceError::InvalidResponse(format!(
                "HuggingFace接口返回 {}",
                response.status()
            )));
        }

        let dataset: HfDataset = response.json().await?;
        Ok(Some(self.convert(dataset)))
    }

    /// HF走自己的流式传输策略, 复用同一份进度/取消契约
    fn transfer_strategy(&self, dataset: &DatasetInfo) -> Option<Arc<dyn TransferStrategy>> {
        let url = dataset.url.clone()?;
        let client = build_client().ok()?;
        Some(Arc::new(HttpStreamTransfer::new(client, url)))
    }
}
