use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::connector_trait::SourceConnector;
use super::errors::SourceError;
use super::models::{DatasetInfo, SourceKind};

const API_BASE: &str = "https://www.kaggle.com/api/v1";

/// Kaggle数据集连接器, 走REST v1接口, 需要用户名和API Key
pub struct KaggleConnector {
    client: reqwest::Client,
    username: String,
    key: String,
}

/// /datasets/list 和 /datasets/view 返回的条目, 只取用得到的字段
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KaggleDataset {
    #[serde(rename = "ref")]
    dataset_ref: String,
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    total_bytes: Option<u64>,
    #[serde(default)]
    license_name: Option<String>,
}

impl KaggleConnector {
    pub fn new(username: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            username: username.into(),
            key: key.into(),
        }
    }

    fn check_credentials(&self) -> Result<(), SourceError> {
        if self.username.is_empty() || self.key.is_empty() {
            return Err(SourceError::MissingCredentials(
                "KAGGLE_USERNAME / KAGGLE_KEY".to_string(),
            ));
        }
        Ok(())
    }

    fn convert(&self, dataset: KaggleDataset) -> DatasetInfo {
        let mut info = DatasetInfo::new(dataset.dataset_ref.clone(), dataset.title, self.kind());
        info.description = dataset.subtitle.unwrap_or_default();
        // 元数据页面URL另存, 下载统一走API的download端点
        if let Some(url) = dataset.url {
            info.metadata.insert("page".to_string(), url);
        }
        info.url = Some(format!("{}/datasets/download/{}", API_BASE, dataset.dataset_ref));
        info.size = dataset.total_bytes.map(format_bytes);
        info.license = dataset.license_name;
        info.format = Some("zip".to_string());
        info
    }
}

#[async_trait]
impl SourceConnector for KaggleConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Kaggle
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<DatasetInfo>, SourceError> {
        self.check_credentials()?;

        let url = format!(
            "{}/datasets/list?search={}",
            API_BASE,
            urlencoding::encode(query)
        );
        debug!("Kaggle搜索: {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.key))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SourceError::InvalidResponse(format!(
                "Kaggle接口返回 {}",
                response.status()
            )));
        }

        let datasets: Vec<KaggleDataset> = response.json().await?;
        Ok(datasets
            .into_iter()
            .take(limit)
            .map(|d| self.convert(d))
            .collect())
    }

    async fn get_dataset(&self, dataset_id: &str) -> Result<Option<DatasetInfo>, SourceError> {
        self.check_credentials()?;

        // Kaggle的数据集ID固定是 owner/slug 两段
        let Some((owner, slug)) = dataset_id.split_once('/') else {
            return Err(SourceError::InvalidDatasetId(dataset_id.to_string()));
        };
        if owner.is_empty() || slug.is_empty() || slug.contains('/') {
            return Err(SourceError::InvalidDatasetId(dataset_id.to_string()));
        }

        let url = format!("{}/datasets/view/{}/{}", API_BASE, owner, slug);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.key))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            warn!("Kaggle数据集不存在: {}", dataset_id);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(SourceError::InvalidResponse(format!(
                "Kaggle接口返回 {}",
                response.status()
            )));
        }

        let dataset: KaggleDataset = response.json().await?;
        Ok(Some(self.convert(dataset)))
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
