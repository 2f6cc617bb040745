pub mod connector_trait;
pub mod errors;
pub mod google_dataset;
pub mod huggingface;
pub mod kaggle;
pub mod models;

use std::sync::Arc;

use tracing::info;

use crate::common::cache::Cache;
use crate::common::config::Config;

pub use connector_trait::SourceConnector;
pub use errors::SourceError;
pub use models::{DatasetInfo, SourceKind};

/// 按数据源类型构造对应的连接器
pub fn connector_for(kind: SourceKind, config: &Config) -> Arc<dyn SourceConnector> {
    match kind {
        SourceKind::Kaggle => Arc::new(kaggle::KaggleConnector::new(
            config.kaggle_username.clone(),
            config.kaggle_key.clone(),
        )),
        SourceKind::Huggingface => Arc::new(huggingface::HuggingFaceConnector::new(
            config.huggingface_api_key.clone(),
        )),
        SourceKind::GoogleDataset => Arc::new(google_dataset::GoogleDatasetConnector::new()),
    }
}

/// 带文件缓存的搜索, 命中时不打外部接口
pub async fn search_cached(
    cache: &Cache,
    connector: &dyn SourceConnector,
    query: &str,
    limit: usize,
) -> Result<Vec<DatasetInfo>, SourceError> {
    let key = cache.key(
        "search",
        &[connector.kind().as_str(), query, &limit.to_string()],
    );
    if let Some(hit) = cache.get::<Vec<DatasetInfo>>(&key) {
        info!("搜索缓存命中: {} '{}'", connector.kind(), query);
        return Ok(hit);
    }

    let results = connector.search(query, limit).await?;
    cache.set(&key, &results);
    Ok(results)
}
