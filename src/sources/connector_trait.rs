use std::sync::Arc;

use async_trait::async_trait;

use crate::downloader::transfer::TransferStrategy;

use super::errors::SourceError;
use super::models::{DatasetInfo, SourceKind};

/// 数据源连接器的统一接口
///
/// 下载核心只通过这个窄接口消费连接器:
/// 搜索、取元数据、以及可选的自定义传输策略。
#[async_trait]
pub trait SourceConnector: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// 按关键词搜索数据集, 最多返回limit条
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<DatasetInfo>, SourceError>;

    /// 按ID取数据集元信息, 不存在时返回None
    async fn get_dataset(&self, dataset_id: &str) -> Result<Option<DatasetInfo>, SourceError>;

    /// 连接器自带的传输策略, 默认None表示走管理器内置的HTTP下载
    fn transfer_strategy(&self, _dataset: &DatasetInfo) -> Option<Arc<dyn TransferStrategy>> {
        None
    }
}
