use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::error::DownloadError;
use super::task::CancelFlag;

/// 进度回调, 参数为[0,1]的完成比例, 调用频率由具体策略决定
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// 可插拔的传输策略
///
/// 连接器可以提供自己的传输实现(比如走SDK接口),
/// 但必须遵守同一份进度/取消契约:
/// 在分块粒度上检查取消信号, 取消时删掉半成品文件, 失败时返回Err。
#[async_trait]
pub trait TransferStrategy: Send + Sync {
    async fn transfer(
        &self,
        dataset_id: &str,
        target_path: &Path,
        progress: ProgressFn,
        cancel: CancelFlag,
    ) -> Result<(), DownloadError>;
}

/// 构造带有限超时的下载客户端
///
/// 只限制连接和单次读取, 不限制整个请求时长,
/// 否则大文件下载会被整体超时打断。
pub fn build_client() -> Result<reqwest::Client, DownloadError> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .read_timeout(Duration::from_secs(30))
        .build()?;
    Ok(client)
}

/// 通用的HTTP流式传输策略
///
/// 按块写盘, 声明了Content-Length时通过回调上报比例进度。
pub struct HttpStreamTransfer {
    client: reqwest::Client,
    url: String,
}

impl HttpStreamTransfer {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TransferStrategy for HttpStreamTransfer {
    async fn transfer(
        &self,
        dataset_id: &str,
        target_path: &Path,
        progress: ProgressFn,
        cancel: CancelFlag,
    ) -> Result<(), DownloadError> {
        debug!("开始流式下载: {} -> {:?}", dataset_id, target_path);

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                status,
                url: self.url.clone(),
            });
        }

        let total_size = response.content_length().unwrap_or(0);
        let mut file = tokio::fs::File::create(target_path).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            // 每个分块边界检查一次取消信号
            if cancel.is_cancelled() {
                drop(file);
                let _ = tokio::fs::remove_file(target_path).await;
                warn!("传输被取消: {}", dataset_id);
                return Ok(());
            }

            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if total_size > 0 {
                progress(downloaded as f64 / total_size as f64);
            }
        }

        file.flush().await?;
        progress(1.0);
        Ok(())
    }
}
