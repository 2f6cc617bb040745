use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::sources::models::SourceKind;

use super::error::DownloadError;
use super::task::{CancelFlag, DownloadTask, TaskSnapshot, TaskStatus};
use super::transfer::{ProgressFn, TransferStrategy, build_client};

/// 文件名截断长度
const MAX_NAME_LEN: usize = 100;

/// 下载管理器
///
/// 注册表是唯一的跨worker共享资源, 每个任务单独spawn一个tokio任务,
/// 任务之间互不协调。某个任务的可变字段只有它自己的worker会写,
/// 查询方通过短临界区拿快照, 不会阻塞在网络IO上。
#[derive(Clone)]
pub struct DownloadManager {
    tasks: Arc<DashMap<String, Arc<Mutex<DownloadTask>>>>, // task_id -> Task
    datasets_dir: PathBuf,
    client: reqwest::Client,
    seq: Arc<AtomicU64>,
}

impl DownloadManager {
    pub fn new(datasets_dir: impl Into<PathBuf>) -> Result<Self, DownloadError> {
        let client = build_client()?;
        Ok(Self {
            tasks: Arc::new(DashMap::new()),
            datasets_dir: datasets_dir.into(),
            client,
            seq: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn datasets_dir(&self) -> &Path {
        &self.datasets_dir
    }

    /// 提交下载任务, 立刻返回任务ID, 不做任何网络校验
    ///
    /// 不传strategy时走内置的HTTP流式下载;
    /// 传了strategy则由连接器自己传输, 但要遵守进度/取消契约。
    pub fn submit(
        &self,
        dataset_id: &str,
        dataset_name: &str,
        source: SourceKind,
        url: &str,
        strategy: Option<Arc<dyn TransferStrategy>>,
    ) -> String {
        let mut task = DownloadTask::new(
            dataset_id.to_string(),
            dataset_name.to_string(),
            source,
            url.to_string(),
            self.datasets_dir.clone(),
        );
        task.seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let task_id = task.id.clone();
        let cancel = task.cancel.clone();
        let task_lock = Arc::new(Mutex::new(task));
        self.tasks.insert(task_id.clone(), Arc::clone(&task_lock));

        debug!("提交下载任务: {} ({})", task_id, dataset_id);

        let client = self.client.clone();
        let datasets_dir = self.datasets_dir.clone();
        tokio::spawn(async move {
            Self::run(task_lock, client, datasets_dir, strategy, cancel).await;
        });

        task_id
    }

    /// worker入口, 单个任务的完整生命周期
    async fn run(
        task_lock: Arc<Mutex<DownloadTask>>,
        client: reqwest::Client,
        datasets_dir: PathBuf,
        strategy: Option<Arc<dyn TransferStrategy>>,
        cancel: CancelFlag,
    ) {
        // 标记开始, 同时一次性确定目标路径, 此后不再变更
        let (task_id, dataset_id, dataset_name, url, file_path) = {
            let mut task = task_lock.lock().await;
            task.status = TaskStatus::Downloading;
            task.start_time = Some(Utc::now());
            let file_name = target_file_name(&task.dataset_name, &task.dataset_id, &task.url);
            let path = datasets_dir.join(file_name);
            task.file_path = Some(path.clone());
            (
                task.id.clone(),
                task.dataset_id.clone(),
                task.dataset_name.clone(),
                task.url.clone(),
                path,
            )
        };

        info!("开始下载任务: {} ({})", task_id, dataset_name);

        let result = Self::execute(
            &task_lock,
            client,
            &datasets_dir,
            strategy,
            &cancel,
            &dataset_id,
            &url,
            &file_path,
        )
        .await;

        // 收尾块: 所有退出路径都经过这里, 保证end_time和终态只记录一次
        let mut task = task_lock.lock().await;
        if cancel.is_cancelled() {
            task.status = TaskStatus::Cancelled;
            let _ = tokio::fs::remove_file(&file_path).await;
            info!("下载已取消: {}", dataset_name);
        } else {
            match result {
                Ok(()) => {
                    task.status = TaskStatus::Completed;
                    task.progress = 1.0;
                    info!("下载完成: {} -> {:?}", dataset_name, file_path);
                }
                Err(e) => {
                    task.status = TaskStatus::Failed;
                    task.error = Some(e.to_string());
                    let _ = tokio::fs::remove_file(&file_path).await;
                    error!("下载失败: {} - {}", dataset_name, e);
                }
            }
        }
        task.end_time = Some(Utc::now());
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute(
        task_lock: &Arc<Mutex<DownloadTask>>,
        client: reqwest::Client,
        datasets_dir: &Path,
        strategy: Option<Arc<dyn TransferStrategy>>,
        cancel: &CancelFlag,
        dataset_id: &str,
        url: &str,
        file_path: &Path,
    ) -> Result<(), DownloadError> {
        // 目录创建是幂等的, 多个worker并发调用也安全
        tokio::fs::create_dir_all(datasets_dir).await?;

        match strategy {
            Some(strategy) => {
                // 外部策略只通过回调上报进度, 这里负责钳位和单调写入
                let progress_task = Arc::clone(task_lock);
                let progress: ProgressFn = Arc::new(move |p: f64| {
                    let p = p.clamp(0.0, 1.0);
                    if let Ok(mut task) = progress_task.try_lock() {
                        if p > task.progress {
                            task.progress = p;
                        }
                    }
                });
                strategy
                    .transfer(dataset_id, file_path, progress, cancel.clone())
                    .await
            }
            None => Self::transfer_from_url(task_lock, client, url, file_path, cancel).await,
        }
    }

    /// 内置的HTTP流式下载, 按块写盘并维护任务上的字节计数
    async fn transfer_from_url(
        task_lock: &Arc<Mutex<DownloadTask>>,
        client: reqwest::Client,
        url: &str,
        file_path: &Path,
        cancel: &CancelFlag,
    ) -> Result<(), DownloadError> {
        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                status,
                url: url.to_string(),
            });
        }

        let total_size = response.content_length().unwrap_or(0);
        if total_size > 0 {
            let mut task = task_lock.lock().await;
            task.file_size = total_size;
        }

        let mut file = tokio::fs::File::create(file_path).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            // 取消信号在每个分块边界检查, 中断后由收尾块清理半成品
            if cancel.is_cancelled() {
                warn!("传输中断, 任务已请求取消: {}", url);
                return Ok(());
            }

            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            {
                let mut task = task_lock.lock().await;
                task.downloaded_size = downloaded;
                if total_size > 0 {
                    let p = (downloaded as f64 / total_size as f64).clamp(0.0, 1.0);
                    if p > task.progress {
                        task.progress = p;
                    }
                }
            }
        }

        file.flush().await?;
        Ok(())
    }

    /// 查询任务状态, 未知ID返回None, 不抛错
    pub async fn get_status(&self, task_id: &str) -> Option<TaskSnapshot> {
        let task = {
            let entry = self.tasks.get(task_id)?;
            Arc::clone(entry.value())
        };
        Some(task.lock().await.snapshot())
    }

    /// 请求取消任务
    ///
    /// 只有Pending/Downloading状态下才会置位, 且只在首次置位时返回true。
    /// 取消是异步协作式的, 调用方需要轮询状态等待Cancelled终态。
    pub async fn cancel(&self, task_id: &str) -> bool {
        let task = {
            let Some(entry) = self.tasks.get(task_id) else {
                return false;
            };
            Arc::clone(entry.value())
        };
        let task = task.lock().await;
        match task.status {
            TaskStatus::Pending | TaskStatus::Downloading => task.cancel.cancel(),
            _ => false,
        }
    }

    /// 按创建顺序列出所有任务的快照
    pub async fn list_all(&self) -> Vec<TaskSnapshot> {
        let locks: Vec<_> = self
            .tasks
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut snapshots = Vec::with_capacity(locks.len());
        for lock in locks {
            let task = lock.lock().await;
            snapshots.push((task.seq, task.snapshot()));
        }
        snapshots.sort_by_key(|(seq, _)| *seq);
        snapshots.into_iter().map(|(_, snap)| snap).collect()
    }

    /// 清理结束时间早于max_age的终态任务, 只动注册表, 不动磁盘文件
    pub async fn sweep(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let candidates: Vec<_> = self
            .tasks
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut to_remove = Vec::new();
        for (task_id, lock) in candidates {
            let task = lock.lock().await;
            if let (true, Some(end)) = (task.status.is_terminal(), task.end_time) {
                let age = (now - end).to_std().unwrap_or_default();
                if age >= max_age {
                    to_remove.push(task_id);
                }
            }
        }

        let mut removed = 0;
        for task_id in to_remove {
            if self.tasks.remove(&task_id).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("清理了{}个已结束的下载任务", removed);
        }
        removed
    }
}

/// 过滤文件名中的非法字符, 只保留字母数字和 - _ . 并截断长度
fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect()
}

/// 从URL路径推导扩展名, 忽略查询串, 推不出来时默认.zip
fn file_extension(url: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    let last_segment = path.rsplit('/').next().unwrap_or("");
    match last_segment.rfind('.') {
        Some(idx) if idx > 0 => last_segment[idx..].to_string(),
        _ => ".zip".to_string(),
    }
}

/// 目标文件名, 在传输开始前确定一次, 此后不可变
fn target_file_name(dataset_name: &str, dataset_id: &str, url: &str) -> String {
    format!(
        "{}_{}{}",
        safe_file_name(dataset_name),
        dataset_id.replace('/', "_"),
        file_extension(url)
    )
}
