use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sources::models::SourceKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Downloading,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// 是否已进入终态, 终态之间不会再迁移
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Downloading => "downloading",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// 协作式取消信号, 只能置位一次, 传输循环在每个分块边界检查
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消, 返回是否是本次调用真正置位的
    pub fn cancel(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 一次下载任务的全部状态, 由注册表独占持有
///
/// 可变字段只有该任务的worker会写, 查询方拿到的是快照副本。
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub id: String,
    /// 提交顺序号, 由管理器分配, 用于稳定排序
    pub seq: u64,
    pub dataset_id: String,
    pub dataset_name: String,
    pub source: SourceKind,
    pub url: String,
    pub target_dir: PathBuf,
    pub status: TaskStatus,
    pub progress: f64,
    pub error: Option<String>,
    pub file_path: Option<PathBuf>,
    pub file_size: u64,
    pub downloaded_size: u64,
    pub created_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub cancel: CancelFlag,
}

impl DownloadTask {
    pub fn new(
        dataset_id: String,
        dataset_name: String,
        source: SourceKind,
        url: String,
        target_dir: PathBuf,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            seq: 0,
            dataset_id,
            dataset_name,
            source,
            url,
            target_dir,
            status: TaskStatus::Pending,
            progress: 0.0,
            error: None,
            file_path: None,
            file_size: 0,
            downloaded_size: 0,
            created_at: Utc::now(),
            start_time: None,
            end_time: None,
            cancel: CancelFlag::new(),
        }
    }

    /// 生成当前时刻的状态快照, 速度和ETA在这里即时推导, 不落库
    pub fn snapshot(&self) -> TaskSnapshot {
        let mut speed = 0.0;
        let mut eta = 0.0;

        if self.status == TaskStatus::Downloading
            && self.file_size > 0
            && self.downloaded_size > 0
        {
            if let Some(start) = self.start_time {
                let elapsed = (Utc::now() - start).num_milliseconds() as f64 / 1000.0;
                if elapsed > 0.0 {
                    speed = self.downloaded_size as f64 / elapsed;
                    if speed > 0.0 {
                        let remaining = self.file_size.saturating_sub(self.downloaded_size);
                        eta = remaining as f64 / speed;
                    }
                }
            }
        }

        TaskSnapshot {
            id: self.id.clone(),
            dataset_id: self.dataset_id.clone(),
            dataset_name: self.dataset_name.clone(),
            source: self.source,
            status: self.status.clone(),
            progress: self.progress,
            error: self.error.clone(),
            file_path: self.file_path.clone(),
            file_size: self.file_size,
            downloaded_size: self.downloaded_size,
            speed,
            eta,
            created_at: self.created_at,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// 对外暴露的扁平快照, 可直接序列化成JSON供UI轮询
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    pub id: String,
    pub dataset_id: String,
    pub dataset_name: String,
    pub source: SourceKind,
    pub status: TaskStatus,
    pub progress: f64,
    pub error: Option<String>,
    pub file_path: Option<PathBuf>,
    pub file_size: u64,
    pub downloaded_size: u64,
    /// 字节每秒, 不可测时为0
    pub speed: f64,
    /// 预计剩余秒数, 速度为0或总大小未知时为0
    pub eta: f64,
    pub created_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}
