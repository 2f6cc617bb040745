use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

/// 简单的过期文件缓存
///
/// 每个键一个JSON文件, 读取时检查写入时间是否超过有效期,
/// 过期条目顺手删除。淘汰策略刻意保持简单。
pub struct Cache {
    dir: PathBuf,
    expiry: Duration,
}

#[derive(serde::Deserialize, Serialize)]
struct Entry<T> {
    stored_at: DateTime<Utc>,
    payload: T,
}

impl Cache {
    pub fn new(dir: impl Into<PathBuf>, expiry: Duration) -> Self {
        let dir = dir.into();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("创建缓存目录失败: {:?} - {}", dir, e);
        }
        Self { dir, expiry }
    }

    /// 用命名空间和参数拼出缓存键, md5避免文件名过长
    pub fn key(&self, namespace: &str, parts: &[&str]) -> String {
        let mut hasher = Md5::new();
        hasher.update(namespace.as_bytes());
        for part in parts {
            hasher.update([0u8]);
            hasher.update(part.as_bytes());
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key);
        let raw = std::fs::read_to_string(&path).ok()?;
        let entry: Entry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                // 损坏的缓存文件直接删掉
                warn!("缓存文件损坏, 已删除: {:?} - {}", path, e);
                let _ = std::fs::remove_file(&path);
                return None;
            }
        };

        let age = (Utc::now() - entry.stored_at).to_std().unwrap_or_default();
        if age >= self.expiry {
            debug!("缓存过期: {}", key);
            let _ = std::fs::remove_file(&path);
            return None;
        }
        Some(entry.payload)
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let entry = Entry {
            stored_at: Utc::now(),
            payload: value,
        };
        match serde_json::to_string(&entry) {
            Ok(json) => {
                if let Err(e) = std::fs::write(self.path_for(key), json) {
                    warn!("写缓存失败: {} - {}", key, e);
                }
            }
            Err(e) => warn!("缓存序列化失败: {} - {}", key, e),
        }
    }

    pub fn clear(&self, key: &str) {
        let _ = std::fs::remove_file(self.path_for(key));
    }
}
