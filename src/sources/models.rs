use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::SourceError;

/// 支持的数据源, 封闭枚举
///
/// 提交下载、解析LLM输出时都只接受这三个值,
/// 其他字符串一律在边界处拒绝, 不做模糊匹配。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Kaggle,
    Huggingface,
    GoogleDataset,
}

impl SourceKind {
    pub fn all() -> [SourceKind; 3] {
        [
            SourceKind::Kaggle,
            SourceKind::Huggingface,
            SourceKind::GoogleDataset,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Kaggle => "kaggle",
            SourceKind::Huggingface => "huggingface",
            SourceKind::GoogleDataset => "google_dataset",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kaggle" => Ok(SourceKind::Kaggle),
            "huggingface" => Ok(SourceKind::Huggingface),
            "google_dataset" => Ok(SourceKind::GoogleDataset),
            other => Err(SourceError::UnknownSource(other.to_string())),
        }
    }
}

/// 数据集元信息, 各连接器统一转换成这个结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub source: SourceKind,
    pub url: Option<String>,
    pub size: Option<String>,
    pub format: Option<String>,
    pub license: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl DatasetInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, source: SourceKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            source,
            url: None,
            size: None,
            format: None,
            license: None,
            tags: Vec::new(),
            metadata: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_round_trip() {
        for kind in SourceKind::all() {
            assert_eq!(kind.as_str().parse::<SourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_source_kind_rejects_unknown() {
        // 拒绝大小写变体和随意的别名, 不做清洗
        for bad in ["Kaggle", "hugging face", "google", "kaggle.com", ""] {
            assert!(bad.parse::<SourceKind>().is_err(), "{} 不应被接受", bad);
        }
    }

    #[test]
    fn test_source_kind_serde() {
        let json = serde_json::to_string(&SourceKind::GoogleDataset).unwrap();
        assert_eq!(json, "\"google_dataset\"");
        let kind: SourceKind = serde_json::from_str("\"huggingface\"").unwrap();
        assert_eq!(kind, SourceKind::Huggingface);
    }
}
