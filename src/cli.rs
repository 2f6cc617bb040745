use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 数据集搜索与下载工具
#[derive(Parser, Debug)]
#[command(name = "datadl")]
#[command(version = "1.0")]
#[command(about = "用自然语言搜索数据集并下载", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 搜索数据集 (默认先让LLM生成搜索计划)
    Search {
        /// 自然语言描述的数据需求
        #[arg(value_name = "QUERY")]
        query: String,

        /// 限定数据源, 可重复指定
        #[arg(long = "source", value_name = "SOURCE")]
        #[arg(help = "数据源: kaggle / huggingface / google_dataset")]
        sources: Vec<String>,

        /// 每个数据源最多返回的条数
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// 跳过LLM, 直接用原始关键词搜索
        #[arg(long)]
        no_llm: bool,

        /// 搜索后让LLM推荐最合适的一个
        #[arg(long)]
        recommend: bool,
    },

    /// 下载数据集
    Download {
        /// 数据源名称
        #[arg(value_name = "SOURCE")]
        #[arg(help = "数据源: kaggle / huggingface / google_dataset")]
        source: String,

        /// 数据集ID, 如 owner/dataset-name
        #[arg(value_name = "DATASET_ID")]
        dataset_id: String,

        /// 保存目录
        #[arg(long, value_name = "DIR")]
        #[arg(value_hint = clap::ValueHint::DirPath)]
        output_dir: Option<PathBuf>,
    },
}
