use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use dataset_downloader::agent::LlmAgent;
use dataset_downloader::common::cache::Cache;
use dataset_downloader::common::config::Config;
use dataset_downloader::downloader::{DownloadManager, TaskStatus};
use dataset_downloader::sources::{
    DatasetInfo, SourceKind, connector_for, search_cached,
};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = cli::Cli::parse();
    let config = Config::from_env();

    match args.command {
        cli::Command::Search {
            query,
            sources,
            limit,
            no_llm,
            recommend,
        } => run_search(&config, &query, &sources, limit, no_llm, recommend).await,
        cli::Command::Download {
            source,
            dataset_id,
            output_dir,
        } => run_download(&config, &source, &dataset_id, output_dir).await,
    }
}

/// 把命令行传入的源名严格解析成枚举, 任何未知名称直接报错
fn parse_sources(raw: &[String]) -> anyhow::Result<Vec<SourceKind>> {
    raw.iter()
        .map(|s| s.parse::<SourceKind>().map_err(anyhow::Error::from))
        .collect()
}

async fn run_search(
    config: &Config,
    query: &str,
    raw_sources: &[String],
    limit: usize,
    no_llm: bool,
    recommend: bool,
) -> anyhow::Result<()> {
    let user_sources = parse_sources(raw_sources)?;

    // 搜索词和数据源: 用户指定的源优先于LLM建议
    let (terms, sources, explanation) = if no_llm {
        let sources = if user_sources.is_empty() {
            SourceKind::all().to_vec()
        } else {
            user_sources
        };
        (vec![query.to_string()], sources, None)
    } else {
        config.validate_llm().map_err(anyhow::Error::msg)?;
        let agent = LlmAgent::new(config);
        let plan = agent.plan_search(query).await?;
        info!("搜索计划: {:?} @ {:?}", plan.search_terms, plan.sources);
        let sources = if user_sources.is_empty() {
            plan.sources
        } else {
            user_sources
        };
        (plan.search_terms, sources, Some(plan.explanation))
    };

    if let Some(explanation) = explanation.filter(|e| !e.is_empty()) {
        println!("{} {}", "▶".cyan().bold(), explanation);
    }

    let cache = Cache::new(&config.cache_dir, config.cache_expiry);
    let mut seen = HashSet::new();
    let mut results: Vec<DatasetInfo> = Vec::new();

    for kind in &sources {
        let connector = connector_for(*kind, config);
        for term in &terms {
            match search_cached(&cache, connector.as_ref(), term, limit).await {
                Ok(datasets) => {
                    for dataset in datasets {
                        if seen.insert((dataset.source, dataset.id.clone())) {
                            results.push(dataset);
                        }
                    }
                }
                // 单个源失败不影响其他源
                Err(e) => warn!("{}搜索失败: {}", kind, e),
            }
        }
    }

    if results.is_empty() {
        println!("{} 没有找到匹配的数据集", "✗".red().bold());
        return Ok(());
    }

    println!();
    for (i, dataset) in results.iter().enumerate() {
        println!(
            "{:>3}. {} {} {}",
            i + 1,
            format!("[{}]", dataset.source).cyan(),
            dataset.name.bold(),
            dataset.id.bright_black()
        );
        if !dataset.description.is_empty() {
            let desc: String = dataset.description.chars().take(120).collect();
            println!("     {}", desc.bright_black());
        }
        if let Some(size) = &dataset.size {
            println!("     {}: {}", "大小".bright_black(), size);
        }
    }
    println!("\n共 {} 条结果", results.len());

    if recommend {
        config.validate_llm().map_err(anyhow::Error::msg)?;
        let agent = LlmAgent::new(config);
        let advice = agent.recommend(query, &results).await?;
        println!("\n{} {}", "★".yellow().bold(), advice);
    }

    Ok(())
}

async fn run_download(
    config: &Config,
    raw_source: &str,
    dataset_id: &str,
    output_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let kind: SourceKind = raw_source.parse()?;
    let connector = connector_for(kind, config);

    info!("查询数据集元信息: {} @ {}", dataset_id, kind);
    let dataset = connector
        .get_dataset(dataset_id)
        .await?
        .with_context(|| format!("数据集不存在: {}", dataset_id))?;

    let Some(url) = dataset.url.clone() else {
        bail!("该数据集没有可下载的URL: {}", dataset_id);
    };

    let target_dir = output_dir.unwrap_or_else(|| config.datasets_dir.clone());
    let manager = DownloadManager::new(target_dir)?;
    let strategy = connector.transfer_strategy(&dataset);
    let task_id = manager.submit(&dataset.id, &dataset.name, kind, &url, strategy);

    // Ctrl-C转成协作式取消, 等worker自己收尾
    {
        let manager = manager.clone();
        let task_id = task_id.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("收到中断信号, 正在取消下载...");
                manager.cancel(&task_id).await;
            }
        });
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        )
        .unwrap()
        .progress_chars("#>-"),
    );

    // 轮询快照直到终态
    let snapshot = loop {
        let Some(snapshot) = manager.get_status(&task_id).await else {
            bail!("任务丢失: {}", task_id);
        };
        if snapshot.file_size > 0 {
            pb.set_length(snapshot.file_size);
            pb.set_position(snapshot.downloaded_size);
        } else {
            pb.tick();
        }
        if snapshot.status.is_terminal() {
            break snapshot;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    };
    pb.finish_and_clear();

    match snapshot.status {
        TaskStatus::Completed => {
            println!(
                "{} 下载完成: {}",
                "✓".green().bold(),
                snapshot
                    .file_path
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
                    .bold()
            );
            Ok(())
        }
        TaskStatus::Cancelled => {
            println!("{} 下载已取消", "⚠".yellow().bold());
            Ok(())
        }
        TaskStatus::Failed => {
            let message = snapshot.error.unwrap_or_else(|| "未知错误".to_string());
            error!("下载失败: {}", message);
            bail!("下载失败: {}", message);
        }
        status => bail!("意外的终态: {}", status),
    }
}
