//! 通用HTTP流式传输策略的集成测试

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use dataset_downloader::downloader::transfer::{HttpStreamTransfer, build_client};
use dataset_downloader::downloader::{CancelFlag, ProgressFn, TransferStrategy};

use common::http_server::{self, ServerOptions};

fn collecting_progress() -> (ProgressFn, Arc<Mutex<Vec<f64>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let progress: ProgressFn = Arc::new(move |p| sink.lock().unwrap().push(p));
    (progress, seen)
}

#[tokio::test]
async fn test_stream_transfer_writes_file_and_reports_progress() {
    let url = http_server::start(vec![0x11u8; 200_000]);
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.zip");

    let strategy = HttpStreamTransfer::new(build_client().unwrap(), url);
    let (progress, seen) = collecting_progress();
    strategy
        .transfer("owner/demo", &target, progress, CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(std::fs::metadata(&target).unwrap().len(), 200_000);

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    // 进度始终落在[0,1], 单调不减, 最后一个值是1.0
    assert!(seen.iter().all(|p| (0.0..=1.0).contains(p)));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*seen.last().unwrap(), 1.0);
}

#[tokio::test]
async fn test_stream_transfer_cancel_deletes_partial_file() {
    let url = http_server::start_with_options(
        vec![0x22u8; 800_000],
        ServerOptions {
            chunk_size: 4 * 1024,
            chunk_delay: Duration::from_millis(5),
        },
    );
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.zip");

    let strategy = HttpStreamTransfer::new(build_client().unwrap(), url);
    let (progress, _seen) = collecting_progress();
    let cancel = CancelFlag::new();

    let handle = {
        let cancel = cancel.clone();
        let target = target.clone();
        tokio::spawn(async move { strategy.transfer("owner/demo", &target, progress, cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    // 取消不是错误, 策略自己清理半成品
    handle.await.unwrap().unwrap();
    assert!(!target.exists());
}

#[tokio::test]
async fn test_stream_transfer_unreachable_url_fails() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.zip");

    let strategy = HttpStreamTransfer::new(
        build_client().unwrap(),
        "http://127.0.0.1:1/nothing.zip",
    );
    let (progress, _seen) = collecting_progress();
    let result = strategy
        .transfer("owner/demo", &target, progress, CancelFlag::new())
        .await;

    assert!(result.is_err());
    assert!(!target.exists());
}
