//! 集成测试用的最小HTTP服务器
//!
//! 固定返回一段静态内容并声明Content-Length,
//! 可以配置按块限速, 用来给取消留出时间窗口。

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// 每次写出的块大小
    pub chunk_size: usize,
    /// 每块之间的停顿, 用于模拟慢速网络
    pub chunk_delay: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
            chunk_delay: Duration::ZERO,
        }
    }
}

/// 在后台线程起一个服务器, 返回形如 http://127.0.0.1:PORT/data.zip 的URL
pub fn start(body: Vec<u8>) -> String {
    start_with_options(body, ServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: ServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            thread::spawn(move || handle(stream, &body, opts));
        }
    });
    format!("http://127.0.0.1:{}/data.zip", port)
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], opts: ServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    // 把请求读掉, 内容不重要
    let _ = stream.read(&mut buf);

    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    if stream.write_all(header.as_bytes()).is_err() {
        return;
    }

    for chunk in body.chunks(opts.chunk_size.max(1)) {
        // 客户端取消后写入会失败, 直接退出
        if stream.write_all(chunk).is_err() {
            return;
        }
        if !opts.chunk_delay.is_zero() {
            thread::sleep(opts.chunk_delay);
        }
    }
}
