//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use toon_http::codec::ToonCodec;
use toon_http::config::{ToonConfig, ToonOptions};
use toon_http::http::HttpServer;
use toon_http::lifecycle::Shutdown;

/// A server running on a loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub updates: mpsc::UnboundedSender<ToonConfig>,
    shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Push new TOON options through the reload channel.
    pub async fn reload(&self, toon: ToonOptions) {
        let config = ToonConfig {
            toon,
            ..ToonConfig::default()
        };
        self.updates.send(config).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

#[allow(dead_code)]
pub fn config_with(toon: ToonOptions) -> ToonConfig {
    ToonConfig {
        toon,
        ..ToonConfig::default()
    }
}

#[allow(dead_code)]
pub async fn start_server(config: ToonConfig) -> TestServer {
    start_server_with_codec(config, ToonCodec::new()).await
}

pub async fn start_server_with_codec(config: ToonConfig, codec: ToonCodec) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::with_codec(config, codec);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestServer {
        addr,
        updates,
        shutdown,
    }
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Write `head` and `body` on a raw connection, then read until the server
/// closes it.
#[allow(dead_code)]
pub async fn raw_exchange(addr: SocketAddr, head: &str, body: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(head.as_bytes()).await.unwrap();
    stream.write_all(body).await.unwrap();

    let mut response = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response)).await;
    String::from_utf8_lossy(&response).into_owned()
}
