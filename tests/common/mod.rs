//! Shared utilities for integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use site_search::config::{SearchConfig, ViewConfig};
use site_search::{SearchServer, Shutdown};

/// A raw-TCP stand-in for the search provider.
pub struct MockUpstream {
    pub addr: SocketAddr,
    targets: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    /// Base URL to use as `upstream.api_base`.
    pub fn api_base(&self) -> String {
        format!("http://{}/customsearch/v1", self.addr)
    }

    /// Request targets (path and query) seen so far.
    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.targets.lock().unwrap().len()
    }

    /// Query parameters of the `n`th request.
    pub fn params(&self, n: usize) -> Vec<(String, String)> {
        let target = self.targets()[n].clone();
        url::Url::parse(&format!("http://mock{target}"))
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    pub fn param(&self, n: usize, name: &str) -> Option<String> {
        self.params(n)
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

/// Start a programmable mock upstream. `respond` maps the request target
/// to a status code and a body.
pub async fn start_mock_upstream<F>(respond: F) -> MockUpstream
where
    F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let targets = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let seen = targets.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let respond = respond.clone();
            let seen = seen.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&buf);
                let target = head
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();
                seen.lock().unwrap().push(target.clone());

                let (status, body) = respond(&target);
                let status_text = match status {
                    200 => "200 OK",
                    400 => "400 Bad Request",
                    403 => "403 Forbidden",
                    429 => "429 Too Many Requests",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockUpstream { addr, targets }
}

/// Mock upstream answering every request with `num` entries.
pub async fn start_results_upstream() -> MockUpstream {
    start_mock_upstream(|target| {
        let num = url::Url::parse(&format!("http://mock{target}"))
            .ok()
            .and_then(|url| {
                url.query_pairs()
                    .find(|(k, _)| k == "num")
                    .and_then(|(_, v)| v.parse::<usize>().ok())
            })
            .unwrap_or(10);
        (200, results_body(num).to_string())
    })
    .await
}

/// A provider-shaped response body with `count` items.
pub fn results_body(count: usize) -> Value {
    let items: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "kind": "customsearch#result",
                "title": format!("Snap result {i}"),
                "link": format!("https://snapcraft.io/docs/{i}"),
                "htmlSnippet": format!("<b>snap</b> line one<br>\nline two {i}"),
            })
        })
        .collect();

    json!({
        "kind": "customsearch#search",
        "searchInformation": {
            "totalResults": "1250",
            "formattedTotalResults": "1,250"
        },
        "items": items
    })
}

pub fn fixture_templates() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/templates")
}

/// Config with a plain `/search` view and a site-restricted docs view,
/// both pointed at `api_base`.
pub fn test_config(api_base: &str) -> SearchConfig {
    let mut config = SearchConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.api_base = api_base.to_string();
    config.upstream.api_key = Some("test-key".to_string());
    config.upstream.timeout_secs = 5;
    config.templates.directory = fixture_templates().to_string_lossy().into_owned();
    config.cache.enabled = false;
    config.views = vec![
        ViewConfig {
            path: "/search".to_string(),
            template: "search.html".to_string(),
            search_engine_id: "test-cx".to_string(),
            site: None,
            site_restricted: false,
        },
        ViewConfig {
            path: "/docs/search".to_string(),
            template: "docs/search.html".to_string(),
            search_engine_id: "docs-cx".to_string(),
            site: Some("maas.io/docs".to_string()),
            site_restricted: true,
        },
    ];
    config
}

/// A running service under test.
pub struct TestServer {
    pub base_url: String,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// Serve `server` on an ephemeral port.
pub async fn spawn_server(server: SearchServer) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        base_url: format!("http://{addr}"),
        shutdown,
    }
}

/// Build and serve the service from `config`.
pub async fn spawn_from_config(config: SearchConfig) -> TestServer {
    spawn_server(SearchServer::new(config).unwrap()).await
}
