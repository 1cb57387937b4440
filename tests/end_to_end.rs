//! Real listener, real client, file-backed store.

use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use channel_redirect::config::{RedirectorConfig, StoreBackend};
use channel_redirect::store::JsonFileStore;
use channel_redirect::{HttpServer, Shutdown};

struct Running {
    addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Running {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

async fn start(path: &std::path::Path) -> Running {
    let mut config = RedirectorConfig::default();
    config.store.backend = StoreBackend::File;
    config.store.path = path.display().to_string();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, Arc::new(JsonFileStore::new(path)));
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    Running {
        addr,
        shutdown,
        handle,
    }
}

fn client() -> Client {
    Client::builder().redirect(Policy::none()).build().unwrap()
}

#[tokio::test]
async fn test_register_redirect_and_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    let server = start(&path).await;
    let client = client();

    let response = client
        .post(server.url("/api/create"))
        .json(&json!({
            "channel_id": "nas",
            "password": "p",
            "host": "192.168.1.20",
            "port": "5666",
            "https": false,
            "accessKey": "letmein"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client.get(server.url("/nas/files?dir=%2F")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("/api/verify"));

    let response = client
        .post(server.url("/api/verify"))
        .json(&json!({ "channel_id": "nas", "accessKey": "letmein" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()["set-cookie"].to_str().unwrap().to_string();
    let pair = cookie.split(';').next().unwrap().to_string();
    assert_eq!(pair, "access_nas=letmein");

    let response = client
        .get(server.url("/nas/files?dir=%2F"))
        .header("cookie", pair)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()["location"],
        "http://192.168.1.20:5666/files?dir=%2F"
    );

    server.stop().await;

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["nas"]["host"], "192.168.1.20");
    assert_eq!(saved["nas"]["accessKey"], "letmein");

    // A restarted server serves the persisted record.
    let server = start(&path).await;
    let response = client
        .get(server.url("/nas"))
        .header("cookie", "access_nas=letmein")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], "http://192.168.1.20:5666");
    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_creates_have_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(&dir.path().join("records.json")).await;
    let client = client();

    let attempts = (0..16).map(|i| {
        let client = client.clone();
        let url = server.url("/api/create");
        tokio::spawn(async move {
            client
                .post(url)
                .json(&json!({
                    "channel_id": "race",
                    "password": format!("p{}", i),
                    "host": format!("10.0.0.{}", i),
                    "port": 80
                }))
                .send()
                .await
                .unwrap()
                .status()
        })
    });

    let mut created = 0;
    let mut conflicts = 0;
    for attempt in attempts.collect::<Vec<_>>() {
        let status = attempt.await.unwrap();
        if status == StatusCode::CREATED {
            created += 1;
        } else if status == StatusCode::CONFLICT {
            conflicts += 1;
        } else {
            panic!("unexpected status {}", status);
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicts, 15);

    server.stop().await;
}

#[tokio::test]
async fn test_pages_and_health() {
    let dir = tempfile::tempdir().unwrap();
    let server = start(&dir.path().join("records.json")).await;
    let client = client();

    for path in ["/", "/register", "/healthz"] {
        let response = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", path);
        assert!(response.headers().contains_key("x-request-id"));
    }

    let response = client.get(server.url("/missing")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    server.stop().await;
}
