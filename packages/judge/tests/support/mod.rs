#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use judge::{JudgeClient, JudgeClientConfig, RecordingSleeper};
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_judge(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A base URL nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Fast settings: small delays that are only recorded, never slept.
pub fn test_config(base_url: &str) -> JudgeClientConfig {
    let mut config = JudgeClientConfig::new(base_url);
    config.timeout_ms = 2_000;
    config.health_timeout_ms = 1_000;
    config.max_retries = 3;
    config.retry_base_delay_ms = 100;
    config.retry_max_delay_ms = 1_000;
    config.poll_interval_ms = 250;
    config.max_poll_attempts = 4;
    config
}

pub fn test_client(config: JudgeClientConfig) -> (JudgeClient, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::new());
    let client = JudgeClient::with_sleeper(config, sleeper.clone()).unwrap();
    (client, sleeper)
}
