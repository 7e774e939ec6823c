use async_trait::async_trait;
use judge::{ExecutionRequest, ExecutionResponse, JudgeClient, JudgeLanguage, StatsSnapshot};

use super::ExecutionBackend;
use crate::health::ServiceMode;

/// Runs programs on a remote judge.
#[derive(Debug)]
pub struct RemoteJudge {
    client: JudgeClient,
}

impl RemoteJudge {
    pub fn new(client: JudgeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExecutionBackend for RemoteJudge {
    fn mode(&self) -> ServiceMode {
        ServiceMode::Remote
    }

    fn endpoint(&self) -> Option<String> {
        Some(self.client.base_url().to_string())
    }

    async fn submit(&self, request: &ExecutionRequest) -> judge::Result<String> {
        self.client.submit_execution(request).await
    }

    async fn poll(&self, token: &str) -> judge::Result<ExecutionResponse> {
        self.client.get_execution_result(token).await
    }

    async fn check_health(&self) -> bool {
        self.client.check_health().await
    }

    fn stats(&self) -> Option<StatsSnapshot> {
        Some(self.client.stats())
    }

    async fn languages(&self) -> judge::Result<Vec<JudgeLanguage>> {
        self.client.list_languages().await
    }
}
