use std::sync::Arc;

use config::{Config, ConfigError, Environment, File, Source};
use judge::{JudgeClient, JudgeClientConfig};
use serde::Deserialize;
use tracing::info;

use crate::backend::{ExecutionBackend, RemoteJudge, SimulatedJudge};
use crate::health::ServiceMode;

pub const CONFIG_PATH_VAR: &str = "EXECUTOR_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/config";
pub const ENV_PREFIX: &str = "EXECUTOR";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ExecutorAppConfig {
    /// Remote judge settings. An empty `base_url` selects simulated mode.
    #[serde(default)]
    pub judge: JudgeClientConfig,
}

impl ExecutorAppConfig {
    /// Load from the file named by `EXECUTOR_CONFIG` (default
    /// `config/config`), then environment overrides such as
    /// `EXECUTOR__JUDGE__BASE_URL`.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Like [`load`](Self::load) with an explicit config file path.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Self::build(
            File::with_name(path).required(false),
            Environment::with_prefix(ENV_PREFIX).separator("__"),
        )
    }

    fn build<S>(file: S, env: Environment) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let s = Config::builder()
            .set_default("judge.base_url", "")?
            .add_source(file)
            .add_source(env)
            .build()?;

        s.try_deserialize()
    }

    pub fn mode(&self) -> ServiceMode {
        if self.judge.base_url.trim().is_empty() {
            ServiceMode::Simulated
        } else {
            ServiceMode::Remote
        }
    }

    /// Construct the backend for the configured mode. The judge config is
    /// validated before a remote client is built.
    pub fn build_backend(&self) -> judge::Result<Arc<dyn ExecutionBackend>> {
        match self.mode() {
            ServiceMode::Simulated => {
                info!("No judge endpoint configured, using simulated execution");
                Ok(Arc::new(SimulatedJudge::new()))
            }
            ServiceMode::Remote => {
                let client = JudgeClient::new(self.judge.clone())?;
                info!(endpoint = %client.base_url(), "Using remote judge");
                Ok(Arc::new(RemoteJudge::new(client)))
            }
        }
    }
}
