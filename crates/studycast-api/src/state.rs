//! Application state.

use studycast_worker::{GenerationService, WorkerConfig};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub service: GenerationService,
}

impl AppState {
    /// Build the generation service and every configured provider.
    pub fn new(config: ApiConfig, worker: WorkerConfig) -> anyhow::Result<Self> {
        let service = GenerationService::from_config(worker)?;
        Ok(Self { config, service })
    }

    pub fn with_service(config: ApiConfig, service: GenerationService) -> Self {
        Self { config, service }
    }
}
