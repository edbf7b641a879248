use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Repository;
use crate::services::CepLookup;

/// Shared by every handler through axum's `State` extractor
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn Repository>,
    pub cep: Arc<dyn CepLookup>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn Repository>,
        cep: Arc<dyn CepLookup>,
        config: AppConfig,
    ) -> Self {
        Self {
            repository,
            cep,
            config: Arc::new(config),
        }
    }
}
