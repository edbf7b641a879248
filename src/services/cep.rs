//! Postal-code (CEP) resolution.
//!
//! Addresses are never typed in full by the back office: the CEP is resolved
//! against the public ViaCEP service and the state, city, neighborhood and
//! street come back from it. The lookup sits behind [`CepLookup`] so handlers
//! can be exercised without network access.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::CepConfig;

/// Address fields resolved from a postal code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub cep: String,
    pub estado: String,
    pub cidade: String,
    pub bairro: String,
    pub logradouro: String,
}

#[derive(Debug, Error)]
pub enum CepError {
    #[error("CEP não encontrado: {0}")]
    NotFound(String),

    #[error("Serviço de CEP indisponível: {0}")]
    Unavailable(String),

    #[error("Resposta inválida do serviço de CEP: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait CepLookup: Send + Sync {
    /// Resolve an 8-digit postal code
    async fn lookup(&self, cep: &str) -> Result<PostalAddress, CepError>;
}

/// Raw ViaCEP payload; `erro` is `true` (older API) or `"true"` (newer API) for unknown codes
#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    cep: Option<String>,
    logradouro: Option<String>,
    bairro: Option<String>,
    localidade: Option<String>,
    uf: Option<String>,
    erro: Option<Value>,
}

impl ViaCepResponse {
    fn is_error(&self) -> bool {
        match &self.erro {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn into_address(self, requested: &str) -> Result<PostalAddress, CepError> {
        if self.is_error() {
            return Err(CepError::NotFound(requested.to_string()));
        }

        let uf = self.uf.unwrap_or_default();
        let cidade = self.localidade.unwrap_or_default();
        if uf.is_empty() || cidade.is_empty() {
            return Err(CepError::InvalidResponse(format!(
                "missing state or city for {}",
                requested
            )));
        }

        Ok(PostalAddress {
            cep: self
                .cep
                .map(|c| c.chars().filter(char::is_ascii_digit).collect())
                .unwrap_or_else(|| requested.to_string()),
            estado: uf,
            cidade,
            bairro: self.bairro.unwrap_or_default(),
            logradouro: self.logradouro.unwrap_or_default(),
        })
    }
}

/// HTTP client for `https://viacep.com.br/ws/{cep}/json/`
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    client: reqwest::Client,
    base_url: String,
}

impl ViaCepClient {
    pub fn new(config: &CepConfig) -> Result<Self, CepError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("rapseglog-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CepError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, cep: &str) -> String {
        format!("{}/ws/{}/json/", self.base_url, cep)
    }
}

#[async_trait]
impl CepLookup for ViaCepClient {
    async fn lookup(&self, cep: &str) -> Result<PostalAddress, CepError> {
        let url = self.url_for(cep);
        debug!("Resolving CEP {} via {}", cep, url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!("CEP lookup for {} failed: {}", cep, e);
            if e.is_timeout() {
                CepError::Unavailable(format!("timeout resolving {}", cep))
            } else {
                CepError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(CepError::NotFound(cep.to_string()));
        }
        if !status.is_success() {
            warn!("CEP lookup for {} answered HTTP {}", cep, status);
            return Err(CepError::Unavailable(format!("HTTP {}", status)));
        }

        let body: ViaCepResponse = response
            .json()
            .await
            .map_err(|e| CepError::InvalidResponse(e.to_string()))?;
        body.into_address(cep)
    }
}
