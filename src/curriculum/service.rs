//! `CurriculumService` trait and its HTTP implementation.
//!
//! The remote service exposes:
//!
//! ```text
//! GET  /health               → 2xx when ready
//! POST /generate-curriculum  {target_language, scenario}
//!                            → {scenario_scene, curriculum_questions[], correction_examples[]}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::CurriculumConfig;
use crate::curriculum::context::CurriculumContext;

// ---------------------------------------------------------------------------
// CurriculumError
// ---------------------------------------------------------------------------

/// Errors talking to the curriculum service.
#[derive(Debug, Error)]
pub enum CurriculumError {
    /// Transport or connection error.
    #[error("curriculum request failed: {0}")]
    Request(String),

    /// The call did not complete within its budget.
    #[error("curriculum request timed out")]
    Timeout,

    /// The service answered with a non-2xx status.
    #[error("curriculum service responded with status {0}")]
    Status(u16),

    /// The body did not have the expected shape.
    #[error("malformed curriculum payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for CurriculumError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CurriculumError::Timeout
        } else {
            CurriculumError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// CurriculumService trait
// ---------------------------------------------------------------------------

/// Remote source of curriculum context.
#[async_trait]
pub trait CurriculumService: Send + Sync {
    /// Liveness probe.
    async fn health(&self) -> Result<(), CurriculumError>;

    /// Generate a curriculum for `scenario` in `target_language`.
    async fn generate(
        &self,
        target_language: &str,
        scenario: &str,
    ) -> Result<CurriculumContext, CurriculumError>;
}

// ---------------------------------------------------------------------------
// HttpCurriculumService
// ---------------------------------------------------------------------------

/// reqwest-backed [`CurriculumService`].
pub struct HttpCurriculumService {
    client: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
    request_timeout: Duration,
}

impl HttpCurriculumService {
    pub fn from_config(config: &CurriculumConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

#[async_trait]
impl CurriculumService for HttpCurriculumService {
    async fn health(&self) -> Result<(), CurriculumError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CurriculumError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    async fn generate(
        &self,
        target_language: &str,
        scenario: &str,
    ) -> Result<CurriculumContext, CurriculumError> {
        let url = format!("{}/generate-curriculum", self.base_url);
        let body = serde_json::json!({
            "target_language": target_language,
            "scenario":        scenario,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.request_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CurriculumError::Status(response.status().as_u16()));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| CurriculumError::Malformed(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
