//! Curriculum context provider — never fails.
//!
//! ```text
//! health probe (≈5 s) ──fail──────────────────────────┐
//!      │ ok                                           ▼
//! generate (≈10 s) ──timeout / status / malformed──▶ fallback_context()
//!      │ ok + well-formed
//!      ▼
//! remote context, verbatim
//! ```
//!
//! Every failure is logged and absorbed; callers always get a context.

use std::sync::Arc;
use std::time::Duration;

use crate::config::CurriculumConfig;
use crate::curriculum::context::{fallback_context, CurriculumContext};
use crate::curriculum::service::{CurriculumError, CurriculumService, HttpCurriculumService};

/// Resolves a [`CurriculumContext`] for a session.
#[derive(Clone)]
pub struct CurriculumProvider {
    service: Option<Arc<dyn CurriculumService>>,
    probe_timeout: Duration,
    request_timeout: Duration,
}

impl CurriculumProvider {
    /// Wrap `service` with the given probe and request budgets.
    pub fn new(
        service: Arc<dyn CurriculumService>,
        probe_timeout: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            service: Some(service),
            probe_timeout,
            request_timeout,
        }
    }

    /// A provider that never contacts a service and always falls back.
    pub fn offline() -> Self {
        let defaults = CurriculumConfig::default();
        Self {
            service: None,
            probe_timeout: Duration::from_secs(defaults.health_timeout_secs),
            request_timeout: Duration::from_secs(defaults.request_timeout_secs),
        }
    }

    /// HTTP-backed provider, or [`offline`](Self::offline) when disabled.
    pub fn from_config(config: &CurriculumConfig) -> Self {
        if !config.enabled {
            return Self::offline();
        }
        Self::new(
            Arc::new(HttpCurriculumService::from_config(config)),
            Duration::from_secs(config.health_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Fetch the context for `(target_language, scenario)`.
    pub async fn get_context(&self, target_language: &str, scenario: &str) -> CurriculumContext {
        let Some(service) = &self.service else {
            log::debug!("curriculum: offline, using fallback");
            return fallback_context(target_language, scenario);
        };

        match self.fetch_remote(service.as_ref(), target_language, scenario).await {
            Ok(context) => {
                log::debug!("curriculum: received remote context for {scenario:?}");
                context
            }
            Err(e) => {
                log::warn!("curriculum service unavailable, using fallback: {e}");
                fallback_context(target_language, scenario)
            }
        }
    }

    async fn fetch_remote(
        &self,
        service: &dyn CurriculumService,
        target_language: &str,
        scenario: &str,
    ) -> Result<CurriculumContext, CurriculumError> {
        tokio::time::timeout(self.probe_timeout, service.health())
            .await
            .map_err(|_| CurriculumError::Timeout)??;

        let context = tokio::time::timeout(
            self.request_timeout,
            service.generate(target_language, scenario),
        )
        .await
        .map_err(|_| CurriculumError::Timeout)??;

        if !context.is_well_formed() {
            return Err(CurriculumError::Malformed("empty scenario_scene".into()));
        }
        Ok(context)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
