//! Chaos injection middleware.
//!
//! Two independent stages wrap every route, the spec route included: a
//! fixed latency delay and a probabilistic error short-circuit. Latency
//! runs first; a request rejected by error injection still pays the
//! configured delay.

use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Failure simulation settings, fixed for the process lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChaosConfig {
    /// Fixed delay added to every request. Zero disables the stage.
    #[serde(default)]
    pub latency: Duration,

    /// Percentage of requests (0-100) answered with a bare 500 before
    /// reaching any handler. Zero disables the stage.
    #[serde(default)]
    pub error_rate: u8,
}

impl ChaosConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.error_rate > 100 {
            anyhow::bail!(
                "error rate must be between 0 and 100, got {}",
                self.error_rate
            );
        }
        Ok(())
    }

    /// Whether this request draws an injected failure.
    ///
    /// An independent Bernoulli trial per request; there is no memory of
    /// past decisions.
    fn should_fail(&self) -> bool {
        self.error_rate > 0 && rand::thread_rng().gen_range(0u8..100) < self.error_rate
    }
}

/// Middleware applying the latency stage, then the error-injection stage.
///
/// An injected failure is a bare 500 with no body, indistinguishable from a
/// real backend fault.
pub async fn inject(State(chaos): State<ChaosConfig>, request: Request, next: Next) -> Response {
    if !chaos.latency.is_zero() {
        tokio::time::sleep(chaos.latency).await;
    }
    if chaos.should_fail() {
        debug!(path = %request.uri().path(), "injecting error response");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    next.run(request).await
}
