//! Process-wide subscriber and the per-request summary line
//!
//! Every request produces exactly one summary event. Its level follows the [`Outcome`], so a
//! rejected call shows up once at `warn` and a broken encoder once at `error`.

use std::time::Instant;

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tracing::{error, info, warn};
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

/// Installs the global fmt subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Why a request failed, attached to the response by the code that knew the reason.
#[derive(Debug, Clone)]
pub struct FailureCause(pub String);

/// Summary classification of a finished request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Answered,
    Forbidden,
    NotFound,
    Malformed,
    Failed,
}

impl Outcome {
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            403 => Self::Forbidden,
            404 => Self::NotFound,
            400..=499 => Self::Malformed,
            500..=599 => Self::Failed,
            _ => Self::Answered,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Malformed => "malformed",
            Self::Failed => "failed",
        }
    }
}

pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let verb = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let outcome = Outcome::from_status(response.status());
    let cause = response
        .extensions()
        .get::<FailureCause>()
        .map(|cause| cause.0.as_str());

    match outcome {
        Outcome::Forbidden | Outcome::Malformed => warn!(
            verb = %verb,
            path,
            status,
            elapsed_ms,
            outcome = outcome.as_str(),
            cause,
            "rpc request rejected"
        ),
        Outcome::Failed => error!(
            verb = %verb,
            path,
            status,
            elapsed_ms,
            outcome = outcome.as_str(),
            cause,
            "rpc request failed"
        ),
        Outcome::Answered | Outcome::NotFound => info!(
            verb = %verb,
            path,
            status,
            elapsed_ms,
            outcome = outcome.as_str(),
            "rpc request answered"
        ),
    }

    response
}
