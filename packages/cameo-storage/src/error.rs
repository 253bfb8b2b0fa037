use std::time::Duration;

use cameo_resilience::Fault;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Vector index unavailable: {message}")]
	Unavailable { message: String },
	#[error("Vector index throttled the request.")]
	Throttled { retry_after: Option<Duration> },
	#[error("Vector index not ready: {message}")]
	NotReady { message: String },
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("Invalid catalog record: {message}")]
	InvalidRecord { message: String },
	#[error("Not found: {0}")]
	NotFound(String),
}

impl Fault for Error {
	fn is_retryable(&self) -> bool {
		matches!(self, Self::Unavailable { .. } | Self::Throttled { .. })
	}

	fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::Throttled { retry_after } => *retry_after,
			_ => None,
		}
	}
}
