use std::time::Duration;

use cameo_resilience::Fault;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Provider unavailable: {message}")]
	Unavailable { message: String },
	#[error("Provider throttled the request.")]
	Throttled { retry_after: Option<Duration> },
	#[error("Input of {chars} characters exceeds the {limit} character limit.")]
	Oversized { chars: usize, limit: usize },
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		if err.is_builder() {
			return Self::InvalidConfig { message: err.to_string() };
		}

		Self::Unavailable { message: err.to_string() }
	}
}

impl From<reqwest::header::InvalidHeaderName> for Error {
	fn from(err: reqwest::header::InvalidHeaderName) -> Self {
		Self::InvalidConfig { message: err.to_string() }
	}
}

impl From<reqwest::header::InvalidHeaderValue> for Error {
	fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
		Self::InvalidConfig { message: err.to_string() }
	}
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
