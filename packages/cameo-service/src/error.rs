use std::time::Duration;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Assignment failed validation.")]
	Validation { fields: Vec<String> },
	#[error("{dependency} is unavailable: {message}")]
	DependencyUnavailable {
		dependency: &'static str,
		message: String,
		retry_after: Option<Duration>,
	},
	#[error("Request exceeded its {timeout_ms} ms deadline.")]
	DeadlineExceeded { timeout_ms: u64 },
}
