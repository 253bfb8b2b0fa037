use std::{future::Future, sync::Arc, time::Duration};

use crate::{
	health::Dependency,
	retry::{Fault, RetryPolicy, retry_with_policy},
};

/// One guarded outbound dependency: `breaker(deadline(retry(op)))`.
///
/// The deadline bounds the whole retried call, so abandoned backoff waits
/// can never outlive it. The breaker sees exactly one terminal outcome
/// per shielded call; its own rejections are not outcomes.
pub struct Shield {
	dependency: Arc<Dependency>,
	retry: RetryPolicy,
	call_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ShieldError<E> {
	#[error("Circuit for {dependency} is open.")]
	CircuitOpen { dependency: String },
	#[error("Call to {dependency} exceeded its {timeout_ms} ms deadline.")]
	DeadlineExceeded { dependency: String, timeout_ms: u64 },
	#[error(transparent)]
	Inner(E),
}

impl Shield {
	pub fn new(dependency: Arc<Dependency>, retry: RetryPolicy, call_timeout: Duration) -> Self {
		Self { dependency, retry, call_timeout }
	}

	pub fn dependency(&self) -> &Arc<Dependency> {
		&self.dependency
	}

	pub async fn call<T, E, F, Fut>(&self, operation: F) -> Result<T, ShieldError<E>>
	where
		E: Fault + std::error::Error,
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, E>>,
	{
		if !self.dependency.breaker().admit() {
			return Err(ShieldError::CircuitOpen { dependency: self.dependency.name().to_string() });
		}

		let retried = retry_with_policy(&self.retry, operation);

		match tokio::time::timeout(self.call_timeout, retried).await {
			Ok(Ok(value)) => {
				self.dependency.record_success();

				Ok(value)
			},
			Ok(Err(err)) => {
				self.dependency.record_failure(&err.to_string());

				Err(ShieldError::Inner(err))
			},
			Err(_) => {
				let timeout_ms = self.call_timeout.as_millis() as u64;

				self.dependency.record_failure("deadline exceeded");

				Err(ShieldError::DeadlineExceeded {
					dependency: self.dependency.name().to_string(),
					timeout_ms,
				})
			},
		}
	}
}
