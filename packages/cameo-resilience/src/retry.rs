use std::{fmt, future::Future, time::Duration};

/// How an error behaves under retry. Implemented by every outbound fault
/// taxonomy so the retrier never needs to know concrete error types.
pub trait Fault {
	/// Whether another attempt could plausibly succeed.
	fn is_retryable(&self) -> bool;

	/// A provider-supplied wait hint, when present.
	fn retry_after(&self) -> Option<Duration> {
		None
	}
}

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
}
impl RetryPolicy {
	pub fn from_config(cfg: &cameo_config::Retry) -> Self {
		Self {
			max_attempts: cfg.max_attempts.max(1),
			base_delay: Duration::from_millis(cfg.base_delay_ms),
			max_delay: Duration::from_millis(cfg.max_delay_ms),
		}
	}

	/// Delay before retry `n` (1-indexed): `base * 2^(n-1)` with ±20 %
	/// jitter, capped at `max_delay`. A provider retry-after hint wins
	/// when it is larger than the computed delay.
	pub fn delay_for_retry(&self, retry: u32, hint: Option<Duration>) -> Duration {
		let exponent = retry.saturating_sub(1).min(16);
		let raw = self.base_delay.saturating_mul(1 << exponent);
		let capped = raw.min(self.max_delay);
		let jittered = capped.mul_f64(rand::random::<f64>() * 0.4 + 0.8);
		let computed = jittered.min(self.max_delay);

		match hint {
			Some(hint) if hint > computed => hint,
			_ => computed,
		}
	}
}

/// Run `operation` until it succeeds, fails terminally, or exhausts
/// `policy.max_attempts`. Only faults classified retryable are retried;
/// everything else propagates immediately.
pub async fn retry_with_policy<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
	E: Fault + fmt::Display,
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
{
	let mut attempt = 1;

	loop {
		match operation().await {
			Ok(value) => return Ok(value),
			Err(err) => {
				if !err.is_retryable() || attempt >= policy.max_attempts {
					return Err(err);
				}

				let delay = policy.delay_for_retry(attempt, err.retry_after());

				tracing::warn!(
					attempt,
					max_attempts = policy.max_attempts,
					delay_ms = delay.as_millis() as u64,
					error = %err,
					"Transient fault; retrying after backoff."
				);
				tokio::time::sleep(delay).await;

				attempt += 1;
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::{
		Arc,
		atomic::{AtomicU32, Ordering},
	};

	use super::*;

	#[derive(Debug)]
	struct TestFault {
		retryable: bool,
		hint: Option<Duration>,
	}
	impl fmt::Display for TestFault {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "test fault")
		}
	}
	impl Fault for TestFault {
		fn is_retryable(&self) -> bool {
			self.retryable
		}

		fn retry_after(&self) -> Option<Duration> {
			self.hint
		}
	}

	fn policy() -> RetryPolicy {
		RetryPolicy {
			max_attempts: 3,
			base_delay: Duration::from_millis(100),
			max_delay: Duration::from_millis(5_000),
		}
	}

	#[test]
	fn backoff_doubles_within_jitter_bounds() {
		let policy = policy();

		for retry in 1..=4_u32 {
			let expected = 100_u64 * (1 << (retry - 1));

			for _ in 0..64 {
				let delay = policy.delay_for_retry(retry, None).as_millis() as u64;
				let low = expected * 8 / 10;
				let high = expected * 12 / 10;

				assert!(
					(low..=high).contains(&delay),
					"retry {retry}: delay {delay} outside [{low}, {high}]"
				);
			}
		}
	}

	#[test]
	fn backoff_is_capped_at_max_delay() {
		let policy = RetryPolicy {
			max_attempts: 8,
			base_delay: Duration::from_millis(100),
			max_delay: Duration::from_millis(300),
		};

		for _ in 0..64 {
			assert!(policy.delay_for_retry(6, None) <= Duration::from_millis(300));
		}
	}

	#[test]
	fn retry_after_hint_wins_when_larger() {
		let policy = policy();
		let hint = Duration::from_millis(2_000);

		assert_eq!(policy.delay_for_retry(1, Some(hint)), hint);

		// A tiny hint never shrinks the computed delay.
		let small = policy.delay_for_retry(3, Some(Duration::from_millis(1)));

		assert!(small >= Duration::from_millis(320));
	}

	#[tokio::test]
	async fn terminal_faults_are_not_retried() {
		let calls = Arc::new(AtomicU32::new(0));
		let counter = calls.clone();
		let result: Result<(), _> = retry_with_policy(&policy(), || {
			let counter = counter.clone();

			async move {
				counter.fetch_add(1, Ordering::SeqCst);

				Err(TestFault { retryable: false, hint: None })
			}
		})
		.await;

		assert!(result.is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn retryable_faults_are_retried_up_to_the_limit() {
		let fast = RetryPolicy {
			max_attempts: 3,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(2),
		};
		let calls = Arc::new(AtomicU32::new(0));
		let counter = calls.clone();
		let result: Result<(), _> = retry_with_policy(&fast, || {
			let counter = counter.clone();

			async move {
				counter.fetch_add(1, Ordering::SeqCst);

				Err(TestFault { retryable: true, hint: None })
			}
		})
		.await;

		assert!(result.is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn succeeds_after_transient_failures() {
		let fast = RetryPolicy {
			max_attempts: 3,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(2),
		};
		let calls = Arc::new(AtomicU32::new(0));
		let counter = calls.clone();
		let result = retry_with_policy(&fast, || {
			let counter = counter.clone();

			async move {
				if counter.fetch_add(1, Ordering::SeqCst) < 2 {
					Err(TestFault { retryable: true, hint: None })
				} else {
					Ok(7_u32)
				}
			}
		})
		.await;

		assert_eq!(result.expect("third attempt must succeed"), 7);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}
}
