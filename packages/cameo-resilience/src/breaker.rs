use std::{
	fmt,
	sync::Mutex,
	time::{Duration, Instant},
};

use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
	Closed,
	Open,
	HalfOpen,
}
impl fmt::Display for BreakerState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Closed => write!(f, "closed"),
			Self::Open => write!(f, "open"),
			Self::HalfOpen => write!(f, "half_open"),
		}
	}
}

/// Per-dependency circuit breaker.
///
/// Opens after `failure_threshold` consecutive terminal failures. While
/// open, calls are rejected until `reset_timeout` has elapsed since the
/// last recorded failure; the breaker then admits a single half-open
/// probe. A successful probe closes the circuit and zeroes the counter; a
/// failed probe reopens it and restarts the timer.
pub struct CircuitBreaker {
	name: String,
	failure_threshold: u32,
	reset_timeout: Duration,
	inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
	state: BreakerState,
	consecutive_failures: u32,
	opened_at: Option<Instant>,
	/// When the current half-open probe was admitted. A probe abandoned by
	/// request cancellation is reclaimed after the reset timeout.
	probe_started: Option<Instant>,
}

impl CircuitBreaker {
	pub fn new(name: impl Into<String>, failure_threshold: u32, reset_timeout: Duration) -> Self {
		Self {
			name: name.into(),
			failure_threshold: failure_threshold.max(1),
			reset_timeout,
			inner: Mutex::new(Inner {
				state: BreakerState::Closed,
				consecutive_failures: 0,
				opened_at: None,
				probe_started: None,
			}),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Whether a call may proceed right now. Admitting the half-open probe
	/// consumes it; the caller must report the outcome.
	pub fn admit(&self) -> bool {
		let mut inner = self.lock();

		self.roll_over_if_due(&mut inner);

		match inner.state {
			BreakerState::Closed => true,
			BreakerState::Open => false,
			BreakerState::HalfOpen => {
				if let Some(started) = inner.probe_started
					&& started.elapsed() < self.reset_timeout
				{
					return false;
				}

				inner.probe_started = Some(Instant::now());

				true
			},
		}
	}

	/// Record a terminal success. Resets the failure counter; closes the
	/// circuit when it arrives from a half-open probe.
	pub fn record_success(&self) {
		let mut inner = self.lock();

		inner.consecutive_failures = 0;

		if inner.state != BreakerState::Closed {
			self.transition(&mut inner, BreakerState::Closed);
		}
	}

	/// Record a terminal failure. Opens the circuit at the threshold and
	/// restarts the reset timer while open.
	pub fn record_failure(&self) {
		let mut inner = self.lock();

		inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

		match inner.state {
			BreakerState::Closed if inner.consecutive_failures >= self.failure_threshold => {
				self.transition(&mut inner, BreakerState::Open);
			},
			BreakerState::HalfOpen => {
				self.transition(&mut inner, BreakerState::Open);
			},
			BreakerState::Open => {
				inner.opened_at = Some(Instant::now());
			},
			BreakerState::Closed => {},
		}
	}

	/// Current state, rolling an expired open window over to half-open so
	/// observers see the probe-ready state.
	pub fn state(&self) -> BreakerState {
		let mut inner = self.lock();

		self.roll_over_if_due(&mut inner);

		inner.state
	}

	fn roll_over_if_due(&self, inner: &mut Inner) {
		if inner.state == BreakerState::Open
			&& let Some(opened_at) = inner.opened_at
			&& opened_at.elapsed() >= self.reset_timeout
		{
			self.transition(inner, BreakerState::HalfOpen);
		}
	}

	fn transition(&self, inner: &mut Inner, next: BreakerState) {
		if inner.state == next {
			return;
		}

		tracing::info!(
			breaker = %self.name,
			from = %inner.state,
			to = %next,
			"Circuit breaker state transition."
		);

		inner.state = next;

		match next {
			BreakerState::Open => {
				inner.opened_at = Some(Instant::now());
				inner.probe_started = None;
			},
			BreakerState::Closed => {
				inner.consecutive_failures = 0;
				inner.opened_at = None;
				inner.probe_started = None;
			},
			BreakerState::HalfOpen => {
				inner.probe_started = None;
			},
		}
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
		self.inner.lock().unwrap_or_else(|err| err.into_inner())
	}
}
