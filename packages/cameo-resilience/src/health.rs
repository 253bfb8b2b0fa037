use std::{
	collections::VecDeque,
	sync::{Arc, Mutex},
	time::{Duration, Instant},
};

use serde::Serialize;

use crate::breaker::{BreakerState, CircuitBreaker};

/// Terminal outcomes remembered per dependency for the uptime window.
const OUTCOME_WINDOW: usize = 50;

/// A guarded outbound dependency as the health surface sees it: the
/// breaker plus a sliding window of terminal outcomes and the last error.
pub struct Dependency {
	name: String,
	critical: bool,
	breaker: CircuitBreaker,
	outcomes: Mutex<VecDeque<bool>>,
	last_error: Mutex<Option<String>>,
}
impl Dependency {
	pub fn new(
		name: impl Into<String>,
		critical: bool,
		failure_threshold: u32,
		reset_timeout: Duration,
	) -> Self {
		let name = name.into();

		Self {
			breaker: CircuitBreaker::new(name.clone(), failure_threshold, reset_timeout),
			name,
			critical,
			outcomes: Mutex::new(VecDeque::with_capacity(OUTCOME_WINDOW)),
			last_error: Mutex::new(None),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn is_critical(&self) -> bool {
		self.critical
	}

	pub fn breaker(&self) -> &CircuitBreaker {
		&self.breaker
	}

	pub fn state(&self) -> BreakerState {
		self.breaker.state()
	}

	pub fn record_success(&self) {
		self.breaker.record_success();
		self.push_outcome(true);
	}

	pub fn record_failure(&self, error: &str) {
		self.breaker.record_failure();
		self.push_outcome(false);

		let mut last_error = self.last_error.lock().unwrap_or_else(|err| err.into_inner());

		*last_error = Some(error.to_string());
	}

	/// Fraction of successful terminal outcomes over the window, as a
	/// percentage. A dependency with no recorded calls reports 100.
	pub fn uptime_pct(&self) -> f64 {
		let outcomes = self.outcomes.lock().unwrap_or_else(|err| err.into_inner());

		if outcomes.is_empty() {
			return 100.0;
		}

		let successes = outcomes.iter().filter(|outcome| **outcome).count();

		(successes as f64 / outcomes.len() as f64) * 100.0
	}

	pub fn report(&self) -> DependencyReport {
		let last_error =
			self.last_error.lock().unwrap_or_else(|err| err.into_inner()).clone();

		DependencyReport {
			name: self.name.clone(),
			state: self.state(),
			last_error,
			uptime_pct: (self.uptime_pct() * 100.0).round() / 100.0,
		}
	}

	fn push_outcome(&self, success: bool) {
		let mut outcomes = self.outcomes.lock().unwrap_or_else(|err| err.into_inner());

		if outcomes.len() == OUTCOME_WINDOW {
			outcomes.pop_front();
		}

		outcomes.push_back(success);
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
	Healthy,
	Degraded,
	Critical,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyReport {
	pub name: String,
	pub state: BreakerState,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_error: Option<String>,
	pub uptime_pct: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
	pub status: OverallStatus,
	pub dependencies: Vec<DependencyReport>,
}

/// Folds per-dependency breaker states into one service status:
/// `critical` when a critical dependency is open, `degraded` when a
/// non-critical dependency is open or fallback mode ran recently,
/// `healthy` otherwise.
pub struct HealthAggregator {
	dependencies: Vec<Arc<Dependency>>,
	last_fallback: Mutex<Option<Instant>>,
	fallback_window: Duration,
}
impl HealthAggregator {
	pub fn new(dependencies: Vec<Arc<Dependency>>, fallback_window: Duration) -> Self {
		Self { dependencies, last_fallback: Mutex::new(None), fallback_window }
	}

	/// Called by the orchestrator whenever a response degrades to
	/// rule-only ranking.
	pub fn record_fallback(&self) {
		let mut last_fallback =
			self.last_fallback.lock().unwrap_or_else(|err| err.into_inner());

		*last_fallback = Some(Instant::now());
	}

	pub fn fallback_recent(&self) -> bool {
		let last_fallback = self.last_fallback.lock().unwrap_or_else(|err| err.into_inner());

		last_fallback.map(|at| at.elapsed() < self.fallback_window).unwrap_or(false)
	}

	pub fn report(&self) -> HealthReport {
		let dependencies: Vec<DependencyReport> =
			self.dependencies.iter().map(|dependency| dependency.report()).collect();
		let critical_open = self
			.dependencies
			.iter()
			.any(|dependency| dependency.is_critical() && dependency.state() == BreakerState::Open);
		let non_critical_open = self.dependencies.iter().any(|dependency| {
			!dependency.is_critical() && dependency.state() == BreakerState::Open
		});
		let status = if critical_open {
			OverallStatus::Critical
		} else if non_critical_open || self.fallback_recent() {
			OverallStatus::Degraded
		} else {
			OverallStatus::Healthy
		};

		HealthReport { status, dependencies }
	}
}
