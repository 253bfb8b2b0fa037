pub mod catalog_cache;
pub mod matching;
pub mod rationale;

mod error;

pub use error::{Error, Result};
pub use matching::MatchRequest;

pub use cameo_domain::MatchResponse;

use std::{
	future::Future,
	pin::Pin,
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
	time::Duration,
};

use cameo_config::{CompletionProviderConfig, Config, EmbeddingProviderConfig, PersistenceConfig};
use cameo_domain::CreatorMatch;
use cameo_providers::{completion, embedding, persistence};
use cameo_resilience::{Dependency, HealthAggregator, HealthReport, RetryPolicy, Shield};
use cameo_storage::index::VectorIndex;

use crate::catalog_cache::CatalogCache;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, cameo_providers::Result<Vec<f32>>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, cameo_providers::Result<String>>;
}

pub trait MatchSink
where
	Self: Send + Sync,
{
	fn persist_matches<'a>(
		&'a self,
		cfg: &'a PersistenceConfig,
		assignment_id: &'a str,
		matches: &'a [CreatorMatch],
	) -> BoxFuture<'a, cameo_providers::Result<()>>;
}

/// The orchestrator's outbound collaborators. Swappable so tests can
/// script behavior; the defaults call the HTTP providers.
#[derive(Clone)]
pub struct Collaborators {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub completion: Arc<dyn CompletionProvider>,
	pub sink: Arc<dyn MatchSink>,
}
impl Default for Collaborators {
	fn default() -> Self {
		let provider = Arc::new(DefaultCollaborators);

		Self { embedding: provider.clone(), completion: provider.clone(), sink: provider }
	}
}

struct DefaultCollaborators;
impl EmbeddingProvider for DefaultCollaborators {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, cameo_providers::Result<Vec<f32>>> {
		Box::pin(embedding::embed(cfg, text))
	}
}
impl CompletionProvider for DefaultCollaborators {
	fn complete<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, cameo_providers::Result<String>> {
		Box::pin(completion::complete(cfg, prompt))
	}
}
impl MatchSink for DefaultCollaborators {
	fn persist_matches<'a>(
		&'a self,
		cfg: &'a PersistenceConfig,
		assignment_id: &'a str,
		matches: &'a [CreatorMatch],
	) -> BoxFuture<'a, cameo_providers::Result<()>> {
		Box::pin(persistence::persist_matches(cfg, assignment_id, matches))
	}
}

/// Counters surfaced alongside health for operational visibility.
#[derive(Debug, Default)]
pub struct ServiceMetrics {
	scoring_warnings: AtomicU64,
	fallback_responses: AtomicU64,
}
impl ServiceMetrics {
	pub fn scoring_warnings(&self) -> u64 {
		self.scoring_warnings.load(Ordering::Relaxed)
	}

	pub fn fallback_responses(&self) -> u64 {
		self.fallback_responses.load(Ordering::Relaxed)
	}

	pub(crate) fn note_scoring_warning(&self) {
		self.scoring_warnings.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn note_fallback(&self) {
		self.fallback_responses.fetch_add(1, Ordering::Relaxed);
	}
}

pub struct MatchService {
	pub cfg: Config,
	pub(crate) catalog: Arc<CatalogCache>,
	pub(crate) index: Arc<dyn VectorIndex>,
	pub(crate) collaborators: Collaborators,
	pub(crate) embedding_shield: Shield,
	pub(crate) vector_shield: Shield,
	pub(crate) completion_shield: Shield,
	pub(crate) persistence_shield: Shield,
	pub(crate) health: HealthAggregator,
	pub(crate) metrics: ServiceMetrics,
}
impl MatchService {
	pub fn new(
		cfg: Config,
		catalog: Arc<CatalogCache>,
		index: Arc<dyn VectorIndex>,
		collaborators: Collaborators,
	) -> Self {
		let retry = RetryPolicy::from_config(&cfg.resilience.retry);
		let threshold = cfg.resilience.failure_threshold;
		let reset = Duration::from_millis(cfg.resilience.reset_ms);
		let embedding_dep = Arc::new(Dependency::new("embedding", true, threshold, reset));
		let vector_dep = Arc::new(Dependency::new("vector-index", true, threshold, reset));
		let completion_dep = Arc::new(Dependency::new("completion", false, threshold, reset));
		let persistence_dep = Arc::new(Dependency::new("persistence", false, threshold, reset));
		let mut observed =
			vec![vector_dep.clone(), embedding_dep.clone(), completion_dep.clone()];

		if cfg.providers.persistence.is_some() {
			observed.push(persistence_dep.clone());
		}

		let health = HealthAggregator::new(
			observed,
			Duration::from_millis(cfg.matching.recent_fallback_window_ms),
		);
		let embedding_shield = Shield::new(
			embedding_dep,
			retry,
			Duration::from_millis(cfg.providers.embedding.timeout_ms),
		);
		let vector_shield = Shield::new(
			vector_dep,
			retry,
			Duration::from_millis(cfg.storage.qdrant.query_timeout_ms),
		);
		let completion_shield = Shield::new(
			completion_dep,
			retry,
			Duration::from_millis(cfg.providers.completion.timeout_ms),
		);
		let persistence_timeout_ms = cfg
			.providers
			.persistence
			.as_ref()
			.map(|persistence| persistence.timeout_ms)
			.unwrap_or(2_000);
		let persistence_shield =
			Shield::new(persistence_dep, retry, Duration::from_millis(persistence_timeout_ms));

		Self {
			cfg,
			catalog,
			index,
			collaborators,
			embedding_shield,
			vector_shield,
			completion_shield,
			persistence_shield,
			health,
			metrics: ServiceMetrics::default(),
		}
	}

	pub fn health(&self) -> HealthReport {
		self.health.report()
	}

	pub fn metrics(&self) -> &ServiceMetrics {
		&self.metrics
	}

	pub fn catalog(&self) -> &Arc<CatalogCache> {
		&self.catalog
	}
}
