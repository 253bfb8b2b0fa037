//! Scripted collaborators and catalog fixtures for exercising the match
//! pipeline without network, Postgres, or Qdrant.

use std::{
	collections::VecDeque,
	sync::{
		Mutex,
		atomic::{AtomicU32, Ordering},
	},
};

use cameo_config::{
	Catalog, CatalogBackend, CompletionProviderConfig, Config, EmbeddingProviderConfig, Matching,
	PersistenceConfig, Providers, Qdrant, Resilience, Retry, Service, Storage,
};
use cameo_domain::{Assignment, Creator, CreatorAnalysis, CreatorMatch};
use cameo_service::{BoxFuture, CompletionProvider, EmbeddingProvider, MatchSink};
use cameo_storage::{
	catalog::CatalogSource,
	index::{CreatorVector, IndexFilter, IndexHit, IndexStats, VectorIndex},
};

pub fn assignment(topic: &str, takeaway: &str, context: &str) -> Assignment {
	Assignment {
		topic: topic.to_string(),
		key_takeaway: takeaway.to_string(),
		additional_context: context.to_string(),
		target_audience: None,
		creator_niches: Vec::new(),
		creator_values: Vec::new(),
		tone_style: None,
	}
}

pub struct CreatorBuilder {
	creator: Creator,
}
impl CreatorBuilder {
	pub fn with_region(mut self, region: &str) -> Self {
		self.creator.region = region.to_string();

		self
	}

	pub fn with_followers(mut self, followers: u64) -> Self {
		self.creator.follower_count = followers;

		self
	}

	pub fn with_hearts(mut self, hearts: u64) -> Self {
		self.creator.heart_count = Some(hearts);

		self
	}

	pub fn with_primary_niches(mut self, niches: &[&str]) -> Self {
		self.creator.analysis.primary_niches =
			niches.iter().map(|tag| tag.to_string()).collect();

		self
	}

	pub fn with_secondary_niches(mut self, niches: &[&str]) -> Self {
		self.creator.analysis.secondary_niches =
			niches.iter().map(|tag| tag.to_string()).collect();

		self
	}

	pub fn with_values(mut self, values: &[&str]) -> Self {
		self.creator.analysis.apparent_values =
			values.iter().map(|tag| tag.to_string()).collect();

		self
	}

	pub fn with_summary(mut self, summary: &str) -> Self {
		self.creator.analysis.summary = summary.to_string();

		self
	}

	pub fn build(self) -> Creator {
		self.creator
	}
}

pub fn creator(id: &str) -> CreatorBuilder {
	CreatorBuilder {
		creator: Creator {
			id: id.to_string(),
			nickname: format!("@{id}"),
			bio: String::new(),
			follower_count: 10_000,
			heart_count: Some(500),
			region: "US".to_string(),
			analysis: CreatorAnalysis {
				primary_niches: vec!["lifestyle".to_string()],
				secondary_niches: Vec::new(),
				apparent_values: Vec::new(),
				audience_interests: Vec::new(),
				tone: Vec::new(),
				summary: String::new(),
			},
		},
	}
}

/// The four-creator finance catalog most scenarios run against.
pub fn sample_catalog() -> Vec<Creator> {
	vec![
		creator("mm")
			.with_primary_niches(&["finance"])
			.with_followers(120_000)
			.with_hearts(9_000)
			.with_summary("Explains money without jargon.")
			.build(),
		creator("md")
			.with_primary_niches(&["finance", "education"])
			.with_followers(80_000)
			.with_hearts(5_000)
			.build(),
		creator("cc")
			.with_primary_niches(&["budgeting"])
			.with_followers(40_000)
			.with_hearts(3_000)
			.build(),
		creator("cb")
			.with_primary_niches(&["entrepreneurship"])
			.with_followers(20_000)
			.with_hearts(800)
			.build(),
	]
}

/// A config that never leaves the process: localhost endpoints, small
/// deadlines, breaker thresholds tuned for fast tests.
pub fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		storage: Storage {
			postgres: None,
			qdrant: Qdrant {
				url: "http://127.0.0.1:6334".to_string(),
				index_name: "creator-embeddings".to_string(),
				vector_dim: 3,
				query_timeout_ms: 500,
			},
		},
		catalog: Catalog {
			source: CatalogBackend::File,
			file_path: Some("unused.json".to_string()),
			refresh_ttl_ms: 300_000,
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test-embedding".to_string(),
				dimensions: 3,
				timeout_ms: 500,
				max_concurrency: 3,
				max_input_chars: 16_384,
				default_headers: Default::default(),
			},
			completion: CompletionProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "test-completion".to_string(),
				temperature: 0.2,
				max_tokens: 128,
				timeout_ms: 500,
				default_headers: Default::default(),
			},
			persistence: Some(PersistenceConfig {
				base_url: "http://127.0.0.1:1".to_string(),
				api_key: None,
				timeout_ms: 500,
				default_headers: Default::default(),
			}),
		},
		matching: Matching::default(),
		resilience: Resilience {
			failure_threshold: 5,
			reset_ms: 30_000,
			// Keep retry sleeps well inside the per-call deadlines above.
			retry: Retry { max_attempts: 3, base_delay_ms: 5, max_delay_ms: 20 },
		},
	}
}

pub struct StaticCatalogSource {
	creators: Vec<Creator>,
}
impl StaticCatalogSource {
	pub fn new(creators: Vec<Creator>) -> Self {
		Self { creators }
	}
}
impl CatalogSource for StaticCatalogSource {
	fn list_all(&self) -> cameo_storage::BoxFuture<'_, cameo_storage::Result<Vec<Creator>>> {
		let creators = self.creators.clone();

		Box::pin(async move { Ok(creators) })
	}
}

/// A catalog source that always fails, for never-loaded-cache scenarios.
pub struct UnavailableCatalogSource;
impl CatalogSource for UnavailableCatalogSource {
	fn list_all(&self) -> cameo_storage::BoxFuture<'_, cameo_storage::Result<Vec<Creator>>> {
		Box::pin(async move {
			Err(cameo_storage::Error::Unavailable {
				message: "catalog store is down".to_string(),
			})
		})
	}
}

pub enum EmbeddingStep {
	Vector(Vec<f32>),
	Unavailable,
	Throttled,
}

/// Embedding collaborator driven by a script; once the script drains it
/// keeps returning the fallback vector.
pub struct ScriptedEmbedding {
	script: Mutex<VecDeque<EmbeddingStep>>,
	fallback: Vec<f32>,
	calls: AtomicU32,
}
impl ScriptedEmbedding {
	pub fn returning(vector: Vec<f32>) -> Self {
		Self { script: Mutex::new(VecDeque::new()), fallback: vector, calls: AtomicU32::new(0) }
	}

	pub fn scripted(steps: Vec<EmbeddingStep>, fallback: Vec<f32>) -> Self {
		Self { script: Mutex::new(steps.into()), fallback, calls: AtomicU32::new(0) }
	}

	pub fn calls(&self) -> u32 {
		self.calls.load(Ordering::SeqCst)
	}
}
impl EmbeddingProvider for ScriptedEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_text: &'a str,
	) -> BoxFuture<'a, cameo_providers::Result<Vec<f32>>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let step = self
				.script
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.pop_front();

			match step {
				None => Ok(self.fallback.clone()),
				Some(EmbeddingStep::Vector(vector)) => Ok(vector),
				Some(EmbeddingStep::Unavailable) => Err(cameo_providers::Error::Unavailable {
					message: "embedding provider is down".to_string(),
				}),
				Some(EmbeddingStep::Throttled) => {
					Err(cameo_providers::Error::Throttled { retry_after: None })
				},
			}
		})
	}
}

pub enum IndexStep {
	Hits(Vec<(&'static str, f64)>),
	Unavailable,
	Throttled,
}

/// Vector index driven by a script; once the script drains it keeps
/// returning the fallback hit list.
pub struct ScriptedIndex {
	script: Mutex<VecDeque<IndexStep>>,
	fallback: Vec<(&'static str, f64)>,
	unavailable: bool,
	query_calls: AtomicU32,
}
impl ScriptedIndex {
	pub fn returning(hits: Vec<(&'static str, f64)>) -> Self {
		Self {
			script: Mutex::new(VecDeque::new()),
			fallback: hits,
			unavailable: false,
			query_calls: AtomicU32::new(0),
		}
	}

	pub fn scripted(steps: Vec<IndexStep>, fallback: Vec<(&'static str, f64)>) -> Self {
		Self {
			script: Mutex::new(steps.into()),
			fallback,
			unavailable: false,
			query_calls: AtomicU32::new(0),
		}
	}

	pub fn always_unavailable() -> Self {
		Self {
			script: Mutex::new(VecDeque::new()),
			fallback: Vec::new(),
			unavailable: true,
			query_calls: AtomicU32::new(0),
		}
	}

	pub fn query_calls(&self) -> u32 {
		self.query_calls.load(Ordering::SeqCst)
	}

	fn next_hits(&self) -> cameo_storage::Result<Vec<IndexHit>> {
		let step = self
			.script
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.pop_front();

		match step {
			None => Ok(to_hits(&self.fallback)),
			Some(IndexStep::Hits(hits)) => Ok(to_hits(&hits)),
			Some(IndexStep::Unavailable) => Err(cameo_storage::Error::Unavailable {
				message: "vector index is down".to_string(),
			}),
			Some(IndexStep::Throttled) => {
				Err(cameo_storage::Error::Throttled { retry_after: None })
			},
		}
	}
}

fn to_hits(hits: &[(&'static str, f64)]) -> Vec<IndexHit> {
	hits.iter()
		.map(|(creator_id, score)| IndexHit {
			creator_id: creator_id.to_string(),
			score: *score,
		})
		.collect()
}

impl VectorIndex for ScriptedIndex {
	fn ensure_index(&self) -> cameo_storage::BoxFuture<'_, cameo_storage::Result<()>> {
		Box::pin(async move { Ok(()) })
	}

	fn upsert<'a>(
		&'a self,
		_points: &'a [CreatorVector],
	) -> cameo_storage::BoxFuture<'a, cameo_storage::Result<()>> {
		Box::pin(async move { Ok(()) })
	}

	fn query<'a>(
		&'a self,
		_vector: &'a [f32],
		_top_k: u32,
		_filter: Option<&'a IndexFilter>,
	) -> cameo_storage::BoxFuture<'a, cameo_storage::Result<Vec<IndexHit>>> {
		Box::pin(async move {
			self.query_calls.fetch_add(1, Ordering::SeqCst);

			if self.unavailable {
				return Err(cameo_storage::Error::Unavailable {
					message: "vector index is down".to_string(),
				});
			}

			self.next_hits()
		})
	}

	fn stats(&self) -> cameo_storage::BoxFuture<'_, cameo_storage::Result<IndexStats>> {
		Box::pin(async move {
			Ok(IndexStats {
				vector_count: self.fallback.len() as u64,
				status: "green".to_string(),
			})
		})
	}
}

pub enum CompletionStep {
	Text(&'static str),
	Unavailable,
}

pub struct ScriptedCompletion {
	script: Mutex<VecDeque<CompletionStep>>,
	fallback: &'static str,
}
impl ScriptedCompletion {
	pub fn returning(text: &'static str) -> Self {
		Self { script: Mutex::new(VecDeque::new()), fallback: text }
	}

	pub fn scripted(steps: Vec<CompletionStep>, fallback: &'static str) -> Self {
		Self { script: Mutex::new(steps.into()), fallback }
	}
}
impl CompletionProvider for ScriptedCompletion {
	fn complete<'a>(
		&'a self,
		_cfg: &'a CompletionProviderConfig,
		_prompt: &'a str,
	) -> BoxFuture<'a, cameo_providers::Result<String>> {
		Box::pin(async move {
			let step = self
				.script
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.pop_front();

			match step {
				None => Ok(self.fallback.to_string()),
				Some(CompletionStep::Text(text)) => Ok(text.to_string()),
				Some(CompletionStep::Unavailable) => {
					Err(cameo_providers::Error::Unavailable {
						message: "completion provider is down".to_string(),
					})
				},
			}
		})
	}
}

/// Records persisted matches instead of calling anything.
#[derive(Default)]
pub struct RecordingSink {
	persisted: Mutex<Vec<(String, usize)>>,
	fail: bool,
}
impl RecordingSink {
	pub fn failing() -> Self {
		Self { persisted: Mutex::new(Vec::new()), fail: true }
	}

	pub fn persisted(&self) -> Vec<(String, usize)> {
		self.persisted.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl MatchSink for RecordingSink {
	fn persist_matches<'a>(
		&'a self,
		_cfg: &'a PersistenceConfig,
		assignment_id: &'a str,
		matches: &'a [CreatorMatch],
	) -> BoxFuture<'a, cameo_providers::Result<()>> {
		Box::pin(async move {
			if self.fail {
				return Err(cameo_providers::Error::Unavailable {
					message: "assignment store is down".to_string(),
				});
			}

			self.persisted
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.push((assignment_id.to_string(), matches.len()));

			Ok(())
		})
	}
}
