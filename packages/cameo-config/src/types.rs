use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub catalog: Catalog,
	pub providers: Providers,
	#[serde(default)]
	pub matching: Matching,
	#[serde(default)]
	pub resilience: Resilience,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Option<Postgres>,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	#[serde(default = "default_index_name")]
	pub index_name: String,
	pub vector_dim: u32,
	#[serde(default = "default_query_timeout_ms")]
	pub query_timeout_ms: u64,
}

/// Where creator records are loaded from and how often the in-memory
/// snapshot is refreshed.
#[derive(Debug, Deserialize)]
pub struct Catalog {
	pub source: CatalogBackend,
	/// Required when `source = "file"`.
	pub file_path: Option<String>,
	#[serde(default = "default_refresh_ttl_ms")]
	pub refresh_ttl_ms: u64,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CatalogBackend {
	Postgres,
	File,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub completion: CompletionProviderConfig,
	pub persistence: Option<PersistenceConfig>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	#[serde(default = "default_embedding_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_embedding_concurrency")]
	pub max_concurrency: usize,
	#[serde(default = "default_max_input_chars")]
	pub max_input_chars: usize,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	#[serde(default = "default_temperature")]
	pub temperature: f32,
	#[serde(default = "default_max_tokens")]
	pub max_tokens: u32,
	#[serde(default = "default_completion_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct PersistenceConfig {
	pub base_url: String,
	pub api_key: Option<String>,
	#[serde(default = "default_persistence_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Matching {
	/// Final result count K.
	pub top_k: u32,
	/// Candidate pool requested from the vector index.
	pub query_top_k: u32,
	/// Upper bound on concurrent per-candidate scoring within one request.
	pub scoring_parallelism: usize,
	/// Append structured filters (niches, values, tone) to the embedded
	/// brief text. Off by default: description fields only.
	pub embed_filters: bool,
	pub request_deadline_ms: u64,
	/// Window after a fallback-mode response during which overall health
	/// reports degraded.
	pub recent_fallback_window_ms: u64,
	pub weights: ScoreWeights,
}
impl Default for Matching {
	fn default() -> Self {
		Self {
			top_k: 3,
			query_top_k: 15,
			scoring_parallelism: 8,
			embed_filters: false,
			request_deadline_ms: 15_000,
			recent_fallback_window_ms: 60_000,
			weights: ScoreWeights::default(),
		}
	}
}

/// Component weights for the composite match score. Must sum to 1.0.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
	pub semantic: f64,
	pub niche: f64,
	pub audience: f64,
	pub value: f64,
}
impl Default for ScoreWeights {
	fn default() -> Self {
		Self { semantic: 0.7, niche: 0.2, audience: 0.05, value: 0.05 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Resilience {
	/// Consecutive terminal failures before a breaker opens.
	pub failure_threshold: u32,
	/// How long an open breaker waits before admitting a half-open probe.
	pub reset_ms: u64,
	pub retry: Retry,
}
impl Default for Resilience {
	fn default() -> Self {
		Self { failure_threshold: 5, reset_ms: 30_000, retry: Retry::default() }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retry {
	pub max_attempts: u32,
	pub base_delay_ms: u64,
	pub max_delay_ms: u64,
}
impl Default for Retry {
	fn default() -> Self {
		Self { max_attempts: 3, base_delay_ms: 200, max_delay_ms: 5_000 }
	}
}

fn default_index_name() -> String {
	"creator-embeddings".to_string()
}

fn default_query_timeout_ms() -> u64 {
	2_000
}

fn default_refresh_ttl_ms() -> u64 {
	300_000
}

fn default_embedding_timeout_ms() -> u64 {
	5_000
}

fn default_embedding_concurrency() -> usize {
	3
}

fn default_max_input_chars() -> usize {
	16_384
}

fn default_temperature() -> f32 {
	0.4
}

fn default_max_tokens() -> u32 {
	256
}

fn default_completion_timeout_ms() -> u64 {
	10_000
}

fn default_persistence_timeout_ms() -> u64 {
	2_000
}
