mod error;
mod types;

use std::{env, fs, path::Path, str::FromStr};

pub use error::{Error, Result};
pub use types::{
	Catalog, CatalogBackend, CompletionProviderConfig, Config, EmbeddingProviderConfig, Matching,
	PersistenceConfig, Postgres, Providers, Qdrant, Resilience, Retry, ScoreWeights, Service,
	Storage,
};

/// Load a config file, apply the recognized environment overrides, then
/// normalize and validate. The rest of the system never reads the
/// environment; this is the only place overrides enter.
pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|source| Error::ReadConfig { path: path.to_path_buf(), source })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|source| Error::ParseConfig { path: path.to_path_buf(), source })?;

	apply_env(&mut cfg)?;
	normalize(&mut cfg);
	validate(&cfg)?;

	Ok(cfg)
}

pub fn apply_env(cfg: &mut Config) -> Result<()> {
	apply_overrides(cfg, |name| env::var(name).ok())
}

/// Apply the recognized overrides from an arbitrary lookup. Split from
/// [`apply_env`] so tests do not have to mutate the process environment.
pub fn apply_overrides<F>(cfg: &mut Config, get: F) -> Result<()>
where
	F: Fn(&str) -> Option<String>,
{
	if let Some(value) = get("VECTOR_INDEX_NAME") {
		cfg.storage.qdrant.index_name = value;
	}
	if let Some(value) = get("EMBEDDING_MODEL") {
		cfg.providers.embedding.model = value;
	}
	if let Some(value) = get("COMPLETION_MODEL") {
		cfg.providers.completion.model = value;
	}
	if let Some(value) = get("AI_PROVIDER") {
		cfg.providers.embedding.provider_id = value.clone();
		cfg.providers.completion.provider_id = value;
	}
	if let Some(value) = get("MATCH_TOP_K") {
		cfg.matching.top_k = parse_override("MATCH_TOP_K", &value)?;
	}
	if let Some(value) = get("VECTOR_QUERY_TOP_K") {
		cfg.matching.query_top_k = parse_override("VECTOR_QUERY_TOP_K", &value)?;
	}
	if let Some(value) = get("CATALOG_REFRESH_TTL_MS") {
		cfg.catalog.refresh_ttl_ms = parse_override("CATALOG_REFRESH_TTL_MS", &value)?;
	}
	if let Some(value) = get("BREAKER_FAILURE_THRESHOLD") {
		cfg.resilience.failure_threshold = parse_override("BREAKER_FAILURE_THRESHOLD", &value)?;
	}
	if let Some(value) = get("BREAKER_RESET_MS") {
		cfg.resilience.reset_ms = parse_override("BREAKER_RESET_MS", &value)?;
	}
	if let Some(value) = get("RETRY_MAX_ATTEMPTS") {
		cfg.resilience.retry.max_attempts = parse_override("RETRY_MAX_ATTEMPTS", &value)?;
	}
	if let Some(value) = get("RETRY_BASE_DELAY_MS") {
		cfg.resilience.retry.base_delay_ms = parse_override("RETRY_BASE_DELAY_MS", &value)?;
	}
	if let Some(value) = get("RETRY_MAX_DELAY_MS") {
		cfg.resilience.retry.max_delay_ms = parse_override("RETRY_MAX_DELAY_MS", &value)?;
	}
	if let Some(value) = get("REQUEST_DEADLINE_MS") {
		cfg.matching.request_deadline_ms = parse_override("REQUEST_DEADLINE_MS", &value)?;
	}

	Ok(())
}

fn parse_override<T: FromStr>(variable: &str, raw: &str) -> Result<T> {
	raw.trim().parse().map_err(|_| Error::Environment {
		variable: variable.to_string(),
		message: format!("{raw:?} is not a valid value."),
	})
}

fn normalize(cfg: &mut Config) {
	if cfg.catalog.file_path.as_deref().map(|path| path.trim().is_empty()).unwrap_or(false) {
		cfg.catalog.file_path = None;
	}
	cfg.storage.qdrant.index_name = cfg.storage.qdrant.index_name.trim().to_string();
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(validation("service.http_bind must be non-empty."));
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(validation("providers.embedding.dimensions must be greater than zero."));
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(validation(
			"providers.embedding.dimensions must match storage.qdrant.vector_dim.",
		));
	}
	if cfg.storage.qdrant.index_name.is_empty() {
		return Err(validation("storage.qdrant.index_name must be non-empty."));
	}

	match cfg.catalog.source {
		CatalogBackend::Postgres if cfg.storage.postgres.is_none() => {
			return Err(validation(
				"storage.postgres must be configured when catalog.source is postgres.",
			));
		},
		CatalogBackend::File if cfg.catalog.file_path.is_none() => {
			return Err(validation(
				"catalog.file_path must be configured when catalog.source is file.",
			));
		},
		_ => {},
	}

	if cfg.catalog.refresh_ttl_ms == 0 {
		return Err(validation("catalog.refresh_ttl_ms must be greater than zero."));
	}
	if cfg.matching.top_k == 0 {
		return Err(validation("matching.top_k must be greater than zero."));
	}
	if !(1..=100).contains(&cfg.matching.query_top_k) {
		return Err(validation("matching.query_top_k must be in the range 1-100."));
	}
	if cfg.matching.scoring_parallelism == 0 {
		return Err(validation("matching.scoring_parallelism must be greater than zero."));
	}
	if cfg.matching.request_deadline_ms == 0 {
		return Err(validation("matching.request_deadline_ms must be greater than zero."));
	}

	validate_weights(&cfg.matching.weights)?;

	if cfg.resilience.failure_threshold == 0 {
		return Err(validation("resilience.failure_threshold must be greater than zero."));
	}
	if cfg.resilience.retry.max_attempts == 0 {
		return Err(validation("resilience.retry.max_attempts must be greater than zero."));
	}
	if cfg.resilience.retry.base_delay_ms > cfg.resilience.retry.max_delay_ms {
		return Err(validation(
			"resilience.retry.base_delay_ms must not exceed resilience.retry.max_delay_ms.",
		));
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("completion", &cfg.providers.completion.api_key),
	] {
		if key.trim().is_empty() {
			return Err(validation(&format!("Provider {label} api_key must be non-empty.")));
		}
	}

	if !cfg.providers.completion.temperature.is_finite()
		|| cfg.providers.completion.temperature < 0.0
	{
		return Err(validation("providers.completion.temperature must be zero or greater."));
	}
	if let Some(persistence) = cfg.providers.persistence.as_ref()
		&& persistence.base_url.trim().is_empty()
	{
		return Err(validation("providers.persistence.base_url must be non-empty."));
	}

	Ok(())
}

fn validate_weights(weights: &ScoreWeights) -> Result<()> {
	let components = [
		("semantic", weights.semantic),
		("niche", weights.niche),
		("audience", weights.audience),
		("value", weights.value),
	];

	for (label, weight) in components {
		if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
			return Err(validation(&format!(
				"matching.weights.{label} must be in the range 0.0-1.0."
			)));
		}
	}

	let sum: f64 = components.iter().map(|(_, weight)| weight).sum();

	if (sum - 1.0).abs() > 1e-6 {
		return Err(validation("matching.weights must sum to 1.0."));
	}

	Ok(())
}

fn validation(message: &str) -> Error {
	Error::Validation { message: message.to_string() }
}
