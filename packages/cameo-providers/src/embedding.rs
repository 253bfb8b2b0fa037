use futures::{StreamExt, stream};
use serde_json::Value;

use cameo_config::EmbeddingProviderConfig;

use crate::{Error, Result};

/// Embed a single text. The input is trimmed; inputs over the configured
/// character limit are rejected rather than silently truncated, so the
/// vector always reflects the whole brief.
pub async fn embed(cfg: &EmbeddingProviderConfig, text: &str) -> Result<Vec<f32>> {
	let trimmed = text.trim();

	if trimmed.chars().count() > cfg.max_input_chars {
		return Err(Error::Oversized {
			chars: trimmed.chars().count(),
			limit: cfg.max_input_chars,
		});
	}

	let client = crate::client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": [trimmed],
		"dimensions": cfg.dimensions,
	});
	let request =
		client.post(url).headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?);
	let json = crate::send_json(request, &body).await?;
	let mut vectors = parse_embedding_response(json)?;

	let Some(vector) = vectors.pop() else {
		return Err(Error::InvalidResponse {
			message: "Embedding response contained no vectors.".to_string(),
		});
	};

	check_dimension(&vector, cfg.dimensions)?;

	Ok(vector)
}

/// Embed many texts with at most `cfg.max_concurrency` requests in
/// flight. Output order matches input order.
pub async fn embed_batch(
	cfg: &EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let concurrency = cfg.max_concurrency.max(1);
	let results: Vec<Result<Vec<f32>>> = stream::iter(texts)
		.map(|text| embed(cfg, text))
		.buffered(concurrency)
		.collect()
		.await;

	results.into_iter().collect()
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse {
			message: "Embedding response is missing data array.".to_string(),
		}
	})?;

	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
			Error::InvalidResponse {
				message: "Embedding item missing embedding array.".to_string(),
			}
		})?;
		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".to_string(),
			})?;

			vec.push(number as f32);
		}

		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

fn check_dimension(vector: &[f32], expected: u32) -> Result<()> {
	if vector.len() != expected as usize {
		return Err(Error::InvalidConfig {
			message: format!(
				"Embedding dimension {} does not match the configured {expected}.",
				vector.len()
			),
		});
	}

	Ok(())
}
