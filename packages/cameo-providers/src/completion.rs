use serde_json::Value;

use cameo_config::CompletionProviderConfig;

use crate::{Error, Result};

/// Generate a short rationale text. Output is advisory only; the caller
/// substitutes a canned message on any failure.
pub async fn complete(cfg: &CompletionProviderConfig, prompt: &str) -> Result<String> {
	let client = crate::client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": [
			{ "role": "user", "content": prompt }
		],
	});
	let request =
		client.post(url).headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?);
	let json = crate::send_json(request, &body).await?;

	parse_completion_response(json)
}

fn parse_completion_response(json: Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(str::trim)
		.filter(|content| !content.is_empty());

	match content {
		Some(content) => Ok(content.to_string()),
		None => Err(Error::InvalidResponse {
			message: "Completion response is missing message content.".to_string(),
		}),
	}
}
