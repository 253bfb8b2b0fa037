use cameo_config::PersistenceConfig;
use cameo_domain::CreatorMatch;

use crate::{Error, Result};

/// Write match results back to the assignment store:
/// `PATCH {base}/assignments/{id}/matches`. Any 2xx is success; the
/// orchestrator only logs failures.
pub async fn persist_matches(
	cfg: &PersistenceConfig,
	assignment_id: &str,
	matches: &[CreatorMatch],
) -> Result<()> {
	let client = crate::client(cfg.timeout_ms)?;
	let base = cfg.base_url.trim_end_matches('/');
	let url = format!("{base}/assignments/{assignment_id}/matches");
	let body = serde_json::json!({ "matchResults": matches });
	let headers = crate::optional_auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?;
	let res = client.patch(url).headers(headers).json(&body).send().await?;
	let status = res.status();

	if !status.is_success() {
		return Err(Error::Unavailable {
			message: format!("Persistence endpoint returned {status}."),
		});
	}

	Ok(())
}
