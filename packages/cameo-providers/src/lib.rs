pub mod completion;
pub mod embedding;
pub mod persistence;

mod error;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client, RequestBuilder, Response, StatusCode,
	header::{AUTHORIZATION, HeaderMap, HeaderName, RETRY_AFTER},
};
use serde_json::{Map, Value};

pub fn client(timeout_ms: u64) -> Result<Client> {
	Ok(Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?)
}

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	optional_auth_headers(Some(api_key), default_headers)
}

pub fn optional_auth_headers(
	api_key: Option<&str>,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if let Some(api_key) = api_key {
		headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Send a JSON request and classify the response status into the fault
/// taxonomy: 429 is throttled (with any retry-after hint), 5xx is
/// unavailable, other non-2xx is a terminal invalid response.
pub(crate) async fn send_json(request: RequestBuilder, body: &Value) -> Result<Value> {
	let res = request.json(body).send().await?;
	let res = classify_status(res)?;
	let json: Value = res.json().await.map_err(|err| Error::InvalidResponse {
		message: format!("Provider returned a non-JSON body: {err}."),
	})?;

	Ok(json)
}

fn classify_status(res: Response) -> Result<Response> {
	let status = res.status();

	if status == StatusCode::TOO_MANY_REQUESTS {
		return Err(Error::Throttled { retry_after: retry_after_hint(&res) });
	}
	if status.is_server_error() {
		return Err(Error::Unavailable { message: format!("Provider returned {status}.") });
	}
	if !status.is_success() {
		return Err(Error::InvalidResponse { message: format!("Provider returned {status}.") });
	}

	Ok(res)
}

fn retry_after_hint(res: &Response) -> Option<Duration> {
	let raw = res.headers().get(RETRY_AFTER)?.to_str().ok()?;
	let seconds: u64 = raw.trim().parse().ok()?;

	Some(Duration::from_secs(seconds))
}
