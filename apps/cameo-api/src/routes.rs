use std::time::Duration;

use axum::{
	Json, Router,
	extract::State,
	http::{StatusCode, header::RETRY_AFTER},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use cameo_resilience::HealthReport;
use cameo_service::{Error as ServiceError, MatchRequest, MatchResponse};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/matches", post(matches))
		.with_state(state)
}

async fn matches(
	State(state): State<AppState>,
	Json(payload): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, ApiError> {
	let response = state.service.match_assignment(payload).await?;

	Ok(Json(response))
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
	Json(state.service.health())
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
	retry_after: Option<Duration>,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::Validation { fields } => Self {
				status: StatusCode::BAD_REQUEST,
				error_code: "validation_error".to_string(),
				message: "Assignment failed validation.".to_string(),
				fields: Some(fields),
				retry_after: None,
			},
			ServiceError::DependencyUnavailable { dependency, message, retry_after } => Self {
				status: StatusCode::SERVICE_UNAVAILABLE,
				error_code: "dependency_unavailable".to_string(),
				message: format!("{dependency} is unavailable: {message}"),
				fields: None,
				retry_after,
			},
			ServiceError::DeadlineExceeded { timeout_ms } => Self {
				status: StatusCode::GATEWAY_TIMEOUT,
				error_code: "deadline_exceeded".to_string(),
				message: format!("Request exceeded its {timeout_ms} ms deadline."),
				fields: None,
				retry_after: None,
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error_code: self.error_code,
			message: self.message,
			fields: self.fields,
		};
		let mut response = (self.status, Json(body)).into_response();

		if let Some(retry_after) = self.retry_after
			&& let Ok(value) = retry_after.as_secs().to_string().parse()
		{
			response.headers_mut().insert(RETRY_AFTER, value);
		}

		response
	}
}
