use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crop_retrieval::{Error, RetrieveRequest, RetrieveResponse};

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
		Self { status, error_code, message: message.into() }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			Error::Provider { message } => {
				tracing::error!(error = %message, "Embedding provider failed.");

				Self::new(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message)
			},
			Error::Storage { message } => {
				tracing::error!(error = %message, "Chunk store failed.");

				Self::new(StatusCode::BAD_GATEWAY, "STORAGE_ERROR", message)
			},
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code.to_string(), message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/context", post(context))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn context(
	State(state): State<AppState>,
	payload: Result<Json<RetrieveRequest>, JsonRejection>,
) -> Result<Json<RetrieveResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.retrieve(payload).await?;

	Ok(Json(response))
}
