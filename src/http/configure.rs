//! Configuration endpoint.
//!
//! `POST /configure` with a JSON [`ServiceConfig`]. Replies `200 success`, or
//! `500 internal error` for an undecodable body and
//! `500 internal error: <reason>` when the service cannot be built.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::config::ServiceConfig;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::ConfigureError;

pub async fn configure(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Failed to read configuration body");
            metrics::record_configuration("malformed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response();
        }
    };

    let result = match ServiceConfig::from_slice(&body) {
        Ok(config) => {
            tracing::debug!(
                prefix = %config.prefix,
                domain = %config.domain,
                repo = %config.repo,
                team = %config.team,
                "Configuration received"
            );
            state.services.register(config).await
        }
        Err(e) => Err(ConfigureError::from(e)),
    };

    match result {
        Ok(_) => {
            metrics::record_configuration("success");
            (StatusCode::OK, "success").into_response()
        }
        Err(e) => e.into_response(),
    }
}

impl IntoResponse for ConfigureError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Configuration rejected");
        match self {
            ConfigureError::MalformedConfig(_) => {
                metrics::record_configuration("malformed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
            other => {
                metrics::record_configuration("rejected");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("internal error: {}", other),
                )
                    .into_response()
            }
        }
    }
}
