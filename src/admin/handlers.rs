use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::server::AppState;
use crate::routing::ServiceSummary;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub services: usize,
    /// Middleware keys service configurations may use.
    pub middleware: Vec<String>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        services: state.services.len().await,
        middleware: state.services.middleware().keys(),
    })
}

pub async fn get_services(State(state): State<AppState>) -> Json<Vec<ServiceSummary>> {
    Json(state.services.list().await)
}

pub async fn delete_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    match state.services.deregister(&format!("/{}", name)).await {
        Some(_) => (StatusCode::OK, "removed").into_response(),
        None => (StatusCode::NOT_FOUND, "unknown service").into_response(),
    }
}
