//! Operator-facing inspection of registered services.

pub mod handlers;

use axum::{
    routing::{delete, get},
    Router,
};

use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/services", get(get_services))
        .route("/admin/services/{name}", delete(delete_service))
}
