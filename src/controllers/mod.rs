pub mod sessions;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().merge(sessions::routes())
}

/// Полный роутер приложения без слоёв трассировки и CORS.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Cinema seats API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", routes())
        .with_state(state)
}
