pub use super::routes::{categories, todos, AppState};

use axum::{routing::get, Router};

use crate::domain::repository::BlobStore;

pub fn app(router: Router) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(router)
}

/// Every todo, category and selection route over one shared store.
pub fn api<B: BlobStore>(state: AppState<B>) -> Router {
    app(todos::router(state.clone()).merge(categories::router(state)))
}
