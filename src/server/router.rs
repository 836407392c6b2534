//! Route table
//!
//! `/api/*` routes sit behind Basic auth; the front-end is public.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Router, middleware};
use tower_http::services::ServeDir;

use crate::api::handlers;
use crate::auth::require_basic_auth;
use crate::middleware::{log_request, permissive_cors};
use crate::server::AppState;
use crate::server::frontend::serve_index;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/login", post(handlers::login))
        .route("/files", get(handlers::list_files))
        .route("/download", get(handlers::download))
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/action", post(handlers::file_action))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ));

    Router::new()
        .nest("/api", api)
        .route("/", get(serve_index))
        .nest_service("/assets", ServeDir::new(state.config().assets_dir()))
        .fallback(serve_index)
        .layer(middleware::from_fn(log_request))
        .layer(permissive_cors())
        .with_state(state)
}
