use std::time::Duration;

use axum::{http::StatusCode, middleware, routing::get, Router};
use relyingparty_auth::{identity_context, mock::mock_provider_routes};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{handlers::home::home, state::AppState};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .merge(state.endpoint.router())
        .merge(mock_provider_routes())
        .layer(middleware::from_fn_with_state(
            state.binding.clone(),
            identity_context,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(state)
}
