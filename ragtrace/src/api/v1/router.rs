use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::v1_auth_middleware;

pub fn v1_router(state: AppState) -> Router<AppState> {
    let traces = Router::new()
        .route(
            "/",
            get(handlers::traces::list_traces).post(handlers::traces::create_trace),
        )
        .route(
            "/{promptId}",
            get(handlers::traces::get_trace).delete(handlers::traces::delete_trace),
        );

    let responses = Router::new()
        .route("/{responseId}/checks", get(handlers::checks::list_checks))
        .route(
            "/{responseId}/checks:score",
            post(handlers::checks::score_response),
        );

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let protected_routes = Router::new()
        .nest("/traces", traces)
        .route("/traces:stream", get(handlers::stream::stream_traces))
        .nest("/responses", responses)
        .route_layer(middleware::from_fn_with_state(state, v1_auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
