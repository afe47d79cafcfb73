pub mod conversations;
pub mod use_cases;

use axum::Router;

use troupe_core::state::AppState;

/// Build the complete API router with all sub-routes.
pub fn api_router() -> Router<AppState> {
    Router::new().nest(
        "/api/use_cases",
        use_cases::router().merge(conversations::router()),
    )
}
