use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::account;
use crate::session;
use crate::shared::AppState;

/// Builds the application router: open registration and login endpoints,
/// logout behind a token-presence check, and the profile endpoints behind
/// full bearer authentication, all mounted under /api/v1.
pub fn router(state: AppState) -> Router {
    let open = Router::new()
        .route("/register", post(session::register))
        .route("/login", post(session::login));

    // Logout only needs the raw token, not a valid session: revoking an
    // already-dead token must still succeed
    let logout = Router::new()
        .route("/logout", post(session::logout))
        .layer(middleware::from_fn(session::require_token));

    let protected = Router::new()
        .route(
            "/profile",
            get(account::get_profile)
                .put(account::update_profile)
                .delete(account::delete_profile),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::bearer_auth,
        ));

    let api = open.merge(logout).merge(protected);

    Router::new()
        .nest("/api/v1", api)
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Fallback for unknown routes
async fn route_not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "route not found"})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt; // for `oneshot`

    #[tokio::test]
    async fn test_unknown_route_returns_404_json() {
        let app = router(AppStateBuilder::new().build());

        let request = Request::builder()
            .uri("/api/v1/no-such-route")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "route not found");
    }
}
