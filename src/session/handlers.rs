use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::{info, instrument};

use super::types::{
    AuthResponse, BearerToken, LoginRequest, LogoutResponse, RegisterRequest, UserResponse,
};
use crate::shared::{AppError, AppState};

/// HTTP handler for registering a new user
///
/// POST /api/v1/register
/// Returns the created user (without its password hash) and 201
#[instrument(name = "register", skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    if request.name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.username.trim().is_empty()
        || request.password.is_empty()
    {
        return Err(AppError::Validation("please fill all fields".to_string()));
    }

    let user = state.session_service.register(request).await?;

    info!(user_id = %user.id, username = %user.username, "Registration completed");
    Ok((StatusCode::CREATED, Json(user)))
}

/// HTTP handler for logging in
///
/// POST /api/v1/login
/// Returns the user and a fresh session token
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::Validation("please fill all fields".to_string()));
    }

    let auth = state
        .session_service
        .authenticate(&request.username, &request.password)
        .await
        .map_err(|e| match e {
            // A login probe must not learn whether the username exists, so
            // both failure kinds leave as the same error
            AppError::NotFound(_) | AppError::InvalidCredentials => AppError::InvalidCredentials,
            other => other,
        })?;

    info!(user_id = %auth.user.id, "Login completed");
    Ok(Json(auth))
}

/// HTTP handler for logging out
///
/// POST /api/v1/logout
/// Revokes the presented token; succeeds again on repeat calls
#[instrument(name = "logout", skip(state, token))]
pub async fn logout(
    State(state): State<AppState>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<Json<LogoutResponse>, AppError> {
    state.session_service.logout(&token).await?;

    info!("Logout completed");
    Ok(Json(LogoutResponse {
        message: "logged out successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware, Router,
    };
    use rstest::rstest;
    use tower::ServiceExt; // for `oneshot`

    fn test_app() -> (AppState, Router) {
        let state = AppStateBuilder::new().build();
        let app = Router::new()
            .route("/register", axum::routing::post(register))
            .route("/login", axum::routing::post(login))
            .route(
                "/logout",
                axum::routing::post(logout)
                    .layer(middleware::from_fn(crate::session::require_token)),
            )
            .with_state(state.clone());
        (state, app)
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    const ALICE: &str =
        r#"{"name": "Alice", "email": "alice@x.com", "username": "alice", "password": "pw123"}"#;

    #[tokio::test]
    async fn test_register_handler() {
        let (_state, app) = test_app();

        let response = app.oneshot(json_post("/register", ALICE)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_string(response).await;
        let user: UserResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(user.username, "alice");
        assert!(!body.contains("password"));
        assert!(!body.contains("pw123"));
    }

    #[rstest]
    #[case(r#"{"name": "", "email": "a@x.com", "username": "a", "password": "pw"}"#)]
    #[case(r#"{"name": "A", "email": " ", "username": "a", "password": "pw"}"#)]
    #[case(r#"{"name": "A", "email": "a@x.com", "username": "", "password": "pw"}"#)]
    #[case(r#"{"name": "A", "email": "a@x.com", "username": "a", "password": ""}"#)]
    #[tokio::test]
    async fn test_register_handler_empty_field(#[case] body: &str) {
        let (_state, app) = test_app();

        let response = app.oneshot(json_post("/register", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_register_handler_duplicate() {
        let (_state, app) = test_app();

        let response = app
            .clone()
            .oneshot(json_post("/register", ALICE))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app.oneshot(json_post("/register", ALICE)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_handler() {
        let (_state, app) = test_app();
        app.clone()
            .oneshot(json_post("/register", ALICE))
            .await
            .unwrap();

        let response = app
            .oneshot(json_post(
                "/login",
                r#"{"username": "alice", "password": "pw123"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let auth: AuthResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(auth.user.username, "alice");
        assert!(auth.token.contains('.'));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (_state, app) = test_app();
        app.clone()
            .oneshot(json_post("/register", ALICE))
            .await
            .unwrap();

        let wrong_password = app
            .clone()
            .oneshot(json_post(
                "/login",
                r#"{"username": "alice", "password": "wrong"}"#,
            ))
            .await
            .unwrap();
        let unknown_user = app
            .oneshot(json_post(
                "/login",
                r#"{"username": "nobody", "password": "pw123"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

        // Same status and same body: no username oracle
        let body_a = body_string(wrong_password).await;
        let body_b = body_string(unknown_user).await;
        assert_eq!(body_a, body_b);
    }

    #[tokio::test]
    async fn test_logout_handler() {
        let (state, app) = test_app();
        app.clone()
            .oneshot(json_post("/register", ALICE))
            .await
            .unwrap();
        let auth = state
            .session_service
            .authenticate("alice", "pw123")
            .await
            .unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/logout")
            .header("Authorization", format!("Bearer {}", auth.token))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: LogoutResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body.message, "logged out successfully");

        // The token is now dead for access checks
        let result = state.session_service.check_access(Some(&auth.token)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_logout_handler_without_token() {
        let (_state, app) = test_app();

        let request = Request::builder()
            .method("POST")
            .uri("/logout")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
