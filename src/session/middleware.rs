use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use super::types::BearerToken;
use crate::shared::{AppError, AppState, DeniedReason};

/// Bearer authentication middleware - runs the full session check (presence,
/// revocation, signature/expiry) and adds SessionClaims to the request.
/// Usage: .layer(middleware::from_fn_with_state(state.clone(), session::bearer_auth))
/// Handlers can then extract Extension(claims): Extension<SessionClaims>.
#[instrument(skip(state, req, next))]
pub async fn bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    debug!(uri = %req.uri(), "Bearer authentication middleware triggered");

    let token = bearer_token(req.headers());

    let claims = match state.session_service.check_access(token.as_deref()).await {
        Ok(claims) => claims,
        Err(e) => {
            warn!(uri = %req.uri(), error = %e, "Bearer authentication failed");
            return Err(e);
        }
    };

    debug!(user_id = %claims.sub, "Authentication successful, adding claims to request");
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Token-presence middleware for logout - extracts the raw bearer token
/// without validating it. A logged-out or expired token is still a valid
/// thing to revoke; only a missing token is rejected.
#[instrument(skip(req, next))]
pub async fn require_token(mut req: Request, next: Next) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        warn!(uri = %req.uri(), "No bearer token on request");
        AppError::Denied(DeniedReason::MissingToken)
    })?;

    req.extensions_mut().insert(BearerToken(token));

    Ok(next.run(req).await)
}

/// Pulls the token out of an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        let headers = headers_with_auth("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_wrong_scheme() {
        let headers = headers_with_auth("Basic dXNlcjpwdw==");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_empty_bearer_value() {
        let headers = headers_with_auth("Bearer ");
        assert_eq!(bearer_token(&headers), None);
    }
}
