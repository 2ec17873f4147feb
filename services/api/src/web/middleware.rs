//! services/api/src/web/middleware.rs
//!
//! Identity-resolution middleware for the API routes.

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use uuid::Uuid;

use crate::error::ApiError;

/// The header callers use to identify themselves.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller's identity, resolved once per request and stored in request
/// extensions.
///
/// `None` means the request was anonymous. Handlers that need an identified
/// user reject `None` with 401; handlers that can serve anyone fall back to
/// their anonymous behavior instead.
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser(pub Option<Uuid>);

/// Middleware that resolves the caller's identity from the `x-user-id` header.
///
/// The header is optional, but when present it must parse as a UUID: claiming
/// a malformed identity is a client error, not an anonymous request.
pub async fn resolve_user(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let user = current_user_from(req.headers())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

fn current_user_from(headers: &HeaderMap) -> Result<CurrentUser, ApiError> {
    let Some(value) = headers.get(USER_ID_HEADER) else {
        return Ok(CurrentUser(None));
    };

    let raw = value.to_str().map_err(|_| {
        ApiError::BadRequest(format!("{USER_ID_HEADER} header is not valid text"))
    })?;
    let user_id = Uuid::parse_str(raw)
        .map_err(|_| ApiError::BadRequest(format!("Invalid {USER_ID_HEADER} format: '{raw}'")))?;

    Ok(CurrentUser(Some(user_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_header_is_anonymous() {
        let headers = HeaderMap::new();
        let user = current_user_from(&headers).unwrap();
        assert!(user.0.is_none());
    }

    #[test]
    fn test_valid_header_resolves_the_user() {
        let user_id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, user_id.to_string().parse().unwrap());

        let user = current_user_from(&headers).unwrap();
        assert_eq!(user.0, Some(user_id));
    }

    #[test]
    fn test_malformed_header_is_a_client_error() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, "not-a-uuid".parse().unwrap());

        match current_user_from(&headers) {
            Err(ApiError::BadRequest(msg)) => {
                assert!(msg.contains("not-a-uuid"), "message should echo the value: {msg}")
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }
}
