//! Client-token identity middleware.
//!
//! Requests carry an opaque token in the `X-Client-Token` header. The first
//! request from a client may omit it; a fresh token is minted, the user row
//! is created, and the token is echoed back in the response header so the
//! client can persist it for subsequent requests.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::db::Repository;

/// Header name for the opaque client token, on both request and response.
pub const CLIENT_TOKEN_HEADER: &str = "x-client-token";

/// Identity layer: resolve the request's token to a user, minting a token
/// when none was supplied.
///
/// The resolved `User` is stored in request extensions for handlers to read
/// via `Extension<User>`. This cannot fail on valid input; only database
/// errors surface.
pub async fn identity_layer(repo: Arc<Repository>, mut request: Request, next: Next) -> Response {
    let supplied = request
        .headers()
        .get(CLIENT_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    let minted = supplied.is_none();
    let token = supplied.unwrap_or_else(|| Uuid::new_v4().to_string());

    let user = match repo.resolve_user(&token).await {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(user);

    let mut response = next.run(request).await;

    if minted {
        if let Ok(value) = HeaderValue::from_str(&token) {
            response.headers_mut().insert(CLIENT_TOKEN_HEADER, value);
        }
    }

    response
}
