//! Bearer-token authentication for the business API.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::startup::AppState;

/// Reject requests without a valid `Authorization: Bearer <token>` header.
/// Verified claims are inserted as a request extension for handlers that
/// need the acting user.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing bearer token")))?;

    let claims = state.jwt.verify_token(token)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
