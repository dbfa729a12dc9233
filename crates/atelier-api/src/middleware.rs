use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::AppState;
use crate::error::ApiError;

/// Reject requests that do not carry a live admin session cookie.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.is_authenticated(&jar) {
        return Err(ApiError::Unauthorized("Unauthorized"));
    }
    Ok(next.run(req).await)
}
