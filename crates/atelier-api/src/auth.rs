use std::sync::Arc;

use axum::{Json, extract::State};
use axum_extra::extract::{
    WithRejection,
    cookie::{Cookie, CookieJar, SameSite},
};
use tracing::{info, warn};

use atelier_db::Database;
use atelier_types::api::{AuthStatus, LoginRequest, SuccessResponse};

use crate::error::ApiError;
use crate::session::{SESSION_COOKIE, SESSION_TTL_HOURS, SessionStore};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: Box<dyn SessionStore>,
    /// Shared operator password. `None` disables login.
    pub admin_password: Option<String>,
    /// Mark the session cookie `Secure` (production).
    pub secure_cookies: bool,
    /// Public site root, used for links out of the dashboard.
    pub base_url: String,
}

impl AppStateInner {
    /// True when the request carries a cookie naming a live session.
    pub fn is_authenticated(&self, jar: &CookieJar) -> bool {
        jar.get(SESSION_COOKIE)
            .is_some_and(|c| self.sessions.is_active(c.value(), chrono::Utc::now()))
    }
}

/// POST /admin/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<(CookieJar, Json<SuccessResponse>), ApiError> {
    let expected = state
        .admin_password
        .as_deref()
        .ok_or(ApiError::Configuration("Admin password not configured"))?;

    if req.password.as_deref() != Some(expected) {
        warn!("Rejected admin login attempt");
        return Err(ApiError::Unauthorized("Invalid password"));
    }

    let session = state.sessions.issue(chrono::Utc::now());
    let cookie = Cookie::build((SESSION_COOKIE, session.token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.secure_cookies)
        .max_age(time::Duration::hours(SESSION_TTL_HOURS))
        .build();

    info!("Admin session issued, expires {}", session.expires_at);
    Ok((jar.add(cookie), Json(SuccessResponse::ok())))
}

/// GET /admin/auth/check
pub async fn check(State(state): State<AppState>, jar: CookieJar) -> Json<AuthStatus> {
    Json(AuthStatus {
        authenticated: state.is_authenticated(&jar),
    })
}

/// POST /admin/auth/logout
///
/// Always succeeds, with or without a session.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.revoke(cookie.value());
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(SuccessResponse::ok()))
}
