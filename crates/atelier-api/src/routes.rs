use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::middleware::require_session;
use crate::{dashboard, records, users};

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/enrollment", post(records::create_enrollment))
        .route("/contact-submission", post(records::create_contact_submission))
        .route("/admin/auth/login", post(auth::login))
        .route("/admin/auth/check", get(auth::check))
        .route("/admin/auth/logout", post(auth::logout))
        .route("/admin", get(dashboard::dashboard))
        .route("/admin/login", get(dashboard::login_page))
        .route("/health", get(health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/admin/data", get(records::admin_data))
        .route(
            "/admin/users",
            get(users::list_users)
                .post(users::create_user)
                .delete(users::delete_user),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_session))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// GET /health
///
/// Liveness check (no auth).
async fn health() -> &'static str {
    "ok"
}
