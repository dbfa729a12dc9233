use axum::{
    Json,
    extract::{Query, State},
};
use axum_extra::extract::WithRejection;
use tracing::info;

use atelier_types::api::{
    CreateAdminUserRequest, DeleteAdminUserQuery, SuccessResponse, UserResponse, UsersResponse,
};
use atelier_types::models::NewAdminUser;
use atelier_types::validation::parse_user_id;

use crate::auth::AppState;
use crate::error::{ApiError, run_db};

// All handlers here sit behind `require_session`.

/// GET /admin/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>, ApiError> {
    let users = run_db(&state, "Failed to fetch users", |db| db.list_admin_users()).await?;

    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}

/// POST /admin/users
pub async fn create_user(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateAdminUserRequest>, ApiError>,
) -> Result<Json<UserResponse>, ApiError> {
    let new = NewAdminUser::try_from(req)?;

    let user = run_db(&state, "Failed to create user", move |db| {
        db.create_admin_user(&new)
    })
    .await?;

    info!(id = user.id, username = %user.username, role = %user.role, "Admin user created");
    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// DELETE /admin/users?id=<n>
///
/// Unknown ids succeed without effect.
pub async fn delete_user(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<DeleteAdminUserQuery>, ApiError>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = parse_user_id(query.id)?;

    let removed = run_db(&state, "Failed to delete user", move |db| {
        db.delete_admin_user(id)
    })
    .await?;

    info!(id, removed, "Admin user delete");
    Ok(Json(SuccessResponse::ok()))
}
