use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use tracing::info;

use atelier_types::api::{AdminData, ContactSubmissionRequest, DataResponse, EnrollmentRequest};
use atelier_types::models::{NewContactSubmission, NewEnrollment};

use crate::auth::AppState;
use crate::error::{ApiError, run_db};

/// POST /enrollment
///
/// Public workshop registration form.
pub async fn create_enrollment(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<EnrollmentRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let new = NewEnrollment::try_from(req)?;

    let row = run_db(&state, "Failed to save enrollment", move |db| {
        db.insert_enrollment(&new)
    })
    .await?;

    info!(id = row.id, workshop = %row.workshop, locale = %row.locale, "Enrollment saved");
    Ok((StatusCode::CREATED, Json(DataResponse::new(row))))
}

/// POST /contact-submission
///
/// Public contact form.
pub async fn create_contact_submission(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<ContactSubmissionRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let new = NewContactSubmission::try_from(req)?;

    let row = run_db(&state, "Failed to save submission", move |db| {
        db.insert_contact_submission(&new)
    })
    .await?;

    info!(id = row.id, locale = %row.locale, "Contact submission saved");
    Ok((StatusCode::CREATED, Json(DataResponse::new(row))))
}

/// GET /admin/data
///
/// Both submission tables, newest first. Session required.
pub async fn admin_data(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<AdminData>>, ApiError> {
    let data = run_db(&state, "Failed to fetch data", |db| {
        Ok(AdminData {
            enrollments: db.list_enrollments()?,
            submissions: db.list_contact_submissions()?,
        })
    })
    .await?;

    Ok(Json(DataResponse::new(data)))
}
