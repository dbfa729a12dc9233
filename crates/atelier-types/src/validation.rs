use thiserror::Error;

use crate::api::{ContactSubmissionRequest, CreateAdminUserRequest, EnrollmentRequest};
use crate::models::{
    DEFAULT_ROLE, Locale, NewAdminUser, NewContactSubmission, NewEnrollment,
};

/// Column widths of the record tables.
pub mod limits {
    pub const NAME: usize = 255;
    pub const EMAIL: usize = 255;
    pub const PHONE: usize = 50;
    pub const WORKSHOP: usize = 255;
    pub const PREFERRED_DATE: usize = 255;
    pub const SUBJECT: usize = 255;
    pub const USERNAME: usize = 100;
    pub const ROLE: usize = 50;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Username and email are required")]
    MissingUserFields,

    #[error("Field '{field}' must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Unsupported locale '{0}'")]
    UnsupportedLocale(String),

    #[error("User ID is required")]
    MissingUserId,

    #[error("Invalid user ID '{0}'")]
    InvalidUserId(String),

    #[error("Invalid request body: {0}")]
    Body(String),
}

/// A present value that is not blank.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn within(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

fn within_opt(field: &'static str, value: Option<&str>, max: usize) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| within(field, v, max))
}

/// Omitted or empty means the default locale.
pub fn parse_locale(value: Option<String>) -> Result<Locale, ValidationError> {
    match present(value) {
        None => Ok(Locale::default()),
        Some(code) => code
            .parse()
            .map_err(|_| ValidationError::UnsupportedLocale(code)),
    }
}

pub fn parse_user_id(value: Option<String>) -> Result<i64, ValidationError> {
    let raw = present(value).ok_or(ValidationError::MissingUserId)?;
    raw.trim()
        .parse()
        .map_err(|_| ValidationError::InvalidUserId(raw))
}

impl TryFrom<EnrollmentRequest> for NewEnrollment {
    type Error = ValidationError;

    fn try_from(req: EnrollmentRequest) -> Result<Self, Self::Error> {
        let (Some(name), Some(email), Some(workshop)) =
            (present(req.name), present(req.email), present(req.workshop))
        else {
            return Err(ValidationError::MissingFields);
        };

        let phone = present(req.phone);
        let preferred_date = present(req.preferred_date);

        within("name", &name, limits::NAME)?;
        within("email", &email, limits::EMAIL)?;
        within("workshop", &workshop, limits::WORKSHOP)?;
        within_opt("phone", phone.as_deref(), limits::PHONE)?;
        within_opt("preferredDate", preferred_date.as_deref(), limits::PREFERRED_DATE)?;

        Ok(NewEnrollment {
            name,
            email,
            phone,
            workshop,
            preferred_date,
            message: present(req.message),
            locale: parse_locale(req.locale)?,
        })
    }
}

impl TryFrom<ContactSubmissionRequest> for NewContactSubmission {
    type Error = ValidationError;

    fn try_from(req: ContactSubmissionRequest) -> Result<Self, Self::Error> {
        let (Some(name), Some(email), Some(subject), Some(message)) = (
            present(req.name),
            present(req.email),
            present(req.subject),
            present(req.message),
        ) else {
            return Err(ValidationError::MissingFields);
        };

        within("name", &name, limits::NAME)?;
        within("email", &email, limits::EMAIL)?;
        within("subject", &subject, limits::SUBJECT)?;

        Ok(NewContactSubmission {
            name,
            email,
            subject,
            message,
            locale: parse_locale(req.locale)?,
        })
    }
}

impl TryFrom<CreateAdminUserRequest> for NewAdminUser {
    type Error = ValidationError;

    fn try_from(req: CreateAdminUserRequest) -> Result<Self, Self::Error> {
        let (Some(username), Some(email)) = (present(req.username), present(req.email)) else {
            return Err(ValidationError::MissingUserFields);
        };
        let role = present(req.role).unwrap_or_else(|| DEFAULT_ROLE.to_string());

        within("username", &username, limits::USERNAME)?;
        within("email", &email, limits::EMAIL)?;
        within("role", &role, limits::ROLE)?;

        Ok(NewAdminUser { username, email, role })
    }
}
