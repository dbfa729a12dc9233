use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

use atelier_types::models::{
    AdminUser, ContactSubmission, Locale, NewAdminUser, NewContactSubmission, NewEnrollment,
    WorkshopEnrollment,
};

use crate::{Database, Result};

const ENROLLMENT_COLUMNS: &str =
    "id, name, email, phone, workshop, preferred_date, message, locale, created_at";
const SUBMISSION_COLUMNS: &str = "id, name, email, subject, message, locale, created_at";
const ADMIN_USER_COLUMNS: &str = "id, username, email, role, created_at, last_login";

impl Database {
    // -- Workshop enrollments --

    pub fn insert_enrollment(&self, new: &NewEnrollment) -> Result<WorkshopEnrollment> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO workshop_enrollments (name, email, phone, workshop, preferred_date, message, locale)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING {ENROLLMENT_COLUMNS}"
            );
            let row = conn.query_row(
                &sql,
                rusqlite::params![
                    new.name,
                    new.email,
                    new.phone,
                    new.workshop,
                    new.preferred_date,
                    new.message,
                    new.locale.as_str(),
                ],
                enrollment_from_row,
            )?;
            Ok(row)
        })
    }

    /// Newest first.
    pub fn list_enrollments(&self) -> Result<Vec<WorkshopEnrollment>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {ENROLLMENT_COLUMNS} FROM workshop_enrollments
                 ORDER BY created_at DESC, id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], enrollment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Contact submissions --

    pub fn insert_contact_submission(
        &self,
        new: &NewContactSubmission,
    ) -> Result<ContactSubmission> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO contact_submissions (name, email, subject, message, locale)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING {SUBMISSION_COLUMNS}"
            );
            let row = conn.query_row(
                &sql,
                rusqlite::params![new.name, new.email, new.subject, new.message, new.locale.as_str()],
                submission_from_row,
            )?;
            Ok(row)
        })
    }

    /// Newest first.
    pub fn list_contact_submissions(&self) -> Result<Vec<ContactSubmission>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {SUBMISSION_COLUMNS} FROM contact_submissions
                 ORDER BY created_at DESC, id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], submission_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Admin users --

    /// Fails with `DbError::Conflict` when the username or email is taken.
    pub fn create_admin_user(&self, new: &NewAdminUser) -> Result<AdminUser> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO admin_users (username, email, role) VALUES (?1, ?2, ?3)
                 RETURNING {ADMIN_USER_COLUMNS}"
            );
            let row = conn.query_row(
                &sql,
                rusqlite::params![new.username, new.email, new.role],
                admin_user_from_row,
            )?;
            Ok(row)
        })
    }

    /// Oldest first.
    pub fn list_admin_users(&self) -> Result<Vec<AdminUser>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {ADMIN_USER_COLUMNS} FROM admin_users ORDER BY created_at ASC, id ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], admin_user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns the number of rows removed; an unknown id removes nothing.
    pub fn delete_admin_user(&self, id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM admin_users WHERE id = ?1", [id])?;
            Ok(removed)
        })
    }
}

// -- Row mapping --

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(_) => timestamp(row, idx).map(Some),
    }
}

fn locale(row: &Row<'_>, idx: usize) -> rusqlite::Result<Locale> {
    let raw: String = row.get(idx)?;
    raw.parse::<Locale>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn enrollment_from_row(row: &Row<'_>) -> rusqlite::Result<WorkshopEnrollment> {
    Ok(WorkshopEnrollment {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        workshop: row.get(4)?,
        preferred_date: row.get(5)?,
        message: row.get(6)?,
        locale: locale(row, 7)?,
        created_at: timestamp(row, 8)?,
    })
}

fn submission_from_row(row: &Row<'_>) -> rusqlite::Result<ContactSubmission> {
    Ok(ContactSubmission {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        subject: row.get(3)?,
        message: row.get(4)?,
        locale: locale(row, 5)?,
        created_at: timestamp(row, 6)?,
    })
}

fn admin_user_from_row(row: &Row<'_>) -> rusqlite::Result<AdminUser> {
    Ok(AdminUser {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        created_at: timestamp(row, 4)?,
        last_login: optional_timestamp(row, 5)?,
    })
}
