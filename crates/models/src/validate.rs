//! Field-level validators shared by expense and user records.

use chrono::NaiveDate;

use crate::errors::ModelError;

/// Wire format of every calendar date stored in a record.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Minimum length of a plaintext password.
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_required(field: &str, value: &str) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::invalid(format!("{field} is required")));
    }
    Ok(())
}

pub fn validate_email(field: &str, value: &str) -> Result<(), ModelError> {
    validate_required(field, value)?;
    let (local, domain) = value
        .split_once('@')
        .ok_or_else(|| ModelError::invalid(format!("{field} must be an email address")))?;
    if local.is_empty() || domain.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(ModelError::invalid(format!("{field} must be an email address")));
    }
    Ok(())
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ModelError> {
    // chrono accepts single-digit months and days; the stored form does not
    if value.len() != 10 {
        return Err(ModelError::invalid(format!("{field} must be in YYYY-MM-DD format")));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| ModelError::invalid(format!("{field} must be in YYYY-MM-DD format")))
}

pub fn validate_distance(value: f64) -> Result<(), ModelError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ModelError::invalid("kilometrina must be a non-negative number"));
    }
    Ok(())
}

pub fn validate_password(value: &str) -> Result<(), ModelError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ModelError::invalid(format!("geslo must be at least {MIN_PASSWORD_LEN} characters")));
    }
    Ok(())
}
