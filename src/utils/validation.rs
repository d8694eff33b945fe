use std::collections::BTreeMap;
use std::str::FromStr;

use actix_web::HttpResponse;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;

use crate::model::attendance::AttendanceStatus;
use crate::model::department::Department;

pub const VALIDATION_FAILED: &str = "Validation failed. Please check the submitted data.";

const EMPLOYEE_ID_MAX: usize = 20;
const FULL_NAME_MAX: usize = 150;
const EMAIL_MAX: usize = 254;
const NOTE_MAX: usize = 255;

/// Field-level validation errors, aggregated so a response can report every
/// problem in one round trip.
#[derive(Debug, Default, Serialize)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Record the error side of a validator result under `field`.
    pub fn collect<T>(&mut self, field: &str, result: Result<T, String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_response(self) -> HttpResponse {
        HttpResponse::BadRequest().json(json!({
            "errors": self.0,
            "message": VALIDATION_FAILED,
        }))
    }
}

/// Trim + uppercase, then enforce the code format.
pub fn normalize_employee_id(raw: &str) -> Result<String, String> {
    let value = raw.trim().to_uppercase();
    if value.is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    if value.chars().count() > EMPLOYEE_ID_MAX {
        return Err(format!(
            "Ensure this field has no more than {EMPLOYEE_ID_MAX} characters."
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(
            "Employee ID can only contain letters, numbers, hyphens, and underscores.".to_string(),
        );
    }
    Ok(value)
}

pub fn normalize_full_name(raw: &str) -> Result<String, String> {
    let value = raw.trim();
    if value.chars().count() < 2 {
        return Err("Full name must be at least 2 characters.".to_string());
    }
    if value.chars().count() > FULL_NAME_MAX {
        return Err(format!(
            "Ensure this field has no more than {FULL_NAME_MAX} characters."
        ));
    }
    Ok(value.to_string())
}

pub fn normalize_email(raw: &str) -> Result<String, String> {
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    if value.chars().count() > EMAIL_MAX {
        return Err(format!(
            "Ensure this field has no more than {EMAIL_MAX} characters."
        ));
    }
    if !is_plausible_email(&value) {
        return Err("Enter a valid email address.".to_string());
    }
    Ok(value)
}

fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

pub fn parse_department(raw: &str) -> Result<Department, String> {
    Department::from_str(raw).map_err(|_| format!("\"{raw}\" is not a valid choice."))
}

pub fn parse_status(raw: &str) -> Result<AttendanceStatus, String> {
    AttendanceStatus::from_str(raw).map_err(|_| format!("\"{raw}\" is not a valid choice."))
}

pub fn validate_note(raw: &str) -> Result<(), String> {
    if raw.chars().count() > NOTE_MAX {
        return Err(format!(
            "Ensure this field has no more than {NOTE_MAX} characters."
        ));
    }
    Ok(())
}

pub fn validate_date_not_future(date: NaiveDate) -> Result<(), String> {
    if date > Utc::now().date_naive() {
        return Err("Cannot mark attendance for a future date.".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    #[test]
    fn employee_id_is_trimmed_and_uppercased() {
        assert_eq!(normalize_employee_id("  emp-001 ").unwrap(), "EMP-001");
        assert_eq!(normalize_employee_id("a_b-9").unwrap(), "A_B-9");
    }

    #[test]
    fn employee_id_with_space_is_rejected() {
        let err = normalize_employee_id("a b").unwrap_err();
        assert!(err.contains("letters, numbers, hyphens, and underscores"));
    }

    #[test]
    fn blank_employee_id_is_rejected() {
        assert!(normalize_employee_id("   ").is_err());
    }

    #[test]
    fn overlong_employee_id_is_rejected() {
        let long = "E".repeat(21);
        assert!(normalize_employee_id(&long).is_err());
        assert!(normalize_employee_id(&"E".repeat(20)).is_ok());
    }

    #[test]
    fn full_name_requires_two_characters_after_trim() {
        assert!(normalize_full_name(" J ").is_err());
        assert_eq!(normalize_full_name("  Jo  ").unwrap(), "Jo");
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  John.Doe@Company.COM ").unwrap(),
            "john.doe@company.com"
        );
    }

    #[test]
    fn malformed_email_is_rejected() {
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("a@b").is_err());
        assert!(normalize_email("@b.com").is_err());
        assert!(normalize_email("a@.com").is_err());
    }

    #[test]
    fn department_choices_are_enforced() {
        assert_eq!(parse_department("HR").unwrap(), Department::Hr);
        assert_eq!(parse_department("Other").unwrap(), Department::Other);
        let err = parse_department("Warp").unwrap_err();
        assert_eq!(err, "\"Warp\" is not a valid choice.");
    }

    #[test]
    fn note_length_is_capped() {
        assert!(validate_note(&"x".repeat(255)).is_ok());
        assert!(validate_note(&"x".repeat(256)).is_err());
    }

    #[test]
    fn future_dates_are_rejected() {
        let today = Utc::now().date_naive();
        assert!(validate_date_not_future(today).is_ok());
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap();
        assert_eq!(
            validate_date_not_future(tomorrow).unwrap_err(),
            "Cannot mark attendance for a future date."
        );
    }

    #[test]
    fn errors_aggregate_per_field() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());
        errors.collect("employee_id", normalize_employee_id("a b"));
        errors.collect("full_name", normalize_full_name("J"));
        errors.collect::<String>("email", Ok("ok@example.com".to_string()));
        assert!(!errors.is_empty());
        let body = serde_json::to_value(&errors).unwrap();
        assert!(body.get("employee_id").is_some());
        assert!(body.get("full_name").is_some());
        assert!(body.get("email").is_none());
    }
}
