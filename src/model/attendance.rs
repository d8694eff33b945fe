use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

/// Attendance row as returned by the API. `employee` is the owning employee's
/// primary key; name, code and department are joined in at query time for
/// display, never stored on the row.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "employee": 1,
        "employee_name": "John Doe",
        "employee_id": "EMP-001",
        "department": "Engineering",
        "date": "2026-01-05",
        "status": "Present",
        "note": "",
        "created_at": "2026-01-05T09:00:00Z",
        "updated_at": "2026-01-05T09:00:00Z"
    })
)]
pub struct AttendanceRecord {
    #[schema(example = 7)]
    pub id: u64,

    #[schema(example = 1)]
    pub employee: u64,

    #[schema(example = "John Doe")]
    pub employee_name: String,

    #[schema(example = "EMP-001")]
    pub employee_id: String,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "Present")]
    pub status: String,

    #[schema(example = "on site")]
    pub note: String,

    #[schema(example = "2026-01-05T09:00:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(example = "2026-01-05T09:00:00Z", value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_parses_exact_names_only() {
        assert_eq!(
            AttendanceStatus::from_str("Present").unwrap(),
            AttendanceStatus::Present
        );
        assert_eq!(
            AttendanceStatus::from_str("Absent").unwrap(),
            AttendanceStatus::Absent
        );
        assert!(AttendanceStatus::from_str("present").is_err());
        assert!(AttendanceStatus::from_str("Late").is_err());
    }
}
