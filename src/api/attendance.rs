use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::utils::db_utils::{SqlValue, build_update, execute_update};
use crate::utils::query::{BindValue, FilterBuilder};
use crate::utils::validation::{
    ValidationErrors, parse_status, validate_date_not_future, validate_note,
};

#[derive(Deserialize, ToSchema)]
pub struct CreateAttendance {
    /// Owning employee primary key
    #[schema(example = 1)]
    pub employee: u64,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "Present")]
    pub status: String,
    #[schema(example = "on site")]
    pub note: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateAttendance {
    pub employee: Option<u64>,
    #[schema(value_type = String, format = "date")]
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AttendanceQuery {
    /// Filter by owning employee primary key
    pub employee_id: Option<u64>,
    /// Exact date
    #[param(value_type = String, format = "date")]
    pub date: Option<NaiveDate>,
    /// Inclusive lower bound
    #[param(value_type = String, format = "date")]
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound
    #[param(value_type = String, format = "date")]
    pub date_to: Option<NaiveDate>,
    /// Present or Absent
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeAttendanceQuery {
    #[param(value_type = String, format = "date")]
    pub date_from: Option<NaiveDate>,
    #[param(value_type = String, format = "date")]
    pub date_to: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    #[schema(example = 2)]
    pub count: usize,
    pub results: Vec<AttendanceRecord>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceSummary {
    #[schema(example = 4)]
    pub total: usize,
    #[schema(example = 3)]
    pub present: usize,
    #[schema(example = 1)]
    pub absent: usize,
    #[schema(example = 75.0)]
    pub attendance_rate: f64,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeAttendanceResponse {
    /// Employee primary key
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    pub summary: AttendanceSummary,
    pub records: Vec<AttendanceRecord>,
}

#[derive(sqlx::FromRow)]
struct AttendanceKey {
    employee_id: u64,
    date: NaiveDate,
}

// Employee name/code/department are joined in for display, never duplicated
// onto the attendance row.
const ATTENDANCE_SELECT: &str = r#"
SELECT
    a.id,
    a.employee_id AS employee,
    e.full_name AS employee_name,
    e.employee_id AS employee_id,
    e.department AS department,
    a.`date` AS `date`,
    a.status,
    a.note,
    a.created_at,
    a.updated_at
FROM attendance a
INNER JOIN employees e ON e.id = a.employee_id
"#;

async fn fetch_record(pool: &MySqlPool, id: u64) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    let sql = format!("{ATTENDANCE_SELECT} WHERE a.id = ?");
    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

fn conflict_response(date: NaiveDate) -> HttpResponse {
    let message = format!("Attendance for this employee on {date} already exists. Use PUT to update.");
    HttpResponse::Conflict().json(json!({
        "errors": { "non_field_errors": [message.clone()] },
        "message": message,
    }))
}

/// round(present / total * 100, 1), 0 when there are no records.
pub(crate) fn attendance_rate(present: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (present as f64 / total as f64 * 1000.0).round() / 10.0
}

/// List attendance records
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Attendance records, newest date first", body = AttendanceListResponse)
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let mut filter = FilterBuilder::new();

    if let Some(employee_id) = query.employee_id {
        filter.equals("a.employee_id", BindValue::U64(employee_id));
    }
    if let Some(date) = query.date {
        filter.equals("a.`date`", BindValue::Date(date));
    }
    if let Some(date_from) = query.date_from {
        filter.on_or_after("a.`date`", date_from);
    }
    if let Some(date_to) = query.date_to {
        filter.on_or_before("a.`date`", date_to);
    }
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        filter.equals("a.status", BindValue::Str(status.to_string()));
    }

    let sql = format!(
        "{ATTENDANCE_SELECT}{} ORDER BY a.`date` DESC, a.id DESC",
        filter.where_clause()
    );
    debug!(sql = %sql, "Fetching attendance records");

    let results = filter
        .apply_as(sqlx::query_as::<_, AttendanceRecord>(&sql))
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, sql = %sql, "Failed to fetch attendance records");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        count: results.len(),
        results,
    }))
}

/// Mark attendance
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = CreateAttendance,
    responses(
        (status = 201, description = "Attendance recorded", body = AttendanceRecord),
        (status = 400, description = "Validation failed", body = Object, example = json!({
            "errors": { "date": ["Cannot mark attendance for a future date."] },
            "message": "Validation failed. Please check the submitted data."
        })),
        (status = 409, description = "Record already exists for this employee and date", body = Object, example = json!({
            "errors": { "non_field_errors": ["Attendance for this employee on 2026-01-05 already exists. Use PUT to update."] },
            "message": "Attendance for this employee on 2026-01-05 already exists. Use PUT to update."
        }))
    ),
    tag = "Attendance"
)]
pub async fn create_attendance(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAttendance>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let note = payload.note.unwrap_or_default();

    let mut errors = ValidationErrors::new();
    if let Err(message) = validate_date_not_future(payload.date) {
        errors.add("date", message);
    }
    if let Err(message) = validate_note(&note) {
        errors.add("note", message);
    }
    let status = match parse_status(&payload.status) {
        Ok(status) => status,
        Err(message) => {
            errors.add("status", message);
            return Ok(errors.into_response());
        }
    };
    if !errors.is_empty() {
        return Ok(errors.into_response());
    }

    let employee = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE id = ?")
        .bind(payload.employee)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee = payload.employee, "Failed to fetch employee");
            ErrorInternalServerError("Internal Server Error")
        })?;
    if employee.is_none() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "employee",
            format!("Invalid pk \"{}\" - object does not exist.", payload.employee),
        );
        return Ok(errors.into_response());
    }

    // Descriptive conflict before the unique key would fire
    let duplicate = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM attendance WHERE employee_id = ? AND `date` = ?",
    )
    .bind(payload.employee)
    .bind(payload.date)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee = payload.employee, "Failed to check for duplicate attendance");
        ErrorInternalServerError("Internal Server Error")
    })?;
    if duplicate.is_some() {
        return Ok(conflict_response(payload.date));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (employee_id, `date`, status, note)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee)
    .bind(payload.date)
    .bind(status.as_ref())
    .bind(&note)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            let id = res.last_insert_id();
            let created = fetch_record(pool.get_ref(), id).await.map_err(|e| {
                error!(error = %e, id, "Failed to fetch created attendance record");
                ErrorInternalServerError("Internal Server Error")
            })?;
            match created {
                Some(record) => Ok(HttpResponse::Created().json(record)),
                None => {
                    error!(id, "Created attendance record missing on readback");
                    Err(ErrorInternalServerError("Internal Server Error"))
                }
            }
        }
        Err(e) => {
            // Unique-key race lost to a concurrent writer for the same pair
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(conflict_response(payload.date));
                }
            }
            error!(error = %e, employee = payload.employee, "Failed to create attendance record");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/// Get attendance record by ID
#[utoipa::path(
    get,
    path = "/api/attendance/{id}",
    params(
        ("id", Path, description = "Attendance record ID")
    ),
    responses(
        (status = 200, description = "Record found", body = AttendanceRecord),
        (status = 404, description = "Record not found", body = Object, example = json!({
            "message": "Attendance record not found"
        }))
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();

    let record = fetch_record(pool.get_ref(), id).await.map_err(|e| {
        error!(error = %e, id, "Failed to fetch attendance record");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match record {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        }))),
    }
}

/// Partially update attendance record
#[utoipa::path(
    put,
    path = "/api/attendance/{id}",
    params(
        ("id", Path, description = "Attendance record ID")
    ),
    request_body = UpdateAttendance,
    responses(
        (status = 200, description = "Record updated", body = AttendanceRecord),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Record not found"),
        (status = 409, description = "Another record exists for the new employee/date pair")
    ),
    tag = "Attendance"
)]
pub async fn update_attendance(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAttendance>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    let payload = payload.into_inner();

    let existing = sqlx::query_as::<_, AttendanceKey>(
        "SELECT employee_id, `date` AS `date` FROM attendance WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to fetch attendance record");
        ErrorInternalServerError("Internal Server Error")
    })?;
    let Some(existing) = existing else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        })));
    };

    let mut errors = ValidationErrors::new();
    if let Some(date) = payload.date {
        if let Err(message) = validate_date_not_future(date) {
            errors.add("date", message);
        }
    }
    if let Some(note) = payload.note.as_deref() {
        if let Err(message) = validate_note(note) {
            errors.add("note", message);
        }
    }
    let status = match payload.status.as_deref() {
        Some(raw) => match parse_status(raw) {
            Ok(status) => Some(status),
            Err(message) => {
                errors.add("status", message);
                None
            }
        },
        None => None,
    };
    if !errors.is_empty() {
        return Ok(errors.into_response());
    }

    if let Some(employee) = payload.employee {
        let exists = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE id = ?")
            .bind(employee)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, employee, "Failed to fetch employee");
                ErrorInternalServerError("Internal Server Error")
            })?;
        if exists.is_none() {
            let mut errors = ValidationErrors::new();
            errors.add(
                "employee",
                format!("Invalid pk \"{employee}\" - object does not exist."),
            );
            return Ok(errors.into_response());
        }
    }

    // Re-check uniqueness only when the effective pair actually changes,
    // excluding the record being updated.
    let effective_employee = payload.employee.unwrap_or(existing.employee_id);
    let effective_date = payload.date.unwrap_or(existing.date);
    if (effective_employee, effective_date) != (existing.employee_id, existing.date) {
        let duplicate = sqlx::query_scalar::<_, u64>(
            "SELECT id FROM attendance WHERE employee_id = ? AND `date` = ? AND id <> ?",
        )
        .bind(effective_employee)
        .bind(effective_date)
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to check for duplicate attendance");
            ErrorInternalServerError("Internal Server Error")
        })?;
        if duplicate.is_some() {
            return Ok(conflict_response(effective_date));
        }
    }

    let mut sets: Vec<(&str, SqlValue)> = Vec::new();
    if let Some(employee) = payload.employee {
        sets.push(("employee_id", SqlValue::U64(employee)));
    }
    if let Some(date) = payload.date {
        sets.push(("`date`", SqlValue::Date(date)));
    }
    if let Some(status) = status {
        sets.push(("status", SqlValue::String(status.to_string())));
    }
    if let Some(note) = payload.note {
        sets.push(("note", SqlValue::String(note)));
    }

    if !sets.is_empty() {
        let update = build_update("attendance", sets, "id", id);
        execute_update(pool.get_ref(), update).await.map_err(|e| {
            error!(error = %e, id, "Failed to update attendance record");
            ErrorInternalServerError("Internal Server Error")
        })?;
    }

    let updated = fetch_record(pool.get_ref(), id).await.map_err(|e| {
        error!(error = %e, id, "Failed to fetch updated attendance record");
        ErrorInternalServerError("Internal Server Error")
    })?;
    match updated {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        }))),
    }
}

/// Delete attendance record
#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(
        ("id", Path, description = "Attendance record ID")
    ),
    responses(
        (status = 200, description = "Record deleted", body = Object, example = json!({
            "message": "Attendance record deleted."
        })),
        (status = 404, description = "Record not found")
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();

    let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete attendance record");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance record deleted."
    })))
}

/// Filtered attendance history for one employee, with a summary block
#[utoipa::path(
    get,
    path = "/api/employees/{id}/attendance",
    params(
        ("id", Path, description = "Employee primary key"),
        EmployeeAttendanceQuery
    ),
    responses(
        (status = 200, description = "Records plus summary", body = EmployeeAttendanceResponse),
        (status = 404, description = "Employee not found")
    ),
    tag = "Attendance"
)]
pub async fn employee_attendance(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<EmployeeAttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();

    let employee =
        sqlx::query_as::<_, (u64, String)>("SELECT id, full_name FROM employees WHERE id = ?")
            .bind(id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, id, "Failed to fetch employee");
                ErrorInternalServerError("Internal Server Error")
            })?;
    let Some((employee_id, employee_name)) = employee else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    let mut filter = FilterBuilder::new();
    filter.equals("a.employee_id", BindValue::U64(employee_id));
    if let Some(date_from) = query.date_from {
        filter.on_or_after("a.`date`", date_from);
    }
    if let Some(date_to) = query.date_to {
        filter.on_or_before("a.`date`", date_to);
    }
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        filter.equals("a.status", BindValue::Str(status.to_string()));
    }

    let sql = format!(
        "{ATTENDANCE_SELECT}{} ORDER BY a.`date` DESC, a.id DESC",
        filter.where_clause()
    );
    let records = filter
        .apply_as(sqlx::query_as::<_, AttendanceRecord>(&sql))
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, sql = %sql, "Failed to fetch attendance records");
            ErrorInternalServerError("Database error")
        })?;

    let total = records.len();
    let present = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present.as_ref())
        .count();
    let absent = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Absent.as_ref())
        .count();

    Ok(HttpResponse::Ok().json(EmployeeAttendanceResponse {
        employee_id,
        employee_name,
        summary: AttendanceSummary {
            total,
            present,
            absent,
            attendance_rate: attendance_rate(present, total),
        },
        records,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_zero_without_records() {
        assert_eq!(attendance_rate(0, 0), 0.0);
    }

    #[test]
    fn rate_rounds_to_one_decimal() {
        assert_eq!(attendance_rate(3, 4), 75.0);
        assert_eq!(attendance_rate(1, 3), 33.3);
        assert_eq!(attendance_rate(2, 3), 66.7);
        assert_eq!(attendance_rate(4, 4), 100.0);
    }
}
