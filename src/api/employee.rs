use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

use crate::model::employee::EmployeeRecord;
use crate::utils::db_utils::{SqlValue, build_update, execute_update};
use crate::utils::query::{BindValue, FilterBuilder};
use crate::utils::validation::{
    ValidationErrors, normalize_email, normalize_employee_id, normalize_full_name,
    parse_department,
};

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    #[schema(example = "John Doe")]
    pub full_name: String,
    #[schema(example = "john.doe@company.com", format = "email")]
    pub email: String,
    #[schema(example = "Engineering")]
    pub department: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub employee_id: Option<String>,
    pub full_name: Option<String>,
    #[schema(format = "email")]
    pub email: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    /// Case-insensitive substring match against name, employee ID, or email
    pub search: Option<String>,
    /// Exact department match
    pub department: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    #[schema(example = 2)]
    pub count: usize,
    pub results: Vec<EmployeeRecord>,
}

// Tallies are correlated subqueries so reads never depend on stored counters.
const EMPLOYEE_SELECT: &str = r#"
SELECT
    e.id,
    e.employee_id,
    e.full_name,
    e.email,
    e.department,
    e.created_at,
    e.updated_at,
    (SELECT COUNT(*) FROM attendance a
      WHERE a.employee_id = e.id AND a.status = 'Present') AS total_present,
    (SELECT COUNT(*) FROM attendance a
      WHERE a.employee_id = e.id AND a.status = 'Absent') AS total_absent
FROM employees e
"#;

async fn fetch_employee(pool: &MySqlPool, id: u64) -> Result<Option<EmployeeRecord>, sqlx::Error> {
    let sql = format!("{EMPLOYEE_SELECT} WHERE e.id = ?");
    sqlx::query_as::<_, EmployeeRecord>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// List employees
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Employee list with per-status tallies", body = EmployeeListResponse)
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let mut filter = FilterBuilder::new();

    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        filter.search_like(&["e.full_name", "e.employee_id", "e.email"], search);
    }
    if let Some(department) = query.department.as_deref().filter(|s| !s.is_empty()) {
        filter.equals("e.department", BindValue::Str(department.to_string()));
    }

    let sql = format!(
        "{EMPLOYEE_SELECT}{} ORDER BY e.created_at DESC, e.id DESC",
        filter.where_clause()
    );
    debug!(sql = %sql, "Fetching employees");

    let results = filter
        .apply_as(sqlx::query_as::<_, EmployeeRecord>(&sql))
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, sql = %sql, "Failed to fetch employees");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        count: results.len(),
        results,
    }))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = EmployeeRecord),
        (status = 400, description = "Validation failed", body = Object, example = json!({
            "errors": { "employee_id": ["Employee ID can only contain letters, numbers, hyphens, and underscores."] },
            "message": "Validation failed. Please check the submitted data."
        }))
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();

    let employee_id = normalize_employee_id(&payload.employee_id);
    let full_name = normalize_full_name(&payload.full_name);
    let email = normalize_email(&payload.email);
    let department = parse_department(&payload.department);

    let (employee_id, full_name, email, department) =
        match (employee_id, full_name, email, department) {
            (Ok(id), Ok(name), Ok(email), Ok(dept)) => (id, name, email, dept),
            (id, name, email, dept) => {
                let mut errors = ValidationErrors::new();
                errors.collect("employee_id", id);
                errors.collect("full_name", name);
                errors.collect("email", email);
                errors.collect("department", dept);
                return Ok(errors.into_response());
            }
        };

    // Pre-check uniqueness for a field-level message; the unique keys stay the
    // backstop against concurrent writers.
    let mut errors = ValidationErrors::new();

    let id_taken = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE employee_id = ?")
        .bind(&employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to check employee_id uniqueness");
            ErrorInternalServerError("Internal Server Error")
        })?;
    if id_taken.is_some() {
        errors.add("employee_id", "employee with this employee id already exists.");
    }

    let email_taken = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to check email uniqueness");
            ErrorInternalServerError("Internal Server Error")
        })?;
    if email_taken.is_some() {
        errors.add("email", "employee with this email already exists.");
    }

    if !errors.is_empty() {
        return Ok(errors.into_response());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employees (employee_id, full_name, email, department)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&employee_id)
    .bind(&full_name)
    .bind(&email)
    .bind(department.as_ref())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            let id = res.last_insert_id();
            let created = fetch_employee(pool.get_ref(), id).await.map_err(|e| {
                error!(error = %e, id, "Failed to fetch created employee");
                ErrorInternalServerError("Internal Server Error")
            })?;
            match created {
                Some(record) => Ok(HttpResponse::Created().json(record)),
                None => {
                    error!(id, "Created employee missing on readback");
                    Err(ErrorInternalServerError("Internal Server Error"))
                }
            }
        }
        Err(e) => {
            // Unique-key race lost to a concurrent writer
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    let mut errors = ValidationErrors::new();
                    errors.add("employee_id", "employee with this employee id already exists.");
                    return Ok(errors.into_response());
                }
            }
            error!(error = %e, "Failed to create employee");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(
        ("id", Path, description = "Employee primary key")
    ),
    responses(
        (status = 200, description = "Employee found", body = EmployeeRecord),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();

    let employee = fetch_employee(pool.get_ref(), id).await.map_err(|e| {
        error!(error = %e, id, "Failed to fetch employee");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match employee {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}

/// Partially update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(
        ("id", Path, description = "Employee primary key")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = EmployeeRecord),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee"
)]
pub async fn update_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateEmployee>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    let payload = payload.into_inner();

    let exists = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE id = ?")
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to fetch employee");
            ErrorInternalServerError("Internal Server Error")
        })?;
    if exists.is_none() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    // Same field validations as create, applied only to supplied fields.
    let mut errors = ValidationErrors::new();
    let mut sets: Vec<(&str, SqlValue)> = Vec::new();
    let mut new_employee_id = None;
    let mut new_email = None;

    if let Some(raw) = payload.employee_id.as_deref() {
        match normalize_employee_id(raw) {
            Ok(value) => new_employee_id = Some(value),
            Err(message) => errors.add("employee_id", message),
        }
    }
    if let Some(raw) = payload.full_name.as_deref() {
        match normalize_full_name(raw) {
            Ok(value) => sets.push(("full_name", SqlValue::String(value))),
            Err(message) => errors.add("full_name", message),
        }
    }
    if let Some(raw) = payload.email.as_deref() {
        match normalize_email(raw) {
            Ok(value) => new_email = Some(value),
            Err(message) => errors.add("email", message),
        }
    }
    if let Some(raw) = payload.department.as_deref() {
        match parse_department(raw) {
            Ok(value) => sets.push(("department", SqlValue::String(value.to_string()))),
            Err(message) => errors.add("department", message),
        }
    }

    if !errors.is_empty() {
        return Ok(errors.into_response());
    }

    // Uniqueness checks exclude the record being updated.
    let mut errors = ValidationErrors::new();
    if let Some(value) = &new_employee_id {
        let taken = sqlx::query_scalar::<_, u64>(
            "SELECT id FROM employees WHERE employee_id = ? AND id <> ?",
        )
        .bind(value)
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to check employee_id uniqueness");
            ErrorInternalServerError("Internal Server Error")
        })?;
        if taken.is_some() {
            errors.add("employee_id", "employee with this employee id already exists.");
        }
    }
    if let Some(value) = &new_email {
        let taken =
            sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE email = ? AND id <> ?")
                .bind(value)
                .bind(id)
                .fetch_optional(pool.get_ref())
                .await
                .map_err(|e| {
                    error!(error = %e, id, "Failed to check email uniqueness");
                    ErrorInternalServerError("Internal Server Error")
                })?;
        if taken.is_some() {
            errors.add("email", "employee with this email already exists.");
        }
    }
    if !errors.is_empty() {
        return Ok(errors.into_response());
    }

    if let Some(value) = new_employee_id {
        sets.push(("employee_id", SqlValue::String(value)));
    }
    if let Some(value) = new_email {
        sets.push(("email", SqlValue::String(value)));
    }

    if !sets.is_empty() {
        let update = build_update("employees", sets, "id", id);
        execute_update(pool.get_ref(), update).await.map_err(|e| {
            error!(error = %e, id, "Failed to update employee");
            ErrorInternalServerError("Internal Server Error")
        })?;
    }

    let updated = fetch_employee(pool.get_ref(), id).await.map_err(|e| {
        error!(error = %e, id, "Failed to fetch updated employee");
        ErrorInternalServerError("Internal Server Error")
    })?;
    match updated {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(
        ("id", Path, description = "Employee primary key")
    ),
    responses(
        (status = 200, description = "Employee and its attendance records deleted", body = Object, example = json!({
            "message": "Employee \"John Doe\" has been deleted successfully."
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee"
)]
pub async fn delete_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();

    let full_name = sqlx::query_scalar::<_, String>("SELECT full_name FROM employees WHERE id = ?")
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to fetch employee");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(full_name) = full_name else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    // Attendance rows go with it via the cascading foreign key.
    sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete employee");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Employee \"{full_name}\" has been deleted successfully.")
    })))
}

/// Suggest the next free EMP-nnn code
#[utoipa::path(
    get,
    path = "/api/employees/next-id",
    responses(
        (status = 200, description = "Next unused employee code", body = Object, example = json!({
            "next_id": "EMP-004"
        }))
    ),
    tag = "Employee"
)]
pub async fn next_employee_id(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let codes = sqlx::query_scalar::<_, String>("SELECT employee_id FROM employees")
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch employee codes");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "next_id": next_code(codes.iter().map(String::as_str))
    })))
}

/// Next code in the EMP-nnn sequence; codes in other formats are ignored.
fn next_code<'a>(existing: impl Iterator<Item = &'a str>) -> String {
    let max = existing
        .filter_map(|code| code.strip_prefix("EMP-"))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("EMP-{:03}", max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_code_starts_at_one() {
        assert_eq!(next_code(std::iter::empty()), "EMP-001");
    }

    #[test]
    fn next_code_follows_the_highest_suffix() {
        let codes = ["EMP-001", "EMP-007", "EMP-003"];
        assert_eq!(next_code(codes.into_iter()), "EMP-008");
    }

    #[test]
    fn next_code_ignores_foreign_formats() {
        let codes = ["EMP-002", "CTR-900", "EMP-XYZ", "9000"];
        assert_eq!(next_code(codes.into_iter()), "EMP-003");
    }

    #[test]
    fn next_code_outgrows_the_padding() {
        let codes = ["EMP-999"];
        assert_eq!(next_code(codes.into_iter()), "EMP-1000");
    }
}
