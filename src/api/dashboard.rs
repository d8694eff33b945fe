use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::Utc;
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct DepartmentCount {
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = 3)]
    pub count: i64,
}

#[derive(Serialize, ToSchema)]
#[schema(
    example = json!({
        "total_employees": 12,
        "total_departments": 4,
        "today_present": 9,
        "today_absent": 2,
        "today": "2026-01-05",
        "department_breakdown": [
            { "department": "Engineering", "count": 6 },
            { "department": "Sales", "count": 3 }
        ]
    })
)]
pub struct DashboardStats {
    pub total_employees: i64,
    pub total_departments: i64,
    pub today_present: i64,
    pub today_absent: i64,
    #[schema(example = "2026-01-05")]
    pub today: String,
    pub department_breakdown: Vec<DepartmentCount>,
}

/// Aggregate stats for the dashboard
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Headcount, today's attendance and department breakdown", body = DashboardStats)
    ),
    tag = "Dashboard"
)]
pub async fn dashboard_stats(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    // One clock for both the counts and the reported date
    let today = Utc::now().date_naive();

    let total_employees = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to count employees");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let total_departments =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT department) FROM employees")
            .fetch_one(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to count departments");
                ErrorInternalServerError("Internal Server Error")
            })?;

    let today_present = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendance WHERE `date` = ? AND status = 'Present'",
    )
    .bind(today)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to count today's present records");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let today_absent = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendance WHERE `date` = ? AND status = 'Absent'",
    )
    .bind(today)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to count today's absent records");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let department_breakdown = sqlx::query_as::<_, DepartmentCount>(
        "SELECT department, COUNT(*) AS `count` FROM employees GROUP BY department",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch department breakdown");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(DashboardStats {
        total_employees,
        total_departments,
        today_present,
        today_absent,
        today: today.to_string(),
        department_breakdown,
    }))
}
