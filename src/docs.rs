use crate::api::attendance::{
    AttendanceListResponse, AttendanceSummary, CreateAttendance, EmployeeAttendanceResponse,
    UpdateAttendance,
};
use crate::api::dashboard::{DashboardStats, DepartmentCount};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, UpdateEmployee};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::department::Department;
use crate::model::employee::EmployeeRecord;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rollcall API",
        version = "1.0.0",
        description = r#"
## Employee attendance tracking

Backend for a small attendance register: employee records, one
Present/Absent entry per employee per day, and aggregate views.

### Key features
- **Employees** — create, search, update and delete employee profiles
- **Attendance** — mark and correct daily Present/Absent records
- **Summaries** — per-employee attendance rate over any date range
- **Dashboard** — headcount, today's attendance and department breakdown

### Response format
- JSON responses; list endpoints wrap results as `{count, results}`
- Validation failures return `{errors, message}` with HTTP 400

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::list_employees,
        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::next_employee_id,

        crate::api::attendance::list_attendance,
        crate::api::attendance::create_attendance,
        crate::api::attendance::get_attendance,
        crate::api::attendance::update_attendance,
        crate::api::attendance::delete_attendance,
        crate::api::attendance::employee_attendance,

        crate::api::dashboard::dashboard_stats,
    ),
    components(
        schemas(
            CreateEmployee,
            UpdateEmployee,
            EmployeeRecord,
            EmployeeListResponse,
            CreateAttendance,
            UpdateAttendance,
            AttendanceRecord,
            AttendanceListResponse,
            AttendanceSummary,
            EmployeeAttendanceResponse,
            DashboardStats,
            DepartmentCount,
            Department,
            AttendanceStatus
        )
    ),
    tags(
        (name = "Employee", description = "Employee management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Dashboard", description = "Aggregate statistics APIs"),
    )
)]
pub struct ApiDoc;
