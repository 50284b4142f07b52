use crate::api::attendance::{AttendanceQuery, DateRangeQuery, MarkAttendance};
use crate::api::employee::CreateEmployee;
use crate::model::attendance::{
    AttendanceRecord, AttendanceStatus, AttendanceWithEmployee, PresentDaysSummary,
};
use crate::model::employee::Employee;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRMS Lite API",
        version = "1.0.0",
        description = r#"
## HRMS Lite

A lightweight **Human Resource Management** API for employee records and daily attendance.

### 🔹 Key Features
- **Employee Directory**
  - Create, list and delete employees (deleting an employee removes its attendance)
  - `employee_id` and `email` are unique; emails are stored lowercased
- **Attendance Ledger**
  - One `Present` / `Absent` mark per employee per day
  - Date-range listing, newest first, with the employee's name attached
  - Present-day summary per employee

### 📦 Response Format
- JSON bodies, ISO dates (`YYYY-MM-DD`)
- Errors carry a `detail` message: 404 not found, 409 conflict, 422 validation

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::list_employees,
        crate::api::employee::create_employee,
        crate::api::employee::delete_employee,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::list_employee_attendance,
        crate::api::attendance::attendance_summary
    ),
    components(
        schemas(
            Employee,
            CreateEmployee,
            AttendanceStatus,
            AttendanceRecord,
            AttendanceWithEmployee,
            PresentDaysSummary,
            MarkAttendance,
            AttendanceQuery,
            DateRangeQuery
        )
    ),
    tags(
        (name = "Employee", description = "Employee directory APIs"),
        (name = "Attendance", description = "Attendance ledger APIs"),
    )
)]
pub struct ApiDoc;
