use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::HrError;
use crate::model::attendance::{
    AttendanceFilter, AttendanceRecord, AttendanceStatus, AttendanceWithEmployee, PresentDaysSummary,
};
use crate::service::AttendanceLedger;
use crate::utils::validation::{EMPLOYEE_ID_MAX, require_length};

#[derive(Deserialize, Serialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = "EMP001", value_type = String)]
    pub employee_id: String,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Present")]
    pub status: AttendanceStatus,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    #[schema(example = "EMP001")]
    /// Filter by business employee id
    pub employee_id: Option<String>,
    #[schema(example = "2024-01-01", format = "date", value_type = Option<String>)]
    #[param(value_type = Option<String>)]
    /// Inclusive lower bound
    pub from_date: Option<NaiveDate>,
    #[schema(example = "2024-01-31", format = "date", value_type = Option<String>)]
    #[param(value_type = Option<String>)]
    /// Inclusive upper bound
    pub to_date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct DateRangeQuery {
    #[schema(example = "2024-01-01", format = "date", value_type = Option<String>)]
    #[param(value_type = Option<String>)]
    /// Inclusive lower bound
    pub from_date: Option<NaiveDate>,
    #[schema(example = "2024-01-31", format = "date", value_type = Option<String>)]
    #[param(value_type = Option<String>)]
    /// Inclusive upper bound
    pub to_date: Option<NaiveDate>,
}

/// Mark attendance
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 201, description = "Attendance recorded", body = AttendanceRecord),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "detail": "Employee not found"
        })),
        (status = 409, description = "Already marked for this date", body = Object, example = json!({
            "detail": "Attendance already recorded for this employee on this date"
        })),
        (status = 422, description = "Validation error")
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    ledger: web::Data<AttendanceLedger>,
    payload: web::Json<MarkAttendance>,
) -> Result<impl Responder, HrError> {
    let payload = payload.into_inner();
    require_length("employee_id", &payload.employee_id, EMPLOYEE_ID_MAX)?;

    let record = ledger
        .mark(&payload.employee_id, payload.date, payload.status)
        .await?;
    Ok(HttpResponse::Created().json(record))
}

/// List attendance
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Attendance newest first", body = [AttendanceWithEmployee])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    ledger: web::Data<AttendanceLedger>,
    query: web::Query<AttendanceQuery>,
) -> Result<impl Responder, HrError> {
    let query = query.into_inner();
    let rows = ledger
        .list(AttendanceFilter {
            employee_id: query.employee_id,
            from_date: query.from_date,
            to_date: query.to_date,
        })
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// List attendance of one employee
#[utoipa::path(
    get,
    path = "/api/attendance/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Business employee id, e.g. EMP001"),
        DateRangeQuery
    ),
    responses(
        (status = 200, description = "Attendance newest first", body = [AttendanceWithEmployee]),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "detail": "Employee not found"
        }))
    ),
    tag = "Attendance"
)]
pub async fn list_employee_attendance(
    ledger: web::Data<AttendanceLedger>,
    path: web::Path<String>,
    query: web::Query<DateRangeQuery>,
) -> Result<impl Responder, HrError> {
    let employee_id = path.into_inner();
    let rows = ledger
        .list_for_employee(&employee_id, query.from_date, query.to_date)
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Present days per employee
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    responses(
        (status = 200, description = "One row per employee with at least one Present mark", body = [PresentDaysSummary])
    ),
    tag = "Attendance"
)]
pub async fn attendance_summary(
    ledger: web::Data<AttendanceLedger>,
) -> Result<impl Responder, HrError> {
    Ok(HttpResponse::Ok().json(ledger.summarize().await?))
}
