use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::error::HrError;
use crate::model::employee::{Employee, NewEmployee};
use crate::service::EmployeeDirectory;
use crate::utils::validation::{
    EMPLOYEE_ID_MAX, TEXT_FIELD_MAX, require_email, require_length,
};

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP001", value_type = String)]
    pub employee_id: String,
    #[schema(example = "Alice Smith", value_type = String)]
    pub full_name: String,
    #[schema(example = "alice@company.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "Engineering", value_type = String)]
    pub department: String,
}

impl CreateEmployee {
    fn validate(self) -> Result<NewEmployee, HrError> {
        require_length("employee_id", &self.employee_id, EMPLOYEE_ID_MAX)?;
        require_length("full_name", &self.full_name, TEXT_FIELD_MAX)?;
        require_email(&self.email)?;
        require_length("department", &self.department, TEXT_FIELD_MAX)?;

        Ok(NewEmployee {
            employee_id: self.employee_id,
            full_name: self.full_name,
            email: self.email,
            department: self.department,
        })
    }
}

/// List Employees
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "All employees ordered by employee_id", body = [Employee])
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    directory: web::Data<EmployeeDirectory>,
) -> Result<impl Responder, HrError> {
    let employees = directory.list().await?;
    debug!(count = employees.len(), "Listed employees");
    Ok(HttpResponse::Ok().json(employees))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Employee),
        (status = 409, description = "Employee ID or email already exists", body = Object, example = json!({
            "detail": "Employee ID already exists"
        })),
        (status = 422, description = "Validation error", body = Object, example = json!({
            "detail": "email must contain an @ symbol"
        }))
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    directory: web::Data<EmployeeDirectory>,
    payload: web::Json<CreateEmployee>,
) -> Result<impl Responder, HrError> {
    let candidate = payload.into_inner().validate()?;
    let employee = directory.create(candidate).await?;
    Ok(HttpResponse::Created().json(employee))
}

/// Delete Employee
///
/// Also removes every attendance record of the employee.
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Business employee id, e.g. EMP001")
    ),
    responses(
        (status = 204, description = "Employee and attendance deleted"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "detail": "Employee not found"
        }))
    ),
    tag = "Employee"
)]
pub async fn delete_employee(
    directory: web::Data<EmployeeDirectory>,
    path: web::Path<String>,
) -> Result<impl Responder, HrError> {
    let employee_id = path.into_inner();
    directory.delete(&employee_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
