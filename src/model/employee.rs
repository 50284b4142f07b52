use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": "6f1c1f8e-3f8e-4a51-9d6c-0a4a3c5d2b11",
        "employee_id": "EMP001",
        "full_name": "Alice Smith",
        "email": "alice@company.com",
        "department": "Engineering"
    })
)]
pub struct Employee {
    /// Storage-assigned identity, distinct from the business id.
    #[schema(example = "6f1c1f8e-3f8e-4a51-9d6c-0a4a3c5d2b11")]
    pub id: String,

    #[schema(example = "EMP001")]
    pub employee_id: String,

    #[schema(example = "Alice Smith")]
    pub full_name: String,

    #[schema(example = "alice@company.com")]
    pub email: String,

    #[schema(example = "Engineering")]
    pub department: String,
}

/// Key under which business ids compare equal. Every case-insensitive match of a
/// business id goes through this.
pub fn business_key(employee_id: &str) -> String {
    employee_id.to_lowercase()
}

/// Candidate employee, everything but the storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub employee_id: String,
    pub full_name: String,
    pub email: String,
    pub department: String,
}

impl NewEmployee {
    /// Trims every field and lowercases the email.
    pub fn normalized(self) -> Self {
        Self {
            employee_id: self.employee_id.trim().to_string(),
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            department: self.department.trim().to_string(),
        }
    }

    pub fn with_id(self, id: String) -> Employee {
        Employee {
            id,
            employee_id: self.employee_id,
            full_name: self.full_name,
            email: self.email,
            department: self.department,
        }
    }
}
