//! Storage for employees and attendance.
//!
//! Both collections sit behind [`HrStore`] so the directory and the ledger receive an explicit
//! handle at construction time. The unique keys listed in [`UniqueKey`] are enforced by every
//! implementation at write time; callers treat [`StoreError::Duplicate`] as the authoritative
//! conflict signal.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use derive_more::{Display, From};

use crate::model::attendance::{AttendanceFilter, AttendanceRecord, NewAttendance, PresentCount};
use crate::model::employee::{Employee, NewEmployee};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Unique indexes enforced by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum UniqueKey {
    #[display(fmt = "employee_id")]
    EmployeeId,
    #[display(fmt = "email")]
    Email,
    #[display(fmt = "employee_id+date")]
    EmployeeDate,
}

impl UniqueKey {
    pub fn index_name(self) -> &'static str {
        match self {
            UniqueKey::EmployeeId => "uq_employees_employee_id",
            UniqueKey::Email => "uq_employees_email",
            UniqueKey::EmployeeDate => "uq_attendance_employee_date",
        }
    }
}

#[derive(Debug, Display, From)]
pub enum StoreError {
    #[display(fmt = "duplicate key on {}", _0)]
    #[from(ignore)]
    Duplicate(UniqueKey),

    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),

    #[display(fmt = "corrupt record: {}", _0)]
    #[from(ignore)]
    Corrupt(String),
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(e) => Some(e),
            _ => None,
        }
    }
}

/// Persistence for both collections.
///
/// Business ids are compared case-insensitively in every lookup.
#[async_trait]
pub trait HrStore: Send + Sync {
    /// Creates collections and indexes. Safe to call on every start.
    async fn ensure_indexes(&self) -> Result<(), StoreError>;

    /// All employees ordered by business id ascending.
    async fn list_employees(&self) -> Result<Vec<Employee>, StoreError>;

    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>, StoreError>;

    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>, StoreError>;

    /// Batch lookup in a single query.
    async fn find_employees(&self, employee_ids: &[String]) -> Result<Vec<Employee>, StoreError>;

    /// Fails with `Duplicate(EmployeeId | Email)` when a unique key is taken.
    async fn insert_employee(&self, employee: NewEmployee) -> Result<Employee, StoreError>;

    /// Returns the number of removed employees (0 or 1).
    async fn delete_employee(&self, employee_id: &str) -> Result<u64, StoreError>;

    /// Fails with `Duplicate(EmployeeDate)` when the day is already marked.
    async fn insert_attendance(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError>;

    /// Matching records, newest date first.
    async fn find_attendance(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, StoreError>;

    async fn delete_attendance_for(&self, employee_id: &str) -> Result<u64, StoreError>;

    /// Present-day counts grouped by business id, ascending. Employees without a
    /// `Present` mark do not appear.
    async fn count_present(&self) -> Result<Vec<PresentCount>, StoreError>;
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
