//! Employee Directory: owns employee records, their uniqueness, and the cascade to attendance.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::HrError;
use crate::model::employee::{Employee, NewEmployee, business_key};
use crate::store::{HrStore, StoreError, UniqueKey};

const DUPLICATE_ID: &str = "Employee ID already exists";
const DUPLICATE_EMAIL: &str = "Email already registered";

#[derive(Clone)]
pub struct EmployeeDirectory {
    store: Arc<dyn HrStore>,
}

impl EmployeeDirectory {
    pub fn new(store: Arc<dyn HrStore>) -> Self {
        Self { store }
    }

    /// All employees, ascending by business id.
    pub async fn list(&self) -> Result<Vec<Employee>, HrError> {
        Ok(self.store.list_employees().await?)
    }

    pub async fn find(&self, employee_id: &str) -> Result<Option<Employee>, HrError> {
        Ok(self.store.find_employee(employee_id.trim()).await?)
    }

    /// Like [`find`](Self::find) but absence is a `NotFound` error.
    pub async fn require(&self, employee_id: &str) -> Result<Employee, HrError> {
        self.find(employee_id).await?.ok_or_else(|| {
            warn!(employee_id, "Employee not found");
            HrError::employee_not_found()
        })
    }

    /// One batch lookup; result is keyed by [`business_key`].
    pub async fn find_many(&self, employee_ids: &[String]) -> Result<HashMap<String, Employee>, HrError> {
        let employees = self.store.find_employees(employee_ids).await?;
        Ok(employees
            .into_iter()
            .map(|e| (business_key(&e.employee_id), e))
            .collect())
    }

    /// Normalizes and persists a new employee.
    ///
    /// The existence checks only produce the friendlier message up front; a concurrent
    /// writer that slips past them is still stopped by the store's unique keys, which map
    /// to the same `Conflict`.
    pub async fn create(&self, candidate: NewEmployee) -> Result<Employee, HrError> {
        let candidate = candidate.normalized();

        if self.store.find_employee(&candidate.employee_id).await?.is_some() {
            warn!(employee_id = %candidate.employee_id, "Duplicate employee id");
            return Err(HrError::Conflict(DUPLICATE_ID.into()));
        }
        if self.store.find_employee_by_email(&candidate.email).await?.is_some() {
            warn!(employee_id = %candidate.employee_id, "Duplicate email");
            return Err(HrError::Conflict(DUPLICATE_EMAIL.into()));
        }

        match self.store.insert_employee(candidate).await {
            Ok(employee) => {
                info!(employee_id = %employee.employee_id, id = %employee.id, "Employee created");
                Ok(employee)
            }
            Err(StoreError::Duplicate(key)) => {
                warn!(key = %key, "Employee insert lost a uniqueness race");
                let message = match key {
                    UniqueKey::Email => DUPLICATE_EMAIL,
                    _ => DUPLICATE_ID,
                };
                Err(HrError::Conflict(message.into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the employee and every attendance mark that references it.
    ///
    /// Attendance goes first: if the second step fails the employee survives with no
    /// attendance, never attendance without an employee.
    pub async fn delete(&self, employee_id: &str) -> Result<(), HrError> {
        let employee = self.require(employee_id).await?;

        let removed_marks = self.store.delete_attendance_for(&employee.employee_id).await?;
        let removed = self.store.delete_employee(&employee.employee_id).await?;
        if removed == 0 {
            // Deleted concurrently between lookup and delete.
            return Err(HrError::employee_not_found());
        }

        info!(employee_id = %employee.employee_id, removed_marks, "Employee deleted");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::attendance::{AttendanceFilter, AttendanceStatus, NewAttendance};
    use crate::store::MemoryStore;
    use crate::store::memory::YieldingStore;
    use chrono::NaiveDate;

    pub(crate) fn candidate(employee_id: &str, email: &str) -> NewEmployee {
        NewEmployee {
            employee_id: employee_id.into(),
            full_name: format!("Name of {}", employee_id.trim()),
            email: email.into(),
            department: "Engineering".into(),
        }
    }

    fn directory() -> (Arc<MemoryStore>, EmployeeDirectory) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), EmployeeDirectory::new(store))
    }

    #[actix_web::test]
    async fn create_normalizes_and_lists_once() {
        let (_, directory) = directory();
        let created = directory
            .create(NewEmployee {
                employee_id: " EMP001 ".into(),
                full_name: "  Alice Smith ".into(),
                email: " Alice@X.COM ".into(),
                department: " Engineering".into(),
            })
            .await
            .unwrap();

        assert_eq!(created.employee_id, "EMP001");
        assert_eq!(created.email, "alice@x.com");

        let listed = directory.list().await.unwrap();
        assert_eq!(listed, vec![created]);
        assert_eq!(listed[0].full_name, "Alice Smith");
        assert_eq!(listed[0].department, "Engineering");
    }

    #[actix_web::test]
    async fn list_is_ordered_by_business_id() {
        let (_, directory) = directory();
        for (id, email) in [("EMP003", "c@x.com"), ("EMP001", "a@x.com"), ("EMP002", "b@x.com")] {
            directory.create(candidate(id, email)).await.unwrap();
        }

        let ids: Vec<String> = directory.list().await.unwrap().into_iter().map(|e| e.employee_id).collect();
        assert_eq!(ids, vec!["EMP001", "EMP002", "EMP003"]);
    }

    #[actix_web::test]
    async fn duplicate_business_id_conflicts() {
        let (_, directory) = directory();
        directory.create(candidate("EMP001", "a@x.com")).await.unwrap();

        for variant in ["EMP001", " EMP001 ", "emp001"] {
            let err = directory.create(candidate(variant, "other@x.com")).await.unwrap_err();
            assert!(matches!(err, HrError::Conflict(ref m) if m == DUPLICATE_ID), "{variant}");
        }
    }

    #[actix_web::test]
    async fn duplicate_email_conflicts_after_normalization() {
        let (_, directory) = directory();
        directory.create(candidate("EMP001", "alice@x.com")).await.unwrap();

        let err = directory.create(candidate("EMP002", "  ALICE@x.com ")).await.unwrap_err();
        assert!(matches!(err, HrError::Conflict(ref m) if m == DUPLICATE_EMAIL));
        assert_eq!(directory.list().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn concurrent_creates_yield_one_winner() {
        let store = Arc::new(YieldingStore::default());
        let directory = EmployeeDirectory::new(store.clone());
        let (a, b) = futures::future::join(
            directory.create(candidate("EMP001", "a@x.com")),
            directory.create(candidate("emp001", "b@x.com")),
        )
        .await;

        // Both calls got past the existence checks; the unique key decided.
        assert_eq!(YieldingStore::inserts(&store.employee_inserts), 2);
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let loser = if a.is_err() { a } else { b };
        assert!(matches!(loser, Err(HrError::Conflict(ref m)) if m == DUPLICATE_ID));
        assert_eq!(directory.list().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn store_backstop_maps_to_conflict() {
        // A row that the pre-check cannot see yet still trips the unique key.
        struct RacingStore(MemoryStore);

        #[async_trait::async_trait]
        impl HrStore for RacingStore {
            async fn ensure_indexes(&self) -> Result<(), StoreError> {
                Ok(())
            }
            async fn list_employees(&self) -> Result<Vec<Employee>, StoreError> {
                self.0.list_employees().await
            }
            async fn find_employee(&self, _: &str) -> Result<Option<Employee>, StoreError> {
                Ok(None)
            }
            async fn find_employee_by_email(&self, _: &str) -> Result<Option<Employee>, StoreError> {
                Ok(None)
            }
            async fn find_employees(&self, ids: &[String]) -> Result<Vec<Employee>, StoreError> {
                self.0.find_employees(ids).await
            }
            async fn insert_employee(&self, e: NewEmployee) -> Result<Employee, StoreError> {
                self.0.insert_employee(e).await
            }
            async fn delete_employee(&self, id: &str) -> Result<u64, StoreError> {
                self.0.delete_employee(id).await
            }
            async fn insert_attendance(
                &self,
                r: NewAttendance,
            ) -> Result<crate::model::attendance::AttendanceRecord, StoreError> {
                self.0.insert_attendance(r).await
            }
            async fn find_attendance(
                &self,
                f: &AttendanceFilter,
            ) -> Result<Vec<crate::model::attendance::AttendanceRecord>, StoreError> {
                self.0.find_attendance(f).await
            }
            async fn delete_attendance_for(&self, id: &str) -> Result<u64, StoreError> {
                self.0.delete_attendance_for(id).await
            }
            async fn count_present(
                &self,
            ) -> Result<Vec<crate::model::attendance::PresentCount>, StoreError> {
                self.0.count_present().await
            }
        }

        let directory = EmployeeDirectory::new(Arc::new(RacingStore(MemoryStore::new())));
        directory.create(candidate("EMP001", "a@x.com")).await.unwrap();

        let by_id = directory.create(candidate("EMP001", "b@x.com")).await.unwrap_err();
        assert!(matches!(by_id, HrError::Conflict(ref m) if m == DUPLICATE_ID));

        let by_email = directory.create(candidate("EMP002", "a@x.com")).await.unwrap_err();
        assert!(matches!(by_email, HrError::Conflict(ref m) if m == DUPLICATE_EMAIL));
    }

    #[actix_web::test]
    async fn delete_missing_is_not_found() {
        let (_, directory) = directory();
        let err = directory.delete("EMP404").await.unwrap_err();
        assert!(matches!(err, HrError::NotFound(_)));
    }

    #[actix_web::test]
    async fn delete_cascades_to_attendance() {
        let (store, directory) = directory();
        directory.create(candidate("EMP001", "a@x.com")).await.unwrap();
        directory.create(candidate("EMP002", "b@x.com")).await.unwrap();
        for (id, day) in [("EMP001", 1), ("EMP001", 2), ("EMP002", 1)] {
            store
                .insert_attendance(NewAttendance {
                    employee_id: id.into(),
                    date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
                    status: AttendanceStatus::Present,
                })
                .await
                .unwrap();
        }

        directory.delete("emp001").await.unwrap();

        let remaining: Vec<String> = directory.list().await.unwrap().into_iter().map(|e| e.employee_id).collect();
        assert_eq!(remaining, vec!["EMP002"]);
        let marks = store.find_attendance(&AttendanceFilter::default()).await.unwrap();
        assert!(marks.iter().all(|m| m.employee_id == "EMP002"));
        assert_eq!(marks.len(), 1);
    }
}
