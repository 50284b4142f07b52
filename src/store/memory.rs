use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{HrStore, StoreError, UniqueKey, new_id};
use crate::model::attendance::{
    AttendanceFilter, AttendanceRecord, AttendanceStatus, NewAttendance, PresentCount,
};
use crate::model::employee::{Employee, NewEmployee, business_key};

/// In-process store for `memory://` URLs and tests.
///
/// Every write checks and updates its unique keys under one lock, so concurrent writers
/// see the same one-winner behaviour as the MySQL indexes.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

#[derive(Default)]
struct Collections {
    /// Keyed by folded business id.
    employees: BTreeMap<String, Employee>,
    /// email -> folded business id
    emails: HashMap<String, String>,
    /// Keyed by (folded business id, date).
    attendance: BTreeMap<(String, NaiveDate), AttendanceRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes an employee without touching attendance. Simulates records
    /// edited outside the directory.
    #[cfg(test)]
    pub(crate) fn remove_employee_only(&self, employee_id: &str) {
        let mut collections = self.lock();
        if let Some(employee) = collections.employees.remove(&business_key(employee_id)) {
            collections.emails.remove(&employee.email);
        }
    }
}

#[async_trait]
impl HrStore for MemoryStore {
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, StoreError> {
        let collections = self.lock();
        let mut employees: Vec<Employee> = collections.employees.values().cloned().collect();
        employees.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));
        Ok(employees)
    }

    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>, StoreError> {
        Ok(self.lock().employees.get(&business_key(employee_id)).cloned())
    }

    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>, StoreError> {
        let collections = self.lock();
        Ok(collections
            .emails
            .get(email)
            .and_then(|key| collections.employees.get(key))
            .cloned())
    }

    async fn find_employees(&self, employee_ids: &[String]) -> Result<Vec<Employee>, StoreError> {
        let collections = self.lock();
        let mut found: BTreeMap<String, Employee> = BTreeMap::new();
        for employee_id in employee_ids {
            let key = business_key(employee_id);
            if let Some(employee) = collections.employees.get(&key) {
                found.insert(key, employee.clone());
            }
        }
        Ok(found.into_values().collect())
    }

    async fn insert_employee(&self, employee: NewEmployee) -> Result<Employee, StoreError> {
        let mut collections = self.lock();
        let key = business_key(&employee.employee_id);
        if collections.employees.contains_key(&key) {
            return Err(StoreError::Duplicate(UniqueKey::EmployeeId));
        }
        if collections.emails.contains_key(&employee.email) {
            return Err(StoreError::Duplicate(UniqueKey::Email));
        }

        let employee = employee.with_id(new_id());
        collections.emails.insert(employee.email.clone(), key.clone());
        collections.employees.insert(key, employee.clone());
        Ok(employee)
    }

    async fn delete_employee(&self, employee_id: &str) -> Result<u64, StoreError> {
        let mut collections = self.lock();
        match collections.employees.remove(&business_key(employee_id)) {
            Some(employee) => {
                collections.emails.remove(&employee.email);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn insert_attendance(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let mut collections = self.lock();
        let key = (business_key(&record.employee_id), record.date);
        if collections.attendance.contains_key(&key) {
            return Err(StoreError::Duplicate(UniqueKey::EmployeeDate));
        }

        let record = record.with_id(new_id());
        collections.attendance.insert(key, record.clone());
        Ok(record)
    }

    async fn find_attendance(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, StoreError> {
        let collections = self.lock();
        let mut records: Vec<AttendanceRecord> = collections
            .attendance
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.employee_id.cmp(&b.employee_id)));
        Ok(records)
    }

    async fn delete_attendance_for(&self, employee_id: &str) -> Result<u64, StoreError> {
        let mut collections = self.lock();
        let key = business_key(employee_id);
        let before = collections.attendance.len();
        collections.attendance.retain(|(owner, _), _| *owner != key);
        Ok((before - collections.attendance.len()) as u64)
    }

    async fn count_present(&self) -> Result<Vec<PresentCount>, StoreError> {
        let collections = self.lock();
        let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
        for record in collections.attendance.values() {
            if record.status == AttendanceStatus::Present {
                *counts.entry(record.employee_id.as_str()).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(employee_id, present_days)| PresentCount {
                employee_id: employee_id.to_string(),
                present_days,
            })
            .collect())
    }
}

/// Wraps a [`MemoryStore`] and yields to the executor before every call, so joined
/// operations interleave their reads and writes.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct YieldingStore {
    inner: MemoryStore,
    pub(crate) employee_inserts: std::sync::atomic::AtomicUsize,
    pub(crate) attendance_inserts: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl YieldingStore {
    pub(crate) fn inserts(counter: &std::sync::atomic::AtomicUsize) -> usize {
        counter.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl HrStore for YieldingStore {
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        actix_web::rt::task::yield_now().await;
        self.inner.ensure_indexes().await
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, StoreError> {
        actix_web::rt::task::yield_now().await;
        self.inner.list_employees().await
    }

    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>, StoreError> {
        actix_web::rt::task::yield_now().await;
        self.inner.find_employee(employee_id).await
    }

    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>, StoreError> {
        actix_web::rt::task::yield_now().await;
        self.inner.find_employee_by_email(email).await
    }

    async fn find_employees(&self, employee_ids: &[String]) -> Result<Vec<Employee>, StoreError> {
        actix_web::rt::task::yield_now().await;
        self.inner.find_employees(employee_ids).await
    }

    async fn insert_employee(&self, employee: NewEmployee) -> Result<Employee, StoreError> {
        actix_web::rt::task::yield_now().await;
        self.employee_inserts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.inner.insert_employee(employee).await
    }

    async fn delete_employee(&self, employee_id: &str) -> Result<u64, StoreError> {
        actix_web::rt::task::yield_now().await;
        self.inner.delete_employee(employee_id).await
    }

    async fn insert_attendance(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        actix_web::rt::task::yield_now().await;
        self.attendance_inserts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.inner.insert_attendance(record).await
    }

    async fn find_attendance(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, StoreError> {
        actix_web::rt::task::yield_now().await;
        self.inner.find_attendance(filter).await
    }

    async fn delete_attendance_for(&self, employee_id: &str) -> Result<u64, StoreError> {
        actix_web::rt::task::yield_now().await;
        self.inner.delete_attendance_for(employee_id).await
    }

    async fn count_present(&self) -> Result<Vec<PresentCount>, StoreError> {
        actix_web::rt::task::yield_now().await;
        self.inner.count_present().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(employee_id: &str, email: &str) -> NewEmployee {
        NewEmployee {
            employee_id: employee_id.into(),
            full_name: format!("Name of {employee_id}"),
            email: email.into(),
            department: "Engineering".into(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn mark(employee_id: &str, d: u32, status: AttendanceStatus) -> NewAttendance {
        NewAttendance {
            employee_id: employee_id.into(),
            date: day(d),
            status,
        }
    }

    #[actix_web::test]
    async fn insert_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let a = store.insert_employee(candidate("EMP001", "a@x.com")).await.unwrap();
        let b = store.insert_employee(candidate("EMP002", "b@x.com")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_ne!(a.id, a.employee_id);
    }

    #[actix_web::test]
    async fn unique_keys_reject_duplicates() {
        let store = MemoryStore::new();
        store.insert_employee(candidate("EMP001", "a@x.com")).await.unwrap();

        let by_id = store.insert_employee(candidate("emp001", "other@x.com")).await;
        assert!(matches!(by_id, Err(StoreError::Duplicate(UniqueKey::EmployeeId))));

        let by_email = store.insert_employee(candidate("EMP002", "a@x.com")).await;
        assert!(matches!(by_email, Err(StoreError::Duplicate(UniqueKey::Email))));

        store.insert_attendance(mark("EMP001", 1, AttendanceStatus::Present)).await.unwrap();
        let twice = store.insert_attendance(mark("EMP001", 1, AttendanceStatus::Absent)).await;
        assert!(matches!(twice, Err(StoreError::Duplicate(UniqueKey::EmployeeDate))));
    }

    #[actix_web::test]
    async fn deleted_email_can_be_reused() {
        let store = MemoryStore::new();
        store.insert_employee(candidate("EMP001", "a@x.com")).await.unwrap();
        assert_eq!(store.delete_employee("EMP001").await.unwrap(), 1);
        assert_eq!(store.delete_employee("EMP001").await.unwrap(), 0);

        store.insert_employee(candidate("EMP009", "a@x.com")).await.unwrap();
    }

    #[actix_web::test]
    async fn find_attendance_sorts_newest_first() {
        let store = MemoryStore::new();
        for d in [3, 1, 2] {
            store.insert_attendance(mark("EMP001", d, AttendanceStatus::Present)).await.unwrap();
        }

        let dates: Vec<NaiveDate> = store
            .find_attendance(&AttendanceFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(dates, vec![day(3), day(2), day(1)]);
    }

    #[actix_web::test]
    async fn delete_attendance_only_touches_one_employee() {
        let store = MemoryStore::new();
        store.insert_attendance(mark("EMP001", 1, AttendanceStatus::Present)).await.unwrap();
        store.insert_attendance(mark("EMP001", 2, AttendanceStatus::Absent)).await.unwrap();
        store.insert_attendance(mark("EMP002", 1, AttendanceStatus::Present)).await.unwrap();

        assert_eq!(store.delete_attendance_for("emp001").await.unwrap(), 2);
        let left = store.find_attendance(&AttendanceFilter::default()).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].employee_id, "EMP002");
    }

    #[actix_web::test]
    async fn count_present_skips_absent_only() {
        let store = MemoryStore::new();
        store.insert_attendance(mark("EMP002", 1, AttendanceStatus::Present)).await.unwrap();
        store.insert_attendance(mark("EMP002", 2, AttendanceStatus::Present)).await.unwrap();
        store.insert_attendance(mark("EMP001", 1, AttendanceStatus::Present)).await.unwrap();
        store.insert_attendance(mark("EMP003", 1, AttendanceStatus::Absent)).await.unwrap();

        let counts = store.count_present().await.unwrap();
        assert_eq!(
            counts,
            vec![
                PresentCount { employee_id: "EMP001".into(), present_days: 1 },
                PresentCount { employee_id: "EMP002".into(), present_days: 2 },
            ]
        );
    }
}
