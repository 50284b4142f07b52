//! Attendance Ledger: one mark per employee per day, range listing and presence counts.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::EmployeeDirectory;
use crate::error::HrError;
use crate::model::attendance::{
    AttendanceFilter, AttendanceRecord, AttendanceStatus, AttendanceWithEmployee, NewAttendance,
    PresentDaysSummary,
};
use crate::model::employee::business_key;
use crate::store::{HrStore, StoreError};

/// Shown in the summary when a counted employee no longer exists.
pub const MISSING_EMPLOYEE_NAME: &str = "—";

const DUPLICATE_DAY: &str = "Attendance already recorded for this employee on this date";

#[derive(Clone)]
pub struct AttendanceLedger {
    store: Arc<dyn HrStore>,
    directory: EmployeeDirectory,
}

impl AttendanceLedger {
    pub fn new(store: Arc<dyn HrStore>, directory: EmployeeDirectory) -> Self {
        Self { store, directory }
    }

    /// Records one status for one employee on one day.
    ///
    /// The (employee, date) unique key decides duplicates; there is no pre-check.
    pub async fn mark(
        &self,
        employee_id: &str,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, HrError> {
        let employee = self.directory.require(employee_id).await?;

        let record = NewAttendance {
            employee_id: employee.employee_id,
            date,
            status,
        };

        match self.store.insert_attendance(record).await {
            Ok(record) => {
                info!(employee_id = %record.employee_id, date = %record.date, status = %record.status, "Attendance marked");
                Ok(record)
            }
            Err(StoreError::Duplicate(_)) => {
                warn!(employee_id, date = %date, "Attendance already marked");
                Err(HrError::Conflict(DUPLICATE_DAY.into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Matching records newest first, each decorated with its employee's name.
    pub async fn list(&self, mut filter: AttendanceFilter) -> Result<Vec<AttendanceWithEmployee>, HrError> {
        filter.employee_id = filter.employee_id.map(|id| id.trim().to_string());
        let records = self.store.find_attendance(&filter).await?;

        let ids: Vec<String> = records
            .iter()
            .map(|r| r.employee_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let employees = self.directory.find_many(&ids).await?;
        debug!(records = records.len(), employees = employees.len(), "Decorating attendance");

        Ok(records
            .into_iter()
            .map(|record| {
                let name = employees
                    .get(&business_key(&record.employee_id))
                    .map(|e| e.full_name.clone());
                AttendanceWithEmployee::decorate(record, name)
            })
            .collect())
    }

    /// Same as [`list`](Self::list) scoped to one existing employee.
    pub async fn list_for_employee(
        &self,
        employee_id: &str,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceWithEmployee>, HrError> {
        let employee = self.directory.require(employee_id).await?;

        let filter = AttendanceFilter {
            employee_id: Some(employee.employee_id.clone()),
            from_date,
            to_date,
        };
        let records = self.store.find_attendance(&filter).await?;

        Ok(records
            .into_iter()
            .map(|record| AttendanceWithEmployee::decorate(record, Some(employee.full_name.clone())))
            .collect())
    }

    /// Present-day counts per employee, ascending by business id. Employees with no
    /// `Present` mark are left out.
    pub async fn summarize(&self) -> Result<Vec<PresentDaysSummary>, HrError> {
        let counts = self.store.count_present().await?;
        if counts.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = counts.iter().map(|c| c.employee_id.clone()).collect();
        let employees = self.directory.find_many(&ids).await?;

        let mut summary: Vec<PresentDaysSummary> = counts
            .into_iter()
            .map(|count| PresentDaysSummary {
                full_name: employees
                    .get(&business_key(&count.employee_id))
                    .map(|e| e.full_name.clone())
                    .unwrap_or_else(|| MISSING_EMPLOYEE_NAME.to_string()),
                employee_id: count.employee_id,
                present_days: count.present_days,
            })
            .collect();
        summary.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));
        Ok(summary)
    }
}
