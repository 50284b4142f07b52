use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::employee::business_key;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = "0b8e4d52-7b0f-4c8e-a3b4-5b1f3d2f9a10")]
    pub id: String,
    /// Business id of the employee.
    #[schema(example = "EMP001")]
    pub employee_id: String,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    pub employee_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

impl NewAttendance {
    pub fn with_id(self, id: String) -> AttendanceRecord {
        AttendanceRecord {
            id,
            employee_id: self.employee_id,
            date: self.date,
            status: self.status,
        }
    }
}

/// Attendance record decorated with the owning employee's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "0b8e4d52-7b0f-4c8e-a3b4-5b1f3d2f9a10",
    "employee_id": "EMP001",
    "date": "2024-01-01",
    "status": "Present",
    "employee_identifier": "EMP001",
    "employee_name": "Alice Smith"
}))]
pub struct AttendanceWithEmployee {
    pub id: String,
    pub employee_id: String,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub employee_identifier: Option<String>,
    /// `None` when the employee record no longer exists.
    pub employee_name: Option<String>,
}

impl AttendanceWithEmployee {
    pub fn decorate(record: AttendanceRecord, employee_name: Option<String>) -> Self {
        Self {
            employee_identifier: Some(record.employee_id.clone()),
            id: record.id,
            employee_id: record.employee_id,
            date: record.date,
            status: record.status,
            employee_name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceFilter {
    pub employee_id: Option<String>,
    /// Inclusive lower bound.
    pub from_date: Option<NaiveDate>,
    /// Inclusive upper bound.
    pub to_date: Option<NaiveDate>,
}

impl AttendanceFilter {
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        if let Some(employee_id) = &self.employee_id {
            if business_key(employee_id) != business_key(&record.employee_id) {
                return false;
            }
        }
        if self.from_date.is_some_and(|from| record.date < from) {
            return false;
        }
        if self.to_date.is_some_and(|to| record.date > to) {
            return false;
        }
        true
    }
}

/// Raw aggregation row: present days per business id.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PresentCount {
    pub employee_id: String,
    pub present_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "employee_id": "EMP001",
    "full_name": "Alice Smith",
    "present_days": 12
}))]
pub struct PresentDaysSummary {
    pub employee_id: String,
    pub full_name: String,
    pub present_days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record(employee_id: &str, day: u32) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("{employee_id}-{day}"),
            employee_id: employee_id.into(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            status: AttendanceStatus::Present,
        }
    }

    #[test]
    fn status_parses_exact_names_only() {
        assert_eq!(AttendanceStatus::from_str("Present").unwrap(), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::from_str("Absent").unwrap(), AttendanceStatus::Absent);
        assert!(AttendanceStatus::from_str("present").is_err());
        assert!(AttendanceStatus::from_str("Late").is_err());
        assert_eq!(AttendanceStatus::Absent.as_ref(), "Absent");
    }

    #[test]
    fn status_serializes_as_variant_name() {
        let json = serde_json::to_string(&AttendanceStatus::Present).unwrap();
        assert_eq!(json, "\"Present\"");
        assert!(serde_json::from_str::<AttendanceStatus>("\"Maybe\"").is_err());
    }

    #[test]
    fn filter_range_is_inclusive() {
        let filter = AttendanceFilter {
            employee_id: None,
            from_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            to_date: NaiveDate::from_ymd_opt(2024, 1, 4),
        };

        assert!(!filter.matches(&record("EMP001", 1)));
        assert!(filter.matches(&record("EMP001", 2)));
        assert!(filter.matches(&record("EMP001", 4)));
        assert!(!filter.matches(&record("EMP001", 5)));
    }

    #[test]
    fn filter_employee_id_ignores_case() {
        let filter = AttendanceFilter {
            employee_id: Some("emp001".into()),
            ..Default::default()
        };

        assert!(filter.matches(&record("EMP001", 1)));
        assert!(!filter.matches(&record("EMP002", 1)));
    }

    #[test]
    fn filter_employee_id_folds_non_ascii() {
        let filter = AttendanceFilter {
            employee_id: Some("émp001".into()),
            ..Default::default()
        };

        assert!(filter.matches(&record("ÉMP001", 1)));
    }

    #[test]
    fn decorate_repeats_business_id() {
        let decorated = AttendanceWithEmployee::decorate(record("EMP001", 1), None);
        assert_eq!(decorated.employee_identifier.as_deref(), Some("EMP001"));
        assert_eq!(decorated.employee_name, None);
    }
}
