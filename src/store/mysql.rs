use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlQueryResult;
use tracing::{debug, info};

use super::{HrStore, StoreError, UniqueKey, new_id};
use crate::model::attendance::{
    AttendanceFilter, AttendanceRecord, AttendanceStatus, NewAttendance, PresentCount,
};
use crate::model::employee::{Employee, NewEmployee};

// Business ids use a case-insensitive collation so uniqueness, lookups and the
// cascade all agree on what "the same employee" means.
const CREATE_EMPLOYEES: &str = r#"
    CREATE TABLE IF NOT EXISTS employees (
        id CHAR(36) NOT NULL,
        employee_id VARCHAR(50) CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci NOT NULL,
        full_name VARCHAR(255) NOT NULL,
        email VARCHAR(254) NOT NULL,
        department VARCHAR(255) NOT NULL,
        PRIMARY KEY (id),
        UNIQUE KEY uq_employees_employee_id (employee_id),
        UNIQUE KEY uq_employees_email (email)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

const CREATE_ATTENDANCE: &str = r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id CHAR(36) NOT NULL,
        employee_id VARCHAR(50) CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci NOT NULL,
        date DATE NOT NULL,
        status VARCHAR(16) NOT NULL,
        PRIMARY KEY (id),
        UNIQUE KEY uq_attendance_employee_date (employee_id, date),
        KEY idx_attendance_date (date),
        KEY idx_attendance_employee_id (employee_id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

/// Index definition checked on every start.
struct IndexSpec {
    table: &'static str,
    name: &'static str,
    columns: &'static str,
    unique: bool,
}

impl IndexSpec {
    fn create_sql(&self) -> String {
        let kind = if self.unique { "UNIQUE INDEX" } else { "INDEX" };
        format!("CREATE {kind} {} ON {} ({})", self.name, self.table, self.columns)
    }
}

// Tables created by an older build may predate some of these.
const INDEXES: &[IndexSpec] = &[
    IndexSpec { table: "employees", name: "uq_employees_employee_id", columns: "employee_id", unique: true },
    IndexSpec { table: "employees", name: "uq_employees_email", columns: "email", unique: true },
    IndexSpec { table: "attendance", name: "uq_attendance_employee_date", columns: "employee_id, date", unique: true },
    IndexSpec { table: "attendance", name: "idx_attendance_date", columns: "date", unique: false },
    IndexSpec { table: "attendance", name: "idx_attendance_employee_id", columns: "employee_id", unique: false },
];

const EMPLOYEE_COLUMNS: &str = "id, employee_id, full_name, email, department";

/// MySQL-backed store over a shared connection pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AttendanceRow {
    id: String,
    employee_id: String,
    date: NaiveDate,
    status: String,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::from_str(&row.status).map_err(|_| {
            StoreError::Corrupt(format!("attendance {} has status {:?}", row.id, row.status))
        })?;

        Ok(Self {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            status,
        })
    }
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    Str(&'a str),
    Date(NaiveDate),
}

/// Maps a duplicate-key failure (MySQL 1062) to the violated index. `keys` lists the
/// unique keys of the target table, first one used when the server message names none.
/// Other integrity errors share SQLSTATE 23000 and stay `Database`.
fn classify(err: sqlx::Error, keys: &[UniqueKey]) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = db_err.message();
            let key = keys
                .iter()
                .find(|key| message.contains(key.index_name()))
                .or_else(|| keys.first());
            if let Some(key) = key {
                return StoreError::Duplicate(*key);
            }
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl HrStore for MySqlStore {
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_EMPLOYEES).execute(&self.pool).await?;
        sqlx::query(CREATE_ATTENDANCE).execute(&self.pool).await?;

        for index in INDEXES {
            let present = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*) FROM information_schema.statistics
                WHERE table_schema = DATABASE() AND table_name = ? AND index_name = ?
                "#,
            )
            .bind(index.table)
            .bind(index.name)
            .fetch_one(&self.pool)
            .await?;

            if present == 0 {
                info!(table = index.table, index = index.name, "Creating missing index");
                sqlx::query(&index.create_sql()).execute(&self.pool).await?;
            }
        }
        Ok(())
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, StoreError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY employee_id ASC");
        let employees = sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }

    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>, StoreError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>, StoreError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ?");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn find_employees(&self, employee_ids: &[String]) -> Result<Vec<Employee>, StoreError> {
        if employee_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; employee_ids.len()].join(", ");
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id IN ({placeholders})");
        debug!(sql = %sql, count = employee_ids.len(), "Batch employee lookup");

        let mut query = sqlx::query_as::<_, Employee>(&sql);
        for employee_id in employee_ids {
            query = query.bind(employee_id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn insert_employee(&self, employee: NewEmployee) -> Result<Employee, StoreError> {
        let employee = employee.with_id(new_id());

        sqlx::query(
            r#"
            INSERT INTO employees (id, employee_id, full_name, email, department)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.employee_id)
        .bind(&employee.full_name)
        .bind(&employee.email)
        .bind(&employee.department)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, &[UniqueKey::EmployeeId, UniqueKey::Email]))?;

        Ok(employee)
    }

    async fn delete_employee(&self, employee_id: &str) -> Result<u64, StoreError> {
        let result: MySqlQueryResult = sqlx::query("DELETE FROM employees WHERE employee_id = ?")
            .bind(employee_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_attendance(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let record = record.with_id(new_id());

        sqlx::query(
            r#"
            INSERT INTO attendance (id, employee_id, date, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.employee_id)
        .bind(record.date)
        .bind(record.status.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, &[UniqueKey::EmployeeDate]))?;

        Ok(record)
    }

    async fn find_attendance(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(employee_id) = filter.employee_id.as_deref() {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::Str(employee_id));
        }

        if let Some(from_date) = filter.from_date {
            where_sql.push_str(" AND date >= ?");
            args.push(FilterValue::Date(from_date));
        }

        if let Some(to_date) = filter.to_date {
            where_sql.push_str(" AND date <= ?");
            args.push(FilterValue::Date(to_date));
        }

        let sql = format!(
            "SELECT id, employee_id, date, status FROM attendance{} ORDER BY date DESC, employee_id ASC",
            where_sql
        );
        debug!(sql = %sql, "Fetching attendance");

        let mut query = sqlx::query_as::<_, AttendanceRow>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::Str(s) => query.bind(s),
                FilterValue::Date(d) => query.bind(d),
            };
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(AttendanceRecord::try_from)
            .collect()
    }

    async fn delete_attendance_for(&self, employee_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM attendance WHERE employee_id = ?")
            .bind(employee_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_present(&self) -> Result<Vec<PresentCount>, StoreError> {
        let counts = sqlx::query_as::<_, PresentCount>(
            r#"
            SELECT employee_id, COUNT(*) AS present_days
            FROM attendance
            WHERE status = ?
            GROUP BY employee_id
            ORDER BY employee_id ASC
            "#,
        )
        .bind(AttendanceStatus::Present.as_ref())
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }
}
