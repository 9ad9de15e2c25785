use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySql, MySqlPool, QueryBuilder};

use super::{
    AttendanceRepository, BonusRepository, EmployeeRepository, FinancialRepository,
    WashRepository,
};
use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::bonus::{BonusPayment, NewBonusPayment};
use crate::model::employee::Employee;
use crate::model::financial::{FinancialEntry, LedgerFilter};
use crate::model::wash::{CargoWasherEntry, CarretaWash, DirtyWasherEntry, WashFilter};
use crate::service::window::{DateRange, YearMonth};

/// Repository over the shared MySQL pool.
#[derive(Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Appends the wash filters; the wash table must be aliased `w` and joined
/// to `clients c`.
pub(crate) fn push_wash_filters(qb: &mut QueryBuilder<'_, MySql>, filter: &WashFilter) {
    if let Some(kind) = filter.kind {
        qb.push(" AND w.wash_kind = ").push_bind(kind.as_ref().to_string());
    }
    if let Some(client_id) = filter.client_id {
        qb.push(" AND w.client_id = ").push_bind(client_id);
    }
    if let Some(name) = &filter.client_name {
        qb.push(" AND c.name LIKE ").push_bind(format!("%{}%", name));
    }
    if let Some(range) = filter.range {
        qb.push(" AND w.date BETWEEN ")
            .push_bind(range.start)
            .push(" AND ")
            .push_bind(range.end);
    }
}

fn wash_query<'a>(table: &str, filter: &WashFilter) -> QueryBuilder<'a, MySql> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT w.* FROM {table} w LEFT JOIN clients c ON c.id = w.client_id WHERE 1 = 1"
    ));
    push_wash_filters(&mut qb, filter);
    qb.push(" ORDER BY w.date DESC, w.id DESC");
    qb
}

/// Appends the ledger filters to a query already holding a `WHERE` clause.
pub(crate) fn push_ledger_filters(qb: &mut QueryBuilder<'_, MySql>, filter: &LedgerFilter) {
    if let Some(year) = filter.year {
        qb.push(" AND year = ").push_bind(year);
    }
    if let Some(month) = filter.month {
        qb.push(" AND month = ").push_bind(month);
    }
    if let Some(range) = filter.range {
        qb.push(" AND date BETWEEN ")
            .push_bind(range.start)
            .push(" AND ")
            .push_bind(range.end);
    }
}

#[async_trait]
impl EmployeeRepository for MySqlRepository {
    async fn find_employee(&self, id: u64) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn active_employees(&self) -> Result<Vec<Employee>, AppError> {
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE active = TRUE ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(employees)
    }
}

#[async_trait]
impl AttendanceRepository for MySqlRepository {
    async fn upsert_attendance(
        &self,
        employee_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError> {
        sqlx::query(
            r#"
            INSERT INTO attendance_records (employee_id, date, status)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE status = VALUES(status)
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .bind(status.as_ref())
        .execute(&self.pool)
        .await?;

        let record = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance_records WHERE employee_id = ? AND date = ?",
        )
        .bind(employee_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn attendance_in_range(
        &self,
        employee_id: u64,
        range: DateRange,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT * FROM attendance_records
            WHERE employee_id = ? AND date BETWEEN ? AND ?
            ORDER BY date
            "#,
        )
        .bind(employee_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn delete_attendance(&self, id: u64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM attendance_records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn transaction_failure(e: sqlx::Error) -> AppError {
    AppError::TransactionFailure(e.to_string())
}

#[async_trait]
impl BonusRepository for MySqlRepository {
    async fn insert_bonus_batch(
        &self,
        payments: &[NewBonusPayment],
    ) -> Result<Vec<BonusPayment>, AppError> {
        let mut tx = self.pool.begin().await.map_err(transaction_failure)?;
        let mut written = Vec::with_capacity(payments.len());

        for p in payments {
            let result = sqlx::query(
                r#"
                INSERT INTO bonus_payments (employee_id, kind, amount, issued_at, issued_by)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(p.employee_id)
            .bind(p.kind.as_ref())
            .bind(p.amount)
            .bind(p.issued_at)
            .bind(p.issued_by)
            .execute(&mut *tx)
            .await
            .map_err(transaction_failure)?;

            written.push(BonusPayment {
                id: result.last_insert_id(),
                employee_id: p.employee_id,
                kind: p.kind,
                amount: p.amount,
                issued_at: p.issued_at,
                issued_by: p.issued_by,
            });
        }

        // dropping `tx` on any early return rolls everything back
        tx.commit().await.map_err(transaction_failure)?;
        Ok(written)
    }

    async fn bonus_payments(
        &self,
        employee_id: Option<u64>,
    ) -> Result<Vec<BonusPayment>, AppError> {
        let mut qb = QueryBuilder::<MySql>::new("SELECT * FROM bonus_payments WHERE 1 = 1");
        if let Some(id) = employee_id {
            qb.push(" AND employee_id = ").push_bind(id);
        }
        qb.push(" ORDER BY issued_at DESC, id DESC");

        let payments = qb
            .build_query_as::<BonusPayment>()
            .fetch_all(&self.pool)
            .await?;
        Ok(payments)
    }
}

#[async_trait]
impl WashRepository for MySqlRepository {
    async fn carreta_washes(&self, filter: &WashFilter) -> Result<Vec<CarretaWash>, AppError> {
        let mut qb = wash_query("carreta_washes", filter);
        let rows = qb
            .build_query_as::<CarretaWash>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn dirty_washer_entries(
        &self,
        filter: &WashFilter,
    ) -> Result<Vec<DirtyWasherEntry>, AppError> {
        let mut qb = wash_query("dirty_washer_entries", filter);
        let rows = qb
            .build_query_as::<DirtyWasherEntry>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn cargo_washer_entries(
        &self,
        filter: &WashFilter,
    ) -> Result<Vec<CargoWasherEntry>, AppError> {
        let mut qb = wash_query("cargo_washer_entries", filter);
        let rows = qb
            .build_query_as::<CargoWasherEntry>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl FinancialRepository for MySqlRepository {
    async fn financial_entries(
        &self,
        filter: &LedgerFilter,
    ) -> Result<Vec<FinancialEntry>, AppError> {
        let mut qb = QueryBuilder::<MySql>::new("SELECT * FROM financial_entries WHERE 1 = 1");
        push_ledger_filters(&mut qb, filter);
        qb.push(" ORDER BY date DESC, id DESC");

        let rows = qb
            .build_query_as::<FinancialEntry>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn financial_entries_in_month_span(
        &self,
        first: YearMonth,
        last: YearMonth,
    ) -> Result<Vec<FinancialEntry>, AppError> {
        let rows = sqlx::query_as::<_, FinancialEntry>(
            r#"
            SELECT * FROM financial_entries
            WHERE (year, month) >= (?, ?) AND (year, month) <= (?, ?)
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(first.year)
        .bind(first.month)
        .bind(last.year)
        .bind(last.month)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
