//! Data-access seams for the rule engines.
//!
//! The services in `crate::service` only see these traits; the MySQL
//! implementation backs the running server and `memory` backs unit tests.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::bonus::{BonusPayment, NewBonusPayment};
use crate::model::employee::Employee;
use crate::model::financial::{FinancialEntry, LedgerFilter};
use crate::model::wash::{CargoWasherEntry, CarretaWash, DirtyWasherEntry, WashFilter};
use crate::service::window::{DateRange, YearMonth};

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub use mysql::MySqlRepository;

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn find_employee(&self, id: u64) -> Result<Option<Employee>, AppError>;

    async fn active_employees(&self) -> Result<Vec<Employee>, AppError>;
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Inserts or replaces the status for `(employee_id, date)`.
    async fn upsert_attendance(
        &self,
        employee_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError>;

    async fn attendance_in_range(
        &self,
        employee_id: u64,
        range: DateRange,
    ) -> Result<Vec<AttendanceRecord>, AppError>;

    /// Returns false when no record had that id.
    async fn delete_attendance(&self, id: u64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait BonusRepository: Send + Sync {
    /// Writes every payment in a single transaction. On error nothing is
    /// stored and the error is `AppError::TransactionFailure`.
    async fn insert_bonus_batch(
        &self,
        payments: &[NewBonusPayment],
    ) -> Result<Vec<BonusPayment>, AppError>;

    async fn bonus_payments(&self, employee_id: Option<u64>)
    -> Result<Vec<BonusPayment>, AppError>;
}

#[async_trait]
pub trait WashRepository: Send + Sync {
    async fn carreta_washes(&self, filter: &WashFilter) -> Result<Vec<CarretaWash>, AppError>;

    async fn dirty_washer_entries(
        &self,
        filter: &WashFilter,
    ) -> Result<Vec<DirtyWasherEntry>, AppError>;

    async fn cargo_washer_entries(
        &self,
        filter: &WashFilter,
    ) -> Result<Vec<CargoWasherEntry>, AppError>;
}

#[async_trait]
pub trait FinancialRepository: Send + Sync {
    /// Entries matching the filter, newest date first.
    async fn financial_entries(&self, filter: &LedgerFilter)
    -> Result<Vec<FinancialEntry>, AppError>;

    /// Entries whose (year, month) lies between `first` and `last`, inclusive.
    async fn financial_entries_in_month_span(
        &self,
        first: YearMonth,
        last: YearMonth,
    ) -> Result<Vec<FinancialEntry>, AppError>;
}
