//! In-memory repository for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use super::{
    AttendanceRepository, BonusRepository, EmployeeRepository, FinancialRepository,
    WashRepository,
};
use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::bonus::{BonusPayment, NewBonusPayment};
use crate::model::client::Client;
use crate::model::employee::Employee;
use crate::model::financial::{ExpenseBreakdown, FinancialEntry, FinancialInput, LedgerFilter};
use crate::model::wash::{CargoWasherEntry, CarretaWash, DirtyWasherEntry, WashFilter, WashKind};
use crate::service::window::{DateRange, YearMonth};

#[derive(Default)]
struct State {
    next_id: u64,
    employees: Vec<Employee>,
    clients: Vec<Client>,
    attendance: Vec<AttendanceRecord>,
    bonuses: Vec<BonusPayment>,
    carreta: Vec<CarretaWash>,
    dirty: Vec<DirtyWasherEntry>,
    cargo: Vec<CargoWasherEntry>,
    ledger: Vec<FinancialEntry>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
    fail_next_bonus_batch: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `insert_bonus_batch` fail partway through, the way an
    /// aborted transaction would.
    pub fn fail_next_bonus_batch(&self) {
        self.fail_next_bonus_batch.store(true, Ordering::SeqCst);
    }

    pub fn add_employee(&self, name: &str, active: bool) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.employees.push(Employee {
            id,
            name: name.to_string(),
            cpf: format!("{id:011}"),
            address: String::new(),
            postal_code: String::new(),
            email: String::new(),
            phone: String::new(),
            job_title_id: 1,
            active,
        });
        id
    }

    pub fn add_client(&self, name: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.clients.push(Client {
            id,
            name: name.to_string(),
            cnpj: None,
            phone: String::new(),
            email: String::new(),
        });
        id
    }

    pub fn add_carreta(
        &self,
        date: NaiveDate,
        client_id: Option<u64>,
        box_quantity: u32,
        unit_price: Decimal,
    ) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.carreta.push(CarretaWash {
            id,
            date,
            trailer_ident: String::new(),
            client_id,
            wash_kind: WashKind::Dirty,
            box_type_id: 1,
            product_type_id: 1,
            box_quantity,
            unit_price,
            created_by: None,
        });
    }

    pub fn add_dirty(&self, date: NaiveDate, box_quantity: u32, unit_price: Decimal) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.dirty.push(DirtyWasherEntry {
            id,
            date,
            client_id: None,
            wash_kind: WashKind::Dirty,
            box_quantity,
            box_size: "G".to_string(),
            product_type_id: 1,
            unit_price,
            created_by: None,
        });
    }

    pub fn add_cargo(&self, date: NaiveDate, rendered_value: Decimal) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.cargo.push(CargoWasherEntry {
            id,
            date,
            client_id: None,
            wash_kind: WashKind::PerLoad,
            box_quantity: 0,
            q_3a: 0,
            q_2a: 0,
            q_1a: 0,
            q_g: 0,
            rendered_value,
            created_by: None,
        });
    }

    /// Books a ledger entry whose whole amount is freight.
    pub fn add_ledger(&self, date: NaiveDate, amount: Decimal) {
        let input = FinancialInput {
            date,
            expenses: ExpenseBreakdown {
                freight: amount,
                ..ExpenseBreakdown::default()
            },
        };
        let values = input.ledger_values();

        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.ledger.push(FinancialEntry {
            id,
            date: values.date,
            year: values.year,
            month: values.month,
            expenses: values.expenses,
            total: values.total,
            created_at: Utc::now(),
            created_by: None,
        });
    }

    pub fn attendance_count(&self) -> usize {
        self.state.lock().unwrap().attendance.len()
    }

    pub fn all_bonuses(&self) -> Vec<BonusPayment> {
        self.state.lock().unwrap().bonuses.clone()
    }

    fn matches_wash(
        state: &State,
        filter: &WashFilter,
        date: NaiveDate,
        kind: WashKind,
        client_id: Option<u64>,
    ) -> bool {
        if filter.kind.is_some_and(|k| k != kind) {
            return false;
        }
        if filter.range.is_some_and(|r| !r.contains(date)) {
            return false;
        }
        if filter.client_id.is_some() && filter.client_id != client_id {
            return false;
        }
        if let Some(needle) = &filter.client_name {
            let needle = needle.to_lowercase();
            let name_matches = client_id
                .and_then(|id| state.clients.iter().find(|c| c.id == id))
                .is_some_and(|c| c.name.to_lowercase().contains(&needle));
            if !name_matches {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl EmployeeRepository for MemoryRepository {
    async fn find_employee(&self, id: u64) -> Result<Option<Employee>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.employees.iter().find(|e| e.id == id).cloned())
    }

    async fn active_employees(&self) -> Result<Vec<Employee>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.employees.iter().filter(|e| e.active).cloned().collect())
    }
}

#[async_trait]
impl AttendanceRepository for MemoryRepository {
    async fn upsert_attendance(
        &self,
        employee_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .attendance
            .iter_mut()
            .find(|r| r.employee_id == employee_id && r.date == date)
        {
            existing.status = status;
            return Ok(existing.clone());
        }

        let record = AttendanceRecord {
            id: state.next_id(),
            employee_id,
            date,
            status,
        };
        state.attendance.push(record.clone());
        Ok(record)
    }

    async fn attendance_in_range(
        &self,
        employee_id: u64,
        range: DateRange,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .attendance
            .iter()
            .filter(|r| r.employee_id == employee_id && range.contains(r.date))
            .cloned()
            .collect())
    }

    async fn delete_attendance(&self, id: u64) -> Result<bool, AppError> {
        let mut state = self.state.lock().unwrap();
        let before = state.attendance.len();
        state.attendance.retain(|r| r.id != id);
        Ok(state.attendance.len() != before)
    }
}

#[async_trait]
impl BonusRepository for MemoryRepository {
    async fn insert_bonus_batch(
        &self,
        payments: &[NewBonusPayment],
    ) -> Result<Vec<BonusPayment>, AppError> {
        let fail = self.fail_next_bonus_batch.swap(false, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();

        // stage, then publish only on success
        let mut staged = Vec::with_capacity(payments.len());
        for (i, p) in payments.iter().enumerate() {
            if fail && i == 1 {
                return Err(AppError::TransactionFailure(
                    "injected failure on second insert".to_string(),
                ));
            }
            staged.push(BonusPayment {
                id: state.next_id(),
                employee_id: p.employee_id,
                kind: p.kind,
                amount: p.amount,
                issued_at: p.issued_at,
                issued_by: p.issued_by,
            });
        }
        if fail && payments.len() < 2 {
            return Err(AppError::TransactionFailure("injected failure on commit".to_string()));
        }

        state.bonuses.extend(staged.iter().cloned());
        Ok(staged)
    }

    async fn bonus_payments(
        &self,
        employee_id: Option<u64>,
    ) -> Result<Vec<BonusPayment>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .bonuses
            .iter()
            .filter(|b| employee_id.is_none_or(|id| b.employee_id == id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WashRepository for MemoryRepository {
    async fn carreta_washes(&self, filter: &WashFilter) -> Result<Vec<CarretaWash>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .carreta
            .iter()
            .filter(|w| Self::matches_wash(&state, filter, w.date, w.wash_kind, w.client_id))
            .cloned()
            .collect())
    }

    async fn dirty_washer_entries(
        &self,
        filter: &WashFilter,
    ) -> Result<Vec<DirtyWasherEntry>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .dirty
            .iter()
            .filter(|w| Self::matches_wash(&state, filter, w.date, w.wash_kind, w.client_id))
            .cloned()
            .collect())
    }

    async fn cargo_washer_entries(
        &self,
        filter: &WashFilter,
    ) -> Result<Vec<CargoWasherEntry>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .cargo
            .iter()
            .filter(|w| Self::matches_wash(&state, filter, w.date, w.wash_kind, w.client_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FinancialRepository for MemoryRepository {
    async fn financial_entries(
        &self,
        filter: &LedgerFilter,
    ) -> Result<Vec<FinancialEntry>, AppError> {
        let state = self.state.lock().unwrap();
        let mut entries: Vec<_> = state
            .ledger
            .iter()
            .filter(|e| filter.year.is_none_or(|y| e.year == y))
            .filter(|e| filter.month.is_none_or(|m| e.month == m))
            .filter(|e| filter.range.is_none_or(|r| r.contains(e.date)))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    async fn financial_entries_in_month_span(
        &self,
        first: YearMonth,
        last: YearMonth,
    ) -> Result<Vec<FinancialEntry>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .ledger
            .iter()
            .filter(|e| (first..=last).contains(&e.year_month()))
            .cloned()
            .collect())
    }
}
