//! Zero-absence bonus eligibility.
//!
//! An employee is eligible for a window when the attendance ledger holds no
//! `Absent` record inside it. Days without any record are not absences, so
//! an employee with no records at all is eligible.

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::repository::{AttendanceRepository, EmployeeRepository};
use crate::service::window::DateRange;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Eligibility {
    pub employee_id: u64,
    pub window: DateRange,
    pub present: u32,
    pub absent: u32,
    pub day_off: u32,
    pub eligible: bool,
}

impl Eligibility {
    fn tally(employee_id: u64, window: DateRange, records: &[AttendanceRecord]) -> Self {
        let count = |status: AttendanceStatus| {
            records.iter().filter(|r| r.status == status).count() as u32
        };
        let absent = count(AttendanceStatus::Absent);

        Self {
            employee_id,
            window,
            present: count(AttendanceStatus::Present),
            absent,
            day_off: count(AttendanceStatus::DayOff),
            eligible: absent == 0,
        }
    }
}

/// One row of the grant screen.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RosterEntry {
    pub employee_id: u64,
    pub name: String,
    pub weekly: Eligibility,
    pub monthly: Eligibility,
}

pub struct EligibilityEvaluator<'a, R> {
    repo: &'a R,
}

impl<'a, R> EligibilityEvaluator<'a, R>
where
    R: AttendanceRepository + EmployeeRepository,
{
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub async fn evaluate(
        &self,
        employee_id: u64,
        window: DateRange,
    ) -> Result<Eligibility, AppError> {
        let records = self.repo.attendance_in_range(employee_id, window).await?;
        Ok(Eligibility::tally(employee_id, window, &records))
    }

    pub async fn evaluate_weekly(
        &self,
        employee_id: u64,
        reference: NaiveDate,
    ) -> Result<Eligibility, AppError> {
        self.evaluate(employee_id, DateRange::week_of(reference)?).await
    }

    pub async fn evaluate_monthly(
        &self,
        employee_id: u64,
        reference: NaiveDate,
    ) -> Result<Eligibility, AppError> {
        self.evaluate(employee_id, DateRange::month_of(reference)?).await
    }

    /// Both windows for every active employee, ordered as the repository
    /// lists them.
    pub async fn evaluate_roster(&self, reference: NaiveDate) -> Result<Vec<RosterEntry>, AppError> {
        let week = DateRange::week_of(reference)?;
        let month = DateRange::month_of(reference)?;

        let mut roster = Vec::new();
        for employee in self.repo.active_employees().await? {
            roster.push(RosterEntry {
                weekly: self.evaluate(employee.id, week).await?,
                monthly: self.evaluate(employee.id, month).await?,
                employee_id: employee.id,
                name: employee.name,
            });
        }
        Ok(roster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryRepository;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[actix_web::test]
    async fn no_records_means_eligible() {
        let repo = MemoryRepository::new();
        let id = repo.add_employee("Ana", true);
        let evaluator = EligibilityEvaluator::new(&repo);

        let weekly = evaluator.evaluate_weekly(id, day(2026, 3, 4)).await.unwrap();
        let monthly = evaluator.evaluate_monthly(id, day(2026, 3, 4)).await.unwrap();

        assert!(weekly.eligible);
        assert!(monthly.eligible);
        assert_eq!((weekly.present, weekly.absent, weekly.day_off), (0, 0, 0));
    }

    #[actix_web::test]
    async fn absent_monday_blocks_the_whole_week_until_deleted() {
        let repo = MemoryRepository::new();
        let id = repo.add_employee("Ana", true);
        let monday = day(2026, 3, 2);
        let absence = repo
            .upsert_attendance(id, monday, AttendanceStatus::Absent)
            .await
            .unwrap();
        let evaluator = EligibilityEvaluator::new(&repo);

        for offset in 0..7 {
            let reference = day(2026, 3, 2 + offset);
            let weekly = evaluator.evaluate_weekly(id, reference).await.unwrap();
            assert!(!weekly.eligible, "{reference} should be ineligible");
            assert_eq!(weekly.absent, 1);
        }

        // the following week is unaffected
        let next = evaluator.evaluate_weekly(id, day(2026, 3, 9)).await.unwrap();
        assert!(next.eligible);

        assert!(repo.delete_attendance(absence.id).await.unwrap());
        let weekly = evaluator.evaluate_weekly(id, day(2026, 3, 6)).await.unwrap();
        assert!(weekly.eligible);
    }

    #[actix_web::test]
    async fn counts_each_status() {
        let repo = MemoryRepository::new();
        let id = repo.add_employee("Bruno", true);
        repo.upsert_attendance(id, day(2026, 3, 2), AttendanceStatus::Present)
            .await
            .unwrap();
        repo.upsert_attendance(id, day(2026, 3, 3), AttendanceStatus::Present)
            .await
            .unwrap();
        repo.upsert_attendance(id, day(2026, 3, 8), AttendanceStatus::DayOff)
            .await
            .unwrap();
        repo.upsert_attendance(id, day(2026, 3, 20), AttendanceStatus::Absent)
            .await
            .unwrap();
        let evaluator = EligibilityEvaluator::new(&repo);

        let weekly = evaluator.evaluate_weekly(id, day(2026, 3, 5)).await.unwrap();
        assert_eq!((weekly.present, weekly.absent, weekly.day_off), (2, 0, 1));
        assert!(weekly.eligible);

        let monthly = evaluator.evaluate_monthly(id, day(2026, 3, 5)).await.unwrap();
        assert_eq!(monthly.absent, 1);
        assert!(!monthly.eligible);
    }

    #[actix_web::test]
    async fn upserting_the_same_status_twice_keeps_one_record() {
        let repo = MemoryRepository::new();
        let id = repo.add_employee("Carla", true);
        let first = repo
            .upsert_attendance(id, day(2026, 3, 2), AttendanceStatus::Present)
            .await
            .unwrap();
        let second = repo
            .upsert_attendance(id, day(2026, 3, 2), AttendanceStatus::Present)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.attendance_count(), 1);

        let replaced = repo
            .upsert_attendance(id, day(2026, 3, 2), AttendanceStatus::Absent)
            .await
            .unwrap();
        assert_eq!(replaced.id, first.id);
        assert_eq!(replaced.status, AttendanceStatus::Absent);
        assert_eq!(repo.attendance_count(), 1);
    }

    #[actix_web::test]
    async fn roster_skips_inactive_employees() {
        let repo = MemoryRepository::new();
        let active = repo.add_employee("Ana", true);
        repo.add_employee("Inativo", false);
        repo.upsert_attendance(active, day(2026, 3, 10), AttendanceStatus::Absent)
            .await
            .unwrap();

        let roster = EligibilityEvaluator::new(&repo)
            .evaluate_roster(day(2026, 3, 4))
            .await
            .unwrap();

        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].employee_id, active);
        assert!(roster[0].weekly.eligible);
        assert!(!roster[0].monthly.eligible);
    }
}
