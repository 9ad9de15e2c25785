use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::repository::{
    AttendanceRepository, EmployeeRepository, FinancialRepository, WashRepository,
};
use crate::service::aggregation::{FinancialAggregator, PeriodSummary, RevenueBreakdown};
use crate::service::eligibility::EligibilityEvaluator;
use crate::service::window::DateRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl ReportPeriod {
    /// Resolves the period against `today`. Custom bounds that are missing
    /// default to today.
    pub fn resolve(
        self,
        today: NaiveDate,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<DateRange, AppError> {
        match self {
            ReportPeriod::Daily => Ok(DateRange::single_day(today)),
            ReportPeriod::Weekly => DateRange::week_of(today),
            ReportPeriod::Monthly => DateRange::month_of(today),
            ReportPeriod::Custom => {
                DateRange::new(start.unwrap_or(today), end.unwrap_or(today))
            }
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    #[schema(value_type = String, format = "date")]
    pub today: NaiveDate,
    pub month: DateRange,
    pub month_revenue: RevenueBreakdown,
    /// Sum of ledger entries booked in the current month.
    #[schema(value_type = String)]
    pub month_ledger_total: Decimal,
    pub active_employees: usize,
    pub weekly_eligible: usize,
    pub monthly_eligible: usize,
}

pub async fn period_report<R>(
    repo: &R,
    period: ReportPeriod,
    today: NaiveDate,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<PeriodSummary, AppError>
where
    R: WashRepository + FinancialRepository,
{
    let range = period.resolve(today, start, end)?;
    FinancialAggregator::new(repo).summarize(range).await
}

pub async fn dashboard<R>(repo: &R, today: NaiveDate) -> Result<Dashboard, AppError>
where
    R: WashRepository + FinancialRepository + EmployeeRepository + AttendanceRepository,
{
    let month = DateRange::month_of(today)?;
    let aggregator = FinancialAggregator::new(repo);
    let roster = EligibilityEvaluator::new(repo).evaluate_roster(today).await?;

    Ok(Dashboard {
        today,
        month,
        month_revenue: aggregator.aggregate_revenue(month).await?,
        month_ledger_total: aggregator.aggregate_expenses(month).await?,
        active_employees: roster.len(),
        weekly_eligible: roster.iter().filter(|r| r.weekly.eligible).count(),
        monthly_eligible: roster.iter().filter(|r| r.monthly.eligible).count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use crate::repository::memory::MemoryRepository;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn periods_resolve_against_today() {
        let today = day(2026, 3, 4);
        assert_eq!(
            ReportPeriod::Daily.resolve(today, None, None).unwrap(),
            DateRange::single_day(today)
        );
        assert_eq!(
            ReportPeriod::Weekly.resolve(today, None, None).unwrap().start,
            day(2026, 3, 2)
        );
        assert_eq!(
            ReportPeriod::Monthly.resolve(today, None, None).unwrap().end,
            day(2026, 3, 31)
        );
    }

    #[test]
    fn custom_bounds_default_to_today() {
        let today = day(2026, 3, 4);
        let range = ReportPeriod::Custom
            .resolve(today, Some(day(2026, 2, 1)), None)
            .unwrap();
        assert_eq!(range, DateRange { start: day(2026, 2, 1), end: today });

        assert!(
            ReportPeriod::Custom
                .resolve(today, Some(day(2026, 3, 5)), None)
                .is_err()
        );
    }

    #[actix_web::test]
    async fn dashboard_counts_eligible_employees() {
        let repo = MemoryRepository::new();
        let ana = repo.add_employee("Ana", true);
        repo.add_employee("Bruno", true);
        repo.add_employee("Inativo", false);
        repo.upsert_attendance(ana, day(2026, 3, 3), AttendanceStatus::Absent)
            .await
            .unwrap();
        repo.add_cargo(day(2026, 3, 1), Decimal::new(300, 0));
        repo.add_ledger(day(2026, 3, 31), Decimal::new(120, 0));

        let board = dashboard(&repo, day(2026, 3, 4)).await.unwrap();

        assert_eq!(board.active_employees, 2);
        assert_eq!(board.weekly_eligible, 1);
        assert_eq!(board.monthly_eligible, 1);
        assert_eq!(board.month_revenue.total, Decimal::new(300, 0));
        assert_eq!(board.month_ledger_total, Decimal::new(120, 0));
    }

    #[actix_web::test]
    async fn period_report_summarizes_the_resolved_range() {
        let repo = MemoryRepository::new();
        repo.add_dirty(day(2026, 3, 2), 10, Decimal::new(3, 0));

        let summary = period_report(&repo, ReportPeriod::Weekly, day(2026, 3, 6), None, None)
            .await
            .unwrap();

        assert_eq!(summary.range.start, day(2026, 3, 2));
        assert_eq!(summary.revenue.dirty_washer, Decimal::new(30, 0));
    }

    #[actix_web::test]
    async fn custom_period_outside_the_storable_calendar_is_a_validation_error() {
        let repo = MemoryRepository::new();
        let today = day(2026, 3, 4);

        let widest = period_report(
            &repo,
            ReportPeriod::Custom,
            today,
            Some(day(1000, 1, 1)),
            Some(day(9999, 12, 31)),
        )
        .await
        .unwrap();
        assert_eq!(widest.expenses, Decimal::ZERO);

        let beyond = period_report(
            &repo,
            ReportPeriod::Custom,
            today,
            Some(day(1000, 1, 1)),
            Some(day(12000, 1, 1)),
        )
        .await;
        assert!(matches!(beyond, Err(AppError::Validation(_))));
    }
}
