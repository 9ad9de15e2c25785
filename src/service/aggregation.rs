//! Revenue, expenses and profit over a date range, plus the monthly rollup
//! of the ledger.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::financial::{FinancialEntry, LedgerFilter};
use crate::model::wash::WashFilter;
use crate::repository::{FinancialRepository, WashRepository};
use crate::service::window::DateRange;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct RevenueBreakdown {
    #[schema(value_type = String)]
    pub carreta: Decimal,
    #[schema(value_type = String)]
    pub dirty_washer: Decimal,
    #[schema(value_type = String)]
    pub cargo_washer: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PeriodSummary {
    pub range: DateRange,
    pub revenue: RevenueBreakdown,
    #[schema(value_type = String)]
    pub expenses: Decimal,
    #[schema(value_type = String)]
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyRollupRow {
    pub year: i32,
    pub month: u32,
    #[schema(value_type = String)]
    pub sum: Decimal,
    /// Running total of `sum` from the earliest month up to this one.
    #[schema(value_type = String)]
    pub cumulative: Decimal,
}

pub struct FinancialAggregator<'a, R> {
    repo: &'a R,
}

impl<'a, R> FinancialAggregator<'a, R>
where
    R: WashRepository + FinancialRepository,
{
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub async fn aggregate_revenue(&self, range: DateRange) -> Result<RevenueBreakdown, AppError> {
        let filter = WashFilter::in_range(range);
        let (carreta, dirty, cargo) = futures::try_join!(
            self.repo.carreta_washes(&filter),
            self.repo.dirty_washer_entries(&filter),
            self.repo.cargo_washer_entries(&filter),
        )?;

        let carreta: Decimal = carreta.iter().map(|w| w.revenue()).sum();
        let dirty_washer: Decimal = dirty.iter().map(|w| w.revenue()).sum();
        let cargo_washer: Decimal = cargo.iter().map(|w| w.revenue()).sum();

        Ok(RevenueBreakdown {
            carreta,
            dirty_washer,
            cargo_washer,
            total: carreta + dirty_washer + cargo_washer,
        })
    }

    /// Ledger totals of every month the range touches.
    ///
    /// Whole months count even when the range covers only part of them, so a
    /// one-day range returns the full month's expenses.
    pub async fn aggregate_expenses(&self, range: DateRange) -> Result<Decimal, AppError> {
        let (first, last) = range.month_span();
        let entries = self
            .repo
            .financial_entries_in_month_span(first, last)
            .await?;
        Ok(entries.iter().map(|e| e.total).sum())
    }

    pub async fn profit(&self, range: DateRange) -> Result<Decimal, AppError> {
        Ok(self.summarize(range).await?.profit)
    }

    pub async fn summarize(&self, range: DateRange) -> Result<PeriodSummary, AppError> {
        let (revenue, expenses) =
            futures::try_join!(self.aggregate_revenue(range), self.aggregate_expenses(range))?;

        Ok(PeriodSummary {
            range,
            profit: revenue.total - expenses,
            revenue,
            expenses,
        })
    }

    pub async fn monthly_rollup(&self) -> Result<Vec<MonthlyRollupRow>, AppError> {
        let entries = self.repo.financial_entries(&LedgerFilter::default()).await?;
        Ok(rollup(&entries))
    }
}

/// Groups entries by (year, month) in ascending order with a running sum.
pub fn rollup(entries: &[FinancialEntry]) -> Vec<MonthlyRollupRow> {
    let mut by_month: BTreeMap<_, Decimal> = BTreeMap::new();
    for entry in entries {
        *by_month.entry(entry.year_month()).or_default() += entry.total;
    }

    let mut cumulative = Decimal::ZERO;
    by_month
        .into_iter()
        .map(|(ym, sum)| {
            cumulative += sum;
            MonthlyRollupRow {
                year: ym.year,
                month: ym.month,
                sum,
                cumulative,
            }
        })
        .collect()
}
