use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::window::{DateRange, YearMonth};
use crate::utils::lenient;

/// The six expense categories of a ledger entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ExpenseBreakdown {
    #[serde(default, deserialize_with = "lenient::amount")]
    #[schema(value_type = String, example = "9250.00")]
    pub salary_total: Decimal,
    #[serde(default, deserialize_with = "lenient::amount")]
    #[schema(value_type = String, example = "800.00")]
    pub freight: Decimal,
    #[serde(default, deserialize_with = "lenient::amount")]
    #[schema(value_type = String, example = "320.00")]
    pub breakfast_meals: Decimal,
    #[serde(default, deserialize_with = "lenient::amount")]
    #[schema(value_type = String, example = "640.00")]
    pub lunch_meals: Decimal,
    #[serde(default, deserialize_with = "lenient::amount")]
    #[schema(value_type = String, example = "450.00")]
    pub accounting_fee: Decimal,
    #[serde(default, deserialize_with = "lenient::amount")]
    #[schema(value_type = String, example = "1017.50")]
    pub inss_fee: Decimal,
}

impl ExpenseBreakdown {
    pub fn total(&self) -> Decimal {
        [
            self.salary_total,
            self.freight,
            self.breakfast_meals,
            self.lunch_meals,
            self.accounting_fee,
            self.inss_fee,
        ]
        .iter()
        .sum()
    }
}

/// Monthly ledger row. `year`, `month` and `total` are derived on write.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct FinancialEntry {
    pub id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    #[sqlx(flatten)]
    pub expenses: ExpenseBreakdown,
    #[schema(value_type = String, example = "12477.50")]
    pub total: Decimal,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    pub created_by: Option<u64>,
}

impl FinancialEntry {
    pub fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }
}

/// Body of create and update requests.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FinancialInput {
    #[schema(value_type = String, format = "date", example = "2026-03-31")]
    pub date: NaiveDate,
    #[serde(default)]
    pub expenses: ExpenseBreakdown,
}

/// Column values written for a ledger row.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerValues {
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub expenses: ExpenseBreakdown,
    pub total: Decimal,
}

impl FinancialInput {
    /// Derives period and total from the submitted values; this is the only
    /// path to a stored row, so the total never goes stale.
    pub fn ledger_values(&self) -> LedgerValues {
        LedgerValues {
            date: self.date,
            year: self.date.year(),
            month: self.date.month(),
            expenses: self.expenses.clone(),
            total: self.expenses.total(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub range: Option<DateRange>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_the_sum_of_the_six_categories() {
        let input: FinancialInput = serde_json::from_str(
            r#"{
                "date": "2026-03-31",
                "expenses": {
                    "salary_total": "9250.00",
                    "freight": 800,
                    "breakfast_meals": "320,00",
                    "lunch_meals": "640.00",
                    "accounting_fee": "450",
                    "inss_fee": "1017.50"
                }
            }"#,
        )
        .unwrap();

        let values = input.ledger_values();
        assert_eq!(values.year, 2026);
        assert_eq!(values.month, 3);
        assert_eq!(values.total, Decimal::new(1247750, 2));
    }

    #[test]
    fn missing_or_malformed_categories_count_as_zero() {
        let input: FinancialInput = serde_json::from_str(
            r#"{"date": "2026-01-15", "expenses": {"freight": "n/a", "inss_fee": "100"}}"#,
        )
        .unwrap();

        assert_eq!(input.ledger_values().total, Decimal::new(100, 0));

        let bare: FinancialInput = serde_json::from_str(r#"{"date": "2026-01-15"}"#).unwrap();
        assert_eq!(bare.ledger_values().total, Decimal::ZERO);
    }
}
