use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Fixed amount of the weekly attendance bonus (R$ 120,00).
pub const WEEKLY_BONUS_AMOUNT: Decimal = Decimal::from_parts(12000, 0, 0, false, 2);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr,
    Display,
)]
#[serde(rename_all = "snake_case")]
pub enum BonusKind {
    #[strum(serialize = "semanal")]
    WeeklyBonus,
    /// Monthly food basket; the amount is set later by direct edit.
    #[strum(serialize = "cesta")]
    MonthlyBasket,
}

impl BonusKind {
    pub fn issue_amount(self) -> Decimal {
        match self {
            BonusKind::WeeklyBonus => WEEKLY_BONUS_AMOUNT,
            BonusKind::MonthlyBasket => Decimal::ZERO,
        }
    }
}

impl TryFrom<String> for BonusKind {
    type Error = strum::ParseError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        code.parse()
    }
}

/// Append-only bonus record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct BonusPayment {
    pub id: u64,
    pub employee_id: u64,
    #[sqlx(try_from = "String")]
    pub kind: BonusKind,
    #[schema(example = "120.00", value_type = String)]
    pub amount: Decimal,
    #[schema(value_type = String, format = "date-time")]
    pub issued_at: DateTime<Utc>,
    pub issued_by: Option<u64>,
}

/// A payment about to be written by the bonus issuer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBonusPayment {
    pub employee_id: u64,
    pub kind: BonusKind,
    pub amount: Decimal,
    pub issued_at: DateTime<Utc>,
    pub issued_by: Option<u64>,
}

impl NewBonusPayment {
    pub fn issue(employee_id: u64, kind: BonusKind, issued_by: Option<u64>) -> Self {
        Self {
            employee_id,
            kind,
            amount: kind.issue_amount(),
            issued_at: Utc::now(),
            issued_by,
        }
    }
}
