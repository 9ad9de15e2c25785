use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A job title ("função"); carries the base monthly salary.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct JobTitle {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Lavador")]
    pub name: String,
    #[schema(example = "1850.00", value_type = String)]
    pub monthly_salary: Decimal,
}
