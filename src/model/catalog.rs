use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Box type offered on trailer washes; soft-deleted through `active`.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct BoxType {
    pub id: u64,
    #[schema(example = "Plástica")]
    pub name: String,
    #[schema(example = "G")]
    pub size: String,
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ProductType {
    pub id: u64,
    #[schema(example = "Banana")]
    pub name: String,
    pub active: bool,
}
