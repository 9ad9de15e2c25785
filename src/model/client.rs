use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Client {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Transportadora Norte")]
    pub name: String,
    #[schema(example = "12.345.678/0001-90", nullable = true)]
    pub cnpj: Option<String>,
    pub phone: String,
    pub email: String,
}
