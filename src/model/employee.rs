use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "João da Silva",
        "cpf": "52998224725",
        "address": "Rua das Flores, 10",
        "postal_code": "01001-000",
        "email": "joao@example.com",
        "phone": "(11) 98888-7777",
        "job_title_id": 2,
        "active": true
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "João da Silva")]
    pub name: String,

    /// Digits only, checksum validated.
    #[schema(example = "52998224725")]
    pub cpf: String,

    pub address: String,

    pub postal_code: String,

    pub email: String,

    pub phone: String,

    #[schema(example = 2)]
    pub job_title_id: u64,

    /// Inactive employees are kept for history but leave the bonus roster.
    #[schema(example = true)]
    pub active: bool,
}
