use serde::Serialize;
use utoipa::ToSchema;

/// User row joined with its approval profile.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub email: String,
    pub is_staff: bool,
    pub is_approved: bool,
}
