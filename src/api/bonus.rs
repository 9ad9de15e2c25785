use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::today,
    auth::auth::AuthUser,
    error::AppError,
    model::bonus::BonusPayment,
    repository::{BonusRepository, EmployeeRepository, MySqlRepository},
    service::{
        bonus::{BonusIssuer, BonusSelection, GrantOutcome},
        eligibility::{Eligibility, EligibilityEvaluator, RosterEntry},
    },
};

#[derive(Debug, Deserialize)]
pub struct ReferenceQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentQuery {
    pub employee_id: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GrantRequest {
    /// Defaults to today.
    #[schema(value_type = Option<String>, format = "date", example = "2026-03-06")]
    pub reference_date: Option<NaiveDate>,
    pub selections: Vec<BonusSelection>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeEligibility {
    pub weekly: Eligibility,
    pub monthly: Eligibility,
}

/// Eligibility of every active employee
#[utoipa::path(
    get,
    path = "/api/bonus/roster",
    params(("date", Query, description = "Reference date, defaults to today")),
    responses((status = 200, description = "Weekly and monthly eligibility", body = [RosterEntry])),
    tag = "Bonus",
    security(("bearer_auth" = []))
)]
pub async fn roster(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
    query: web::Query<ReferenceQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let reference = query.date.unwrap_or_else(today);
    let rows = EligibilityEvaluator::new(repo.get_ref())
        .evaluate_roster(reference)
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    get,
    path = "/api/bonus/eligibility/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        ("date", Query, description = "Reference date, defaults to today")
    ),
    responses(
        (status = 200, description = "Eligibility for both windows", body = EmployeeEligibility),
        (status = 404, description = "Employee not found")
    ),
    tag = "Bonus",
    security(("bearer_auth" = []))
)]
pub async fn employee_eligibility(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
    path: web::Path<u64>,
    query: web::Query<ReferenceQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let employee_id = path.into_inner();
    let reference = query.date.unwrap_or_else(today);

    if repo.find_employee(employee_id).await?.is_none() {
        return Err(AppError::not_found("Employee", employee_id).into());
    }

    let evaluator = EligibilityEvaluator::new(repo.get_ref());
    Ok(HttpResponse::Ok().json(EmployeeEligibility {
        weekly: evaluator.evaluate_weekly(employee_id, reference).await?,
        monthly: evaluator.evaluate_monthly(employee_id, reference).await?,
    }))
}

/// Grant bonuses
///
/// Eligibility is checked again for every selection; all payments of one
/// request are stored together or not at all.
#[utoipa::path(
    post,
    path = "/api/bonus/grant",
    request_body = GrantRequest,
    responses(
        (status = 200, description = "Created payments and skipped selections", body = GrantOutcome),
        (status = 404, description = "Unknown employee, nothing stored"),
        (status = 500, description = "Transaction failed, nothing stored")
    ),
    tag = "Bonus",
    security(("bearer_auth" = []))
)]
pub async fn grant(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
    payload: web::Json<GrantRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let reference = payload.reference_date.unwrap_or_else(today);

    let outcome = BonusIssuer::new(repo.get_ref())
        .grant_bonuses(&payload.selections, Some(auth.user_id), reference)
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/bonus/payments",
    params(("employee_id", Query, description = "Filter by employee")),
    responses((status = 200, description = "Payments, newest first", body = [BonusPayment])),
    tag = "Bonus",
    security(("bearer_auth" = []))
)]
pub async fn list_payments(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
    query: web::Query<PaymentQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let payments = repo.bonus_payments(query.employee_id).await?;
    Ok(HttpResponse::Ok().json(payments))
}
