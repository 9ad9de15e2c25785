use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    api::csv_response,
    auth::auth::AuthUser,
    error::AppError,
    model::financial::{FinancialEntry, FinancialInput, LedgerFilter},
    repository::{FinancialRepository, MySqlRepository, mysql::push_ledger_filters},
    service::{
        aggregation::{FinancialAggregator, MonthlyRollupRow},
        export::{ledger_csv, rollup_csv},
    },
    utils::pagination::Page,
};

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl LedgerQuery {
    fn filter(&self) -> Result<LedgerFilter, AppError> {
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(AppError::validation(format!("Month {month} is out of range")));
            }
        }
        Ok(LedgerFilter {
            year: self.year,
            month: self.month,
            range: None,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct LedgerPage {
    pub data: Vec<FinancialEntry>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[utoipa::path(
    get,
    path = "/api/financial",
    params(
        ("year", Query, description = "Filter by year"),
        ("month", Query, description = "Filter by month (1-12)"),
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page")
    ),
    responses((status = 200, description = "Ledger entries, newest date first", body = LedgerPage)),
    tag = "Financial",
    security(("bearer_auth" = []))
)]
pub async fn list_entries(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LedgerQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let filter = query.filter()?;
    let page = Page::new(query.page, query.per_page, 6);

    let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM financial_entries WHERE 1 = 1");
    push_ledger_filters(&mut count, &filter);
    let total = count
        .build_query_scalar::<i64>()
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    let mut data = QueryBuilder::<MySql>::new("SELECT * FROM financial_entries WHERE 1 = 1");
    push_ledger_filters(&mut data, &filter);
    data.push(" ORDER BY date DESC, id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let entries = data
        .build_query_as::<FinancialEntry>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(LedgerPage {
        data: entries,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/financial/{id}",
    params(("id", Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Ledger entry", body = FinancialEntry),
        (status = 404, description = "Entry not found")
    ),
    tag = "Financial",
    security(("bearer_auth" = []))
)]
pub async fn get_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let id = path.into_inner();

    let entry = sqlx::query_as::<_, FinancialEntry>("SELECT * FROM financial_entries WHERE id = ?")
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Financial entry", id))?;

    Ok(HttpResponse::Ok().json(entry))
}

/// Create a ledger entry
///
/// Year, month and total are derived from the submitted date and amounts.
#[utoipa::path(
    post,
    path = "/api/financial",
    request_body = FinancialInput,
    responses(
        (status = 201, description = "Entry created", body = Object, example = json!({
            "id": 3, "total": "12477.50"
        }))
    ),
    tag = "Financial",
    security(("bearer_auth" = []))
)]
pub async fn create_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<FinancialInput>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let values = payload.ledger_values();
    let e = &values.expenses;

    let id = sqlx::query(
        r#"
        INSERT INTO financial_entries
        (date, year, month, salary_total, freight, breakfast_meals, lunch_meals,
         accounting_fee, inss_fee, total, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(values.date)
    .bind(values.year)
    .bind(values.month)
    .bind(e.salary_total)
    .bind(e.freight)
    .bind(e.breakfast_meals)
    .bind(e.lunch_meals)
    .bind(e.accounting_fee)
    .bind(e.inss_fee)
    .bind(values.total)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await
    .map_err(AppError::from)?
    .last_insert_id();

    info!(entry_id = id, total = %values.total, "Ledger entry created");

    Ok(HttpResponse::Created().json(json!({ "id": id, "total": values.total })))
}

/// Replace a ledger entry
///
/// The whole entry is rewritten and the total recomputed.
#[utoipa::path(
    put,
    path = "/api/financial/{id}",
    params(("id", Path, description = "Entry ID")),
    request_body = FinancialInput,
    responses(
        (status = 200, description = "Entry updated"),
        (status = 404, description = "Entry not found")
    ),
    tag = "Financial",
    security(("bearer_auth" = []))
)]
pub async fn update_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<FinancialInput>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let id = path.into_inner();
    let values = payload.ledger_values();
    let e = &values.expenses;

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM financial_entries WHERE id = ?)",
    )
    .bind(id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    if !exists {
        return Err(AppError::not_found("Financial entry", id).into());
    }

    sqlx::query(
        r#"
        UPDATE financial_entries
        SET date = ?, year = ?, month = ?, salary_total = ?, freight = ?,
            breakfast_meals = ?, lunch_meals = ?, accounting_fee = ?, inss_fee = ?, total = ?
        WHERE id = ?
        "#,
    )
    .bind(values.date)
    .bind(values.year)
    .bind(values.month)
    .bind(e.salary_total)
    .bind(e.freight)
    .bind(e.breakfast_meals)
    .bind(e.lunch_meals)
    .bind(e.accounting_fee)
    .bind(e.inss_fee)
    .bind(values.total)
    .bind(id)
    .execute(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(json!({ "id": id, "total": values.total })))
}

#[utoipa::path(
    delete,
    path = "/api/financial/{id}",
    params(("id", Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Entry not found")
    ),
    tag = "Financial",
    security(("bearer_auth" = []))
)]
pub async fn delete_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let id = path.into_inner();

    let result = sqlx::query("DELETE FROM financial_entries WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Financial entry", id).into());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

#[utoipa::path(
    get,
    path = "/api/financial/rollup",
    responses((status = 200, description = "Monthly sums with running total", body = [MonthlyRollupRow])),
    tag = "Financial",
    security(("bearer_auth" = []))
)]
pub async fn monthly_rollup(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let rows = FinancialAggregator::new(repo.get_ref()).monthly_rollup().await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    get,
    path = "/api/financial/export",
    params(
        ("year", Query, description = "Filter by year"),
        ("month", Query, description = "Filter by month (1-12)")
    ),
    responses((status = 200, description = "Ledger as CSV", content_type = "text/csv")),
    tag = "Financial",
    security(("bearer_auth" = []))
)]
pub async fn export_ledger(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
    query: web::Query<LedgerQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let entries = repo.financial_entries(&query.filter()?).await?;
    Ok(csv_response("ledger.csv", ledger_csv(&entries)?))
}

#[utoipa::path(
    get,
    path = "/api/financial/rollup/export",
    responses((status = 200, description = "Monthly rollup as CSV", content_type = "text/csv")),
    tag = "Financial",
    security(("bearer_auth" = []))
)]
pub async fn export_rollup(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let rows = FinancialAggregator::new(repo.get_ref()).monthly_rollup().await?;
    Ok(csv_response("monthly_rollup.csv", rollup_csv(&rows)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_outside_the_calendar_is_rejected() {
        let query = LedgerQuery {
            year: Some(2026),
            month: Some(13),
            page: None,
            per_page: None,
        };
        assert!(matches!(query.filter(), Err(AppError::Validation(_))));
    }
}
