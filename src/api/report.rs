use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    api::{csv_response, today},
    auth::auth::AuthUser,
    repository::MySqlRepository,
    service::{
        aggregation::PeriodSummary,
        export::summary_csv,
        report::{Dashboard, ReportPeriod, dashboard as build_dashboard, period_report},
    },
};

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    pub period: ReportPeriod,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Revenue, expenses and profit of a period
///
/// Expenses include every ledger month the period touches, in full.
#[utoipa::path(
    get,
    path = "/api/reports/period",
    params(
        ("period", Query, description = "daily, weekly, monthly or custom"),
        ("start", Query, description = "Custom start, defaults to today"),
        ("end", Query, description = "Custom end, defaults to today")
    ),
    responses(
        (status = 200, description = "Period summary", body = PeriodSummary),
        (status = 400, description = "Start after end")
    ),
    tag = "Report",
    security(("bearer_auth" = []))
)]
pub async fn period(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let summary = period_report(repo.get_ref(), query.period, today(), query.start, query.end).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Period summary as a one-line CSV
#[utoipa::path(
    get,
    path = "/api/reports/period/export",
    params(
        ("period", Query, description = "daily, weekly, monthly or custom"),
        ("start", Query, description = "Custom start, defaults to today"),
        ("end", Query, description = "Custom end, defaults to today")
    ),
    responses(
        (status = 200, description = "Period summary as CSV", content_type = "text/csv"),
        (status = 400, description = "Start after end")
    ),
    tag = "Report",
    security(("bearer_auth" = []))
)]
pub async fn export_period(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let summary = period_report(repo.get_ref(), query.period, today(), query.start, query.end).await?;
    let filename = format!("report_{}_{}.csv", summary.range.start, summary.range.end);
    Ok(csv_response(&filename, summary_csv(&summary)?))
}

#[utoipa::path(
    get,
    path = "/api/reports/dashboard",
    responses((status = 200, description = "Current month at a glance", body = Dashboard)),
    tag = "Report",
    security(("bearer_auth" = []))
)]
pub async fn dashboard(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let board = build_dashboard(repo.get_ref(), today()).await?;
    Ok(HttpResponse::Ok().json(board))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use actix_web::{body::to_bytes, http::header, test::TestRequest};
    use sqlx::MySqlPool;

    #[sqlx::test(migrations = "./migrations")]
    async fn custom_period_exports_as_a_named_attachment(pool: MySqlPool) {
        sqlx::query(
            "INSERT INTO cargo_washer_entries (date, box_quantity, rendered_value) VALUES ('2026-03-03', 40, 780.00)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO financial_entries (date, year, month, freight, total) VALUES ('2026-03-31', 2026, 3, 80.00, 80.00)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let query = PeriodQuery {
            period: ReportPeriod::Custom,
            start: NaiveDate::from_ymd_opt(2026, 3, 1),
            end: NaiveDate::from_ymd_opt(2026, 3, 31),
        };
        let operator = AuthUser {
            user_id: 1,
            username: "joao".into(),
            role: Role::Operator,
        };
        let resp = export_period(operator, web::Data::new(MySqlRepository::new(pool)), web::Query(query))
            .await
            .unwrap()
            .respond_to(&TestRequest::default().to_http_request());

        let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap();
        assert_eq!(disposition, "attachment; filename=\"report_2026-03-01_2026-03-31.csv\"");

        let body = to_bytes(resp.map_into_boxed_body().into_body()).await.unwrap();
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            "start,end,carreta,dirty_washer,cargo_washer,revenue,expenses,profit\n\
             2026-03-01,2026-03-31,0,0,780.00,780.00,80.00,700.00\n"
        );
    }
}
