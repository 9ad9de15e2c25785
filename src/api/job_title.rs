use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::{auth::auth::AuthUser, error::AppError, model::job_title::JobTitle, utils::lenient};

#[derive(Deserialize, ToSchema)]
pub struct CreateJobTitle {
    #[schema(example = "Lavador")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::amount")]
    #[schema(example = "1850.00", value_type = String)]
    pub monthly_salary: Decimal,
}

#[utoipa::path(
    get,
    path = "/api/job-titles",
    responses((status = 200, description = "All job titles", body = [JobTitle])),
    tag = "Job title",
    security(("bearer_auth" = []))
)]
pub async fn list_job_titles(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;

    let titles = sqlx::query_as::<_, JobTitle>("SELECT * FROM job_titles ORDER BY name")
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(titles))
}

#[utoipa::path(
    post,
    path = "/api/job-titles",
    request_body = CreateJobTitle,
    responses(
        (status = 201, description = "Job title created", body = JobTitle),
        (status = 400, description = "Empty name or negative salary"),
        (status = 403, description = "Admin only")
    ),
    tag = "Job title",
    security(("bearer_auth" = []))
)]
pub async fn create_job_title(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateJobTitle>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Job title name is required").into());
    }
    if payload.monthly_salary.is_sign_negative() {
        return Err(AppError::validation("Monthly salary cannot be negative").into());
    }

    let id = sqlx::query("INSERT INTO job_titles (name, monthly_salary) VALUES (?, ?)")
        .bind(name)
        .bind(payload.monthly_salary)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?
        .last_insert_id();

    Ok(HttpResponse::Created().json(JobTitle {
        id,
        name: name.to_string(),
        monthly_salary: payload.monthly_salary,
    }))
}

/// Delete a job title
///
/// Refused with 409 while any employee holds the title.
#[utoipa::path(
    delete,
    path = "/api/job-titles/{id}",
    params(("id", Path, description = "Job title ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Job title not found"),
        (status = 409, description = "Job title is still assigned")
    ),
    tag = "Job title",
    security(("bearer_auth" = []))
)]
pub async fn delete_job_title(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let id = path.into_inner();

    let holders = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE job_title_id = ?")
        .bind(id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    if holders > 0 {
        return Err(AppError::Conflict(format!(
            "Job title is assigned to {holders} employee(s)"
        ))
        .into());
    }

    let result = sqlx::query("DELETE FROM job_titles WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Job title", id).into());
    }

    info!(job_title_id = id, "Job title deleted");
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use actix_web::http::StatusCode;

    #[actix_web::test]
    async fn only_admins_create_job_titles() {
        // the guard rejects before any query runs
        let pool = MySqlPool::connect_lazy("mysql://root@localhost/unused").unwrap();
        let operator = AuthUser {
            user_id: 7,
            username: "operador".into(),
            role: Role::Operator,
        };

        let denied = create_job_title(
            operator,
            web::Data::new(pool),
            web::Json(CreateJobTitle {
                name: "Lavador".into(),
                monthly_salary: Decimal::new(1500, 0),
            }),
        )
        .await;

        let status = denied.err().unwrap().error_response().status();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
