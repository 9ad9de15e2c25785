use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::attendance::{AttendanceRecord, AttendanceStatus},
    repository::{AttendanceRepository, EmployeeRepository, MySqlRepository},
    service::window::DateRange,
    utils::pagination::Page,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceMark {
    pub employee_id: u64,
    pub status: AttendanceStatus,
}

/// One day of attendance for many employees.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceBatch {
    #[schema(value_type = String, format = "date", example = "2026-03-02")]
    pub date: NaiveDate,
    pub entries: Vec<AttendanceMark>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusUpdate {
    pub status: AttendanceStatus,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub employee_id: Option<u64>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Register a day of attendance
///
/// Each mark replaces whatever status the employee already had that day.
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = AttendanceBatch,
    responses(
        (status = 200, description = "Stored records", body = [AttendanceRecord]),
        (status = 404, description = "Unknown employee")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
pub async fn register_attendance(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
    payload: web::Json<AttendanceBatch>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let batch = payload.into_inner();

    // reject the batch before writing anything when an id is unknown
    for mark in &batch.entries {
        if repo.find_employee(mark.employee_id).await?.is_none() {
            return Err(AppError::not_found("Employee", mark.employee_id).into());
        }
    }

    let mut stored = Vec::with_capacity(batch.entries.len());
    for mark in &batch.entries {
        stored.push(
            repo.upsert_attendance(mark.employee_id, batch.date, mark.status)
                .await?,
        );
    }

    info!(date = %batch.date, count = stored.len(), "Attendance registered");
    Ok(HttpResponse::Ok().json(stored))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(
        ("employee_id", Query, description = "Filter by employee"),
        ("start", Query, description = "First date, inclusive"),
        ("end", Query, description = "Last date, inclusive"),
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page")
    ),
    responses((status = 200, description = "Attendance records, newest first", body = [AttendanceRecord])),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let range = DateRange::from_filters(None, query.start, query.end)?;
    let page = Page::new(query.page, query.per_page, 50);

    let mut qb = QueryBuilder::<MySql>::new("SELECT * FROM attendance_records WHERE 1 = 1");
    if let Some(employee_id) = query.employee_id {
        qb.push(" AND employee_id = ").push_bind(employee_id);
    }
    if let Some(range) = range {
        qb.push(" AND date BETWEEN ")
            .push_bind(range.start)
            .push(" AND ")
            .push_bind(range.end);
    }
    qb.push(" ORDER BY date DESC, employee_id LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let records = qb
        .build_query_as::<AttendanceRecord>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(records))
}

#[utoipa::path(
    put,
    path = "/api/attendance/{id}",
    params(("id", Path, description = "Attendance record ID")),
    request_body = StatusUpdate,
    responses(
        (status = 200, description = "Status changed"),
        (status = 404, description = "Record not found")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
pub async fn update_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<StatusUpdate>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let id = path.into_inner();

    let record = sqlx::query_as::<_, AttendanceRecord>("SELECT * FROM attendance_records WHERE id = ?")
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Attendance record", id))?;

    sqlx::query("UPDATE attendance_records SET status = ? WHERE id = ?")
        .bind(payload.status.as_ref())
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(AttendanceRecord {
        status: payload.status,
        ..record
    }))
}

#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(("id", Path, description = "Attendance record ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Record not found")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
pub async fn delete_attendance(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let id = path.into_inner();

    if !repo.delete_attendance(id).await? {
        return Err(AppError::not_found("Attendance record", id).into());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    #[test]
    fn batch_accepts_readable_status_names() {
        let batch: AttendanceBatch = serde_json::from_str(
            r#"{"date": "2026-03-02", "entries": [
                {"employee_id": 1, "status": "present"},
                {"employee_id": 2, "status": "absent"},
                {"employee_id": 3, "status": "day_off"}
            ]}"#,
        )
        .unwrap();

        let statuses: Vec<_> = batch.entries.iter().map(|m| m.status).collect();
        assert_eq!(
            statuses,
            vec![
                AttendanceStatus::Present,
                AttendanceStatus::Absent,
                AttendanceStatus::DayOff
            ]
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        let parsed = serde_json::from_str::<StatusUpdate>(r#"{"status": "late"}"#);
        assert!(parsed.is_err());
    }

    fn operator() -> AuthUser {
        AuthUser {
            user_id: 7,
            username: "operador".into(),
            role: Role::Operator,
        }
    }

    async fn seeded_record(pool: &MySqlPool) -> u64 {
        let title = sqlx::query("INSERT INTO job_titles (name) VALUES ('Lavador')")
            .execute(pool)
            .await
            .unwrap()
            .last_insert_id();
        let employee = sqlx::query("INSERT INTO employees (name, cpf, job_title_id) VALUES ('Ana', '52998224725', ?)")
            .bind(title)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_id();
        sqlx::query("INSERT INTO attendance_records (employee_id, date, status) VALUES (?, '2026-03-02', 'P')")
            .bind(employee)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_id()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn approved_operators_edit_and_delete_attendance(pool: MySqlPool) {
        let id = seeded_record(&pool).await;

        let edited = update_attendance(
            operator(),
            web::Data::new(pool.clone()),
            web::Path::from(id),
            web::Json(StatusUpdate { status: AttendanceStatus::Absent }),
        )
        .await;
        assert!(edited.is_ok());

        let status: String = sqlx::query_scalar("SELECT status FROM attendance_records WHERE id = ?")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(status, "F");

        let repo = web::Data::new(MySqlRepository::new(pool.clone()));
        assert!(delete_attendance(operator(), repo.clone(), web::Path::from(id)).await.is_ok());

        let again = delete_attendance(operator(), repo, web::Path::from(id)).await;
        let status = again.err().unwrap().error_response().status();
        assert_eq!(status, actix_web::http::StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn pending_users_cannot_delete_attendance(pool: MySqlPool) {
        let id = seeded_record(&pool).await;
        let pending = AuthUser { role: Role::Pending, ..operator() };

        let denied = delete_attendance(
            pending,
            web::Data::new(MySqlRepository::new(pool.clone())),
            web::Path::from(id),
        )
        .await;
        let status = denied.err().unwrap().error_response().status();
        assert_eq!(status, actix_web::http::StatusCode::FORBIDDEN);
    }
}
