use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::employee::Employee,
    utils::{
        cpf::validate_cpf,
        db_utils::{as_object, build_update_sql, execute_update},
        pagination::Page,
    },
};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::{debug, info};
use utoipa::ToSchema;

/// Columns an update body may touch.
const UPDATABLE: &[&str] = &[
    "name",
    "cpf",
    "address",
    "postal_code",
    "email",
    "phone",
    "job_title_id",
    "active",
];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "João da Silva")]
    pub name: String,
    /// With or without punctuation.
    #[schema(example = "529.982.247-25")]
    pub cpf: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    #[schema(example = "01001-000")]
    pub postal_code: String,
    #[serde(default)]
    #[schema(example = "joao@example.com", format = "email")]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[schema(example = 2)]
    pub job_title_id: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub active: Option<bool>,
    pub job_title_id: Option<u64>,
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 12)]
    pub total: i64,
}

fn push_filters(qb: &mut QueryBuilder<'_, MySql>, query: &EmployeeQuery) {
    qb.push(" WHERE 1 = 1");
    if let Some(active) = query.active {
        qb.push(" AND active = ").push_bind(active);
    }
    if let Some(job_title_id) = query.job_title_id {
        qb.push(" AND job_title_id = ").push_bind(job_title_id);
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let like = format!("%{}%", search);
        qb.push(" AND (name LIKE ")
            .push_bind(like.clone())
            .push(" OR cpf LIKE ")
            .push_bind(like)
            .push(")");
    }
}

/// 404 for a job title that does not exist, before the foreign key would
/// turn it into a conflict.
pub(crate) async fn ensure_job_title(pool: &MySqlPool, id: u64) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM job_titles WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(AppError::not_found("Job title", id));
    }
    Ok(())
}

/// The `job_title_id` an update body asks for, if any.
fn requested_job_title(fields: &serde_json::Map<String, Value>) -> Result<Option<u64>, AppError> {
    match fields.get("job_title_id") {
        None => Ok(None),
        Some(raw) => raw
            .as_u64()
            .map(Some)
            .ok_or_else(|| AppError::validation("job_title_id must be a positive integer")),
    }
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Invalid CPF", body = Object, example = json!({
            "message": "CPF check digits do not match"
        })),
        (status = 404, description = "Job title not found"),
        (status = 409, description = "CPF already registered")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;

    let payload = payload.into_inner();
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Employee name is required").into());
    }
    let cpf = validate_cpf(&payload.cpf).map_err(AppError::from)?;
    ensure_job_title(pool.get_ref(), payload.job_title_id).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO employees
        (name, cpf, address, postal_code, email, phone, job_title_id, active)
        VALUES (?, ?, ?, ?, ?, ?, ?, TRUE)
        "#,
    )
    .bind(payload.name.trim())
    .bind(&cpf)
    .bind(&payload.address)
    .bind(&payload.postal_code)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(payload.job_title_id)
    .execute(pool.get_ref())
    .await
    .map_err(AppError::from)?
    .last_insert_id();

    info!(employee_id = id, "Employee created");

    Ok(HttpResponse::Created().json(Employee {
        id,
        name: payload.name.trim().to_string(),
        cpf,
        address: payload.address,
        postal_code: payload.postal_code,
        email: payload.email,
        phone: payload.phone,
        job_title_id: payload.job_title_id,
        active: true,
    }))
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("active", Query, description = "Filter by active flag"),
        ("job_title_id", Query, description = "Filter by job title"),
        ("search", Query, description = "Search by name or CPF")
    ),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;

    let page = Page::new(query.page, query.per_page, 20);

    let mut count = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM employees");
    push_filters(&mut count, &query);
    debug!(sql = %count.sql(), "Counting employees");

    let total = count
        .build_query_scalar::<i64>()
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    let mut data = QueryBuilder::<MySql>::new("SELECT * FROM employees");
    push_filters(&mut data, &query);
    data.push(" ORDER BY name LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let employees = data
        .build_query_as::<Employee>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

/// Update Employee
///
/// Partial update; a new CPF is validated and stored normalized.
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated", body = Object, example = json!({
            "message": "Employee updated successfully"
        })),
        (status = 400, description = "Invalid field or CPF"),
        (status = 404, description = "Employee or job title not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let employee_id = path.into_inner();

    let mut fields = as_object(body.into_inner())?;
    if let Some(raw) = fields.get("cpf") {
        let raw = raw
            .as_str()
            .ok_or_else(|| AppError::validation("CPF must be a string"))?;
        let cpf = validate_cpf(raw).map_err(AppError::from)?;
        fields.insert("cpf".to_string(), Value::String(cpf));
    }
    if let Some(job_title_id) = requested_job_title(&fields)? {
        ensure_job_title(pool.get_ref(), job_title_id).await?;
    }

    let update = build_update_sql("employees", &fields, UPDATABLE, "id", employee_id)?;
    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(AppError::from)?;

    if affected == 0 {
        return Err(AppError::not_found("Employee", employee_id).into());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee updated successfully" })))
}

/// Deactivate Employee
///
/// Employees are never hard-deleted; history keeps pointing at them.
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee deactivated"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn deactivate_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let employee_id = path.into_inner();

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?)")
        .bind(employee_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    if !exists {
        return Err(AppError::not_found("Employee", employee_id).into());
    }

    sqlx::query("UPDATE employees SET active = FALSE WHERE id = ?")
        .bind(employee_id)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    info!(employee_id, "Employee deactivated");
    Ok(HttpResponse::Ok().json(json!({ "message": "Employee deactivated" })))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee 7 not found"
        }))
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let employee_id = path.into_inner();

    let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Employee", employee_id))?;

    Ok(HttpResponse::Ok().json(employee))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_body_job_title_must_be_an_id() {
        let body = as_object(json!({ "job_title_id": 4, "name": "Ana" })).unwrap();
        assert_eq!(requested_job_title(&body).unwrap(), Some(4));

        let untouched = as_object(json!({ "name": "Ana" })).unwrap();
        assert_eq!(requested_job_title(&untouched).unwrap(), None);

        let bad = as_object(json!({ "job_title_id": "x" })).unwrap();
        assert!(matches!(requested_job_title(&bad), Err(AppError::Validation(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_job_title_is_not_found(pool: MySqlPool) {
        let err = ensure_job_title(&pool, 42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let id = sqlx::query("INSERT INTO job_titles (name, monthly_salary) VALUES ('Lavador', 1500)")
            .execute(&pool)
            .await
            .unwrap()
            .last_insert_id();
        assert!(ensure_job_title(&pool, id).await.is_ok());
    }
}
