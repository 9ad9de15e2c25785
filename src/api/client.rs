use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::{
        client::Client,
        wash::{CargoWasherEntry, CarretaWash, DirtyWasherEntry, WashFilter},
    },
    repository::{MySqlRepository, WashRepository},
    utils::db_utils::{as_object, build_update_sql, execute_update},
};

const UPDATABLE: &[&str] = &["name", "cnpj", "phone", "email"];

#[derive(Deserialize, ToSchema)]
pub struct CreateClient {
    #[schema(example = "Transportadora Norte")]
    pub name: String,
    #[schema(example = "12.345.678/0001-90")]
    pub cnpj: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ClientQuery {
    pub search: Option<String>,
}

/// Every wash of one client across the three services.
#[derive(Serialize, ToSchema)]
pub struct ClientWashReport {
    pub client: Client,
    pub carreta: Vec<CarretaWash>,
    pub dirty_washer: Vec<DirtyWasherEntry>,
    pub cargo_washer: Vec<CargoWasherEntry>,
    #[schema(value_type = String)]
    pub revenue: Decimal,
}

async fn fetch_client(pool: &MySqlPool, id: u64) -> Result<Client, AppError> {
    sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Client", id))
}

#[utoipa::path(
    get,
    path = "/api/clients",
    params(("search", Query, description = "Substring of the client name")),
    responses((status = 200, description = "Clients by name", body = [Client])),
    tag = "Client",
    security(("bearer_auth" = []))
)]
pub async fn list_clients(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ClientQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;

    let mut qb = QueryBuilder::<MySql>::new("SELECT * FROM clients");
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        qb.push(" WHERE name LIKE ").push_bind(format!("%{}%", search));
    }
    qb.push(" ORDER BY name");

    let clients = qb
        .build_query_as::<Client>()
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(clients))
}

#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    params(("id", Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client", body = Client),
        (status = 404, description = "Client not found")
    ),
    tag = "Client",
    security(("bearer_auth" = []))
)]
pub async fn get_client(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let client = fetch_client(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(client))
}

#[utoipa::path(
    post,
    path = "/api/clients",
    request_body = CreateClient,
    responses(
        (status = 201, description = "Client created", body = Client),
        (status = 400, description = "Missing name")
    ),
    tag = "Client",
    security(("bearer_auth" = []))
)]
pub async fn create_client(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateClient>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;

    let payload = payload.into_inner();
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("Client name is required").into());
    }
    let cnpj = payload
        .cnpj
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let id = sqlx::query("INSERT INTO clients (name, cnpj, phone, email) VALUES (?, ?, ?, ?)")
        .bind(&name)
        .bind(&cnpj)
        .bind(&payload.phone)
        .bind(&payload.email)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?
        .last_insert_id();

    Ok(HttpResponse::Created().json(Client {
        id,
        name,
        cnpj,
        phone: payload.phone,
        email: payload.email,
    }))
}

#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    params(("id", Path, description = "Client ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Client updated"),
        (status = 404, description = "Client not found")
    ),
    tag = "Client",
    security(("bearer_auth" = []))
)]
pub async fn update_client(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let id = path.into_inner();

    let fields = as_object(body.into_inner())?;
    let update = build_update_sql("clients", &fields, UPDATABLE, "id", id)?;
    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(AppError::from)?;

    if affected == 0 {
        return Err(AppError::not_found("Client", id).into());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Client updated successfully" })))
}

/// Delete a client
///
/// Refused with 409 while any wash entry references the client.
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    params(("id", Path, description = "Client ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Client not found"),
        (status = 409, description = "Client has wash entries")
    ),
    tag = "Client",
    security(("bearer_auth" = []))
)]
pub async fn delete_client(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let id = path.into_inner();

    let references = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT (SELECT COUNT(*) FROM carreta_washes WHERE client_id = ?)
             + (SELECT COUNT(*) FROM dirty_washer_entries WHERE client_id = ?)
             + (SELECT COUNT(*) FROM cargo_washer_entries WHERE client_id = ?)
        "#,
    )
    .bind(id)
    .bind(id)
    .bind(id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    if references > 0 {
        return Err(AppError::Conflict(format!(
            "Client is referenced by {references} wash entries"
        ))
        .into());
    }

    let result = sqlx::query("DELETE FROM clients WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Client", id).into());
    }

    info!(client_id = id, "Client deleted");
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

#[utoipa::path(
    get,
    path = "/api/clients/{id}/washes",
    params(("id", Path, description = "Client ID")),
    responses(
        (status = 200, description = "All washes of the client", body = ClientWashReport),
        (status = 404, description = "Client not found")
    ),
    tag = "Client",
    security(("bearer_auth" = []))
)]
pub async fn client_washes(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    repo: web::Data<MySqlRepository>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let client = fetch_client(pool.get_ref(), path.into_inner()).await?;

    let filter = WashFilter::for_client(client.id);
    let (carreta, dirty_washer, cargo_washer) = futures::try_join!(
        repo.carreta_washes(&filter),
        repo.dirty_washer_entries(&filter),
        repo.cargo_washer_entries(&filter),
    )?;

    let revenue = carreta.iter().map(|w| w.revenue()).sum::<Decimal>()
        + dirty_washer.iter().map(|w| w.revenue()).sum::<Decimal>()
        + cargo_washer.iter().map(|w| w.revenue()).sum::<Decimal>();

    Ok(HttpResponse::Ok().json(ClientWashReport {
        client,
        carreta,
        dirty_washer,
        cargo_washer,
        revenue,
    }))
}
