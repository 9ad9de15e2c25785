use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;

use crate::{
    api::csv_response,
    auth::auth::AuthUser,
    error::AppError,
    model::wash::{
        CargoWasherEntry, CarretaWash, DirtyWasherEntry, NewCargoWasherEntry, NewCarretaWash,
        NewDirtyWasherEntry, WashFilter, WashKind,
    },
    repository::{MySqlRepository, WashRepository},
    service::{export::wash_csv, window::DateRange},
};

#[derive(Debug, Default, Deserialize)]
pub struct WashQuery {
    /// Storage code: `sujo` or `carga`.
    pub kind: Option<String>,
    /// Substring of the client name.
    pub client: Option<String>,
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl WashQuery {
    pub fn to_filter(&self) -> Result<WashFilter, AppError> {
        let kind = self
            .kind
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(|k| {
                k.parse::<WashKind>()
                    .map_err(|_| AppError::validation(format!("Unknown wash kind '{k}'")))
            })
            .transpose()?;

        Ok(WashFilter {
            kind,
            client_id: None,
            client_name: self
                .client
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            range: DateRange::from_filters(self.date, self.start, self.end)?,
        })
    }
}

/// `NotFound` when the row is missing, `Validation` when it was deactivated.
async fn ensure_active(pool: &MySqlPool, table: &str, entity: &str, id: u64) -> Result<(), AppError> {
    let active = sqlx::query_scalar::<_, bool>(&format!("SELECT active FROM {table} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match active {
        Some(true) => Ok(()),
        Some(false) => Err(AppError::validation(format!("{entity} {id} is inactive"))),
        None => Err(AppError::not_found(entity, id)),
    }
}

async fn ensure_client(pool: &MySqlPool, client_id: Option<u64>) -> Result<(), AppError> {
    let Some(id) = client_id else {
        return Ok(());
    };

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM clients WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(AppError::not_found("Client", id))
    }
}

async fn delete_row(pool: &MySqlPool, table: &str, entity: &str, id: u64) -> Result<(), AppError> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(entity, id));
    }
    info!(table, id, "Wash entry deleted");
    Ok(())
}

// -------------------- Trailer washes --------------------

#[utoipa::path(
    get,
    path = "/api/washes/carreta",
    params(
        ("kind", Query, description = "Wash kind code (sujo, carga)"),
        ("client", Query, description = "Substring of the client name"),
        ("date", Query, description = "Exact date"),
        ("start", Query, description = "First date, inclusive"),
        ("end", Query, description = "Last date, inclusive")
    ),
    responses((status = 200, description = "Trailer washes, newest first", body = [CarretaWash])),
    tag = "Wash",
    security(("bearer_auth" = []))
)]
pub async fn list_carreta(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
    query: web::Query<WashQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let rows = repo.carreta_washes(&query.to_filter()?).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    post,
    path = "/api/washes/carreta",
    request_body = NewCarretaWash,
    responses(
        (status = 201, description = "Trailer wash recorded", body = Object, example = json!({"id": 10})),
        (status = 400, description = "Inactive box or product type"),
        (status = 404, description = "Unknown client, box type or product type")
    ),
    tag = "Wash",
    security(("bearer_auth" = []))
)]
pub async fn create_carreta(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<NewCarretaWash>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let pool = pool.get_ref();

    ensure_client(pool, payload.client_id).await?;
    ensure_active(pool, "box_types", "Box type", payload.box_type_id).await?;
    ensure_active(pool, "product_types", "Product type", payload.product_type_id).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO carreta_washes
        (date, trailer_ident, client_id, wash_kind, box_type_id, product_type_id,
         box_quantity, unit_price, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.date)
    .bind(payload.trailer_ident.trim())
    .bind(payload.client_id)
    .bind(payload.wash_kind.as_ref())
    .bind(payload.box_type_id)
    .bind(payload.product_type_id)
    .bind(payload.box_quantity)
    .bind(payload.unit_price)
    .bind(auth.user_id)
    .execute(pool)
    .await
    .map_err(AppError::from)?
    .last_insert_id();

    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

/// Edit a trailer wash
///
/// Replaces every editable field. The creator is kept.
#[utoipa::path(
    put,
    path = "/api/washes/carreta/{id}",
    params(("id", Path, description = "Wash ID")),
    request_body = NewCarretaWash,
    responses(
        (status = 200, description = "Updated wash", body = CarretaWash),
        (status = 400, description = "Inactive box or product type"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown wash, client, box type or product type")
    ),
    tag = "Wash",
    security(("bearer_auth" = []))
)]
pub async fn update_carreta(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<NewCarretaWash>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let pool = pool.get_ref();
    let id = path.into_inner();

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM carreta_washes WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)?;
    if !exists {
        return Err(AppError::not_found("Trailer wash", id).into());
    }

    ensure_client(pool, payload.client_id).await?;
    ensure_active(pool, "box_types", "Box type", payload.box_type_id).await?;
    ensure_active(pool, "product_types", "Product type", payload.product_type_id).await?;

    sqlx::query(
        r#"
        UPDATE carreta_washes
        SET date = ?, trailer_ident = ?, client_id = ?, wash_kind = ?, box_type_id = ?,
            product_type_id = ?, box_quantity = ?, unit_price = ?
        WHERE id = ?
        "#,
    )
    .bind(payload.date)
    .bind(payload.trailer_ident.trim())
    .bind(payload.client_id)
    .bind(payload.wash_kind.as_ref())
    .bind(payload.box_type_id)
    .bind(payload.product_type_id)
    .bind(payload.box_quantity)
    .bind(payload.unit_price)
    .bind(id)
    .execute(pool)
    .await
    .map_err(AppError::from)?;

    let wash = sqlx::query_as::<_, CarretaWash>("SELECT * FROM carreta_washes WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)?;

    info!(id, updated_by = auth.user_id, "Trailer wash updated");
    Ok(HttpResponse::Ok().json(wash))
}

#[utoipa::path(
    delete,
    path = "/api/washes/carreta/{id}",
    params(("id", Path, description = "Wash ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Wash not found")
    ),
    tag = "Wash",
    security(("bearer_auth" = []))
)]
pub async fn delete_carreta(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    delete_row(pool.get_ref(), "carreta_washes", "Trailer wash", path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

// -------------------- Washer 1 (dirty boxes) --------------------

#[utoipa::path(
    get,
    path = "/api/washes/dirty",
    params(
        ("kind", Query, description = "Wash kind code (sujo, carga)"),
        ("client", Query, description = "Substring of the client name"),
        ("date", Query, description = "Exact date"),
        ("start", Query, description = "First date, inclusive"),
        ("end", Query, description = "Last date, inclusive")
    ),
    responses((status = 200, description = "Washer 1 entries, newest first", body = [DirtyWasherEntry])),
    tag = "Wash",
    security(("bearer_auth" = []))
)]
pub async fn list_dirty(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
    query: web::Query<WashQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let rows = repo.dirty_washer_entries(&query.to_filter()?).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    post,
    path = "/api/washes/dirty",
    request_body = NewDirtyWasherEntry,
    responses(
        (status = 201, description = "Entry recorded", body = Object, example = json!({"id": 4})),
        (status = 404, description = "Unknown client or product type")
    ),
    tag = "Wash",
    security(("bearer_auth" = []))
)]
pub async fn create_dirty(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<NewDirtyWasherEntry>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let pool = pool.get_ref();

    ensure_client(pool, payload.client_id).await?;
    ensure_active(pool, "product_types", "Product type", payload.product_type_id).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO dirty_washer_entries
        (date, client_id, wash_kind, box_quantity, box_size, product_type_id, unit_price, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.date)
    .bind(payload.client_id)
    .bind(payload.wash_kind.as_ref())
    .bind(payload.box_quantity)
    .bind(payload.box_size.trim())
    .bind(payload.product_type_id)
    .bind(payload.unit_price)
    .bind(auth.user_id)
    .execute(pool)
    .await
    .map_err(AppError::from)?
    .last_insert_id();

    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

#[utoipa::path(
    delete,
    path = "/api/washes/dirty/{id}",
    params(("id", Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Entry not found")
    ),
    tag = "Wash",
    security(("bearer_auth" = []))
)]
pub async fn delete_dirty(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    delete_row(pool.get_ref(), "dirty_washer_entries", "Washer 1 entry", path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

// -------------------- Washer 2 (per load) --------------------

#[utoipa::path(
    get,
    path = "/api/washes/cargo",
    params(
        ("kind", Query, description = "Wash kind code (sujo, carga)"),
        ("client", Query, description = "Substring of the client name"),
        ("date", Query, description = "Exact date"),
        ("start", Query, description = "First date, inclusive"),
        ("end", Query, description = "Last date, inclusive")
    ),
    responses((status = 200, description = "Washer 2 entries, newest first", body = [CargoWasherEntry])),
    tag = "Wash",
    security(("bearer_auth" = []))
)]
pub async fn list_cargo(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
    query: web::Query<WashQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let rows = repo.cargo_washer_entries(&query.to_filter()?).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    post,
    path = "/api/washes/cargo",
    request_body = NewCargoWasherEntry,
    responses(
        (status = 201, description = "Entry recorded", body = Object, example = json!({"id": 2})),
        (status = 404, description = "Unknown client")
    ),
    tag = "Wash",
    security(("bearer_auth" = []))
)]
pub async fn create_cargo(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<NewCargoWasherEntry>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let pool = pool.get_ref();

    ensure_client(pool, payload.client_id).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO cargo_washer_entries
        (date, client_id, wash_kind, box_quantity, q_3a, q_2a, q_1a, q_g, rendered_value, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.date)
    .bind(payload.client_id)
    .bind(payload.wash_kind.as_ref())
    .bind(payload.box_quantity)
    .bind(payload.q_3a)
    .bind(payload.q_2a)
    .bind(payload.q_1a)
    .bind(payload.q_g)
    .bind(payload.rendered_value)
    .bind(auth.user_id)
    .execute(pool)
    .await
    .map_err(AppError::from)?
    .last_insert_id();

    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

#[utoipa::path(
    delete,
    path = "/api/washes/cargo/{id}",
    params(("id", Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Entry not found")
    ),
    tag = "Wash",
    security(("bearer_auth" = []))
)]
pub async fn delete_cargo(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    delete_row(pool.get_ref(), "cargo_washer_entries", "Washer 2 entry", path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

// -------------------- Export --------------------

/// Filtered wash listing as CSV
///
/// Lines from all three sources, then a grand total of their revenue.
#[utoipa::path(
    get,
    path = "/api/washes/export",
    params(
        ("kind", Query, description = "Wash kind code (sujo, carga)"),
        ("client", Query, description = "Substring of the client name"),
        ("date", Query, description = "Exact date"),
        ("start", Query, description = "First date, inclusive"),
        ("end", Query, description = "Last date, inclusive")
    ),
    responses(
        (status = 200, description = "Wash lines as CSV", content_type = "text/csv"),
        (status = 400, description = "Unknown kind or bad date range")
    ),
    tag = "Wash",
    security(("bearer_auth" = []))
)]
pub async fn export_washes(
    auth: AuthUser,
    repo: web::Data<MySqlRepository>,
    query: web::Query<WashQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let filter = query.to_filter()?;
    let (carreta, dirty, cargo) = futures::try_join!(
        repo.carreta_washes(&filter),
        repo.dirty_washer_entries(&filter),
        repo.cargo_washer_entries(&filter),
    )?;

    Ok(csv_response("washes.csv", wash_csv(&carreta, &dirty, &cargo)?))
}
