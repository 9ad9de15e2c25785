//! Box types and product types offered on trailer washes.
//!
//! Both lists are soft-deleted: a deactivated row stays referenced by past
//! washes but cannot be chosen for new ones.

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::catalog::{BoxType, ProductType},
};

#[derive(Deserialize, ToSchema)]
pub struct CreateBoxType {
    #[schema(example = "Plástica")]
    pub name: String,
    #[schema(example = "G")]
    pub size: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateProductType {
    #[schema(example = "Banana")]
    pub name: String,
}

fn required_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    Ok(name)
}

async fn deactivate(pool: &MySqlPool, table: &str, entity: &str, id: u64) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)"
    ))
    .bind(id)
    .fetch_one(pool)
    .await?;

    if !exists {
        return Err(AppError::not_found(entity, id));
    }

    sqlx::query(&format!("UPDATE {table} SET active = FALSE WHERE id = ?"))
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/box-types",
    responses((status = 200, description = "Active box types", body = [BoxType])),
    tag = "Catalog",
    security(("bearer_auth" = []))
)]
pub async fn list_box_types(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;

    let rows = sqlx::query_as::<_, BoxType>(
        "SELECT * FROM box_types WHERE active = TRUE ORDER BY name",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    post,
    path = "/api/box-types",
    request_body = CreateBoxType,
    responses((status = 201, description = "Box type created", body = BoxType)),
    tag = "Catalog",
    security(("bearer_auth" = []))
)]
pub async fn create_box_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateBoxType>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let name = required_name(&payload.name)?;
    let size = payload.size.trim();

    let id = sqlx::query("INSERT INTO box_types (name, size, active) VALUES (?, ?, TRUE)")
        .bind(name)
        .bind(size)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?
        .last_insert_id();

    Ok(HttpResponse::Created().json(BoxType {
        id,
        name: name.to_string(),
        size: size.to_string(),
        active: true,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/box-types/{id}",
    params(("id", Path, description = "Box type ID")),
    responses(
        (status = 200, description = "Box type deactivated"),
        (status = 404, description = "Box type not found")
    ),
    tag = "Catalog",
    security(("bearer_auth" = []))
)]
pub async fn deactivate_box_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    deactivate(pool.get_ref(), "box_types", "Box type", path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Box type deactivated" })))
}

#[utoipa::path(
    get,
    path = "/api/product-types",
    responses((status = 200, description = "Active product types", body = [ProductType])),
    tag = "Catalog",
    security(("bearer_auth" = []))
)]
pub async fn list_product_types(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;

    let rows = sqlx::query_as::<_, ProductType>(
        "SELECT * FROM product_types WHERE active = TRUE ORDER BY name",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    post,
    path = "/api/product-types",
    request_body = CreateProductType,
    responses((status = 201, description = "Product type created", body = ProductType)),
    tag = "Catalog",
    security(("bearer_auth" = []))
)]
pub async fn create_product_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateProductType>,
) -> actix_web::Result<impl Responder> {
    auth.require_approved()?;
    let name = required_name(&payload.name)?;

    let id = sqlx::query("INSERT INTO product_types (name, active) VALUES (?, TRUE)")
        .bind(name)
        .execute(pool.get_ref())
        .await
        .map_err(AppError::from)?
        .last_insert_id();

    Ok(HttpResponse::Created().json(ProductType {
        id,
        name: name.to_string(),
        active: true,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/product-types/{id}",
    params(("id", Path, description = "Product type ID")),
    responses(
        (status = 200, description = "Product type deactivated"),
        (status = 404, description = "Product type not found")
    ),
    tag = "Catalog",
    security(("bearer_auth" = []))
)]
pub async fn deactivate_product_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    deactivate(pool.get_ref(), "product_types", "Product type", path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Product type deactivated" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(required_name("  Plástica ").unwrap(), "Plástica");
        assert!(matches!(required_name("   "), Err(AppError::Validation(_))));
    }
}
