use crate::{
    auth::{
        auth::AuthUser,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::AppError,
    model::{role::Role, user::User},
    models::{LoginReqDto, RegisterReq, TokenPair, TokenType, UserSql},
};
use actix_web::{HttpRequest, HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn unauthorized(message: &str) -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({ "message": message }))
}

/// Signs a fresh access/refresh pair and stores the refresh token id.
async fn issue_tokens(
    pool: &MySqlPool,
    config: &Config,
    user_id: u64,
    username: &str,
    role: Role,
) -> actix_web::Result<TokenPair> {
    let access_token = generate_access_token(
        user_id,
        username.to_string(),
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign access token");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        user_id,
        username.to_string(),
        role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign refresh token");
        ErrorInternalServerError("Internal Server Error")
    })?;

    debug!(user_id, jti = %refresh_claims.jti, "Storing refresh token");

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user_id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool)
    .await
    .map_err(AppError::from)?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        role: role.to_string(),
    })
}

/// Revokes a stored refresh token in one statement. Returns false when the
/// token is unknown or was already used, so only one caller can rotate it.
async fn consume_refresh_token(pool: &MySqlPool, jti: &str) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ? AND revoked = FALSE",
    )
    .bind(jti)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

async fn find_credentials(pool: &MySqlPool, username: &str) -> Result<Option<UserSql>, AppError> {
    let user = sqlx::query_as::<_, UserSql>(
        r#"
        SELECT u.id, u.username, u.password, u.is_staff,
               COALESCE(p.is_approved, FALSE) AS is_approved
        FROM users u
        LEFT JOIN profiles p ON p.user_id = u.id
        WHERE u.username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Registers a user awaiting approval
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered", body = Object, example = json!({
            "message": "User registered successfully, awaiting approval"
        })),
        (status = 400, description = "Empty username or password"),
        (status = 409, description = "Username already exists")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(pool, user), fields(username = %user.username))]
pub async fn register(
    user: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let username = user.username.trim();
    if username.is_empty() || user.password.is_empty() {
        return Err(AppError::validation("Username and password must not be empty").into());
    }

    let hashed = hash_password(&user.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // user and profile are created together or not at all
    let mut tx = pool.begin().await.map_err(AppError::from)?;

    let user_id = sqlx::query("INSERT INTO users (username, password, email) VALUES (?, ?, ?)")
        .bind(username)
        .bind(hashed)
        .bind(user.email.trim())
        .execute(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Username already exists".to_string()),
            other => other,
        })?
        .last_insert_id();

    sqlx::query("INSERT INTO profiles (user_id, is_approved) VALUES (?, FALSE)")
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

    tx.commit().await.map_err(AppError::from)?;

    info!(user_id, "User registered");

    Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully, awaiting approval"
    })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(AppError::validation("Username or password required").into());
    }

    let Some(db_user) = find_credentials(pool.get_ref(), user.username.trim()).await? else {
        info!("Invalid credentials: user not found");
        return Ok(unauthorized("Invalid credentials"));
    };

    debug!(user_id = db_user.id, "Verifying password");

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Ok(unauthorized("Invalid credentials"));
    }

    let tokens = issue_tokens(
        pool.get_ref(),
        &config,
        db_user.id,
        &db_user.username,
        db_user.role(),
    )
    .await?;

    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        // not fatal for the login
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(role = %db_user.role(), "Login successful");

    Ok(HttpResponse::Ok().json(tokens))
}

/// Rotates a refresh token.
///
/// The role is read again from the database, so an approval granted after
/// login takes effect on the next refresh.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Missing, revoked or invalid refresh token")
    ),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let Some(token) = bearer(&req) else {
        return Ok(unauthorized("No token"));
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return Ok(unauthorized("Invalid token")),
    };

    if !consume_refresh_token(pool.get_ref(), &claims.jti).await? {
        return Ok(unauthorized("Invalid token"));
    }

    let Some(db_user) = find_credentials(pool.get_ref(), &claims.sub).await? else {
        return Ok(unauthorized("Invalid token"));
    };

    let tokens = issue_tokens(
        pool.get_ref(),
        &config,
        db_user.id,
        &db_user.username,
        db_user.role(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(tokens))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Refresh token revoked (idempotent)")),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(token) = bearer(&req) else {
        return HttpResponse::NoContent().finish();
    };

    // only refresh tokens can log out
    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = Object, example = json!({
            "user_id": 1, "username": "admin", "role": "admin"
        }))
    ),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
pub async fn me(auth: AuthUser) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "user_id": auth.user_id,
        "username": auth.username,
        "role": auth.role.to_string(),
    }))
}

/// Lists accounts waiting for approval
#[utoipa::path(
    get,
    path = "/api/users/pending",
    responses(
        (status = 200, description = "Unapproved users", body = [User]),
        (status = 403, description = "Admin only")
    ),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
pub async fn list_pending_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.password, u.email, u.is_staff,
               COALESCE(p.is_approved, FALSE) AS is_approved
        FROM users u
        LEFT JOIN profiles p ON p.user_id = u.id
        WHERE u.is_staff = FALSE AND COALESCE(p.is_approved, FALSE) = FALSE
        ORDER BY u.id
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/approve",
    params(("user_id", Path, description = "User ID")),
    responses(
        (status = 200, description = "User approved"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
pub async fn approve_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let user_id = path.into_inner();

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(user_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    if !exists {
        return Err(AppError::not_found("User", user_id).into());
    }

    // also covers users registered before their profile row existed
    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, is_approved) VALUES (?, TRUE)
        ON DUPLICATE KEY UPDATE is_approved = TRUE
        "#,
    )
    .bind(user_id)
    .execute(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    info!(user_id, approved_by = auth.user_id, "User approved");

    Ok(HttpResponse::Ok().json(json!({ "message": "User approved" })))
}
