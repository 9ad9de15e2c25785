use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::info;

use crate::auth::password::hash_password;

/// Connects and applies pending migrations.
pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    let pool = MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(pool)
}

/// Creates the bootstrap staff account unless the username already exists.
pub async fn seed_admin(pool: &MySqlPool, username: &str, password: &str) -> Result<()> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? LIMIT 1)",
    )
    .bind(username)
    .fetch_one(pool)
    .await?;

    if exists {
        return Ok(());
    }

    let hashed = hash_password(password).map_err(|e| anyhow::anyhow!("hashing failed: {e}"))?;

    let mut tx = pool.begin().await?;
    let user_id = sqlx::query("INSERT INTO users (username, password, is_staff) VALUES (?, ?, 1)")
        .bind(username)
        .bind(hashed)
        .execute(&mut *tx)
        .await?
        .last_insert_id();
    sqlx::query("INSERT INTO profiles (user_id, is_approved) VALUES (?, 1)")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(username, "Bootstrap admin created");
    Ok(())
}
