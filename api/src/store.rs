use sqlx::sqlite::SqlitePool;

use crate::{
    models::{ask::Ask, user::User},
    password::{HashScheme, StoredCredential},
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS credentials (
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        scheme TEXT NOT NULL,
        secret TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (user_id, scheme)
    )",
    "CREATE TABLE IF NOT EXISTS asks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        video_url TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
];

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Inserts the user and their argon2 credential together.
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, name) VALUES (?, ?) RETURNING id, email, name, created_at",
    )
    .bind(email)
    .bind(name)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO credentials (user_id, scheme, secret) VALUES (?, ?, ?)")
        .bind(user.id)
        .bind(HashScheme::Argon2.as_str())
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(user)
}

#[derive(sqlx::FromRow)]
struct LoginRow {
    id: i64,
    email: String,
    name: String,
    created_at: chrono::NaiveDateTime,
    scheme: String,
    secret: String,
}

/// The user with `email` and their preferred credential (argon2 over
/// plaintext). Rows with an unknown scheme are skipped.
pub async fn find_login(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<(User, StoredCredential)>, sqlx::Error> {
    let row = sqlx::query_as::<_, LoginRow>(
        "SELECT u.id, u.email, u.name, u.created_at, c.scheme, c.secret
         FROM users u JOIN credentials c ON c.user_id = u.id
         WHERE u.email = ? AND c.scheme IN ('argon2', 'plaintext')
         ORDER BY CASE c.scheme WHEN 'argon2' THEN 0 ELSE 1 END
         LIMIT 1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|row| {
        let credential = StoredCredential::from_row(&row.scheme, row.secret)?;
        let user = User {
            id: row.id,
            email: row.email,
            name: row.name,
            created_at: row.created_at,
        };
        Some((user, credential))
    }))
}

pub async fn find_credential(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<StoredCredential>, sqlx::Error> {
    let row: Option<(String, String)> = sqlx::query_as(
        "SELECT scheme, secret FROM credentials
         WHERE user_id = ? AND scheme IN ('argon2', 'plaintext')
         ORDER BY CASE scheme WHEN 'argon2' THEN 0 ELSE 1 END
         LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|(scheme, secret)| StoredCredential::from_row(&scheme, secret)))
}

/// Stores a new argon2 hash and drops any legacy plaintext row, leaving one
/// credential per user.
pub async fn set_password(
    pool: &SqlitePool,
    user_id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO credentials (user_id, scheme, secret) VALUES (?, ?, ?)
         ON CONFLICT (user_id, scheme)
         DO UPDATE SET secret = excluded.secret, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(user_id)
    .bind(HashScheme::Argon2.as_str())
    .bind(password_hash)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM credentials WHERE user_id = ? AND scheme = ?")
        .bind(user_id)
        .bind(HashScheme::Plaintext.as_str())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn insert_ask(
    pool: &SqlitePool,
    user_id: i64,
    title: &str,
    video_url: &str,
) -> Result<Ask, sqlx::Error> {
    sqlx::query_as::<_, Ask>(
        "INSERT INTO asks (user_id, title, video_url) VALUES (?, ?, ?)
         RETURNING id, user_id, title, video_url, created_at",
    )
    .bind(user_id)
    .bind(title)
    .bind(video_url)
    .fetch_one(pool)
    .await
}

pub async fn list_asks(pool: &SqlitePool, user_id: i64) -> Result<Vec<Ask>, sqlx::Error> {
    sqlx::query_as::<_, Ask>(
        "SELECT id, user_id, title, video_url, created_at FROM asks
         WHERE user_id = ? ORDER BY id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
