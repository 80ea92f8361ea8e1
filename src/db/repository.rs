use chrono::Utc;
use sqlx::{Row, SqlitePool};

pub async fn get_value(db: &SqlitePool, key: &str) -> Result<Option<String>, sqlx::Error> {
    let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
        .bind(key)
        .fetch_optional(db)
        .await?;

    Ok(row.map(|r| r.get::<String, _>("value")))
}

pub async fn set_value(db: &SqlitePool, key: &str, value: &str) -> Result<(), sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(now)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn remove_value(db: &SqlitePool, key: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
        .bind(key)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn list_keys(db: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query("SELECT key FROM kv_store ORDER BY key")
        .fetch_all(db)
        .await?;

    Ok(rows.into_iter().map(|r| r.get::<String, _>("key")).collect())
}

/// Values for `keys` in request order; keys with no entry are left out.
pub async fn multi_get(db: &SqlitePool, keys: &[String]) -> Result<Vec<(String, String)>, sqlx::Error> {
    let mut pairs = Vec::with_capacity(keys.len());
    for key in keys {
        if let Some(value) = get_value(db, key).await? {
            pairs.push((key.clone(), value));
        }
    }
    Ok(pairs)
}

pub async fn clear(db: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM kv_store").execute(db).await?;
    Ok(result.rows_affected())
}
