//! Identity Repository

use super::{RepoError, RepoResult};
use shared::models::{Identity, IdentityResponse, IdentitySummary};
use sqlx::{SqliteExecutor, SqlitePool};

const SELECT_IDENTITY: &str =
    "SELECT id, username, password_hash, is_superuser, created_at FROM users";

pub async fn create(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    is_superuser: bool,
) -> RepoResult<Identity> {
    if find_by_username(pool, username).await?.is_some() {
        return Err(RepoError::Duplicate(format!("username {username}")));
    }

    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (username, password_hash, is_superuser, created_at) VALUES (?1, ?2, ?3, ?4) RETURNING id",
    )
    .bind(username)
    .bind(password_hash)
    .bind(is_superuser)
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create identity".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Identity>> {
    let identity = sqlx::query_as::<_, Identity>(&format!("{SELECT_IDENTITY} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(identity)
}

/// Exact, case-sensitive username lookup
pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<Identity>> {
    let identity =
        sqlx::query_as::<_, Identity>(&format!("{SELECT_IDENTITY} WHERE username = ?"))
            .bind(username)
            .fetch_optional(pool)
            .await?;
    Ok(identity)
}

/// All identities, for assignment dropdowns and the dashboard filter
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<IdentityResponse>> {
    let identities = sqlx::query_as::<_, IdentityResponse>(
        "SELECT id, username, is_superuser, created_at FROM users ORDER BY username",
    )
    .fetch_all(pool)
    .await?;
    Ok(identities)
}

/// All identities with the number of tickets assigned to each
pub async fn find_all_with_counts(pool: &SqlitePool) -> RepoResult<Vec<IdentitySummary>> {
    let identities = sqlx::query_as::<_, IdentitySummary>(
        "SELECT u.id, u.username, u.is_superuser, u.created_at, COUNT(t.id) AS assigned_tickets \
         FROM users u LEFT JOIN tickets t ON t.assigned_to_id = u.id \
         GROUP BY u.id ORDER BY u.username",
    )
    .fetch_all(pool)
    .await?;
    Ok(identities)
}

pub async fn count_superusers(pool: &SqlitePool) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_superuser = 1")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn exists(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

pub async fn update_password(pool: &SqlitePool, id: i64, password_hash: &str) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE users SET password_hash = ?1 WHERE id = ?2")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("identity {id} not found")));
    }
    Ok(())
}

pub async fn set_superuser(pool: &SqlitePool, id: i64, is_superuser: bool) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE users SET is_superuser = ?1 WHERE id = ?2")
        .bind(is_superuser)
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("identity {id} not found")));
    }
    Ok(())
}

/// Delete the identity row; returns whether a row was removed
pub async fn delete<'e, E>(executor: E, id: i64) -> RepoResult<bool>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(rows.rows_affected() > 0)
}
