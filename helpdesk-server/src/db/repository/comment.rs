//! Comment Repository

use super::{RepoError, RepoResult};
use shared::models::Comment;
use sqlx::{SqliteExecutor, SqlitePool};

pub async fn create(
    pool: &SqlitePool,
    ticket_id: i64,
    author_name: &str,
    body: &str,
) -> RepoResult<Comment> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO comments (ticket_id, author_name, body, created_at) VALUES (?1, ?2, ?3, ?4) RETURNING id",
    )
    .bind(ticket_id)
    .bind(author_name)
    .bind(body)
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create comment".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Comment>> {
    let comment = sqlx::query_as::<_, Comment>(
        "SELECT id, ticket_id, author_name, body, created_at FROM comments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(comment)
}

/// Comments of a ticket, newest first
pub async fn find_by_ticket(pool: &SqlitePool, ticket_id: i64) -> RepoResult<Vec<Comment>> {
    let comments = sqlx::query_as::<_, Comment>(
        "SELECT id, ticket_id, author_name, body, created_at FROM comments \
         WHERE ticket_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(ticket_id)
    .fetch_all(pool)
    .await?;
    Ok(comments)
}

pub async fn delete_by_ticket<'e, E>(executor: E, ticket_id: i64) -> RepoResult<u64>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query("DELETE FROM comments WHERE ticket_id = ?")
        .bind(ticket_id)
        .execute(executor)
        .await?;
    Ok(rows.rows_affected())
}
