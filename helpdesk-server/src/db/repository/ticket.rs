//! Ticket Repository

use super::{RepoError, RepoResult};
use shared::models::{
    AssigneeFilter, Lifecycle, NewTicket, Priority, Ticket, TicketDetails, TicketFilter,
    TicketRow,
};
use shared::PaginatedResponse;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

const SELECT_TICKET: &str = "SELECT t.id, t.kind, t.status, t.created_at, t.started_at, t.closed_at, \
     t.requester_name, t.description, t.image_filename, t.assigned_to_id, \
     u.username AS assigned_to_username, \
     t.vehicle_type, t.vehicle_number, t.anomaly_category, t.title, t.department, t.priority \
     FROM tickets t LEFT JOIN users u ON u.id = t.assigned_to_id";

fn into_ticket(row: TicketRow) -> RepoResult<Ticket> {
    Ticket::try_from(row).map_err(|e| RepoError::Database(e.message))
}

/// Insert a submission as a `NEW`, unassigned ticket
pub async fn create(
    pool: &SqlitePool,
    data: &NewTicket,
    image_filename: Option<&str>,
) -> RepoResult<i64> {
    let now = shared::util::now_millis();
    let kind = data.details.kind();

    let (vehicle_type, vehicle_number, anomaly_category, title, department, priority) =
        match &data.details {
            TicketDetails::Vehicle {
                vehicle_type,
                vehicle_number,
                anomaly_category,
            } => (
                Some(vehicle_type.as_str()),
                vehicle_number.as_deref(),
                Some(anomaly_category.as_str()),
                None,
                None,
                None,
            ),
            TicketDetails::Technical {
                title,
                department,
                priority,
            } => (
                None,
                None,
                None,
                Some(title.as_str()),
                department.as_deref(),
                Some(*priority),
            ),
        };

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO tickets (kind, status, created_at, requester_name, description, image_filename, \
         vehicle_type, vehicle_number, anomaly_category, title, department, priority) \
         VALUES (?1, 'NEW', ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) RETURNING id",
    )
    .bind(kind)
    .bind(now)
    .bind(&data.requester_name)
    .bind(&data.description)
    .bind(image_filename)
    .bind(vehicle_type)
    .bind(vehicle_number)
    .bind(anomaly_category)
    .bind(title)
    .bind(department)
    .bind(priority)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Ticket>> {
    let row = sqlx::query_as::<_, TicketRow>(&format!("{SELECT_TICKET} WHERE t.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(into_ticket).transpose()
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &'a TicketFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(term) = filter.search.as_deref() {
        qb.push(" AND (");
        if let Some(id) = filter.search_id() {
            qb.push("t.id = ").push_bind(id).push(" OR ");
        }
        qb.push("instr(lower(t.requester_name), lower(")
            .push_bind(term)
            .push(")) > 0 OR instr(lower(t.description), lower(")
            .push_bind(term)
            .push(")) > 0)");
    }

    if let Some(status) = filter.status {
        qb.push(" AND t.status = ").push_bind(status);
    }

    match filter.assignee {
        AssigneeFilter::Any => {}
        AssigneeFilter::Unassigned => {
            qb.push(" AND t.assigned_to_id IS NULL");
        }
        AssigneeFilter::Identity(id) => {
            qb.push(" AND t.assigned_to_id = ").push_bind(id);
        }
    }
}

/// One page of tickets matching `filter`, newest first, plus the total match count
pub async fn find_page(
    pool: &SqlitePool,
    filter: &TicketFilter,
    page_size: u32,
) -> RepoResult<(Vec<Ticket>, u64)> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tickets t");
    push_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let offset = PaginatedResponse::<Ticket>::offset(filter.page, page_size) as i64;
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_TICKET);
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ")
        .push_bind(page_size as i64)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows = qb.build_query_as::<TicketRow>().fetch_all(pool).await?;
    let tickets = rows
        .into_iter()
        .map(into_ticket)
        .collect::<RepoResult<Vec<_>>>()?;

    Ok((tickets, total.max(0) as u64))
}

/// Persist a status change and the timestamps that go with it
pub async fn update_lifecycle(pool: &SqlitePool, id: i64, lifecycle: &Lifecycle) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE tickets SET status = ?1, started_at = ?2, closed_at = ?3 WHERE id = ?4",
    )
    .bind(lifecycle.status)
    .bind(lifecycle.started_at)
    .bind(lifecycle.closed_at)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("ticket {id} not found")));
    }
    Ok(())
}

pub async fn set_assignee(pool: &SqlitePool, id: i64, assignee: Option<i64>) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE tickets SET assigned_to_id = ?1 WHERE id = ?2")
        .bind(assignee)
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("ticket {id} not found")));
    }
    Ok(())
}

/// Update priority; only technical tickets carry one
pub async fn set_priority(pool: &SqlitePool, id: i64, priority: Priority) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE tickets SET priority = ?1 WHERE id = ?2 AND kind = 'TECHNICAL'")
        .bind(priority)
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("technical ticket {id} not found")));
    }
    Ok(())
}

/// Clear the owner of every ticket assigned to `identity_id`
pub async fn detach_identity<'e, E>(executor: E, identity_id: i64) -> RepoResult<u64>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query("UPDATE tickets SET assigned_to_id = NULL WHERE assigned_to_id = ?")
        .bind(identity_id)
        .execute(executor)
        .await?;
    Ok(rows.rows_affected())
}

pub async fn delete<'e, E>(executor: E, id: i64) -> RepoResult<bool>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query("DELETE FROM tickets WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Every attachment filename still referenced by a ticket
pub async fn find_image_filenames(pool: &SqlitePool) -> RepoResult<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT image_filename FROM tickets WHERE image_filename IS NOT NULL",
    )
    .fetch_all(pool)
    .await?;
    Ok(names)
}
