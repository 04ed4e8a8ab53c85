//! Persistence of recognized tickets.
//!
//! The UNIQUE constraint on `unique_number` is the single line of defense
//! against redeeming the same physical ticket twice, so inserts go through
//! `ON CONFLICT DO NOTHING` and a missing returned row means a duplicate.

use tokio_postgres::Client;
use tracing::info;

use crate::error::{AppError, Result};

/// A stored ticket row loaded back for deferred recognition.
#[derive(Debug)]
pub struct StoredTicket {
    pub id: i32,
    pub file_name: String,
    pub data: Vec<u8>,
    pub user_id: i32,
}

/// Insert a fully recognized ticket in one step (synchronous path).
pub async fn register(
    db: &Client,
    unique_number: &str,
    origin: &str,
    destination: &str,
    user_id: i32,
    file_name: &str,
    file_data: &[u8],
) -> Result<i32> {
    let row = db
        .query_opt(
            "INSERT INTO tickets (file_name, file_data, origin, destination, unique_number, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (unique_number) DO NOTHING \
             RETURNING id",
            &[&file_name, &file_data, &origin, &destination, &unique_number, &user_id],
        )
        .await?;
    match row {
        Some(row) => {
            let id: i32 = row.get(0);
            info!(id, unique_number, "ticket registered");
            Ok(id)
        }
        None => Err(AppError::DuplicateTicket),
    }
}

/// Reserve a placeholder row before recognition runs (deferred path). The
/// stations stay NULL until the worker fills them in; the dedup check
/// happens here so a duplicate is rejected before anything is enqueued.
pub async fn reserve(
    db: &Client,
    unique_number: &str,
    file_name: &str,
    file_data: &[u8],
    user_id: i32,
) -> Result<i32> {
    let row = db
        .query_opt(
            "INSERT INTO tickets (file_name, file_data, unique_number, user_id) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (unique_number) DO NOTHING \
             RETURNING id",
            &[&file_name, &file_data, &unique_number, &user_id],
        )
        .await?;
    match row {
        Some(row) => {
            let id: i32 = row.get(0);
            info!(id, unique_number, "placeholder ticket reserved");
            Ok(id)
        }
        None => Err(AppError::DuplicateTicket),
    }
}

/// Load a ticket for the recognition worker.
pub async fn load(db: &Client, ticket_id: i32) -> Result<StoredTicket> {
    let row = db
        .query_opt(
            "SELECT id, file_name, file_data, user_id FROM tickets WHERE id = $1",
            &[&ticket_id],
        )
        .await?
        .ok_or_else(|| AppError::Database(format!("ticket {ticket_id} does not exist")))?;
    let data: Option<Vec<u8>> = row.get(2);
    let user_id: Option<i32> = row.get(3);
    Ok(StoredTicket {
        id: row.get(0),
        file_name: row.get(1),
        data: data.unwrap_or_default(),
        user_id: user_id
            .ok_or_else(|| AppError::Database(format!("ticket {ticket_id} has no owner")))?,
    })
}

/// Write the recognized stations onto an existing ticket.
pub async fn finalize(db: &Client, ticket_id: i32, origin: &str, destination: &str) -> Result<()> {
    db.execute(
        "UPDATE tickets SET origin = $2, destination = $3 WHERE id = $1",
        &[&ticket_id, &origin, &destination],
    )
    .await?;
    Ok(())
}

/// Compensating delete for failed recognition or distance resolution.
pub async fn remove(db: &Client, ticket_id: i32) -> Result<()> {
    db.execute("DELETE FROM tickets WHERE id = $1", &[&ticket_id]).await?;
    info!(ticket_id, "ticket removed");
    Ok(())
}
