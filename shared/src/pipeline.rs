//! Orchestration of extraction, recognition, distance resolution, ledger
//! writes and balance accrual for one uploaded ticket file.

use rdkafka::producer::FutureProducer;
use tokio_postgres::Client;
use tracing::{info, warn};

use crate::coupons;
use crate::directions::DirectionsClient;
use crate::dto::TicketUploaded;
use crate::error::Result;
use crate::kafka;
use crate::ledger;
use crate::recognition::{recognizer_for, ImageStationRecognizer, StationRecognizer, TicketDocument};

/// Synchronous path: recognize the upload inline and commit every candidate
/// before answering. Returns the total kilometers credited to the user.
pub async fn process_upload(
    db: &Client,
    directions: &DirectionsClient,
    doc: &TicketDocument,
    user_id: i32,
    ocr_lang: &str,
) -> Result<i64> {
    let recognizer = recognizer_for(&doc.file_name, ocr_lang)?;
    process_upload_with(db, directions, recognizer.as_ref(), doc, user_id).await
}

/// Like [`process_upload`] with an explicit recognition strategy.
///
/// Candidates are committed one by one; the first failure aborts the upload
/// while earlier candidates stay committed, so a retry of the same file is
/// caught by the duplicate check.
pub async fn process_upload_with(
    db: &Client,
    directions: &DirectionsClient,
    recognizer: &dyn StationRecognizer,
    doc: &TicketDocument,
    user_id: i32,
) -> Result<i64> {
    let candidates = recognizer.recognize(doc).await?;
    let mut total = 0i64;
    for candidate in candidates {
        let origin = candidate.origin.to_lowercase();
        let destination = candidate.destination.to_lowercase();
        let km = directions.distance_km(&origin, &destination).await?;
        ledger::register(
            db,
            &candidate.ticket_number,
            &origin,
            &destination,
            user_id,
            &doc.file_name,
            &doc.data,
        )
        .await?;
        coupons::accrue(db, user_id, km).await?;
        total += km;
    }
    info!(user_id, total, file = %doc.file_name, "upload processed");
    Ok(total)
}

/// Deferred path entry: reserve the placeholder row and announce it to the
/// recognition worker. A failed announce removes the placeholder again and
/// surfaces the queue error, so retrying the upload is not a duplicate.
pub async fn park_upload(
    db: &Client,
    producer: &FutureProducer,
    file_name: &str,
    data: &[u8],
    user_id: i32,
) -> Result<i32> {
    let ticket_id = ledger::reserve(db, file_name, file_name, data, user_id).await?;
    let event = TicketUploaded { ticket_id };
    if let Err(e) = kafka::publish(producer, kafka::TICKET_UPLOADED_TOPIC, &event).await {
        if let Err(cleanup) = ledger::remove(db, ticket_id).await {
            warn!(ticket_id, %cleanup, "placeholder left behind after failed announce");
        }
        return Err(e);
    }
    Ok(ticket_id)
}

/// Deferred continuation run by the recognition worker for a reserved
/// placeholder ticket.
pub async fn process_deferred(
    db: &Client,
    directions: &DirectionsClient,
    ticket_id: i32,
    ocr_lang: &str,
) -> Result<()> {
    let recognizer = ImageStationRecognizer::new(ocr_lang);
    process_deferred_with(db, directions, &recognizer, ticket_id).await
}

/// Like [`process_deferred`] with an explicit recognition strategy.
///
/// The uploader already got its 202, so recognition failures are swallowed
/// after the placeholder is cleaned up. A candidate whose distance cannot
/// be resolved is dropped the same way without voiding its siblings.
pub async fn process_deferred_with(
    db: &Client,
    directions: &DirectionsClient,
    recognizer: &dyn StationRecognizer,
    ticket_id: i32,
) -> Result<()> {
    let ticket = ledger::load(db, ticket_id).await?;
    let doc = TicketDocument {
        file_name: ticket.file_name.clone(),
        data: ticket.data,
    };

    let candidates = match recognizer.recognize(&doc).await {
        Ok(c) => c,
        Err(e) => {
            warn!(ticket_id, %e, "recognition failed, placeholder removed");
            ledger::remove(db, ticket_id).await?;
            return Ok(());
        }
    };

    for candidate in candidates {
        let origin = candidate.origin.to_lowercase();
        let destination = candidate.destination.to_lowercase();
        match directions.distance_km(&origin, &destination).await {
            Ok(km) => {
                ledger::finalize(db, ticket_id, &origin, &destination).await?;
                coupons::accrue(db, ticket.user_id, km).await?;
                info!(ticket_id, km, "deferred candidate committed");
            }
            Err(e) => {
                warn!(ticket_id, %e, "distance unavailable, ticket removed");
                ledger::remove(db, ticket_id).await?;
            }
        }
    }
    Ok(())
}
