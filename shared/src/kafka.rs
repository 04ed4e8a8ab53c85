//! Kafka helpers shared across the services: topic bootstrap, producer
//! construction and event publishing.

use std::time::Duration;

use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, Result};

/// Topic carrying [`crate::dto::TicketUploaded`] events from the API to the
/// recognition worker.
pub const TICKET_UPLOADED_TOPIC: &str = "ticket-uploaded";

/// Ensure that the given Kafka topics exist.
///
/// Attempts to create each topic with a single partition and replication
/// factor 1. If the topic already exists the error is ignored.
pub async fn ensure_topics(broker: &str, topics: &[&str]) -> std::result::Result<(), KafkaError> {
    let admin: AdminClient<_> = ClientConfig::new()
        .set("bootstrap.servers", broker)
        .create()?;
    let new_topics: Vec<NewTopic> = topics
        .iter()
        .map(|t| NewTopic::new(t, 1, TopicReplication::Fixed(1)))
        .collect();
    let results = admin
        .create_topics(new_topics.iter(), &AdminOptions::new())
        .await?;
    for result in results {
        if let Err((name, err)) = result {
            if err != RDKafkaErrorCode::TopicAlreadyExists {
                warn!(topic = %name, %err, "failed to create topic");
            } else {
                info!(topic = %name, "topic already exists");
            }
        }
    }
    Ok(())
}

pub fn producer(broker: &str) -> Result<FutureProducer> {
    ClientConfig::new()
        .set("bootstrap.servers", broker)
        .create()
        .map_err(|e| AppError::Queue(e.to_string()))
}

/// Serialize `event` as JSON and publish it on `topic`.
pub async fn publish<T: Serialize>(producer: &FutureProducer, topic: &str, event: &T) -> Result<()> {
    let payload = serde_json::to_string(event).map_err(|e| AppError::Queue(e.to_string()))?;
    producer
        .send(
            FutureRecord::to(topic).payload(&payload).key(&()),
            Duration::from_secs(0),
        )
        .await
        .map_err(|(e, _)| AppError::Queue(e.to_string()))?;
    info!(topic, "event published");
    Ok(())
}
