//! Re-exports the building blocks consumed by the coupon API and the
//! recognition worker: configuration handling, the error taxonomy, database
//! and Kafka helpers, and the ticket pipeline itself.

pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod recognition;
pub mod directions;
pub mod ledger;
pub mod coupons;
pub mod pipeline;
pub mod kafka;
pub mod db;
