use serde::{Deserialize, Serialize};

/// Event published when an image upload was parked for the recognition
/// worker.
#[derive(Debug, Serialize, Deserialize)]
pub struct TicketUploaded {
    pub ticket_id: i32,
}

/// Response body for uploads that continue in the background.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadAccepted {
    pub ticket_id: i32,
}

/// Response body for uploads processed inline, carrying the total
/// kilometers credited to the user.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadProcessed {
    pub distance: i64,
}

/// Coupon returned to the user on redemption.
#[derive(Debug, Serialize, Deserialize)]
pub struct CouponClaimed {
    pub id: i32,
    pub name: String,
    pub price: i64,
}
