use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

/// Failure taxonomy of the ticket pipeline.
///
/// The recognition and eligibility variants carry the message shown to the
/// uploader; the infrastructure variants keep the underlying cause as text
/// for the logs.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("The image is empty.")]
    EmptyDocument,
    #[error("The image does not contain departure or appointment.")]
    MarkersNotFound,
    #[error("Ticket info not found.")]
    TicketInfoNotFound,
    #[error("Ticket already used.")]
    DuplicateTicket,
    #[error("No route found: {0}")]
    DistanceUnavailable(String),
    #[error("No coupons available.")]
    NoCouponsAvailable,
    #[error("Your distance is less than {0}.")]
    DistanceTooSmall(i64),
    #[error("File format is not supported. Use {0} or .pdf.")]
    UnsupportedFileType(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("OCR error: {0}")]
    Ocr(String),
    #[error("Queue error: {0}")]
    Queue(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl From<tokio_postgres::Error> for AppError {
    fn from(e: tokio_postgres::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::EmptyDocument
            | AppError::MarkersNotFound
            | AppError::TicketInfoNotFound
            | AppError::DistanceUnavailable(_)
            | AppError::NoCouponsAvailable
            | AppError::DistanceTooSmall(_)
            | AppError::UnsupportedFileType(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateTicket => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Io(_) | AppError::Ocr(_) | AppError::Queue(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "detail": self.to_string() }))
    }
}
