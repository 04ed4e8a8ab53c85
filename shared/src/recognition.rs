//! Station recognition: turns an uploaded ticket document into origin and
//! destination candidates.
//!
//! Two strategies share the [`StationRecognizer`] contract. The heuristics
//! are tuned to the Ukrainian railway ticket template: the image variant
//! reads the value two tokens past each marker word, the PDF variant slices
//! the page text between marker pairs. A heuristic miss always surfaces as
//! a typed error, never as a partially filled candidate.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::extract;

/// Marker word preceding the origin station.
pub const DEPARTURE: &str = "відправлення";
/// Marker word preceding the destination station.
pub const APPOINTMENT: &str = "призначення";
/// End marker of the origin slice on e-ticket PDFs.
const WAGON: &str = "вагон";
/// End marker of the destination slice on e-ticket PDFs.
const SEAT: &str = "місце";

/// Offset from a marker word to its value in the OCR word stream; the
/// intervening tokens are template boilerplate.
const MARKER_VALUE_OFFSET: usize = 2;

/// File extensions recognized as photographed tickets.
pub const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".bmp"];

/// An extracted origin/destination pair pending distance resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketCandidate {
    pub origin: String,
    pub destination: String,
    /// Dedup key of the physical ticket. Extraction currently has no access
    /// to the printed serial, so the uploaded file name stands in for it.
    pub ticket_number: String,
}

/// An uploaded ticket file.
#[derive(Debug, Clone)]
pub struct TicketDocument {
    pub file_name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
}

impl DocumentKind {
    /// Classify an upload by its file name, case-insensitively.
    pub fn from_name(file_name: &str) -> Result<Self> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".pdf") {
            Ok(DocumentKind::Pdf)
        } else if IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            Ok(DocumentKind::Image)
        } else {
            Err(AppError::UnsupportedFileType(IMAGE_EXTENSIONS.join(", ")))
        }
    }
}

/// A recognition strategy for one document format.
#[async_trait]
pub trait StationRecognizer: Send + Sync {
    /// Extract every candidate the document carries. An empty result is
    /// never returned; a document without usable candidates is an error.
    async fn recognize(&self, doc: &TicketDocument) -> Result<Vec<TicketCandidate>>;
}

/// Reads stations from a photographed ticket via the OCR word stream.
/// One photo holds exactly one ticket.
pub struct ImageStationRecognizer {
    lang: String,
}

impl ImageStationRecognizer {
    pub fn new(lang: &str) -> Self {
        Self { lang: lang.to_string() }
    }
}

#[async_trait]
impl StationRecognizer for ImageStationRecognizer {
    async fn recognize(&self, doc: &TicketDocument) -> Result<Vec<TicketCandidate>> {
        let words = extract::ocr_words_async(doc.data.clone(), self.lang.clone()).await?;
        let candidate = parse_word_stream(&words, &doc.file_name)?;
        Ok(vec![candidate])
    }
}

/// Reads stations from an e-ticket PDF, one candidate per page.
pub struct PdfStationRecognizer;

#[async_trait]
impl StationRecognizer for PdfStationRecognizer {
    async fn recognize(&self, doc: &TicketDocument) -> Result<Vec<TicketCandidate>> {
        let pages = extract::pdf_pages_async(doc.data.clone()).await?;
        parse_pages(&pages, &doc.file_name)
    }
}

/// Select the recognition strategy for an uploaded file name.
pub fn recognizer_for(file_name: &str, ocr_lang: &str) -> Result<Box<dyn StationRecognizer>> {
    match DocumentKind::from_name(file_name)? {
        DocumentKind::Image => Ok(Box::new(ImageStationRecognizer::new(ocr_lang))),
        DocumentKind::Pdf => Ok(Box::new(PdfStationRecognizer)),
    }
}

/// Locate origin and destination in an OCR word stream.
///
/// Markers are searched on a lowercased copy of the stream; the values are
/// taken from the original-case words [`MARKER_VALUE_OFFSET`] tokens past
/// each marker.
pub fn parse_word_stream(words: &[String], file_name: &str) -> Result<TicketCandidate> {
    if words.is_empty() {
        return Err(AppError::EmptyDocument);
    }
    let lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let departure = lower
        .iter()
        .position(|w| w == DEPARTURE)
        .ok_or(AppError::MarkersNotFound)?;
    let appointment = lower
        .iter()
        .position(|w| w == APPOINTMENT)
        .ok_or(AppError::MarkersNotFound)?;
    let origin = words
        .get(departure + MARKER_VALUE_OFFSET)
        .ok_or(AppError::MarkersNotFound)?;
    let destination = words
        .get(appointment + MARKER_VALUE_OFFSET)
        .ok_or(AppError::MarkersNotFound)?;
    debug!(%origin, %destination, "stations recognized from word stream");
    Ok(TicketCandidate {
        origin: origin.clone(),
        destination: destination.clone(),
        ticket_number: file_name.to_string(),
    })
}

/// Parse every page of an e-ticket PDF. Pages that fail the heuristic are
/// skipped so one broken page never voids its siblings; a document where
/// every page fails is rejected as a whole.
pub fn parse_pages(pages: &[String], file_name: &str) -> Result<Vec<TicketCandidate>> {
    let mut candidates = Vec::new();
    for (page_no, page) in pages.iter().enumerate() {
        match parse_page(page, file_name) {
            Ok(c) => candidates.push(c),
            Err(e) => warn!(page = page_no, %e, file = %file_name, "page skipped"),
        }
    }
    if candidates.is_empty() {
        return Err(AppError::TicketInfoNotFound);
    }
    Ok(candidates)
}

/// Parse one PDF page into a candidate: origin lies between the departure
/// and wagon markers, destination between the appointment and seat markers.
pub fn parse_page(page: &str, file_name: &str) -> Result<TicketCandidate> {
    let flat = page.replace(['\r', '\n'], " ");
    let lower = flat.to_lowercase();
    let origin = slice_between(&flat, &lower, DEPARTURE, WAGON)?;
    let destination = slice_between(&flat, &lower, APPOINTMENT, SEAT)?;
    debug!(%origin, %destination, "stations recognized from pdf page");
    Ok(TicketCandidate {
        origin,
        destination,
        ticket_number: file_name.to_string(),
    })
}

/// Take the original-case text strictly between two markers, searched
/// case-insensitively, with digits and whitespace dropped and leftover edge
/// punctuation trimmed.
fn slice_between(original: &str, lower: &str, start: &str, end: &str) -> Result<String> {
    let from = lower.find(start).ok_or(AppError::TicketInfoNotFound)? + start.len();
    let to = lower[from..].find(end).ok_or(AppError::TicketInfoNotFound)? + from;
    // offsets computed on the lowercased copy must land on char boundaries
    // of the original; a mismatch fails the page instead of panicking
    let raw = original.get(from..to).ok_or(AppError::TicketInfoNotFound)?;
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_numeric() && !c.is_whitespace())
        .collect();
    let cleaned = cleaned
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .to_string();
    if cleaned.is_empty() {
        return Err(AppError::TicketInfoNotFound);
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn word_stream_reads_value_two_tokens_past_each_marker() {
        let ws = words(&[
            "Квиток",
            "Станція",
            "відправлення",
            ":",
            "Київ-Пасажирський",
            "Станція",
            "призначення",
            ":",
            "Львів",
        ]);
        let c = parse_word_stream(&ws, "ticket_001.jpg").unwrap();
        assert_eq!(c.origin, "Київ-Пасажирський");
        assert_eq!(c.destination, "Львів");
        assert_eq!(c.ticket_number, "ticket_001.jpg");
    }

    #[test]
    fn word_stream_markers_match_any_case() {
        let ws = words(&["Відправлення", "стан.", "Київ", "Призначення", "стан.", "Одеса"]);
        let c = parse_word_stream(&ws, "t.png").unwrap();
        assert_eq!(c.origin, "Київ");
        assert_eq!(c.destination, "Одеса");
    }

    #[test]
    fn empty_word_stream_is_rejected() {
        assert!(matches!(
            parse_word_stream(&[], "t.jpg"),
            Err(AppError::EmptyDocument)
        ));
    }

    #[test]
    fn missing_marker_is_rejected() {
        let ws = words(&["Станція", "відправлення", ":", "Київ"]);
        assert!(matches!(
            parse_word_stream(&ws, "t.jpg"),
            Err(AppError::MarkersNotFound)
        ));
    }

    #[test]
    fn marker_too_close_to_stream_end_is_rejected() {
        let ws = words(&["відправлення", ":", "Київ", "призначення", "Львів"]);
        assert!(matches!(
            parse_word_stream(&ws, "t.jpg"),
            Err(AppError::MarkersNotFound)
        ));
    }

    #[test]
    fn page_slices_between_marker_pairs() {
        let page = "Посадковий документ\nВідправлення: КИЇВ-ПАС 28.08 18:05\nВагон 12 Призначення: ЛЬВІВ 29.08 06:10\nМісце 034";
        let c = parse_page(page, "e_ticket.pdf").unwrap();
        assert_eq!(c.origin, "КИЇВ-ПАС");
        assert_eq!(c.destination, "ЛЬВІВ");
    }

    #[test]
    fn page_without_markers_is_rejected() {
        assert!(matches!(
            parse_page("Рахунок на оплату", "t.pdf"),
            Err(AppError::TicketInfoNotFound)
        ));
    }

    #[test]
    fn blank_slice_is_rejected() {
        let page = "Відправлення: 28.08 Вагон 12 Призначення: ЛЬВІВ Місце 034";
        assert!(matches!(
            parse_page(page, "t.pdf"),
            Err(AppError::TicketInfoNotFound)
        ));
    }

    #[test]
    fn broken_page_does_not_void_its_siblings() {
        let pages = vec![
            "Відправлення: КИЇВ Вагон 1 Призначення: ЛЬВІВ Місце 1".to_string(),
            "Сторінка з рекламою".to_string(),
            "Відправлення: ЛЬВІВ Вагон 2 Призначення: УЖГОРОД Місце 2".to_string(),
        ];
        let candidates = parse_pages(&pages, "group.pdf").unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].origin, "КИЇВ");
        assert_eq!(candidates[1].destination, "УЖГОРОД");
    }

    #[test]
    fn document_with_only_broken_pages_is_rejected() {
        let pages = vec!["Сторінка з рекламою".to_string()];
        assert!(matches!(
            parse_pages(&pages, "ad.pdf"),
            Err(AppError::TicketInfoNotFound)
        ));
    }

    #[test]
    fn classifies_uploads_by_extension() {
        assert_eq!(DocumentKind::from_name("Ticket.JPG").unwrap(), DocumentKind::Image);
        assert_eq!(DocumentKind::from_name("scan.bmp").unwrap(), DocumentKind::Image);
        assert_eq!(DocumentKind::from_name("e_ticket.pdf").unwrap(), DocumentKind::Pdf);
        assert!(matches!(
            DocumentKind::from_name("notes.txt"),
            Err(AppError::UnsupportedFileType(_))
        ));
    }
}
