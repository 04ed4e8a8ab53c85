//! Thin adapters over the OCR and PDF text engines. Recognition heuristics
//! live in [`crate::recognition`]; this module only produces raw word
//! streams and page texts.

use std::io::Write;

use pdf_extract::extract_text_from_mem_by_pages;
use tesseract::Tesseract;
use tracing::info;

use crate::error::{AppError, Result};

/// Run Tesseract over an image file and return the recognized words in
/// reading order.
pub fn ocr_words(path: &str, lang: &str) -> Result<Vec<String>> {
    let mut tess =
        Tesseract::new(None, Some(lang)).map_err(|e| AppError::Ocr(e.to_string()))?;
    tess = tess.set_image(path).map_err(|e| AppError::Ocr(e.to_string()))?;
    let text = tess.get_text().map_err(|e| AppError::Ocr(e.to_string()))?;
    let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    info!(words = words.len(), "ocr finished");
    Ok(words)
}

/// OCR an in-memory image through a scratch file, off the async executor.
pub async fn ocr_words_async(data: Vec<u8>, lang: String) -> Result<Vec<String>> {
    tokio::task::spawn_blocking(move || {
        let mut tmp = tempfile::NamedTempFile::new()?;
        tmp.write_all(&data)?;
        let path = tmp.path().to_string_lossy().into_owned();
        ocr_words(&path, &lang)
    })
    .await
    .map_err(|e| AppError::Io(e.to_string()))?
}

/// Extract the text of every page of an in-memory PDF.
pub fn pdf_pages(data: &[u8]) -> Result<Vec<String>> {
    extract_text_from_mem_by_pages(data).map_err(|e| AppError::Io(e.to_string()))
}

pub async fn pdf_pages_async(data: Vec<u8>) -> Result<Vec<String>> {
    tokio::task::spawn_blocking(move || pdf_pages(&data))
        .await
        .map_err(|e| AppError::Io(e.to_string()))?
}
