//! Integration test for the PDF page extraction adapter.

use base64;
use shared::extract::pdf_pages;

#[test]
fn single_page_pdf_yields_one_page() {
    let pdf_data = base64::decode("JVBERi0xLjQKMSAwIG9iago8PC9UeXBlL0NhdGFsb2cvUGFnZXMgMiAwIFI+PgplbmRvYmoKMiAwIG9iago8PC9UeXBlL1BhZ2VzL0tpZHMgWzMgMCBSXS9Db3VudCAxPj4KZW5kb2JqCjMgMCBvYmoKPDwvVHlwZS9QYWdlL1BhcmVudCAyIDAgUi9Db250ZW50cyA0IDAgUi9NZWRpYUJveCBbMCAwIDIwMCAyMDBdL1Jlc291cmNlcyA8PC9Gb250IDw8L0YxIDw8L1R5cGUvRm9udC9TdWJ0eXBlL1R5cGUxL0Jhc2VGb250L0hlbHZldGljYT4+Pj4+Pj4+CmVuZG9iago0IDAgb2JqCjw8L0xlbmd0aCAzNj4+CnN0cmVhbQpCVC9GMSAyNCBUZiAxMDAgMTAwIFRkIChIZWxsbykgVGoKRVQKZW5kc3RyZWFtCmVuZG9iagp4cmVmCjAgNQowMDAwMDAwMDAwIDY1NTM1IGYgCjAwMDAwMDAwMDkgMDAwMDAgbiAKMDAwMDAwMDA1NCAwMDAwMCBuIAowMDAwMDAwMTA2IDAwMDAwIG4gCjAwMDAwMDAyNjMgMDAwMDAgbiAKdHJhaWxlcgo8PC9TaXplIDUvUm9vdCAxIDAgUj4+CnN0YXJ0eHJlZgozNDcKJSVFT0YK").unwrap();
    let pages = pdf_pages(&pdf_data).unwrap();
    assert_eq!(pages.len(), 1);
}

#[test]
fn garbage_bytes_are_an_io_error() {
    let err = pdf_pages(b"not a pdf at all").unwrap_err();
    assert!(matches!(err, shared::error::AppError::Io(_)));
}
