//! The single owner of "which PDF bytes are current".

use lopdf::Document;

use super::geometry::PdfRect;
use super::logo::LogoAsset;
use super::pdf::{self, PageBox};
use crate::error::{Result, StampError};

/// Uploaded document plus every successful edit applied to it.
///
/// `current` is always either the original upload or the last serialized
/// output of a placement, and `document` is always parsed from `current`.
/// Mutations never touch `document`; they re-parse `current` and swap in the
/// result only once serialization succeeded.
pub struct PdfSession {
    original: Vec<u8>,
    current: Vec<u8>,
    document: Document,
    logo: Option<LogoAsset>,
    revision: u32,
}

impl std::fmt::Debug for PdfSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfSession")
            .field("original_len", &self.original.len())
            .field("current_len", &self.current.len())
            .field("pages", &self.page_count())
            .field("logo", &self.logo.as_ref().map(|l| l.format()))
            .field("revision", &self.revision)
            .finish()
    }
}

impl PdfSession {
    pub fn load_original(bytes: Vec<u8>) -> Result<Self> {
        let document = pdf::load_document(&bytes)?;
        log::info!(
            "Loaded PDF: {} bytes, {} pages",
            bytes.len(),
            document.get_pages().len()
        );
        Ok(Self {
            original: bytes.clone(),
            current: bytes,
            document,
            logo: None,
            revision: 0,
        })
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    pub fn page_box(&self, index: usize) -> Result<PageBox> {
        pdf::page_box(&self.document, index)
    }

    pub fn logo(&self) -> Option<&LogoAsset> {
        self.logo.as_ref()
    }

    /// Replace the active logo; only one is held at a time.
    pub fn set_logo(&mut self, logo: LogoAsset) {
        self.logo = Some(logo);
    }

    pub fn clear_logo(&mut self) {
        self.logo = None;
    }

    /// Bake the active logo into page `page_index` at `rect`.
    ///
    /// Either the whole edit lands (new bytes, re-parsed document, logo
    /// consumed) or nothing about the session changes.
    pub fn commit_logo_placement(&mut self, page_index: usize, rect: PdfRect) -> Result<()> {
        let logo = self.logo.as_ref().ok_or(StampError::MissingLogo)?;
        let bytes = pdf::embed_and_place(&self.current, page_index, logo.format(), logo.bytes(), rect)?;
        let document = pdf::load_document(&bytes)?;

        self.current = bytes;
        self.document = document;
        self.logo = None;
        self.revision += 1;
        log::info!(
            "Committed placement #{} on page {} ({} bytes)",
            self.revision,
            page_index,
            self.current.len()
        );
        Ok(())
    }

    pub fn export_current(&self) -> &[u8] {
        &self.current
    }

    pub fn original_bytes(&self) -> &[u8] {
        &self.original
    }

    /// Number of placements committed since upload.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn is_modified(&self) -> bool {
        self.revision > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{opaque_png, sample_pdf};

    const RECT: PdfRect = PdfRect {
        x: 40.0,
        y: 60.0,
        width: 80.0,
        height: 30.0,
    };

    fn session_with_logo(pages: usize) -> PdfSession {
        let mut session = PdfSession::load_original(sample_pdf(pages)).unwrap();
        session.set_logo(LogoAsset::new(opaque_png(4, 4), Some("image/png")).unwrap());
        session
    }

    #[test]
    fn load_sets_original_and_current() {
        let bytes = sample_pdf(2);
        let session = PdfSession::load_original(bytes.clone()).unwrap();
        assert_eq!(session.export_current(), bytes.as_slice());
        assert_eq!(session.original_bytes(), bytes.as_slice());
        assert_eq!(session.page_count(), 2);
        assert!(!session.is_modified());
    }

    #[test]
    fn malformed_upload_is_parse_error() {
        let err = PdfSession::load_original(b"hello, not a pdf".to_vec()).unwrap_err();
        assert!(matches!(err, StampError::Parse(_)));
    }

    #[test]
    fn commit_replaces_current_and_consumes_logo() {
        let mut session = session_with_logo(2);
        let before = session.export_current().to_vec();
        session.commit_logo_placement(1, RECT).unwrap();

        assert_ne!(session.export_current(), before.as_slice());
        assert_eq!(session.original_bytes(), before.as_slice());
        assert!(session.logo().is_none());
        assert_eq!(session.revision(), 1);
        assert_eq!(session.page_count(), 2);

        let reparsed = pdf::load_document(session.export_current()).unwrap();
        let page = pdf::page_id(&reparsed, 1).unwrap();
        let content = reparsed.get_page_content(page).unwrap();
        assert!(String::from_utf8_lossy(&content).contains("/Logo1 Do"));
    }

    #[test]
    fn out_of_range_commit_leaves_session_unchanged() {
        let mut session = session_with_logo(2);
        let before = session.export_current().to_vec();
        let err = session.commit_logo_placement(2, RECT).unwrap_err();

        assert!(matches!(err, StampError::OutOfRange { index: 2, count: 2 }));
        assert_eq!(session.export_current(), before.as_slice());
        assert!(session.logo().is_some());
        assert_eq!(session.revision(), 0);
    }

    #[test]
    fn commit_without_logo_fails() {
        let mut session = PdfSession::load_original(sample_pdf(1)).unwrap();
        let err = session.commit_logo_placement(0, RECT).unwrap_err();
        assert!(matches!(err, StampError::MissingLogo));
    }

    #[test]
    fn successive_commits_build_on_latest_bytes() {
        let mut session = session_with_logo(1);
        session.commit_logo_placement(0, RECT).unwrap();
        session.set_logo(LogoAsset::new(opaque_png(2, 2), None).unwrap());
        session.commit_logo_placement(0, RECT.translated(100.0, 100.0)).unwrap();

        let doc = pdf::load_document(session.export_current()).unwrap();
        let page = pdf::page_id(&doc, 0).unwrap();
        let content = String::from_utf8_lossy(&doc.get_page_content(page).unwrap()).into_owned();
        assert!(content.contains("/Logo1 Do"));
        assert!(content.contains("/Logo2 Do"));
        assert_eq!(session.revision(), 2);
    }

    #[test]
    fn export_is_idempotent() {
        let mut session = session_with_logo(1);
        assert_eq!(session.export_current(), session.export_current());
        session.commit_logo_placement(0, RECT).unwrap();
        let first = session.export_current().to_vec();
        let second = session.export_current().to_vec();
        assert_eq!(first, second);
    }
}
