use thiserror::Error;

/// Failures surfaced by the session, the mutation service and the editor handlers.
///
/// Display strings are snake_case codes so the host can match on the prefix.
#[derive(Debug, Error)]
pub enum StampError {
    #[error("pdf_parse_failed:{0}")]
    Parse(String),
    #[error("page_out_of_range:{index}/{count}")]
    OutOfRange { index: usize, count: usize },
    #[error("unsupported_logo_format:{0}")]
    UnsupportedFormat(String),
    #[error("no_active_page")]
    NoActivePage,
    #[error("placement_not_finite")]
    NonFinitePlacement,
    #[error("pdf_structure_invalid:{0}")]
    Structure(String),
    #[error("pdf_save_failed:{0}")]
    Serialize(String),
    #[error("no_document_loaded")]
    NoDocument,
    #[error("no_logo_loaded")]
    MissingLogo,
    #[error("no_overlay_placed")]
    MissingOverlay,
    #[error("read_failed:{0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StampError>;
