/// Errors from loading or walking a PDF document.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The document could not be loaded (corrupt header, broken xref,
    /// unreadable streams). Surfaced with detail, never retried.
    #[error("failed to parse PDF document: {detail}")]
    Parse { detail: String },

    /// Structurally valid document with an empty page tree. A template
    /// always has at least one page.
    #[error("document contains no pages")]
    NoPages,
}

impl From<lopdf::Error> for ExtractError {
    fn from(err: lopdf::Error) -> Self {
        ExtractError::Parse {
            detail: err.to_string(),
        }
    }
}
