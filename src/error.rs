//! Error type shared by the library and the `invoice-forge` binary.
//!
//! Rendering primitives and the invoice composition never fail; errors only
//! come from the edges: reading files, decoding JSON, resolving bindings, and
//! running the document renderer.

use thiserror::Error;

/// Main error type for invoice-forge operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invoice, style table, config or layout JSON could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A binding key that names no invoice slot
    #[error("unknown field binding: {0:?}")]
    UnknownBinding(String),

    /// A product line index past the end of the line list
    #[error("product line {index} out of range ({len} lines)")]
    LineOutOfRange { index: usize, len: usize },

    /// A `KEY=VALUE` assignment without the `=`
    #[error("malformed assignment {0:?}, expected KEY=VALUE")]
    Assignment(String),

    /// Taffy rejected a node or the layout pass
    #[error("layout error: {0}")]
    Layout(String),

    /// A logo that is not a decodable base64 data URI
    #[error("image error: {0}")]
    Image(String),

    /// PDF encoding failure
    #[error("PDF error: {0}")]
    Pdf(String),
}

impl From<taffy::TaffyError> for Error {
    fn from(e: taffy::TaffyError) -> Self {
        Error::Layout(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
