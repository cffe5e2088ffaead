//! Error types for the PDF signing library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF signing library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Signature image could not be decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Malformed PAGExXxYxWIDTHxHEIGHT string
    #[error("Invalid coordinates: {0}")]
    InvalidCoords(String),

    /// Date parsing error
    #[error("Invalid date expression: {0}")]
    InvalidDateExpression(String),

    /// Source PDF not found
    #[error("PDF not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Signature image not found
    #[error("Signature image not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// Requested page does not exist in the document
    #[error("Page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: usize },

    /// Neither an explicit output path nor renaming was requested
    #[error("No output path given (use --output or --rename)")]
    MissingOutput,

    /// Destination could not be written
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// General error
    #[error("{0}")]
    General(String),
}
