//! PDF manipulation module

pub mod metadata;
pub mod image;
pub mod overlay;
pub mod merge;
pub mod compose;

// Re-export commonly used items
pub use compose::{compose, sign_pdf, sign_pdf_with_clock, PagePolicy, SignOptions, SignRequest};
pub use image::SignatureImage;
pub use merge::merge_overlay_page;
pub use metadata::page_media_box;
pub use overlay::{build_overlay, OverlaySpec};
