//! PDF Sign Library
//!
//! A small library for visually signing PDF documents.
//! This library provides functionality to:
//! - Parse signature placements (`PAGExXxYxWIDTHxHEIGHT`)
//! - Decode signature images with automatic alpha masking
//! - Build a one-page overlay holding the signature and an optional date
//! - Flatten that overlay onto a single page, passing all other pages through
//! - Write the result atomically
//!
//! # Example
//!
//! ```no_run
//! use pdf_sign::pdf::{sign_pdf, SignOptions};
//! use std::path::PathBuf;
//!
//! let options = SignOptions {
//!     source: PathBuf::from("contract.pdf"),
//!     signature: PathBuf::from("signature.png"),
//!     output: PathBuf::from("contract_signed.pdf"),
//!     placement: "1x200x300x125x40".parse().expect("valid coords"),
//!     ..Default::default()
//! };
//!
//! sign_pdf(&options).expect("Failed to sign PDF");
//! ```

pub mod error;
pub mod pdf;
pub mod date;
pub mod layout;
pub mod output;

// Re-export commonly used items
pub use error::{Error, Result};
pub use layout::{Placement, Rect};
