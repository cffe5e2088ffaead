//! Page compositor: stamp a signature onto one page and pass the rest through

use std::path::PathBuf;
use chrono::NaiveDate;
use lopdf::Document;
use crate::date::{format_date, resolve_date, Clock, DateExpression, SystemClock};
use crate::error::{Error, Result};
use crate::layout::Placement;
use crate::output::write_atomically;
use crate::pdf::image::SignatureImage;
use crate::pdf::merge::merge_overlay_page;
use crate::pdf::metadata::{page_media_box, rect_object};
use crate::pdf::overlay::{build_overlay, OverlaySpec, DEFAULT_FONT_SIZE};

/// What to do when the requested page does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PagePolicy {
    /// Fail with [`Error::PageOutOfRange`]
    #[default]
    Strict,
    /// Log a warning and return the document unsigned
    Lenient,
}

/// Everything needed to sign one page of an already-loaded document
#[derive(Debug, Clone)]
pub struct SignRequest {
    pub placement: Placement,
    pub image: SignatureImage,
    /// Date written right of the signature, if any
    pub date_stamp: Option<NaiveDate>,
    pub page_policy: PagePolicy,
    /// Date text size in points
    pub font_size: f32,
}

impl SignRequest {
    pub fn new(placement: Placement, image: SignatureImage) -> Self {
        Self {
            placement,
            image,
            date_stamp: None,
            page_policy: PagePolicy::default(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

/// Produce a signed copy of `source`
///
/// Every page keeps its position; only the page named by the placement gets
/// the overlay. The source document is left as it was.
pub fn compose(source: &Document, request: &SignRequest) -> Result<Document> {
    let mut output = source.clone();
    let pages: Vec<_> = output.get_pages().into_values().collect();
    let page_count = pages.len();

    let target_index = request
        .placement
        .page_index()
        .filter(|&index| index < page_count);

    let Some(target_index) = target_index else {
        return match request.page_policy {
            PagePolicy::Strict => Err(Error::PageOutOfRange {
                page: request.placement.page,
                page_count,
            }),
            PagePolicy::Lenient => {
                log::warn!(
                    "Page {} does not exist ({} pages), writing document unsigned",
                    request.placement.page,
                    page_count
                );
                Ok(output)
            }
        };
    };

    let date_text = request.date_stamp.as_ref().map(format_date);

    let page_id = pages[target_index];
    let media_box = page_media_box(&output, page_id)?;
    log::debug!(
        "Signing page {} at {} ({}x{} image, {}x{} media box)",
        target_index + 1,
        request.placement,
        request.image.width(),
        request.image.height(),
        media_box.width(),
        media_box.height()
    );

    let mut overlay = build_overlay(&OverlaySpec {
        media_box,
        placement: &request.placement,
        image: &request.image,
        date_text: date_text.as_deref(),
        font_size: request.font_size,
    })?;

    // The overlay must share the target's coordinate space exactly
    if let Some(overlay_page) = overlay.get_pages().values().next().copied() {
        overlay
            .get_object_mut(overlay_page)?
            .as_dict_mut()?
            .set("MediaBox", rect_object(&media_box));
    }

    merge_overlay_page(&mut output, page_id, overlay)?;

    let output_count = output.get_pages().len();
    if output_count != page_count {
        return Err(Error::General(format!(
            "Page count changed while signing: {} -> {}",
            page_count, output_count
        )));
    }

    Ok(output)
}

/// Options for signing a PDF file
#[derive(Debug, Clone)]
pub struct SignOptions {
    /// PDF to sign
    pub source: PathBuf,
    /// Signature image (PNG or JPEG)
    pub signature: PathBuf,
    /// Where the signed PDF goes
    pub output: PathBuf,
    pub placement: Placement,
    /// Date to stamp next to the signature, if any
    pub date: Option<DateExpression>,
    pub page_policy: PagePolicy,
    pub font_size: f32,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            signature: PathBuf::new(),
            output: PathBuf::new(),
            placement: Placement::default(),
            date: None,
            page_policy: PagePolicy::default(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

/// Sign a PDF file, writing the result to `options.output`
///
/// Returns the path written.
///
/// # Example
///
/// ```no_run
/// use pdf_sign::date::DateExpression;
/// use pdf_sign::pdf::{sign_pdf, SignOptions};
/// use std::path::PathBuf;
///
/// let options = SignOptions {
///     source: PathBuf::from("lease.pdf"),
///     signature: PathBuf::from("signature.png"),
///     output: PathBuf::from("lease_signed.pdf"),
///     date: Some(DateExpression::Today),
///     ..Default::default()
/// };
///
/// sign_pdf(&options).expect("Failed to sign");
/// ```
pub fn sign_pdf(options: &SignOptions) -> Result<PathBuf> {
    sign_pdf_with_clock(options, &SystemClock)
}

/// [`sign_pdf`] with an explicit source for "today"
pub fn sign_pdf_with_clock(options: &SignOptions, clock: &dyn Clock) -> Result<PathBuf> {
    if !options.source.exists() {
        return Err(Error::SourceNotFound(options.source.clone()));
    }
    if !options.signature.exists() {
        return Err(Error::ImageNotFound(options.signature.clone()));
    }

    let source = Document::load(&options.source)?;
    if source.get_pages().is_empty() {
        return Err(Error::EmptyPdf(options.source.clone()));
    }

    let image = SignatureImage::open(&options.signature)?;

    let request = SignRequest {
        placement: options.placement,
        image,
        date_stamp: options.date.as_ref().map(|expr| resolve_date(expr, clock)),
        page_policy: options.page_policy,
        font_size: options.font_size,
    };

    let signed = compose(&source, &request)?;
    write_atomically(signed, &options.output)?;

    log::info!("Wrote {}", options.output.display());
    Ok(options.output.clone())
}
