//! Overlay generation: a one-page PDF holding the signature and date stamp
//!
//! The overlay page has the same media box as the page it will be merged onto,
//! so placement coordinates mean the same thing on both.

use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use crate::error::Result;
use crate::layout::{Placement, Rect};
use crate::pdf::image::SignatureImage;
use crate::pdf::metadata::rect_object;

/// Resource name of the signature image inside the overlay
pub const IMAGE_NAME: &str = "Sig";

/// Resource name of the date font inside the overlay
pub const FONT_NAME: &str = "F1";

/// Default date stamp size in points
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// What goes on the overlay page
#[derive(Debug, Clone)]
pub struct OverlaySpec<'a> {
    /// Geometry of the target page
    pub media_box: Rect,
    /// Where the image goes, relative to the media box origin
    pub placement: &'a Placement,
    pub image: &'a SignatureImage,
    /// Text drawn right of the image, e.g. "2024-01-01"
    pub date_text: Option<&'a str>,
    pub font_size: f32,
}

/// Build a single-page overlay document
pub fn build_overlay(spec: &OverlaySpec) -> Result<Document> {
    let mut doc = Document::with_version("1.5");

    let mut resources = lopdf::Dictionary::new();

    // A zero-size box would need a singular matrix, so the image is left out
    if spec.placement.has_area() {
        let image_id = spec.image.embed(&mut doc);
        resources.set("XObject", dictionary! { IMAGE_NAME => image_id });
    } else {
        log::debug!("Placement {} has no area, drawing no image", spec.placement);
    }

    if spec.date_text.is_some() {
        let font_id = use_helvetica_font(&mut doc);
        resources.set("Font", dictionary! { FONT_NAME => font_id });
    }

    let content = generate_overlay_content(spec);
    let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content.into_bytes()));

    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => rect_object(&spec.media_box),
        "Contents" => content_id,
        "Resources" => resources,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}

/// Helvetica is one of the 14 standard fonts, so nothing needs embedding
fn use_helvetica_font(doc: &mut Document) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Generate the overlay content stream
fn generate_overlay_content(spec: &OverlaySpec) -> String {
    let placement = spec.placement;
    let origin_x = spec.media_box.llx;
    let origin_y = spec.media_box.lly;

    let x = origin_x + placement.x as f32;
    let y = origin_y + placement.y as f32;

    let mut content = String::new();

    // Unit square image scaled into the placement box
    if placement.has_area() {
        content.push_str("q\n");
        content.push_str(&format!(
            "{} 0 0 {} {} {} cm\n",
            placement.width, placement.height, x, y
        ));
        content.push_str(&format!("/{} Do\n", IMAGE_NAME));
        content.push_str("Q\n");
    }

    if let Some(text) = spec.date_text {
        let (date_x, date_y) = placement.date_origin();
        content.push_str("BT\n");
        content.push_str("0 g\n");
        content.push_str(&format!("/{} {} Tf\n", FONT_NAME, spec.font_size));
        content.push_str(&format!(
            "{} {} Td\n",
            origin_x + date_x,
            origin_y + date_y
        ));
        content.push_str(&format!("({}) Tj\n", escape_pdf_string(text)));
        content.push_str("ET\n");
    }

    content
}

/// Escape special characters in PDF strings
fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}
