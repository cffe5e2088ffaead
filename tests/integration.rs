//! Integration tests for the PDF signing library

use chrono::NaiveDate;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use lopdf::{dictionary, Document, Object, Stream};
use pdf_sign::date::{DateExpression, FixedClock};
use pdf_sign::pdf::{sign_pdf, sign_pdf_with_clock, PagePolicy, SignOptions};
use pdf_sign::{Error, Placement};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a PDF with `pages` Letter-size pages, each saying "Page N"
fn write_source_pdf(path: &Path, pages: u32) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids = Vec::new();
    for n in 1..=pages {
        let content = format!("BT /F1 24 Tf 72 700 Td (Page {}) Tj ET\n", n);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("Failed to write source PDF");
}

/// Write a 250x80 PNG: an opaque stroke across a transparent background
fn write_signature_png(path: &Path) {
    let img = ImageBuffer::from_fn(250, 80, |x, y| {
        if (y as i32 - (x as i32 * 80 / 250)).abs() < 3 {
            Rgba([0u8, 0, 96, 255])
        } else {
            Rgba([255, 255, 255, 0])
        }
    });
    DynamicImage::ImageRgba8(img)
        .save_with_format(path, ImageFormat::Png)
        .expect("Failed to write signature PNG");
}

/// Write a fully transparent 1x1 PNG
fn write_transparent_pixel(path: &Path) {
    let img = ImageBuffer::from_pixel(1, 1, Rgba([0u8, 0, 0, 0]));
    DynamicImage::ImageRgba8(img)
        .save_with_format(path, ImageFormat::Png)
        .expect("Failed to write PNG");
}

struct Fixture {
    _dir: TempDir,
    source: PathBuf,
    signature: PathBuf,
    output: PathBuf,
}

fn fixture(pages: u32) -> Fixture {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let source = dir.path().join("contract.pdf");
    let signature = dir.path().join("signature.png");
    let output = dir.path().join("contract_signed.pdf");
    write_source_pdf(&source, pages);
    write_signature_png(&signature);
    Fixture { _dir: dir, source, signature, output }
}

fn options(fx: &Fixture, coords: &str) -> SignOptions {
    SignOptions {
        source: fx.source.clone(),
        signature: fx.signature.clone(),
        output: fx.output.clone(),
        placement: coords.parse().expect("valid coords"),
        ..Default::default()
    }
}

fn load(path: &Path) -> Document {
    let mut doc = Document::load(path).expect("Failed to load output");
    doc.decompress();
    doc
}

fn page_content(doc: &Document, page: u32) -> String {
    let page_id = doc.get_pages()[&page];
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}

/// Content of the signature Form XObject drawn on `page`
fn overlay_content(doc: &Document, page: u32) -> Option<String> {
    let page_id = doc.get_pages()[&page];
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let resources = page.get(b"Resources").ok()?.as_dict().ok()?;
    let xobjects = resources.get(b"XObject").ok()?.as_dict().ok()?;
    let form_id = xobjects.get(b"SigOverlay0").ok()?.as_reference().ok()?;
    let form = doc.get_object(form_id).ok()?.as_stream().ok()?;
    Some(String::from_utf8_lossy(&form.decompressed_content().unwrap_or_else(|_| form.content.clone())).into_owned())
}

#[test]
fn test_sign_page_two_of_three() {
    let fx = fixture(3);
    let written = sign_pdf(&options(&fx, "2x100x100x125x40")).expect("Failed to sign");
    assert_eq!(written, fx.output);

    let doc = load(&fx.output);
    assert_eq!(doc.get_pages().len(), 3);
    for page in [1, 3] {
        assert!(overlay_content(&doc, page).is_none(), "page {} should be unsigned", page);
        assert_eq!(
            page_content(&doc, page),
            format!("BT /F1 24 Tf 72 700 Td (Page {}) Tj ET\n", page)
        );
    }

    let page_two = page_content(&doc, 2);
    assert!(page_two.contains("(Page 2) Tj"));
    assert!(page_two.contains("/SigOverlay0 Do"));

    let overlay = overlay_content(&doc, 2).expect("page 2 should carry the overlay");
    assert!(overlay.contains("125 0 0 40 100 100 cm"));
    assert!(overlay.contains("/Sig Do"));
    assert!(!overlay.contains("Tj"));
}

#[test]
fn test_signature_image_keeps_alpha_mask() {
    let fx = fixture(3);
    sign_pdf(&options(&fx, "2x100x100x125x40")).unwrap();

    let doc = load(&fx.output);
    let page_id = doc.get_pages()[&2];
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let form_id = page
        .get(b"Resources").unwrap().as_dict().unwrap()
        .get(b"XObject").unwrap().as_dict().unwrap()
        .get(b"SigOverlay0").unwrap().as_reference().unwrap();
    let form = doc.get_object(form_id).unwrap().as_stream().unwrap();
    let image_id = form
        .dict.get(b"Resources").unwrap().as_dict().unwrap()
        .get(b"XObject").unwrap().as_dict().unwrap()
        .get(b"Sig").unwrap().as_reference().unwrap();
    let image = doc.get_object(image_id).unwrap().as_stream().unwrap();

    assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 250);
    assert_eq!(image.dict.get(b"Height").unwrap().as_i64().unwrap(), 80);
    assert!(image.dict.get(b"SMask").is_ok(), "transparent PNG should be masked");
}

#[test]
fn test_sign_with_fixed_date() {
    let fx = fixture(3);
    let mut opts = options(&fx, "2x100x100x125x40");
    opts.date = Some(DateExpression::Today);

    let clock = FixedClock(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    sign_pdf_with_clock(&opts, &clock).unwrap();

    let doc = load(&fx.output);
    let overlay = overlay_content(&doc, 2).unwrap();
    assert!(overlay.contains("225 100 Td"));
    assert!(overlay.contains("(2024-01-01) Tj"));
}

#[test]
fn test_transparent_pixel_is_fully_masked() {
    let fx = fixture(1);
    write_transparent_pixel(&fx.signature);
    sign_pdf(&options(&fx, "1x0x0x612x792")).unwrap();

    let doc = load(&fx.output);
    let smask = doc
        .objects
        .values()
        .filter_map(|obj| obj.as_stream().ok())
        .find(|s| {
            s.dict.get(b"ColorSpace").and_then(Object::as_name).ok() == Some(b"DeviceGray".as_slice())
                && s.dict.get(b"Width").and_then(Object::as_i64).ok() == Some(1)
        })
        .expect("soft mask present");
    assert_eq!(smask.content, vec![0u8]);
}

#[test]
fn test_out_of_range_page_strict() {
    let fx = fixture(3);
    let result = sign_pdf(&options(&fx, "9x100x100x125x40"));

    assert!(matches!(result, Err(Error::PageOutOfRange { page: 9, page_count: 3 })));
    assert!(!fx.output.exists(), "no output on failure");
}

#[test]
fn test_out_of_range_page_lenient() {
    let fx = fixture(3);
    let mut opts = options(&fx, "9x100x100x125x40");
    opts.page_policy = PagePolicy::Lenient;
    sign_pdf(&opts).unwrap();

    let doc = load(&fx.output);
    assert_eq!(doc.get_pages().len(), 3);
    for page in 1..=3 {
        assert!(overlay_content(&doc, page).is_none());
    }
}

#[test]
fn test_malformed_coords_fail_before_io() {
    for coords in ["2x100x100", "axbxcxdxe", "2x100x100x125x40x9"] {
        let result = coords.parse::<Placement>();
        assert!(matches!(result, Err(Error::InvalidCoords(_))), "{} should fail", coords);
    }
}

#[test]
fn test_missing_source() {
    let fx = fixture(1);
    let mut opts = options(&fx, "1x1x1x1x1");
    opts.source = PathBuf::from("nonexistent.pdf");

    let result = sign_pdf(&opts);
    assert!(matches!(result, Err(Error::SourceNotFound(_))));
}

#[test]
fn test_empty_pdf_is_rejected() {
    let fx = fixture(0);
    let result = sign_pdf(&options(&fx, "1x100x100x125x40"));

    assert!(matches!(result, Err(Error::EmptyPdf(_))));
    assert!(!fx.output.exists(), "no output on failure");
}

#[test]
fn test_zero_width_placement_is_accepted() {
    let fx = fixture(1);
    let mut opts = options(&fx, "1x10x10x0x40");
    opts.date = Some(DateExpression::Today);
    sign_pdf_with_clock(&opts, &FixedClock(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())).unwrap();

    let doc = load(&fx.output);
    assert_eq!(doc.get_pages().len(), 1);

    let overlay = overlay_content(&doc, 1).unwrap();
    assert!(!overlay.contains("/Sig Do"));
    assert!(overlay.contains("(2024-01-01) Tj"));
}

#[test]
fn test_unwritable_destination() {
    let fx = fixture(1);
    let mut opts = options(&fx, "1x1x1x1x1");
    opts.output = fx.source.with_file_name("missing-dir").join("out.pdf");

    let result = sign_pdf(&opts);
    assert!(matches!(result, Err(Error::Write { .. })));
}

#[test]
fn test_resign_output_again() {
    // A signed file can be signed again; names must not collide
    let fx = fixture(2);
    sign_pdf(&options(&fx, "1x10x10x50x20")).unwrap();

    let second = SignOptions {
        source: fx.output.clone(),
        output: fx.output.with_file_name("twice.pdf"),
        ..options(&fx, "1x300x10x50x20")
    };
    sign_pdf(&second).unwrap();

    let doc = load(&second.output);
    let content = page_content(&doc, 1);
    assert!(content.contains("/SigOverlay0 Do"));
    assert!(content.contains("/SigOverlay1 Do"));
}
