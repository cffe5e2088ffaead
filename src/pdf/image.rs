//! Signature image decoding into PDF Image XObjects

use std::path::Path;
use image::{DynamicImage, GenericImageView, ImageFormat};
use jpeg_decoder::PixelFormat;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use crate::error::{Error, Result};

/// Pixel data for a PDF Image XObject
#[derive(Debug, Clone)]
enum ImageData {
    /// Original JPEG bytes, embedded with `DCTDecode`
    Jpeg(Vec<u8>),
    /// Uncompressed samples, 1 or 3 components per pixel
    Raw(Vec<u8>),
}

/// A decoded signature image, ready to embed
#[derive(Debug, Clone)]
pub struct SignatureImage {
    width: u32,
    height: u32,
    color_space: &'static str,
    data: ImageData,
    /// Alpha plane, present only when some pixel is not fully opaque
    soft_mask: Option<Vec<u8>>,
}

impl SignatureImage {
    /// Load a PNG or JPEG file
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ImageNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Decode image bytes, guessing the format from the content
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes)?;
        let decoded = image::load_from_memory_with_format(bytes, format)?;
        let (width, height) = decoded.dimensions();

        let soft_mask = if decoded.color().has_alpha() {
            let alpha: Vec<u8> = decoded.to_rgba8().pixels().map(|p| p[3]).collect();
            alpha.iter().any(|&a| a < u8::MAX).then_some(alpha)
        } else {
            None
        };

        // Opaque 8-bit gray or RGB JPEGs can be embedded untouched
        let passthrough = match format {
            ImageFormat::Jpeg if soft_mask.is_none() => jpeg_passthrough_color_space(bytes),
            _ => None,
        };

        let (color_space, data) = match passthrough {
            Some(color_space) => (color_space, ImageData::Jpeg(bytes.to_vec())),
            None if is_grayscale(&decoded) => {
                ("DeviceGray", ImageData::Raw(decoded.to_luma8().into_raw()))
            }
            None => ("DeviceRGB", ImageData::Raw(decoded.to_rgb8().into_raw())),
        };

        log::debug!(
            "Decoded {:?} signature {}x{} ({}, mask: {})",
            format,
            width,
            height,
            color_space,
            soft_mask.is_some()
        );

        Ok(Self { width, height, color_space, data, soft_mask })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the image carries a soft mask
    pub fn is_masked(&self) -> bool {
        self.soft_mask.is_some()
    }

    /// Add this image (and its soft mask) to a document, returning the image's id
    pub fn embed(&self, doc: &mut Document) -> ObjectId {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => self.color_space,
            "BitsPerComponent" => 8,
        };

        if let Some(ref alpha) = self.soft_mask {
            let smask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => self.width as i64,
                    "Height" => self.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha.clone(),
            );
            dict.set("SMask", doc.add_object(smask));
        }

        let stream = match self.data {
            ImageData::Jpeg(ref bytes) => {
                dict.set("Filter", "DCTDecode");
                // Already compressed, keep lopdf from deflating it again
                Stream::new(dict, bytes.clone()).with_compression(false)
            }
            ImageData::Raw(ref samples) => Stream::new(dict, samples.clone()),
        };

        doc.add_object(stream)
    }
}

fn is_grayscale(image: &DynamicImage) -> bool {
    matches!(
        image,
        DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
    )
}

/// Colour space for embedding a JPEG's own bytes, judged from its frame header
///
/// `image` hands CMYK JPEGs back as RGB, so the component count has to come
/// from the file itself. Anything other than 8-bit gray or RGB is re-encoded.
fn jpeg_passthrough_color_space(bytes: &[u8]) -> Option<&'static str> {
    let mut decoder = jpeg_decoder::Decoder::new(bytes);
    decoder.read_info().ok()?;
    match decoder.info()?.pixel_format {
        PixelFormat::L8 => Some("DeviceGray"),
        PixelFormat::RGB24 => Some("DeviceRGB"),
        _ => None,
    }
}
