//! Page geometry and signature placement

use std::fmt;
use std::str::FromStr;
use crate::error::{Error, Result};

/// Default placement: page 2, 100pt from the left and bottom, 125 × 40pt
pub const DEFAULT_COORDS: &str = "2x100x100x125x40";

/// A rectangle in PDF user space (1/72 inch), as found in a `/MediaBox`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl Rect {
    pub fn new(llx: f32, lly: f32, urx: f32, ury: f32) -> Self {
        Self { llx, lly, urx, ury }
    }

    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self::new(0.0, 0.0, 612.0, 792.0)
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self::new(0.0, 0.0, 595.0, 842.0)
    }

    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// Build from the four numbers of a PDF rectangle array.
    ///
    /// PDF allows the corners in any order, so the result is normalized to
    /// lower-left / upper-right.
    pub fn from_corners(values: [f32; 4]) -> Self {
        let [x1, y1, x2, y2] = values;
        Self::new(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.llx, self.lly, self.urx, self.ury]
    }
}

/// Where the signature goes: a 1-based page number and a box on that page
///
/// `x`/`y` is the lower-left corner of the box, measured from the lower-left
/// corner of the page's media box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub page: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// 0-based page index, or `None` for page 0
    pub fn page_index(&self) -> Option<usize> {
        (self.page as usize).checked_sub(1)
    }

    /// Point where the date stamp starts: just right of the image, on its bottom edge
    pub fn date_origin(&self) -> (f32, f32) {
        (self.x as f32 + self.width as f32, self.y as f32)
    }

    /// Whether the box covers any area at all
    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self { page: 2, x: 100, y: 100, width: 125, height: 40 }
    }
}

impl FromStr for Placement {
    type Err = Error;

    /// Parse a `PAGExXxYxWIDTHxHEIGHT` string such as `1x200x300x125x40`
    fn from_str(s: &str) -> Result<Self> {
        const FIELDS: [&str; 5] = ["page", "x", "y", "width", "height"];

        let parts: Vec<&str> = s.trim().split('x').collect();
        if parts.len() != FIELDS.len() {
            return Err(Error::InvalidCoords(format!(
                "expected PAGExXxYxWIDTHxHEIGHT (5 fields), got {} in '{}'",
                parts.len(),
                s
            )));
        }

        let mut values = [0u32; 5];
        for (i, (part, name)) in parts.iter().zip(FIELDS).enumerate() {
            values[i] = part.trim().parse().map_err(|_| {
                Error::InvalidCoords(format!(
                    "{} must be a non-negative integer, got '{}' in '{}'",
                    name, part, s
                ))
            })?;
        }

        let [page, x, y, width, height] = values;
        if x.checked_add(width).is_none() || y.checked_add(height).is_none() {
            return Err(Error::InvalidCoords(format!(
                "box {}x{} at {},{} runs past the largest coordinate in '{}'",
                width, height, x, y, s
            )));
        }

        Ok(Self { page, x, y, width, height })
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}x{}x{}", self.page, self.x, self.y, self.width, self.height)
    }
}
