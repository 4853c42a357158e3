//! Mapping between the host's pixel space and PDF user space.
//!
//! Pixel space has its origin at the viewport's top-left corner with y growing
//! downward. PDF user space has its origin at the page's lower-left corner with
//! y growing upward and is measured in points.

use serde::Deserialize;

/// Axis-aligned rectangle in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// True when `other` lies between this rectangle's top and bottom edges.
    pub fn contains_vertically(&self, other: &PixelRect) -> bool {
        other.top >= self.top && other.bottom() <= self.bottom()
    }
}

/// Page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// Rectangle in PDF user space: lower-left corner plus extent, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PdfRect {
    /// False when any component overflowed or came from a degenerate page.
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
    }

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

/// Map an overlay drawn over a rendered page into that page's PDF space.
///
/// The overlay's center is the anchor, so rounding in the host's layout never
/// shifts the logo toward one corner. `page` must have a non-zero area; the
/// mapper does not check.
pub fn map_overlay_to_pdf(overlay: &PixelRect, page: &PixelRect, pdf: PageSize) -> PdfRect {
    let width_ratio = overlay.width / page.width;
    let height_ratio = overlay.height / page.height;
    let pdf_width = width_ratio * pdf.width;
    let pdf_height = height_ratio * pdf.height;

    let (center_x, center_y) = overlay.center();
    let x_ratio = (center_x - page.left) / page.width;
    let y_ratio = (center_y - page.top) / page.height;

    PdfRect {
        x: x_ratio * pdf.width - pdf_width / 2.0,
        y: pdf.height - y_ratio * pdf.height - pdf_height / 2.0,
        width: pdf_width,
        height: pdf_height,
    }
}

/// Index of the first page whose viewport rect vertically contains the overlay.
///
/// Pages without area are skipped so the mapper never divides by zero.
pub fn select_page(overlay: &PixelRect, pages: &[PixelRect]) -> Option<usize> {
    pages
        .iter()
        .position(|page| page.has_area() && page.contains_vertically(overlay))
}
