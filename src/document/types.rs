//! Core types for document rendering

use std::time::Duration;

use crate::selection::SelectionController;

/// Display pixels per native document unit used when nothing else is configured
pub const DEFAULT_DISPLAY_SCALE: f32 = 1.5;

/// Progress is published every N settled pages (and on the last page)
pub const DEFAULT_PROGRESS_EVERY: usize = 5;

/// Identity of one opened document.
///
/// Every load gets a fresh id; worker responses carrying an older id belong to
/// a document that has since been cleared or replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl HandleId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

/// Handle to the document currently owned by the session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DocumentHandle {
    pub id: HandleId,
    pub page_count: usize,
}

/// Raw rendered page image.
///
/// Tightly packed RGB pixel data (3 bytes per pixel, row-major, no padding).
/// Immutable once produced by the document source.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    pixels: Vec<u8>,
    width_px: u32,
    height_px: u32,
}

impl RasterImage {
    pub const CHANNELS: usize = 3;

    /// Wrap an RGB buffer, returning `None` if its length does not match the dimensions
    #[must_use]
    pub fn from_rgb(width_px: u32, height_px: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width_px as usize)
            .checked_mul(height_px as usize)?
            .checked_mul(Self::CHANNELS)?;
        if pixels.len() != expected {
            return None;
        }
        Some(Self {
            pixels,
            width_px,
            height_px,
        })
    }

    /// Solid white raster, mostly useful for tests and placeholder sources
    #[must_use]
    pub fn blank(width_px: u32, height_px: u32) -> Self {
        let len = width_px as usize * height_px as usize * Self::CHANNELS;
        Self {
            pixels: vec![0xFF; len],
            width_px,
            height_px,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width_px
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height_px
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// One rendered page together with its selection layer
#[derive(Debug)]
pub struct PageSurface {
    /// Page number (1-indexed)
    page: usize,
    /// Scale the raster was produced at (display pixels per native unit)
    scale: f32,
    raster: RasterImage,
    selection: SelectionController,
}

impl PageSurface {
    #[must_use]
    pub fn new(page: usize, scale: f32, raster: RasterImage) -> Self {
        Self {
            page,
            scale,
            raster,
            selection: SelectionController::new(page),
        }
    }

    #[must_use]
    pub fn with_hide_delay(mut self, delay: Duration) -> Self {
        self.selection = self.selection.with_hide_delay(delay);
        self
    }

    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[must_use]
    pub fn display_width(&self) -> f32 {
        self.raster.width() as f32
    }

    #[must_use]
    pub fn display_height(&self) -> f32 {
        self.raster.height() as f32
    }

    #[must_use]
    pub fn raster(&self) -> &RasterImage {
        &self.raster
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionController {
        &mut self.selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgb_rejects_mismatched_buffer() {
        assert!(RasterImage::from_rgb(2, 2, vec![0; 11]).is_none());
        assert!(RasterImage::from_rgb(2, 2, vec![0; 12]).is_some());
    }

    #[test]
    fn surface_reports_raster_dimensions() {
        let surface = PageSurface::new(3, 1.5, RasterImage::blank(918, 1188));
        assert_eq!(surface.page(), 3);
        assert_eq!(surface.display_width(), 918.0);
        assert_eq!(surface.display_height(), 1188.0);
        assert!(!surface.selection().is_dragging());
    }
}
