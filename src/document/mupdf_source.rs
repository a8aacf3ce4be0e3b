//! MuPDF-backed document source

use log::debug;
use mupdf::{Colorspace, Document, Matrix, Pixmap};

use super::source::{DecodeError, DocumentSource, RenderError};
use super::types::RasterImage;

/// Largest raster edge we are willing to allocate, in pixels
const MAX_DIMENSION: f32 = 16_384.0;

/// Opens PDF bytes with MuPDF and renders pages to RGB rasters
#[derive(Clone, Copy, Debug, Default)]
pub struct MupdfSource;

impl MupdfSource {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DocumentSource for MupdfSource {
    type Document = Document;

    fn open(&self, bytes: &[u8]) -> Result<Document, DecodeError> {
        let doc = Document::from_bytes(bytes, "pdf").map_err(|e| DecodeError::new(e.to_string()))?;
        // Encrypted or broken xref tables fail here rather than on first render
        doc.page_count()
            .map_err(|e| DecodeError::new(e.to_string()))?;
        Ok(doc)
    }

    fn page_count(&self, doc: &Document) -> usize {
        doc.page_count().map_or(0, |n| n.max(0) as usize)
    }

    fn render_page(
        &self,
        doc: &Document,
        index: usize,
        scale: f32,
    ) -> Result<RasterImage, RenderError> {
        let page_num = index + 1;
        let fault = |e: mupdf::error::Error| RenderError::new(page_num, e.to_string());

        let page = doc.load_page(index as i32).map_err(fault)?;
        let bounds = page.bounds().map_err(fault)?;
        let (page_width, page_height) = (bounds.x1 - bounds.x0, bounds.y1 - bounds.y0);

        let max_dim = page_width.max(page_height) * scale;
        if !max_dim.is_finite() || max_dim <= 0.0 || max_dim > MAX_DIMENSION {
            return Err(RenderError::new(
                page_num,
                format!("page {page_width}x{page_height} at scale {scale} is out of range"),
            ));
        }

        let transform = Matrix::new_scale(scale, scale);
        let rgb = Colorspace::device_rgb();
        let pixmap = page.to_pixmap(&transform, &rgb, false, false).map_err(fault)?;
        debug!(
            "Rendered page {page_num}: {}x{} px",
            pixmap.width(),
            pixmap.height()
        );

        let pixels = pixmap_to_rgb(&pixmap).map_err(|detail| RenderError::new(page_num, detail))?;
        RasterImage::from_rgb(pixmap.width(), pixmap.height(), pixels)
            .ok_or_else(|| RenderError::new(page_num, "pixmap buffer size mismatch"))
    }
}

fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>, String> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(format!("unsupported pixmap format: {n} channels"));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err("pixmap buffer size mismatch".to_string());
    }

    let mut out = Vec::with_capacity(width * height * RasterImage::CHANNELS);
    for y in 0..height {
        let row_start = y * stride;
        let row = &samples[row_start..row_start + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let source = MupdfSource::new();
        assert!(source.open(b"definitely not a pdf").is_err());
    }
}
