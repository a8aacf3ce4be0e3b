//! Boundary to the document decoding library

use super::types::RasterImage;

/// Whole-document failure: the bytes could not be opened as a document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot decode document: {detail}")]
pub struct DecodeError {
    pub detail: String,
}

impl DecodeError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Single-page failure; the document itself stays usable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot render page {page}: {detail}")]
pub struct RenderError {
    /// Page number (1-indexed)
    pub page: usize,
    pub detail: String,
}

impl RenderError {
    pub fn new(page: usize, detail: impl Into<String>) -> Self {
        Self {
            page,
            detail: detail.into(),
        }
    }
}

/// A document decoder that can open byte buffers and rasterize their pages.
///
/// The opened document stays on the render worker thread, so only the source
/// itself has to be `Send`. Page indices passed to [`DocumentSource::render_page`]
/// are 0-based.
pub trait DocumentSource: Send + 'static {
    type Document;

    /// Decode `bytes` into a document
    fn open(&self, bytes: &[u8]) -> Result<Self::Document, DecodeError>;

    /// Number of pages in an opened document
    fn page_count(&self, doc: &Self::Document) -> usize;

    /// Rasterize one page at `scale` display pixels per native unit
    fn render_page(
        &self,
        doc: &Self::Document,
        index: usize,
        scale: f32,
    ) -> Result<RasterImage, RenderError>;
}
