//! Render request and response types

use std::sync::Arc;

use super::source::{DecodeError, RenderError};
use super::types::{HandleId, RasterImage};

/// Request sent to the render worker
#[derive(Debug)]
pub enum RenderRequest {
    /// Decode a new document, replacing whatever the worker holds
    Open { handle: HandleId, bytes: Arc<[u8]> },

    /// Render one page (1-indexed) of the document identified by `handle`
    Page {
        handle: HandleId,
        page: usize,
        scale: f32,
    },

    /// Drop the document identified by `handle`
    Close(HandleId),

    /// Shutdown the worker
    Shutdown,
}

/// Response from the render worker
#[derive(Debug)]
pub enum RenderResponse {
    /// Document decoded
    Opened { handle: HandleId, page_count: usize },

    /// Document could not be decoded
    OpenFailed { handle: HandleId, error: DecodeError },

    /// Rendered page data
    Page {
        handle: HandleId,
        page: usize,
        raster: RasterImage,
    },

    /// Page could not be rendered
    PageFailed { handle: HandleId, error: RenderError },
}

impl RenderResponse {
    /// Document the response belongs to
    #[must_use]
    pub fn handle(&self) -> HandleId {
        match self {
            Self::Opened { handle, .. }
            | Self::OpenFailed { handle, .. }
            | Self::Page { handle, .. }
            | Self::PageFailed { handle, .. } => *handle,
        }
    }
}
