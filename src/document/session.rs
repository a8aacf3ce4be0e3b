//! Document session - owns the render worker and the loaded document

use std::sync::Arc;
use std::time::Duration;

use flume::{Receiver, Sender};
use log::{debug, error, info, warn};

use super::request::{RenderRequest, RenderResponse};
use super::source::{DecodeError, DocumentSource};
use super::state::{Command, DocumentSessionState, Effect, SessionMachine};
use super::types::{
    DEFAULT_DISPLAY_SCALE, DEFAULT_PROGRESS_EVERY, DocumentHandle, HandleId, PageSurface,
};
use super::worker::render_worker;
use crate::selection::DEFAULT_HIDE_DELAY;

/// Errors surfaced by [`DocumentSession`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("a document is already being loaded")]
    AlreadyLoading,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("render worker is not running")]
    Disconnected,
}

/// Tunables for a session
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionConfig {
    /// Display pixels per native document unit
    pub scale: f32,
    /// Publish progress every N pages
    pub progress_every: usize,
    /// How long a committed selection stays visible on its page
    pub hide_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_DISPLAY_SCALE,
            progress_every: DEFAULT_PROGRESS_EVERY,
            hide_delay: DEFAULT_HIDE_DELAY,
        }
    }
}

/// Owns exactly one loaded document at a time and drives the render sweep.
///
/// All decoding and rendering happens on a single worker thread. Requests are
/// tagged with the [`HandleId`] of the document they belong to; responses for
/// any other id are stale and dropped.
pub struct DocumentSession {
    machine: SessionMachine,
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    next_handle_id: u64,
    /// Id of the load in flight or of the open document
    active: Option<HandleId>,
    handle: Option<DocumentHandle>,
    surfaces: Vec<PageSurface>,
    scale: f32,
    hide_delay: Duration,
    published: Vec<DocumentSessionState>,
    last_error: Option<DecodeError>,
}

impl DocumentSession {
    /// Create a session with default configuration
    #[must_use]
    pub fn new<S: DocumentSource>(source: S) -> Self {
        Self::with_config(source, SessionConfig::default())
    }

    /// Create a session with custom configuration
    #[must_use]
    pub fn with_config<S: DocumentSource>(source: S, config: SessionConfig) -> Self {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        // One worker: pages render strictly one after another
        std::thread::spawn(move || {
            render_worker(source, request_rx, response_tx);
        });

        Self {
            machine: SessionMachine::new(config.progress_every),
            request_tx,
            response_rx,
            next_handle_id: 1,
            active: None,
            handle: None,
            surfaces: Vec::new(),
            scale: config.scale,
            hide_delay: config.hide_delay,
            published: Vec::new(),
            last_error: None,
        }
    }

    /// Start loading `bytes` as the new document.
    ///
    /// Returns as soon as the open request is queued; drive the sweep with
    /// [`Self::poll_responses`] or [`Self::wait_until_settled`].
    pub fn load(&mut self, bytes: impl Into<Arc<[u8]>>) -> Result<HandleId, SessionError> {
        if self.machine.state().is_busy() {
            return Err(SessionError::AlreadyLoading);
        }

        let bytes: Arc<[u8]> = bytes.into();
        if bytes.is_empty() {
            return Err(SessionError::UnsupportedType("empty input".to_string()));
        }

        self.last_error = None;
        self.apply_command(Command::BeginLoad);

        let id = self.next_id();
        self.active = Some(id);
        info!("Loading document {id} ({} bytes)", bytes.len());

        if self
            .request_tx
            .send(RenderRequest::Open { handle: id, bytes })
            .is_err()
        {
            self.fail_open(id, DecodeError::new("render worker is not running"));
            return Err(SessionError::Disconnected);
        }

        Ok(id)
    }

    /// Load and render the whole document, blocking until the sweep ends
    pub fn load_blocking(&mut self, bytes: impl Into<Arc<[u8]>>) -> Result<usize, SessionError> {
        self.load(bytes)?;
        self.wait_until_settled()?;

        match self.machine.state() {
            DocumentSessionState::Ready { page_count } => Ok(*page_count),
            DocumentSessionState::Failed { reason } => Err(SessionError::Decode(
                self.last_error
                    .clone()
                    .unwrap_or_else(|| DecodeError::new(reason.clone())),
            )),
            _ => Ok(0),
        }
    }

    /// Drop the current document and every page surface.
    ///
    /// Render work already queued for the old document is discarded when it
    /// comes back.
    pub fn clear(&mut self) {
        self.apply_command(Command::Clear);
    }

    /// Apply every response that is already available, without blocking
    pub fn poll_responses(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(response) = self.response_rx.try_recv() {
            self.apply_response(response);
            applied += 1;
        }
        applied
    }

    /// Block until no load or render sweep is in flight
    pub fn wait_until_settled(&mut self) -> Result<(), SessionError> {
        while self.machine.state().is_busy() {
            self.wait_for_response()?;
        }
        Ok(())
    }

    /// Block for the next worker response, if a sweep is in flight
    pub fn wait_for_response(&mut self) -> Result<(), SessionError> {
        if !self.machine.state().is_busy() {
            return Ok(());
        }

        match self.response_rx.recv() {
            Ok(response) => {
                self.apply_response(response);
                Ok(())
            }
            Err(_) => {
                error!("Render worker disconnected mid-sweep");
                match (self.machine.state(), self.active) {
                    (DocumentSessionState::Loading, Some(id)) => {
                        self.fail_open(id, DecodeError::new("render worker is not running"));
                    }
                    _ => self.clear(),
                }
                Err(SessionError::Disconnected)
            }
        }
    }

    fn apply_response(&mut self, response: RenderResponse) {
        if Some(response.handle()) != self.active {
            debug!("Discarding stale response for {}", response.handle());
            return;
        }

        match response {
            RenderResponse::Opened { handle, page_count } => {
                info!("Opened {handle} with {page_count} pages");
                self.handle = Some(DocumentHandle {
                    id: handle,
                    page_count,
                });
                self.apply_command(Command::Opened { page_count });
            }

            RenderResponse::OpenFailed { handle, error } => {
                self.fail_open(handle, error);
            }

            RenderResponse::Page { page, raster, .. } => {
                debug!(
                    "Page {page} rendered at {}x{}",
                    raster.width(),
                    raster.height()
                );
                self.surfaces
                    .push(PageSurface::new(page, self.scale, raster).with_hide_delay(self.hide_delay));
                self.apply_command(Command::PageSettled { page });
            }

            RenderResponse::PageFailed { error, .. } => {
                warn!("Skipping page: {error}");
                self.apply_command(Command::PageSettled { page: error.page });
            }
        }
    }

    fn fail_open(&mut self, handle: HandleId, error: DecodeError) {
        error!("Failed to open {handle}: {error}");
        let reason = error.detail.clone();
        self.last_error = Some(error);
        self.apply_command(Command::OpenFailed { reason });
    }

    fn apply_command(&mut self, cmd: Command) {
        let effects = self.machine.apply(cmd);
        self.execute_effects(effects);
    }

    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::DiscardDocument => self.discard_document(),

                Effect::RenderPage(page) => {
                    let Some(handle) = self.active else {
                        continue;
                    };
                    let request = RenderRequest::Page {
                        handle,
                        page,
                        scale: self.scale,
                    };
                    if self.request_tx.send(request).is_err() {
                        error!("Render worker is gone, cannot request page {page}");
                    }
                }

                Effect::Publish(state) => {
                    debug!("Session state: {state:?}");
                    self.published.push(state);
                }
            }
        }
    }

    fn discard_document(&mut self) {
        if let Some(id) = self.active.take() {
            let _ = self.request_tx.send(RenderRequest::Close(id));
        }
        self.handle = None;
        self.surfaces.clear();
    }

    /// Current session state
    #[must_use]
    pub fn state(&self) -> &DocumentSessionState {
        self.machine.state()
    }

    /// Drain the state transitions published since the last call
    pub fn take_published(&mut self) -> Vec<DocumentSessionState> {
        std::mem::take(&mut self.published)
    }

    /// Handle of the open document, if any
    #[must_use]
    pub fn handle(&self) -> Option<DocumentHandle> {
        self.handle
    }

    #[must_use]
    pub fn has_document(&self) -> bool {
        self.handle.is_some()
    }

    /// Display scale new pages are rendered at
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Rendered pages in ascending page order
    #[must_use]
    pub fn surfaces(&self) -> &[PageSurface] {
        &self.surfaces
    }

    pub fn surfaces_mut(&mut self) -> &mut [PageSurface] {
        &mut self.surfaces
    }

    /// Surface of a page (1-indexed), if it rendered
    #[must_use]
    pub fn surface(&self, page: usize) -> Option<&PageSurface> {
        self.surfaces.iter().find(|s| s.page() == page)
    }

    pub fn surface_mut(&mut self, page: usize) -> Option<&mut PageSurface> {
        self.surfaces.iter_mut().find(|s| s.page() == page)
    }

    /// Shutdown the worker
    pub fn shutdown(&self) {
        let _ = self.request_tx.send(RenderRequest::Shutdown);
    }

    fn next_id(&mut self) -> HandleId {
        let id = HandleId::new(self.next_handle_id);
        self.next_handle_id += 1;
        id
    }
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
