//! Session orchestrator - routes user input to the document session and
//! reports everything that happens through a [`StatusSink`]

use std::time::Instant;

use log::debug;

use crate::document::{DocumentSession, DocumentSessionState, HandleId, SessionError};
use crate::selection::{PointerEvent, SelectionEffect, SelectionReport};
use crate::status::{StatusSink, StatusUpdate};

const CLEAR_PROMPT: &str = "Are you sure you want to clear the current document?";

/// A file handed over by the file chooser
#[derive(Clone, Debug)]
pub struct FileInput {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes,
        }
    }

    #[must_use]
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Judged by mime type or file name only; content is the decoder's business
    #[must_use]
    pub fn is_document(&self) -> bool {
        self.mime.as_deref().is_some_and(|m| m.contains("pdf"))
            || self.name.to_lowercase().ends_with(".pdf")
    }
}

/// What the caller should do with its file input after a rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputDisposition {
    /// Leave the selection in place so the user can retry
    Retain,
    /// Clear the selection so the same file is not resubmitted silently
    Reset,
}

/// A file selection the orchestrator refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{error}")]
pub struct InputRejected {
    pub error: SessionError,
    pub disposition: InputDisposition,
}

impl From<SessionError> for InputRejected {
    fn from(error: SessionError) -> Self {
        let disposition = match error {
            SessionError::UnsupportedType(_) => InputDisposition::Reset,
            _ => InputDisposition::Retain,
        };
        Self { error, disposition }
    }
}

/// Explicit yes/no step before destructive actions
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Short document status shown next to the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentStatus {
    #[default]
    Waiting,
    Loading,
    Processing,
    Ready,
    Error,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Waiting => "Waiting for file",
            DocumentStatus::Loading => "Loading...",
            DocumentStatus::Processing => "Processing pages...",
            DocumentStatus::Ready => "Ready",
            DocumentStatus::Error => "Error",
        }
    }
}

/// Summary of the loaded document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub file_name: Option<String>,
    pub page_count: usize,
    pub status: DocumentStatus,
}

/// Top-level controller: file chooser, clear button and pointer input in,
/// status updates and selection reports out
pub struct SessionOrchestrator<K: StatusSink> {
    session: DocumentSession,
    sink: K,
    info: DocumentInfo,
}

impl<K: StatusSink> SessionOrchestrator<K> {
    pub fn new(session: DocumentSession, mut sink: K) -> Self {
        sink.status(StatusUpdate::info("Ready to load a PDF file"));
        Self {
            session,
            sink,
            info: DocumentInfo::default(),
        }
    }

    /// Handle the file chooser's selection; only the first file is used.
    ///
    /// Returns `Ok(None)` for an empty selection.
    pub fn on_file_selected(
        &mut self,
        files: Vec<FileInput>,
    ) -> Result<Option<HandleId>, InputRejected> {
        let Some(file) = files.into_iter().next() else {
            return Ok(None);
        };

        if self.session.state().is_busy() {
            self.sink.status(StatusUpdate::warning(
                "Please wait until the current file finishes processing",
            ));
            return Err(SessionError::AlreadyLoading.into());
        }

        if !file.is_document() {
            self.sink
                .status(StatusUpdate::warning("Please choose a PDF file"));
            return Err(SessionError::UnsupportedType(file.name).into());
        }

        if file.bytes.is_empty() {
            self.sink
                .status(StatusUpdate::warning(format!("{} is empty", file.name)));
            return Err(SessionError::UnsupportedType(file.name).into());
        }

        let FileInput { name, bytes, .. } = file;
        let previous = self.info.file_name.replace(name);
        match self.session.load(bytes) {
            Ok(id) => {
                self.publish_transitions();
                Ok(Some(id))
            }
            Err(error) => {
                self.info.file_name = previous;
                self.publish_transitions();
                self.sink
                    .status(StatusUpdate::error(format!("Failed to load file: {error}")));
                Err(error.into())
            }
        }
    }

    /// Drag-and-drop is not a supported way to load documents
    pub fn on_files_dropped(&mut self, count: usize) {
        debug!("Rejecting {count} dropped file(s)");
        self.sink.status(StatusUpdate::warning(
            "Please use the file chooser to load a single PDF file",
        ));
    }

    /// Clear the current document after confirmation.
    ///
    /// Returns whether anything was cleared.
    pub fn on_clear_requested(&mut self, confirm: &mut impl Confirm) -> bool {
        if !self.session.has_document() {
            return false;
        }
        if !confirm.confirm(CLEAR_PROMPT) {
            return false;
        }

        self.session.clear();
        self.publish_transitions();
        self.sink.status(StatusUpdate::info(
            "Document cleared. Choose a new PDF file",
        ));
        true
    }

    /// Route a pointer event to the surface of `page` (1-indexed).
    ///
    /// Returns the report when the event completed a selection.
    pub fn on_pointer(
        &mut self,
        page: usize,
        event: PointerEvent,
        now: Instant,
    ) -> Option<SelectionReport> {
        if matches!(event, PointerEvent::Down(_)) {
            if let Some(busy) = self
                .session
                .surfaces()
                .iter()
                .find(|s| s.page() != page && s.selection().is_dragging())
            {
                debug!(
                    "Ignoring pointer down on page {page}: page {} is mid-gesture",
                    busy.page()
                );
                return None;
            }
            if self.session.surface(page).is_none() {
                debug!("Ignoring pointer down on missing page {page}");
                return None;
            }
            for other in self.session.surfaces_mut() {
                if other.page() != page {
                    let _ = other.selection_mut().deactivate();
                }
            }
        }

        let surface = self.session.surface_mut(page)?;
        let scale = surface.scale();
        let effects = surface.selection_mut().handle(event, now);

        if matches!(event, PointerEvent::Down(_)) && !effects.is_empty() {
            self.sink.status(StatusUpdate::info(format!(
                "Selecting on page {page} - drag the pointer"
            )));
        }

        let mut report = None;
        for effect in effects {
            match effect {
                SelectionEffect::Committed(rect) => {
                    let Some(done) = SelectionReport::from_rect(&rect, scale) else {
                        self.sink.status(StatusUpdate::error(format!(
                            "Page {page} has no usable scale ({scale})"
                        )));
                        continue;
                    };
                    self.sink.selection(&done);
                    self.sink.status(StatusUpdate::info(format!(
                        "Selection completed on page {page}"
                    )));
                    report = Some(done);
                }
                SelectionEffect::Cancelled => {
                    self.sink.status(StatusUpdate::info("Selection cancelled"));
                }
                _ => {}
            }
        }
        report
    }

    /// Let delayed overlay hides fire
    pub fn tick(&mut self, now: Instant) {
        for surface in self.session.surfaces_mut() {
            let _ = surface.selection_mut().tick(now);
        }
    }

    /// Apply finished render work without blocking
    pub fn pump(&mut self) {
        self.session.poll_responses();
        self.publish_transitions();
    }

    /// Block until the current load finishes, reporting progress as it happens
    pub fn wait_until_settled(&mut self) -> Result<(), SessionError> {
        while self.session.state().is_busy() {
            let step = self.session.wait_for_response();
            self.publish_transitions();
            step?;
        }
        Ok(())
    }

    fn publish_transitions(&mut self) {
        for state in self.session.take_published() {
            let name = self.info.file_name.clone().unwrap_or_default();
            let update = match &state {
                DocumentSessionState::Empty => {
                    self.info = DocumentInfo::default();
                    StatusUpdate::info("Ready to load a PDF file")
                }
                DocumentSessionState::Loading => {
                    self.info.page_count = 0;
                    self.info.status = DocumentStatus::Loading;
                    StatusUpdate::info(format!("Loading: {name}..."))
                }
                DocumentSessionState::RenderingPages { current, total } => {
                    self.info.page_count = *total;
                    self.info.status = DocumentStatus::Processing;
                    StatusUpdate::info(format!("Processing pages: {current}/{total}"))
                }
                DocumentSessionState::Ready { page_count } => {
                    self.info.page_count = *page_count;
                    self.info.status = DocumentStatus::Ready;
                    StatusUpdate::info(format!(
                        "Document \"{name}\" ({page_count} pages) is ready"
                    ))
                }
                DocumentSessionState::Failed { reason } => {
                    self.info.page_count = 0;
                    self.info.status = DocumentStatus::Error;
                    StatusUpdate::error(format!("Failed to load file: {reason}"))
                }
            };
            self.sink.status(update);
        }
    }

    #[must_use]
    pub fn session(&self) -> &DocumentSession {
        &self.session
    }

    #[must_use]
    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    #[must_use]
    pub fn sink(&self) -> &K {
        &self.sink
    }
}
