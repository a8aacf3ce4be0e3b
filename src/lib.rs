// Export modules for use in tests
pub mod document;
pub mod event_source;
pub mod export;
pub mod orchestrator;
pub mod panic_handler;
pub mod selection;
pub mod settings;
pub mod status;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export the main entry points
pub use document::{DocumentSession, DocumentSessionState, SessionConfig, SessionError};
pub use orchestrator::{FileInput, InputDisposition, SessionOrchestrator};
pub use selection::{PointerEvent, SelectionReport};
pub use status::{StatusSink, StatusUpdate};
