//! Document loading and page rendering

#[cfg(feature = "pdf")]
mod mupdf_source;
mod request;
mod session;
mod source;
mod state;
mod types;
mod worker;

#[cfg(feature = "pdf")]
pub use mupdf_source::MupdfSource;
pub use request::{RenderRequest, RenderResponse};
pub use session::{DocumentSession, SessionConfig, SessionError};
pub use source::{DecodeError, DocumentSource, RenderError};
pub use state::{Command, DocumentSessionState, Effect, SessionMachine};
pub use types::*;
