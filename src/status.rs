//! Status channel: human-readable updates and selection reports

use log::{error, info, warn};

use crate::selection::SelectionReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub message: String,
    pub level: StatusLevel,
}

impl StatusUpdate {
    pub fn new(message: impl Into<String>, level: StatusLevel) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, StatusLevel::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, StatusLevel::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, StatusLevel::Error)
    }
}

/// Where status text and selection reports end up
pub trait StatusSink {
    fn status(&mut self, update: StatusUpdate);

    fn selection(&mut self, report: &SelectionReport);
}

/// Sends everything to the `log` facade
#[derive(Debug, Default)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn status(&mut self, update: StatusUpdate) {
        match update.level {
            StatusLevel::Info => info!("{}", update.message),
            StatusLevel::Warning => warn!("{}", update.message),
            StatusLevel::Error => error!("{}", update.message),
        }
    }

    fn selection(&mut self, report: &SelectionReport) {
        info!("{report}");
    }
}

impl<T: StatusSink + ?Sized> StatusSink for &mut T {
    fn status(&mut self, update: StatusUpdate) {
        (**self).status(update);
    }

    fn selection(&mut self, report: &SelectionReport) {
        (**self).selection(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting(usize);

    impl StatusSink for Counting {
        fn status(&mut self, _update: StatusUpdate) {
            self.0 += 1;
        }

        fn selection(&mut self, _report: &SelectionReport) {}
    }

    fn post(mut sink: impl StatusSink) {
        sink.status(StatusUpdate::warning("twice"));
        sink.status(StatusUpdate::error("twice"));
    }

    #[test]
    fn borrowed_sink_forwards() {
        let mut sink = Counting(0);
        post(&mut sink);
        assert_eq!(sink.0, 2);
    }

    #[test]
    fn log_sink_accepts_every_level() {
        post(LogSink);
        assert_eq!(StatusUpdate::info("x").level, StatusLevel::Info);
    }
}
