//! In-memory doubles for tests: a scripted document source, a recording
//! status sink and a gesture scenario builder

pub mod test_helpers {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::document::{DecodeError, DocumentSource, RasterImage, RenderError};
    use crate::event_source::{PageEvent, ScriptedEventSource};
    use crate::selection::{Point, PointerEvent, SelectionReport};
    use crate::status::{StatusLevel, StatusSink, StatusUpdate};

    /// Native page size used by [`ScriptedSource`] unless overridden (US letter)
    pub const LETTER: (f32, f32) = (612.0, 792.0);

    /// Shared record of which pages (1-indexed) a source was asked to render
    #[derive(Clone, Debug, Default)]
    pub struct RenderLog(Arc<Mutex<Vec<usize>>>);

    impl RenderLog {
        pub fn attempts(&self) -> Vec<usize> {
            self.0.lock().map(|log| log.clone()).unwrap_or_default()
        }

        fn push(&self, page: usize) {
            if let Ok(mut log) = self.0.lock() {
                log.push(page);
            }
        }
    }

    /// Document source that never touches a real decoder.
    ///
    /// Bytes open successfully only when they start with `%PDF`. Every page
    /// renders to a blank raster unless marked as failing.
    #[derive(Clone, Debug)]
    pub struct ScriptedSource {
        pages: usize,
        page_size: (f32, f32),
        failing: HashSet<usize>,
        render_delay: Option<Duration>,
        log: RenderLog,
    }

    pub struct ScriptedDocument {
        pages: usize,
    }

    impl ScriptedSource {
        pub fn with_pages(pages: usize) -> Self {
            Self {
                pages,
                page_size: LETTER,
                failing: HashSet::new(),
                render_delay: None,
                log: RenderLog::default(),
            }
        }

        /// Make the given page (1-indexed) fail to render
        pub fn failing_page(mut self, page: usize) -> Self {
            self.failing.insert(page);
            self
        }

        pub fn page_size(mut self, width: f32, height: f32) -> Self {
            self.page_size = (width, height);
            self
        }

        /// Sleep before each render, to keep a sweep in flight
        pub fn render_delay(mut self, delay: Duration) -> Self {
            self.render_delay = Some(delay);
            self
        }

        pub fn render_log(&self) -> RenderLog {
            self.log.clone()
        }
    }

    impl DocumentSource for ScriptedSource {
        type Document = ScriptedDocument;

        fn open(&self, bytes: &[u8]) -> Result<ScriptedDocument, DecodeError> {
            if !bytes.starts_with(b"%PDF") {
                return Err(DecodeError::new("missing %PDF header"));
            }
            Ok(ScriptedDocument { pages: self.pages })
        }

        fn page_count(&self, doc: &ScriptedDocument) -> usize {
            doc.pages
        }

        fn render_page(
            &self,
            doc: &ScriptedDocument,
            index: usize,
            scale: f32,
        ) -> Result<RasterImage, RenderError> {
            let page = index + 1;
            self.log.push(page);
            if let Some(delay) = self.render_delay {
                std::thread::sleep(delay);
            }
            if page > doc.pages {
                return Err(RenderError::new(page, "page out of range"));
            }
            if self.failing.contains(&page) {
                return Err(RenderError::new(page, "scripted failure"));
            }
            let width = (self.page_size.0 * scale).round() as u32;
            let height = (self.page_size.1 * scale).round() as u32;
            Ok(RasterImage::blank(width, height))
        }
    }

    /// Status sink that keeps everything it receives
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub updates: Vec<StatusUpdate>,
        pub reports: Vec<SelectionReport>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn messages(&self) -> Vec<String> {
            self.updates.iter().map(|u| u.message.clone()).collect()
        }

        pub fn last_message(&self) -> Option<&str> {
            self.updates.last().map(|u| u.message.as_str())
        }

        pub fn count_at(&self, level: StatusLevel) -> usize {
            self.updates.iter().filter(|u| u.level == level).count()
        }
    }

    impl StatusSink for RecordingSink {
        fn status(&mut self, update: StatusUpdate) {
            self.updates.push(update);
        }

        fn selection(&mut self, report: &SelectionReport) {
            self.reports.push(*report);
        }
    }

    /// Builder for scripted pointer input
    #[derive(Default)]
    pub struct GestureScenarioBuilder {
        events: Vec<PageEvent>,
    }

    impl GestureScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn press(mut self, page: usize, x: f32, y: f32) -> Self {
            self.events
                .push(PageEvent::new(page, PointerEvent::Down(Point::new(x, y))));
            self
        }

        pub fn move_to(mut self, page: usize, x: f32, y: f32) -> Self {
            self.events
                .push(PageEvent::new(page, PointerEvent::Move(Point::new(x, y))));
            self
        }

        pub fn release(mut self, page: usize, x: f32, y: f32) -> Self {
            self.events
                .push(PageEvent::new(page, PointerEvent::Up(Point::new(x, y))));
            self
        }

        pub fn leave(mut self, page: usize) -> Self {
            self.events.push(PageEvent::new(page, PointerEvent::Leave));
            self
        }

        /// Press at `from`, move to `to` and release there
        pub fn drag(self, page: usize, from: (f32, f32), to: (f32, f32)) -> Self {
            self.press(page, from.0, from.1)
                .move_to(page, to.0, to.1)
                .release(page, to.0, to.1)
        }

        pub fn build(self) -> ScriptedEventSource {
            ScriptedEventSource::new(self.events)
        }

        pub fn events(self) -> Vec<PageEvent> {
            self.events
        }
    }
}
