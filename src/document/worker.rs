//! Render worker - runs in a separate thread

use flume::{Receiver, Sender};
use log::{debug, warn};

use super::request::{RenderRequest, RenderResponse};
use super::source::{DocumentSource, RenderError};
use super::types::HandleId;

/// Main worker function - runs in a dedicated thread.
///
/// Requests are served strictly in arrival order, one at a time. The decoded
/// document never leaves this thread.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn render_worker<S: DocumentSource>(
    source: S,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
) {
    let mut current: Option<(HandleId, S::Document)> = None;

    for request in requests {
        let response = match request {
            RenderRequest::Open { handle, bytes } => {
                current = None;
                match source.open(&bytes) {
                    Ok(doc) => {
                        let page_count = source.page_count(&doc);
                        debug!("Worker opened {handle}: {page_count} pages");
                        current = Some((handle, doc));
                        RenderResponse::Opened { handle, page_count }
                    }
                    Err(error) => RenderResponse::OpenFailed { handle, error },
                }
            }

            RenderRequest::Page {
                handle,
                page,
                scale,
            } => match &current {
                Some((id, doc)) if *id == handle => {
                    match source.render_page(doc, page.saturating_sub(1), scale) {
                        Ok(raster) => RenderResponse::Page {
                            handle,
                            page,
                            raster,
                        },
                        // Sweep ordering keys on the requested page, not the source's numbering
                        Err(error) => RenderResponse::PageFailed {
                            handle,
                            error: RenderError::new(page, error.detail),
                        },
                    }
                }
                _ => RenderResponse::PageFailed {
                    handle,
                    error: RenderError::new(page, "document is no longer open"),
                },
            },

            RenderRequest::Close(handle) => {
                if current.as_ref().is_some_and(|(id, _)| *id == handle) {
                    debug!("Worker closed {handle}");
                    current = None;
                }
                continue;
            }

            RenderRequest::Shutdown => break,
        };

        if responses.send(response).is_err() {
            warn!("Render worker lost its session, exiting");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DecodeError, RasterImage};

    /// Numbers its errors with the 0-based index it was handed
    struct IndexNumberedFailures;

    impl DocumentSource for IndexNumberedFailures {
        type Document = ();

        fn open(&self, _bytes: &[u8]) -> Result<(), DecodeError> {
            Ok(())
        }

        fn page_count(&self, _doc: &()) -> usize {
            3
        }

        fn render_page(&self, _doc: &(), index: usize, _scale: f32) -> Result<RasterImage, RenderError> {
            Err(RenderError::new(index, "broken content stream"))
        }
    }

    #[test]
    fn page_failure_carries_the_requested_page() {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();
        let worker = std::thread::spawn(move || {
            render_worker(IndexNumberedFailures, request_rx, response_tx);
        });

        let handle = HandleId(1);
        request_tx
            .send(RenderRequest::Open {
                handle,
                bytes: b"%PDF".to_vec().into(),
            })
            .unwrap();
        request_tx
            .send(RenderRequest::Page {
                handle,
                page: 2,
                scale: 1.0,
            })
            .unwrap();
        request_tx.send(RenderRequest::Shutdown).unwrap();

        assert!(matches!(
            response_rx.recv().unwrap(),
            RenderResponse::Opened { page_count: 3, .. }
        ));
        match response_rx.recv().unwrap() {
            RenderResponse::PageFailed { error, .. } => {
                assert_eq!(error.page, 2);
                assert_eq!(error.detail, "broken content stream");
            }
            other => panic!("unexpected response: {other:?}"),
        }
        worker.join().unwrap();
    }
}
