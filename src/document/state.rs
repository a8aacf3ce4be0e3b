//! Document session state management

use serde::Serialize;

use super::types::DEFAULT_PROGRESS_EVERY;

/// Lifecycle of the single loaded document
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DocumentSessionState {
    #[default]
    Empty,
    Loading,
    RenderingPages { current: usize, total: usize },
    Ready { page_count: usize },
    Failed { reason: String },
}

impl DocumentSessionState {
    /// A load or render sweep is in flight
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Loading | Self::RenderingPages { .. })
    }
}

/// Session state plus sweep bookkeeping, driven by [`Command`]s
#[derive(Clone, Debug)]
pub struct SessionMachine {
    state: DocumentSessionState,

    /// Pages whose render attempt has completed in the current sweep
    settled: usize,

    /// Publish progress every N settled pages
    progress_every: usize,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_EVERY)
    }
}

impl SessionMachine {
    #[must_use]
    pub fn new(progress_every: usize) -> Self {
        Self {
            state: DocumentSessionState::Empty,
            settled: 0,
            progress_every: progress_every.max(1),
        }
    }

    #[must_use]
    pub fn state(&self) -> &DocumentSessionState {
        &self.state
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::BeginLoad => {
                self.settled = 0;
                self.transition(DocumentSessionState::Loading, vec![Effect::DiscardDocument])
            }

            Command::Opened { page_count } => {
                if self.state != DocumentSessionState::Loading {
                    return vec![];
                }
                let mut effects = self.transition(
                    DocumentSessionState::RenderingPages {
                        current: 0,
                        total: page_count,
                    },
                    vec![],
                );
                if page_count == 0 {
                    effects.extend(
                        self.transition(DocumentSessionState::Ready { page_count: 0 }, vec![]),
                    );
                } else {
                    effects.push(Effect::RenderPage(1));
                }
                effects
            }

            Command::OpenFailed { reason } => {
                if self.state != DocumentSessionState::Loading {
                    return vec![];
                }
                self.transition(
                    DocumentSessionState::Failed { reason },
                    vec![Effect::DiscardDocument],
                )
            }

            Command::PageSettled { page } => {
                let DocumentSessionState::RenderingPages { total, .. } = self.state else {
                    return vec![];
                };
                if page != self.settled + 1 {
                    return vec![];
                }
                self.settled = page;

                let mut effects = vec![];
                if page % self.progress_every == 0 || page == total {
                    effects.extend(self.transition(
                        DocumentSessionState::RenderingPages {
                            current: page,
                            total,
                        },
                        vec![],
                    ));
                }
                if page < total {
                    effects.push(Effect::RenderPage(page + 1));
                } else {
                    effects.extend(
                        self.transition(DocumentSessionState::Ready { page_count: total }, vec![]),
                    );
                }
                effects
            }

            Command::Clear => {
                if self.state == DocumentSessionState::Empty {
                    return vec![];
                }
                self.settled = 0;
                self.transition(DocumentSessionState::Empty, vec![Effect::DiscardDocument])
            }
        }
    }

    fn transition(&mut self, next: DocumentSessionState, mut effects: Vec<Effect>) -> Vec<Effect> {
        self.state = next.clone();
        effects.push(Effect::Publish(next));
        effects
    }
}

/// Commands that modify session state
#[derive(Clone, Debug)]
pub enum Command {
    /// A new load was accepted
    BeginLoad,
    /// The worker decoded the document
    Opened { page_count: usize },
    /// The worker could not decode the document
    OpenFailed { reason: String },
    /// A page's render attempt completed, successfully or not
    PageSettled { page: usize },
    /// Drop the document
    Clear,
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Invalidate the current handle and all page surfaces
    DiscardDocument,
    /// Request a page (1-indexed) from the worker
    RenderPage(usize),
    /// Announce the new state to listeners
    Publish(DocumentSessionState),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published(effects: &[Effect]) -> Vec<DocumentSessionState> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Publish(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn begin_load_discards_and_publishes_loading() {
        let mut machine = SessionMachine::default();
        let effects = machine.apply(Command::BeginLoad);
        assert_eq!(
            effects,
            vec![
                Effect::DiscardDocument,
                Effect::Publish(DocumentSessionState::Loading)
            ]
        );
        assert!(machine.state().is_busy());
    }

    #[test]
    fn opened_requests_first_page() {
        let mut machine = SessionMachine::default();
        let _ = machine.apply(Command::BeginLoad);
        let effects = machine.apply(Command::Opened { page_count: 3 });
        assert_eq!(
            effects,
            vec![
                Effect::Publish(DocumentSessionState::RenderingPages {
                    current: 0,
                    total: 3
                }),
                Effect::RenderPage(1)
            ]
        );
    }

    #[test]
    fn three_page_sweep_publishes_only_last_progress() {
        let mut machine = SessionMachine::default();
        let mut states = published(&machine.apply(Command::BeginLoad));
        states.extend(published(&machine.apply(Command::Opened { page_count: 3 })));
        for page in 1..=3 {
            states.extend(published(&machine.apply(Command::PageSettled { page })));
        }
        assert_eq!(
            states,
            vec![
                DocumentSessionState::Loading,
                DocumentSessionState::RenderingPages {
                    current: 0,
                    total: 3
                },
                DocumentSessionState::RenderingPages {
                    current: 3,
                    total: 3
                },
                DocumentSessionState::Ready { page_count: 3 },
            ]
        );
    }

    #[test]
    fn progress_cadence_every_fifth_page() {
        let mut machine = SessionMachine::new(5);
        let _ = machine.apply(Command::BeginLoad);
        let _ = machine.apply(Command::Opened { page_count: 12 });
        let mut reported = vec![];
        for page in 1..=12 {
            for state in published(&machine.apply(Command::PageSettled { page })) {
                if let DocumentSessionState::RenderingPages { current, .. } = state {
                    reported.push(current);
                }
            }
        }
        assert_eq!(reported, vec![5, 10, 12]);
        assert_eq!(
            machine.state(),
            &DocumentSessionState::Ready { page_count: 12 }
        );
    }

    #[test]
    fn zero_page_document_is_ready_immediately() {
        let mut machine = SessionMachine::default();
        let _ = machine.apply(Command::BeginLoad);
        let effects = machine.apply(Command::Opened { page_count: 0 });
        assert!(!effects.iter().any(|e| matches!(e, Effect::RenderPage(_))));
        assert_eq!(machine.state(), &DocumentSessionState::Ready { page_count: 0 });
    }

    #[test]
    fn out_of_order_page_is_ignored() {
        let mut machine = SessionMachine::default();
        let _ = machine.apply(Command::BeginLoad);
        let _ = machine.apply(Command::Opened { page_count: 3 });
        assert!(machine.apply(Command::PageSettled { page: 2 }).is_empty());
    }

    #[test]
    fn clear_twice_settles_to_empty() {
        let mut machine = SessionMachine::default();
        let _ = machine.apply(Command::BeginLoad);
        let first = machine.apply(Command::Clear);
        assert_eq!(
            first,
            vec![
                Effect::DiscardDocument,
                Effect::Publish(DocumentSessionState::Empty)
            ]
        );
        assert!(machine.apply(Command::Clear).is_empty());
        assert_eq!(machine.state(), &DocumentSessionState::Empty);
    }

    #[test]
    fn open_failure_after_clear_is_ignored() {
        let mut machine = SessionMachine::default();
        let _ = machine.apply(Command::BeginLoad);
        let _ = machine.apply(Command::Clear);
        let effects = machine.apply(Command::OpenFailed {
            reason: "late".into(),
        });
        assert!(effects.is_empty());
        assert_eq!(machine.state(), &DocumentSessionState::Empty);
    }
}
