//! Rectangle selection state for one rendered page

use std::time::{Duration, Instant};

/// How long a committed selection stays highlighted
pub const DEFAULT_HIDE_DELAY: Duration = Duration::from_millis(2000);

/// A position relative to the page surface's own top-left corner, in display pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Pointer input delivered to a single page surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    /// Pointer left the page surface
    Leave,
}

/// Committed selection in display-pixel space.
///
/// Always normalized: `x1 <= x2` and `y1 <= y2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionRect {
    /// Page number (1-indexed)
    pub page: usize,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl SelectionRect {
    /// Rectangle spanned by two opposite corners, in any order
    #[must_use]
    pub fn from_corners(page: usize, a: Point, b: Point) -> Self {
        Self {
            page,
            x1: a.x.min(b.x),
            y1: a.y.min(b.y),
            x2: a.x.max(b.x),
            y2: a.y.max(b.y),
        }
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    #[must_use]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }
}

/// Visible highlight drawn over the page while selecting
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Overlay {
    pub visible: bool,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Overlay {
    fn spanning(a: Point, b: Point) -> Self {
        Self {
            visible: true,
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }
}

/// Observable results of feeding an event to the controller
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionEffect {
    /// Page became the active page
    Activated,
    /// Page is no longer highlighted as active
    Deactivated,
    OverlayChanged(Overlay),
    OverlayHidden,
    /// Gesture finished with a selection
    Committed(SelectionRect),
    /// Gesture abandoned without a selection
    Cancelled,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Gesture {
    #[default]
    Idle,
    Dragging {
        anchor: Point,
    },
}

/// Per-page drag-to-select state machine.
///
/// `Idle -> Dragging` on pointer down, back to `Idle` on pointer up (commits a
/// [`SelectionRect`]) or when the pointer leaves the surface (cancels).
#[derive(Clone, Debug)]
pub struct SelectionController {
    page: usize,
    gesture: Gesture,
    overlay: Overlay,
    active: bool,
    /// Pending delayed hide after a commit
    hide_at: Option<Instant>,
    hide_delay: Duration,
}

impl SelectionController {
    #[must_use]
    pub fn new(page: usize) -> Self {
        Self {
            page,
            gesture: Gesture::Idle,
            overlay: Overlay::default(),
            active: false,
            hide_at: None,
            hide_delay: DEFAULT_HIDE_DELAY,
        }
    }

    #[must_use]
    pub fn with_hide_delay(mut self, delay: Duration) -> Self {
        self.hide_delay = delay;
        self
    }

    /// Feed one pointer event
    pub fn handle(&mut self, event: PointerEvent, now: Instant) -> Vec<SelectionEffect> {
        match (self.gesture, event) {
            (_, PointerEvent::Down(point)) => {
                // A fresh gesture reuses the overlay and drops any pending hide
                self.gesture = Gesture::Dragging { anchor: point };
                self.hide_at = None;
                self.overlay = Overlay::spanning(point, point);

                let mut effects = vec![];
                if !self.active {
                    self.active = true;
                    effects.push(SelectionEffect::Activated);
                }
                effects.push(SelectionEffect::OverlayChanged(self.overlay));
                effects
            }

            (Gesture::Dragging { anchor }, PointerEvent::Move(point)) => {
                self.overlay = Overlay::spanning(anchor, point);
                vec![SelectionEffect::OverlayChanged(self.overlay)]
            }

            (Gesture::Dragging { anchor }, PointerEvent::Up(point)) => {
                self.gesture = Gesture::Idle;
                self.overlay = Overlay::spanning(anchor, point);
                self.hide_at = Some(now + self.hide_delay);
                vec![
                    SelectionEffect::OverlayChanged(self.overlay),
                    SelectionEffect::Committed(SelectionRect::from_corners(
                        self.page, anchor, point,
                    )),
                ]
            }

            (Gesture::Dragging { .. }, PointerEvent::Leave) => {
                self.gesture = Gesture::Idle;
                self.hide_at = None;
                let mut effects = self.hide();
                effects.push(SelectionEffect::Cancelled);
                effects
            }

            (Gesture::Idle, _) => vec![],
        }
    }

    /// Fire the delayed hide once its deadline has passed
    pub fn tick(&mut self, now: Instant) -> Vec<SelectionEffect> {
        match self.hide_at {
            Some(deadline) if now >= deadline => {
                self.hide_at = None;
                self.hide()
            }
            _ => vec![],
        }
    }

    /// Drop the active highlight without touching the overlay
    pub fn deactivate(&mut self) -> Vec<SelectionEffect> {
        if self.active {
            self.active = false;
            vec![SelectionEffect::Deactivated]
        } else {
            vec![]
        }
    }

    fn hide(&mut self) -> Vec<SelectionEffect> {
        let mut effects = vec![];
        if self.overlay.visible {
            self.overlay.visible = false;
            effects.push(SelectionEffect::OverlayHidden);
        }
        effects.extend(self.deactivate());
        effects
    }

    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn overlay(&self) -> Overlay {
        self.overlay
    }

    /// When the committed selection will be hidden, if scheduled
    #[must_use]
    pub fn hide_deadline(&self) -> Option<Instant> {
        self.hide_at
    }
}
