//! Drag-to-select on rendered pages

mod controller;
mod transform;

pub use controller::{
    DEFAULT_HIDE_DELAY, Overlay, Point, PointerEvent, SelectionController, SelectionEffect,
    SelectionRect,
};
pub use transform::{SelectionReport, to_native};
