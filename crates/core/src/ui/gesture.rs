//! Pointer gesture classification.
//!
//! Converts egui interaction responses into the gestures the selection
//! engine understands.

use crate::geometry::Point;
use eframe::egui;

/// A pointer gesture on the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// A press and release without movement.
    Tap(Point),
    /// A drag began at the given position.
    DragStarted(Point),
    /// The pointer moved while dragging.
    DragMoved(Point),
    /// The drag was released.
    DragEnded,
    /// Nothing happened this frame.
    None,
}

/// Interaction flags sampled from one frame's response.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerFrame {
    pub clicked: bool,
    pub drag_started: bool,
    pub dragged: bool,
    pub drag_stopped: bool,
    pub position: Option<Point>,
}

impl PointerFrame {
    pub fn from_response(response: &egui::Response) -> Self {
        Self {
            clicked: response.clicked(),
            drag_started: response.drag_started(),
            dragged: response.dragged(),
            drag_stopped: response.drag_stopped(),
            position: response.interact_pointer_pos().map(to_point),
        }
    }
}

/// Classifies one frame. Drag start wins over movement in the same frame so
/// the first sample still reaches the engine.
pub fn classify(frame: PointerFrame) -> Gesture {
    match frame.position {
        Some(position) if frame.drag_started => Gesture::DragStarted(position),
        Some(position) if frame.dragged => Gesture::DragMoved(position),
        _ if frame.drag_stopped => Gesture::DragEnded,
        Some(position) if frame.clicked => Gesture::Tap(position),
        _ => Gesture::None,
    }
}

pub fn to_point(pos: egui::Pos2) -> Point {
    Point::new(pos.x, pos.y)
}

pub fn to_pos(point: Point) -> egui::Pos2 {
    egui::pos2(point.x, point.y)
}
