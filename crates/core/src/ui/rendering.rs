//! Drawing helpers for the text overlay.
//!
//! Blocks are drawn as rotated quads over the image. The ends of the
//! selection get round handles like a native text selection.

use super::gesture::to_pos;
use crate::geometry::{Point, RotatedRect};
use eframe::egui;

/// Fill for blocks that are recognized but not selected.
pub const HIGHLIGHTED: egui::Color32 = egui::Color32::from_rgba_premultiplied(71, 71, 71, 71);
/// Fill for selected blocks.
pub const SELECTED: egui::Color32 = egui::Color32::from_rgba_premultiplied(19, 66, 97, 130);
/// Selection handle colour.
pub const HANDLE: egui::Color32 = egui::Color32::from_rgb(0x0e, 0x51, 0xd5);
/// Dimming applied over the whole image while the overlay is active.
pub const DIM_ALPHA: u8 = 70;

/// Radius of a selection handle.
pub const HANDLE_RADIUS: f32 = 8.0;

/// Dims the whole image.
pub fn draw_dim(painter: &egui::Painter, rect: egui::Rect, alpha: u8) {
    painter.rect_filled(rect, 0.0, egui::Color32::from_black_alpha(alpha));
}

/// Draws one block as a filled, optionally outlined, rotated quad.
pub fn draw_block(
    painter: &egui::Painter,
    bounds: RotatedRect,
    fill: egui::Color32,
    outline: Option<egui::Stroke>,
) {
    let points: Vec<egui::Pos2> = bounds.corners().into_iter().map(to_pos).collect();
    painter.add(egui::Shape::convex_polygon(
        points,
        fill,
        outline.unwrap_or(egui::Stroke::NONE),
    ));
}

/// Which end of the selection a handle marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleEnd {
    Start,
    End,
}

/// Where a handle sits: just outside the top-left corner for the start,
/// the bottom-right corner for the end.
pub fn handle_anchor(bounds: RotatedRect, end: HandleEnd) -> Point {
    let [top_left, _, bottom_right, _] = bounds.corners();
    match end {
        HandleEnd::Start => Point::new(top_left.x - HANDLE_RADIUS, top_left.y - HANDLE_RADIUS),
        HandleEnd::End => Point::new(bottom_right.x + HANDLE_RADIUS, bottom_right.y + HANDLE_RADIUS),
    }
}

/// Draws a selection handle with a stem touching the block corner.
pub fn draw_handle(painter: &egui::Painter, bounds: RotatedRect, end: HandleEnd) {
    let [top_left, _, bottom_right, _] = bounds.corners();
    let corner = match end {
        HandleEnd::Start => top_left,
        HandleEnd::End => bottom_right,
    };
    let center = to_pos(handle_anchor(bounds, end));
    painter.line_segment([to_pos(corner), center], egui::Stroke::new(2.0, HANDLE));
    painter.circle_filled(center, HANDLE_RADIUS, HANDLE);
}

/// Places the toolbar below the selection, or above it when there is not
/// enough space below.
///
/// # Returns
/// A tuple of (x position, y position, pivot alignment)
pub fn calculate_toolbar_position(
    selection_rect: egui::Rect,
    screen_rect: egui::Rect,
    toolbar_width: f32,
    spacing: f32,
    min_space_needed: f32,
) -> (f32, f32, egui::Align2) {
    let max_x = (screen_rect.max.x - toolbar_width - 10.0).max(screen_rect.min.x + 10.0);
    let x = (selection_rect.center().x - toolbar_width / 2.0).clamp(screen_rect.min.x + 10.0, max_x);

    let mut y = selection_rect.max.y + spacing;
    let mut pivot = egui::Align2::LEFT_TOP;

    let space_below = screen_rect.max.y - y;
    if space_below < min_space_needed && selection_rect.min.y - screen_rect.min.y > space_below {
        pivot = egui::Align2::LEFT_BOTTOM;
        y = selection_rect.min.y - spacing;
    }

    (x, y, pivot)
}

/// Axis-aligned envelope of a set of rotated bounds.
pub fn envelope(bounds: impl IntoIterator<Item = RotatedRect>) -> Option<egui::Rect> {
    bounds
        .into_iter()
        .flat_map(|b| b.corners())
        .map(to_pos)
        .fold(None, |acc: Option<egui::Rect>, pos| match acc {
            Some(rect) => Some(rect.union(egui::Rect::from_min_max(pos, pos))),
            None => Some(egui::Rect::from_min_max(pos, pos)),
        })
}
