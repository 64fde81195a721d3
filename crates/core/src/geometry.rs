//! Rectangle and hit-testing utilities shared by layout and selection.
//!
//! All values are in overlay (logical) coordinates: raw image pixels divided
//! by the pixel density.

use crate::layout::TextBlock;
use serde::{Deserialize, Serialize};

/// A point in overlay coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle described by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Returns a copy shifted by `(dx, dy)`.
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            ..*self
        }
    }

    /// Edge-inclusive containment test.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }
}

/// A rectangle rotated about its centre, the way the overlay renders a block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotatedRect {
    pub rect: Rect,
    pub rotation_degrees: f32,
}

impl RotatedRect {
    pub fn new(rect: Rect, rotation_degrees: f32) -> Self {
        Self {
            rect,
            rotation_degrees,
        }
    }

    /// Tests containment by rotating the point back into the rect's frame.
    pub fn contains(&self, point: Point) -> bool {
        if self.rotation_degrees == 0.0 {
            return self.rect.contains(point);
        }
        let local = rotate_about(point, self.rect.center(), -self.rotation_degrees);
        self.rect.contains(local)
    }

    /// Rotated corners, clockwise from the (unrotated) top-left.
    pub fn corners(&self) -> [Point; 4] {
        let r = self.rect;
        let center = r.center();
        [
            Point::new(r.left, r.top),
            Point::new(r.right(), r.top),
            Point::new(r.right(), r.bottom()),
            Point::new(r.left, r.bottom()),
        ]
        .map(|corner| rotate_about(corner, center, self.rotation_degrees))
    }
}

fn rotate_about(point: Point, center: Point, degrees: f32) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

/// Answers "does this screen point fall inside block `index`".
///
/// The host owns the rendered geometry; the selection engine only asks.
pub trait HitTest {
    fn hit(&self, index: usize, point: Point) -> bool;
}

impl<F> HitTest for F
where
    F: Fn(usize, Point) -> bool,
{
    fn hit(&self, index: usize, point: Point) -> bool {
        self(index, point)
    }
}

/// Rendered bounds of every block, in screen coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitRegions {
    bounds: Vec<RotatedRect>,
}

impl HitRegions {
    /// Bounds of `blocks` drawn with their overlay origin at `origin`.
    pub fn from_blocks(blocks: &[TextBlock], origin: Point) -> Self {
        let bounds = blocks
            .iter()
            .map(|block| {
                let mut bounds = block.bounds();
                bounds.rect = bounds.rect.translate(origin.x, origin.y);
                bounds
            })
            .collect();
        Self { bounds }
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<RotatedRect> {
        self.bounds.get(index).copied()
    }

    /// Index of the first region containing `point`.
    pub fn first_hit(&self, point: Point) -> Option<usize> {
        self.bounds.iter().position(|bounds| bounds.contains(point))
    }
}

impl HitTest for HitRegions {
    fn hit(&self, index: usize, point: Point) -> bool {
        self.bounds
            .get(index)
            .is_some_and(|bounds| bounds.contains(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_edge_inclusive() {
        let rect = Rect::new(10.0, 10.0, 20.0, 5.0);
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(rect.contains(Point::new(30.0, 15.0)));
        assert!(!rect.contains(Point::new(30.1, 15.0)));
        assert!(!rect.contains(Point::new(9.9, 12.0)));
    }

    #[test]
    fn rotated_rect_follows_rotation() {
        // A 100x10 bar centred at (50, 5), rotated to vertical.
        let bar = RotatedRect::new(Rect::new(0.0, 0.0, 100.0, 10.0), 90.0);
        assert!(bar.contains(Point::new(50.0, 50.0)));
        assert!(bar.contains(Point::new(50.0, -40.0)));
        assert!(!bar.contains(Point::new(95.0, 5.0)));
    }

    #[test]
    fn corners_without_rotation_match_rect() {
        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        let corners = RotatedRect::new(rect, 0.0).corners();
        assert_eq!(corners[0], Point::new(1.0, 2.0));
        assert_eq!(corners[2], Point::new(4.0, 6.0));
    }

    #[test]
    fn closures_are_hit_tests() {
        let only_two = |index: usize, _point: Point| index == 2;
        assert!(only_two.hit(2, Point::default()));
        assert!(!only_two.hit(1, Point::default()));
    }

    #[test]
    fn hit_regions_apply_origin() {
        let blocks = vec![
            TextBlock {
                text: "hi".into(),
                top: 0.0,
                left: 0.0,
                width: 10.0,
                height: 10.0,
                rotation_degrees: 0.0,
            },
            TextBlock {
                text: "there".into(),
                top: 0.0,
                left: 20.0,
                width: 10.0,
                height: 10.0,
                rotation_degrees: 0.0,
            },
        ];
        let regions = HitRegions::from_blocks(&blocks, Point::new(100.0, 100.0));
        assert!(regions.hit(0, Point::new(105.0, 105.0)));
        assert!(!regions.hit(0, Point::new(5.0, 5.0)));
        assert!(!regions.hit(2, Point::new(105.0, 105.0)));
        assert_eq!(regions.first_hit(Point::new(125.0, 101.0)), Some(1));
        assert_eq!(regions.first_hit(Point::new(115.0, 101.0)), None);
    }
}
