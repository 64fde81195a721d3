//! Layout projection of OCR detections into overlay rectangles.
//!
//! The recognizer returns quadrilaterals in source-image pixels. [`project`]
//! turns each one into a [`TextBlock`]: an axis-aligned rectangle in
//! logical display units plus the skew of its top edge.
//!
//! # Bounding edges
//!
//! The x and y values of the four vertices are sorted independently and the
//! two smallest (and two largest) are averaged. For a slightly skewed word
//! this yields edges through the middle of the skew instead of the outer
//! envelope, so the rotated rectangle drawn on top lines up with the glyphs.

use crate::geometry::{Rect, RotatedRect};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// A polygon vertex in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
}

impl Vertex {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One OCR hit as delivered by the recognition adapter.
///
/// Vertex order is significant: the first two vertices define the top edge
/// used for rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub text: String,
    pub vertices: Vec<Vertex>,
}

/// A projected text block in overlay coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    pub text: String,
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
    pub rotation_degrees: f32,
}

impl TextBlock {
    /// Unrotated bounds of the block.
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }

    /// Bounds as rendered, rotated about the block centre.
    pub fn bounds(&self) -> RotatedRect {
        RotatedRect::new(self.rect(), self.rotation_degrees)
    }
}

/// Projects detections into text blocks, preserving input order.
///
/// Detections without exactly four vertices are dropped. A non-finite or
/// non-positive `pixel_density` is treated as `1.0`.
#[instrument(level = "debug", skip(detections), fields(count = detections.len()))]
pub fn project(detections: &[RawDetection], pixel_density: f32) -> Vec<TextBlock> {
    let density = if pixel_density.is_finite() && pixel_density > 0.0 {
        pixel_density
    } else {
        warn!(pixel_density, "Invalid pixel density, projecting at 1.0");
        1.0
    };

    detections
        .iter()
        .enumerate()
        .filter_map(|(index, detection)| {
            let block = project_one(detection, density);
            if block.is_none() {
                debug!(
                    index,
                    vertices = detection.vertices.len(),
                    "Dropping detection without four vertices"
                );
            }
            block
        })
        .collect()
}

/// Projects a single detection, or `None` if it is not a quadrilateral.
pub fn project_one(detection: &RawDetection, density: f32) -> Option<TextBlock> {
    let vertices: [Vertex; 4] = detection.vertices.as_slice().try_into().ok()?;

    let mut xs = vertices.map(|v| v.x);
    let mut ys = vertices.map(|v| v.y);
    xs.sort_by(f32::total_cmp);
    ys.sort_by(f32::total_cmp);

    let min_x = (xs[0] + xs[1]) / 2.0;
    let max_x = (xs[2] + xs[3]) / 2.0;
    let min_y = (ys[0] + ys[1]) / 2.0;
    let max_y = (ys[2] + ys[3]) / 2.0;

    let left = finite_or_zero(round_half_up(min_x / density));
    let top = finite_or_zero(round_half_up(min_y / density));
    let width = non_negative(((max_x - min_x) / density).abs());
    let height = non_negative(((max_y - min_y) / density).abs());

    let [first, second, ..] = vertices;
    let angle = (second.y - first.y).atan2(second.x - first.x);
    let rotation = finite_or_zero(round_half_up(angle.to_degrees()));

    Some(TextBlock {
        text: detection.text.clone(),
        top,
        left,
        width,
        height,
        // Portrait blocks are near-vertical glyph runs; rotating them flips the box.
        rotation_degrees: if height > width { 0.0 } else { rotation },
    })
}

// Half-up rounding, so -2.5 rounds to -2 rather than away from zero.
fn round_half_up(value: f32) -> f32 {
    (value + 0.5).floor()
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}

fn non_negative(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn detection(text: &str, points: &[(f32, f32)]) -> RawDetection {
        RawDetection {
            text: text.to_string(),
            vertices: points.iter().map(|&(x, y)| Vertex::new(x, y)).collect(),
        }
    }

    #[test]
    fn axis_aligned_rectangle_at_double_density() {
        let input = [detection(
            "hello",
            &[(0.0, 0.0), (100.0, 0.0), (100.0, 50.0), (0.0, 50.0)],
        )];
        let blocks = project(&input, 2.0);
        assert_eq!(
            blocks,
            vec![TextBlock {
                text: "hello".into(),
                top: 0.0,
                left: 0.0,
                width: 50.0,
                height: 25.0,
                rotation_degrees: 0.0,
            }]
        );
    }

    #[test]
    fn skewed_landscape_block_keeps_rotation() {
        // Top edge rises 10px over 100px: atan2(10, 100) ~ 5.71 degrees.
        let input = [detection(
            "tilted",
            &[(0.0, 0.0), (100.0, 10.0), (98.0, 40.0), (-2.0, 30.0)],
        )];
        let block = &project(&input, 1.0)[0];
        assert_eq!(block.rotation_degrees, 6.0);
        assert!(block.width > block.height);
    }

    #[test]
    fn portrait_block_is_never_rotated() {
        let input = [detection(
            "tall",
            &[(0.0, 0.0), (20.0, 5.0), (15.0, 100.0), (-5.0, 95.0)],
        )];
        let block = &project(&input, 1.0)[0];
        assert!(block.height > block.width);
        assert_eq!(block.rotation_degrees, 0.0);
    }

    #[test]
    fn averages_inner_edges() {
        let input = [detection(
            "w",
            &[(10.0, 20.0), (110.0, 24.0), (108.0, 64.0), (8.0, 60.0)],
        )];
        let block = &project(&input, 1.0)[0];
        // xs = [8, 10, 108, 110] -> 9..109, ys = [20, 24, 60, 64] -> 22..62
        assert_eq!(block.left, 9.0);
        assert_eq!(block.top, 22.0);
        assert_eq!(block.width, 100.0);
        assert_eq!(block.height, 40.0);
    }

    #[test]
    fn drops_detections_without_four_vertices() {
        let input = [
            detection("a", &[(0.0, 0.0), (10.0, 0.0), (10.0, 5.0), (0.0, 5.0)]),
            detection("broken", &[(0.0, 0.0), (10.0, 0.0), (10.0, 5.0)]),
            detection("b", &[(20.0, 0.0), (30.0, 0.0), (30.0, 5.0), (20.0, 5.0)]),
            detection("pentagon", &[(0.0, 0.0); 5]),
        ];
        let texts: Vec<_> = project(&input, 1.0).into_iter().map(|b| b.text).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn nan_vertices_clamp_to_zero() {
        let input = [detection(
            "nan",
            &[(f32::NAN, 0.0), (10.0, 0.0), (10.0, f32::NAN), (0.0, 5.0)],
        )];
        let block = &project(&input, 1.0)[0];
        for value in [block.top, block.left, block.width, block.height, block.rotation_degrees] {
            assert!(value.is_finite());
        }
        assert!(block.width >= 0.0 && block.height >= 0.0);
    }

    #[test]
    fn invalid_density_falls_back_to_one() {
        let input = [detection(
            "x",
            &[(0.0, 0.0), (40.0, 0.0), (40.0, 20.0), (0.0, 20.0)],
        )];
        for density in [0.0, -3.0, f32::NAN, f32::INFINITY] {
            assert_eq!(project(&input, density)[0].width, 40.0);
        }
    }

    #[test]
    fn empty_input_projects_nothing() {
        assert!(project(&[], 2.0).is_empty());
    }

    fn any_detection() -> impl Strategy<Value = RawDetection> {
        (
            "[a-z]{1,8}",
            prop::collection::vec((-500.0f32..5000.0, -500.0f32..5000.0), 0..6),
        )
            .prop_map(|(text, points)| RawDetection {
                text,
                vertices: points.into_iter().map(|(x, y)| Vertex::new(x, y)).collect(),
            })
    }

    proptest! {
        #[test]
        fn projection_invariants(
            detections in prop::collection::vec(any_detection(), 0..12),
            density in 0.5f32..4.0,
        ) {
            let blocks = project(&detections, density);
            let valid: Vec<_> = detections
                .iter()
                .filter(|d| d.vertices.len() == 4)
                .map(|d| d.text.clone())
                .collect();

            prop_assert_eq!(blocks.len(), valid.len());
            for (block, text) in blocks.iter().zip(&valid) {
                prop_assert_eq!(&block.text, text);
                prop_assert!(block.width >= 0.0);
                prop_assert!(block.height >= 0.0);
                if block.height > block.width {
                    prop_assert_eq!(block.rotation_degrees, 0.0);
                }
            }
        }
    }
}
