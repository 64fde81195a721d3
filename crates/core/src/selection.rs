//! Touch-driven selection over a sequence of text blocks.
//!
//! [`SelectionEngine`] tracks a contiguous span of block indices. A tap
//! selects one block; a drag reports pointer samples which grow or shrink
//! the span according to the nearest-endpoint rule in
//! [`SelectionEngine::extend_drag`].
//!
//! The engine owns the block sequence it indexes into. Replacing the blocks
//! always clears the selection, so indices never outlive the list they were
//! taken from.

use crate::geometry::{HitTest, Point};
use crate::layout::TextBlock;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::trace;

/// Default length of the tap feedback pulse.
pub const DEFAULT_PULSE: Duration = Duration::from_millis(50);

/// Fire-and-forget tactile (or visual) feedback for discrete taps.
pub trait Haptics {
    fn pulse(&mut self, duration: Duration);
}

/// Feedback sink that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn pulse(&mut self, _duration: Duration) {}
}

/// Anchor and focus of a selection; either may be the larger index while a
/// drag is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub anchor: usize,
    pub focus: usize,
}

impl SelectionRange {
    pub fn single(index: usize) -> Self {
        Self {
            anchor: index,
            focus: index,
        }
    }

    pub fn min(&self) -> usize {
        self.anchor.min(self.focus)
    }

    pub fn max(&self) -> usize {
        self.anchor.max(self.focus)
    }

    pub fn span(&self) -> RangeInclusive<usize> {
        self.min()..=self.max()
    }

    fn set_min(&mut self, index: usize) {
        if self.anchor <= self.focus {
            self.anchor = index;
        } else {
            self.focus = index;
        }
    }

    fn set_max(&mut self, index: usize) {
        if self.anchor <= self.focus {
            self.focus = index;
        } else {
            self.anchor = index;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Tap,
    Drag,
}

/// Selection state machine for one displayed image.
#[derive(Debug)]
pub struct SelectionEngine<H = NoHaptics> {
    blocks: Vec<TextBlock>,
    range: Option<SelectionRange>,
    origin: Origin,
    haptics: H,
    pulse: Duration,
}

impl SelectionEngine<NoHaptics> {
    pub fn new(blocks: Vec<TextBlock>) -> Self {
        Self::with_haptics(blocks, NoHaptics)
    }
}

impl<H: Haptics> SelectionEngine<H> {
    pub fn with_haptics(blocks: Vec<TextBlock>, haptics: H) -> Self {
        Self {
            blocks,
            range: None,
            origin: Origin::Drag,
            haptics,
            pulse: DEFAULT_PULSE,
        }
    }

    /// Sets the tap pulse length.
    pub fn with_pulse(mut self, pulse: Duration) -> Self {
        self.pulse = pulse;
        self
    }

    pub fn blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    pub fn haptics(&self) -> &H {
        &self.haptics
    }

    pub fn haptics_mut(&mut self) -> &mut H {
        &mut self.haptics
    }

    /// Swaps in the blocks of a new image and clears the selection.
    pub fn replace_blocks(&mut self, blocks: Vec<TextBlock>) {
        self.blocks = blocks;
        self.reset();
    }

    /// Current range, `None` when nothing is selected.
    pub fn range(&self) -> Option<SelectionRange> {
        self.range
    }

    /// Materialized `min..=max` span of the selection.
    pub fn span(&self) -> Option<RangeInclusive<usize>> {
        self.range.map(|range| range.span())
    }

    /// Selects exactly one block from a discrete tap.
    ///
    /// # Panics
    /// If `index` is not a valid block index.
    pub fn select_single(&mut self, index: usize) {
        self.check_index(index);
        self.range = Some(SelectionRange::single(index));
        self.origin = Origin::Tap;
        self.haptics.pulse(self.pulse);
    }

    /// Starts a drag gesture. The current range is kept so a drag can extend
    /// an earlier tap.
    pub fn begin_drag(&mut self) {
        self.origin = Origin::Drag;
    }

    /// Feeds one pointer sample of a drag.
    ///
    /// The first block whose hit region contains `point` updates the range:
    /// - with no range, it becomes a single-block range;
    /// - strictly inside the range, the nearer endpoint moves to it (ties
    ///   move the max);
    /// - below the min or above the max, that endpoint moves to it.
    ///
    /// Samples that hit no block leave the range unchanged. Returns whether
    /// the range changed.
    pub fn extend_drag(&mut self, point: Point, hits: &impl HitTest) -> bool {
        self.origin = Origin::Drag;
        let Some(index) = (0..self.blocks.len()).find(|&i| hits.hit(i, point)) else {
            return false;
        };

        let before = self.range;
        let range = self.range.get_or_insert(SelectionRange::single(index));
        let (min, max) = (range.min(), range.max());
        if index > min && index < max {
            if min.abs_diff(index) < max.abs_diff(index) {
                range.set_min(index);
            } else {
                range.set_max(index);
            }
        } else if index < min {
            range.set_min(index);
        } else if index > max {
            range.set_max(index);
        }

        let changed = self.range != before;
        if changed {
            trace!(index, range = ?self.range, "Drag moved selection");
        }
        changed
    }

    /// Ends a drag gesture. The range persists until [`reset`](Self::reset).
    pub fn end_drag(&mut self) {}

    /// Clears the selection.
    pub fn reset(&mut self) {
        self.range = None;
        self.origin = Origin::Drag;
    }

    /// Text of the selection, or `None` when nothing is selected.
    ///
    /// A tapped block yields its own text; a range yields the texts from
    /// min to max joined by single spaces.
    pub fn materialize(&self) -> Option<String> {
        let range = self.range?;
        if self.origin == Origin::Tap && range.anchor == range.focus {
            return Some(self.blocks[range.anchor].text.clone());
        }
        let texts: Vec<&str> = self.blocks[range.span()]
            .iter()
            .map(|block| block.text.as_str())
            .collect();
        Some(texts.join(" "))
    }

    /// # Panics
    /// If `index` is not a valid block index.
    pub fn is_selected(&self, index: usize) -> bool {
        self.check_index(index);
        self.range
            .is_some_and(|range| range.span().contains(&index))
    }

    /// # Panics
    /// If `index` is not a valid block index.
    pub fn is_range_start(&self, index: usize) -> bool {
        self.check_index(index);
        self.range.is_some_and(|range| range.min() == index)
    }

    /// # Panics
    /// If `index` is not a valid block index.
    pub fn is_range_end(&self, index: usize) -> bool {
        self.check_index(index);
        self.range.is_some_and(|range| range.max() == index)
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.blocks.len(),
            "block index {index} out of bounds for {} blocks",
            self.blocks.len()
        );
    }
}
