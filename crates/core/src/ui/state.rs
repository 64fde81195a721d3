//! UI state types and event definitions.

use crate::layout::RawDetection;

/// Current state of the overlay.
///
/// `Waiting` -> `Recognizing` -> `Ready`
///                           \-> `Error` (overlay stays usable, with no blocks)
#[derive(Clone, Debug, PartialEq)]
pub enum UiState {
    /// The image is shown; recognition has not been requested yet.
    Waiting,
    /// The Vision request is in flight.
    Recognizing,
    /// Blocks are available for selection (possibly none).
    Ready,
    /// Recognition failed.
    Error(String),
}

/// Result of a background recognition task.
///
/// Tagged with the session generation it was requested for.
pub(crate) struct RecognitionEvent {
    pub generation: u64,
    pub outcome: Result<Vec<RawDetection>, String>,
}
