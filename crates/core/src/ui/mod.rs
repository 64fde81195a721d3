//! Interactive text overlay.
//!
//! Shows an image with a selectable region over every recognized word,
//! mimicking text selection on a raster image.
//!
//! # Architecture
//!
//! The UI is split into focused submodules:
//! - [`session`]: Per-overlay recognition scheduling
//! - [`state`]: State machine types and event definitions
//! - [`settings`]: User preferences and persistence
//! - [`gesture`]: Pointer gesture classification
//! - [`rendering`]: Drawing utilities for blocks and handles
//! - [`lens_overlay`]: Main application logic
//!
//! # Usage
//!
//! ```ignore
//! use lens_core::{ui, Config};
//!
//! let config = Config::load()?;
//! let image = image::open("receipt.jpg")?;
//!
//! if let Some(text) = ui::run_lens_ui(image, config, None)? {
//!     println!("{text}");
//! }
//! ```

mod gesture;
mod lens_overlay;
mod rendering;
mod settings;
pub mod session;
mod state;

// Public API exports
pub use gesture::{Gesture, PointerFrame, classify};
pub use lens_overlay::{LensOverlay, VisualPulse};
pub use session::RecognitionSession;
pub use settings::Settings;
pub use state::UiState;

use crate::config::Config;
use crate::error::Result;
use crate::layout::RawDetection;
use image::DynamicImage;

/// Launches the overlay and returns the confirmed selection.
///
/// # Arguments
/// * `image` - The image to select text on
/// * `config` - Application configuration with API key and timings
/// * `detections` - Already recognized words, or `None` to call the Vision API
///
/// # Returns
/// - `Ok(Some(text))` - User confirmed a selection
/// - `Ok(None)` - User closed the overlay without confirming
/// - `Err(e)` - An error occurred launching or running the UI
pub fn run_lens_ui(
    image: DynamicImage,
    config: Config,
    detections: Option<Vec<RawDetection>>,
) -> Result<Option<String>> {
    lens_overlay::run(image, config, detections)
}
