//! Lens Core Library
//!
//! Overlays machine-recognized text on a still image and lets a user select
//! recognized words by tap or drag, like selecting text in a document.
//!
//! # Overview
//!
//! - **Recognition**: Google Cloud Vision text detection via [`vision`]
//! - **Layout**: Projection of recognized polygons into rotated overlay
//!   rectangles via [`layout`]
//! - **Selection**: The tap/drag selection state machine in [`selection`]
//! - **User Interface**: The interactive overlay in [`ui`]
//!
//! # Quick Start
//!
//! ```ignore
//! use lens_core::Lens;
//!
//! let lens = Lens::new()?;
//! let image = image::open("sign.png")?;
//! if let Some(text) = lens.run_interactive(image)? {
//!     println!("{text}");
//! }
//! ```
//!
//! The engine can also be driven headless:
//!
//! ```
//! use lens_core::{project, RawDetection, SelectionEngine, Vertex};
//!
//! let detections = vec![RawDetection {
//!     text: "hello".into(),
//!     vertices: vec![
//!         Vertex::new(0.0, 0.0),
//!         Vertex::new(100.0, 0.0),
//!         Vertex::new(100.0, 50.0),
//!         Vertex::new(0.0, 50.0),
//!     ],
//! }];
//! let mut engine = SelectionEngine::new(project(&detections, 2.0));
//! engine.select_single(0);
//! assert_eq!(engine.materialize().as_deref(), Some("hello"));
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod image_processing;
pub mod layout;
pub mod selection;
pub mod ui;
pub mod vision;

// Re-export primary types for convenience
pub use config::Config;
pub use error::{AppError, Result};
pub use geometry::{HitRegions, HitTest, Point, Rect, RotatedRect};
pub use layout::{RawDetection, TextBlock, Vertex, project};
pub use selection::{Haptics, NoHaptics, SelectionEngine, SelectionRange};
pub use vision::{AnnotateResponse, VisionClient};

use image::DynamicImage;
use image_processing::ImageProcessor;
use tracing::info;

/// Encodes `image` and sends it for text detection.
///
/// # Errors
///
/// Returns an error if no API key is configured, encoding fails, or the
/// Vision API call fails.
pub async fn annotate(image: &DynamicImage, config: &Config) -> Result<AnnotateResponse> {
    let client = VisionClient::new(config)?;
    let content = ImageProcessor::encode_to_base64_png(image)?;
    client.annotate(content).await
}

/// Recognizes `image` and returns per-word detections in image pixels.
///
/// # Errors
///
/// Same as [`annotate`], plus an error the service reported for the image.
pub async fn recognize(image: &DynamicImage, config: &Config) -> Result<Vec<RawDetection>> {
    let detections = annotate(image, config).await?.detections()?;
    info!(
        width = image.width(),
        height = image.height(),
        detections = detections.len(),
        "Recognized image"
    );
    Ok(detections)
}

/// Main entry point for the lens application.
///
/// A facade over recognition, projection and the overlay UI.
pub struct Lens {
    config: Config,
}

impl Lens {
    /// Creates an instance with configuration loaded from the environment
    /// (including `.env` files).
    ///
    /// # Errors
    ///
    /// Returns an error if a configured value is invalid.
    pub fn new() -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
        })
    }

    /// Creates an instance with custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Sends `image` for text detection and returns the raw response.
    pub async fn annotate(&self, image: &DynamicImage) -> Result<AnnotateResponse> {
        annotate(image, &self.config).await
    }

    /// Projects the words of a Vision response at `pixel_density`.
    ///
    /// The configured density, when set, takes precedence.
    pub fn blocks_from_response(
        &self,
        response: &AnnotateResponse,
        pixel_density: f32,
    ) -> Result<Vec<TextBlock>> {
        Ok(project(&response.detections()?, self.density(pixel_density)))
    }

    /// Opens the overlay for `image` and returns the confirmed selection.
    pub fn run_interactive(&self, image: DynamicImage) -> Result<Option<String>> {
        ui::run_lens_ui(image, self.config.clone(), None)
    }

    /// Opens the overlay with detections that were recognized earlier.
    pub fn run_interactive_with_detections(
        &self,
        image: DynamicImage,
        detections: Vec<RawDetection>,
    ) -> Result<Option<String>> {
        ui::run_lens_ui(image, self.config.clone(), Some(detections))
    }

    /// Returns a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    fn density(&self, fallback: f32) -> f32 {
        self.config.pixel_density.unwrap_or(fallback)
    }
}
