use crate::error::{AppError, Result};
use crate::selection::DEFAULT_PULSE;
use crate::vision::DEFAULT_ENDPOINT;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Delay between showing an image and sending it for recognition.
pub const DEFAULT_RECOGNITION_DELAY: Duration = Duration::from_millis(200);

#[derive(Clone, Debug)]
pub struct Config {
    pub vision_api_key: Option<String>,
    pub endpoint: String,
    /// Overrides the density derived from the image/view fit.
    pub pixel_density: Option<f32>,
    pub recognition_delay: Duration,
    pub haptic_pulse: Duration,
    pub language_hints: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(key) = lookup("VISION_API_KEY") {
            builder = builder.with_api_key(key);
        }
        if let Some(endpoint) = lookup("VISION_ENDPOINT") {
            builder = builder.with_endpoint(endpoint);
        }
        if let Some(density) = lookup("LENS_PIXEL_DENSITY") {
            let density = density.trim().parse::<f32>().map_err(|_| {
                AppError::config(format!("LENS_PIXEL_DENSITY is not a number: {density}"))
            })?;
            builder = builder.with_pixel_density(density);
        }
        if let Some(ms) = lookup("LENS_RECOGNITION_DELAY_MS") {
            builder = builder.with_recognition_delay(parse_millis("LENS_RECOGNITION_DELAY_MS", &ms)?);
        }
        if let Some(ms) = lookup("LENS_HAPTIC_MS") {
            builder = builder.with_haptic_pulse(parse_millis("LENS_HAPTIC_MS", &ms)?);
        }
        if let Some(hints) = lookup("LENS_LANGUAGE_HINTS") {
            builder = builder.with_language_hints(
                hints
                    .split(',')
                    .map(str::trim)
                    .filter(|hint| !hint.is_empty())
                    .map(String::from),
            );
        }

        builder.build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

fn parse_millis(name: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| AppError::config(format!("{name} must be a whole number of milliseconds: {value}")))
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    api_key: Option<String>,
    endpoint: Option<String>,
    pixel_density: Option<f32>,
    recognition_delay: Option<Duration>,
    haptic_pulse: Option<Duration>,
    language_hints: Vec<String>,
}

impl ConfigBuilder {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_pixel_density(mut self, density: f32) -> Self {
        self.pixel_density = Some(density);
        self
    }

    pub fn with_recognition_delay(mut self, delay: Duration) -> Self {
        self.recognition_delay = Some(delay);
        self
    }

    pub fn with_haptic_pulse(mut self, pulse: Duration) -> Self {
        self.haptic_pulse = Some(pulse);
        self
    }

    pub fn with_language_hints(mut self, hints: impl IntoIterator<Item = String>) -> Self {
        self.language_hints = hints.into_iter().collect();
        self
    }

    pub fn build(self) -> Result<Config> {
        if let Some(density) = self.pixel_density {
            if !(density.is_finite() && density > 0.0) {
                return Err(AppError::config(format!(
                    "Pixel density must be a positive number, got {density}"
                )));
            }
        }

        Ok(Config {
            vision_api_key: self.api_key.filter(|key| !key.trim().is_empty()),
            endpoint: self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            pixel_density: self.pixel_density,
            recognition_delay: self.recognition_delay.unwrap_or(DEFAULT_RECOGNITION_DELAY),
            haptic_pulse: self.haptic_pulse.unwrap_or(DEFAULT_PULSE),
            language_hints: self.language_hints,
        })
    }
}
