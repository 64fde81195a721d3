use anyhow::{Context, Result, bail};
use arboard::Clipboard;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use lens_core::{Lens, vision::AnnotateResponse};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image to select text on
    image: PathBuf,

    /// Use a saved Vision API response instead of calling the API
    #[arg(short, long)]
    response: Option<PathBuf>,

    /// Write the raw Vision API response to this file
    #[arg(long)]
    save_response: Option<PathBuf>,

    /// Override the pixel density (image pixels per display unit)
    #[arg(short, long)]
    density: Option<f32>,

    /// Print the projected text blocks as JSON and exit
    #[arg(long, default_value_t = false)]
    blocks: bool,

    /// Copy the selected text to clipboard automatically
    #[arg(short, long, default_value_t = false)]
    copy: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut lens = Lens::new().context("Failed to load configuration")?;
    if let Some(density) = args.density {
        if !(density.is_finite() && density > 0.0) {
            bail!("--density must be a positive number");
        }
        lens.config_mut().pixel_density = Some(density);
    }

    let image = image::open(&args.image)
        .with_context(|| format!("Failed to open image {}", args.image.display()))?;
    debug!(width = image.width(), height = image.height(), "Loaded image");

    // Offline responses, --blocks and --save-response all need the
    // response up front; otherwise the overlay recognizes on its own.
    let needs_response = args.response.is_some() || args.blocks || args.save_response.is_some();
    if !needs_response {
        return finish(lens.run_interactive(image)?, args.copy);
    }

    let response = match &args.response {
        Some(path) => {
            let body = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            AnnotateResponse::from_json(&body).context("Invalid Vision API response")?
        }
        None => annotate(&lens, &image, args.save_response.as_ref()).await?,
    };

    if args.blocks {
        let blocks = lens
            .blocks_from_response(&response, 1.0)
            .context("Vision API reported an error")?;
        println!("{}", serde_json::to_string_pretty(&blocks)?);
        return Ok(());
    }

    let detections = response
        .detections()
        .context("Vision API reported an error")?;
    finish(lens.run_interactive_with_detections(image, detections)?, args.copy)
}

/// Prints the confirmed selection and optionally copies it.
fn finish(selection: Option<String>, copy: bool) -> Result<()> {
    let Some(text) = selection else {
        eprintln!("Selection cancelled");
        return Ok(());
    };
    println!("{}", text);

    if copy {
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(text) {
                    eprintln!("Warning: Failed to copy to clipboard: {}", e);
                } else {
                    eprintln!("(Copied to clipboard)");
                }
            }
            Err(e) => eprintln!("Warning: Could not access clipboard: {}", e),
        }
    }
    Ok(())
}

/// Calls the Vision API with a spinner, optionally saving the raw response.
async fn annotate(
    lens: &Lens,
    image: &image::DynamicImage,
    save_to: Option<&PathBuf>,
) -> Result<AnnotateResponse> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.green} {msg}")?,
    );
    spinner.set_message("Recognizing text...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = lens.annotate(image).await;
    spinner.finish_and_clear();
    let response = result.context("Vision API request failed")?;

    if let Some(path) = save_to {
        fs::write(path, serde_json::to_string_pretty(&response)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Saved Vision API response");
    }

    Ok(response)
}
