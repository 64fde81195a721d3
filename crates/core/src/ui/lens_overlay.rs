//! Main lens overlay application.
//!
//! `LensOverlay` implements `eframe::App`: it shows the image, requests text
//! detection in the background once the image has settled, and lets the
//! user tap or drag across the recognized words.

use super::gesture::{Gesture, PointerFrame, classify};
use super::rendering::{
    DIM_ALPHA, HIGHLIGHTED, HandleEnd, SELECTED, calculate_toolbar_position, draw_block,
    draw_dim, draw_handle, envelope,
};
use super::session::RecognitionSession;
use super::settings::Settings;
use super::state::{RecognitionEvent, UiState};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::geometry::{HitRegions, Point};
use crate::image_processing::{ImageProcessor, Placement};
use crate::layout::{RawDetection, project};
use crate::selection::{Haptics, SelectionEngine};
use eframe::egui;
use image::DynamicImage;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Desktop stand-in for a haptic motor: briefly outlines the selection.
#[derive(Debug, Default)]
pub struct VisualPulse {
    until: Option<Instant>,
}

impl VisualPulse {
    /// Time left on the current pulse.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.until
            .and_then(|until| until.checked_duration_since(now))
            .filter(|left| !left.is_zero())
    }
}

impl Haptics for VisualPulse {
    fn pulse(&mut self, duration: Duration) {
        self.until = Some(Instant::now() + duration);
    }
}

/// The interactive text overlay.
pub struct LensOverlay {
    // Image state
    image_texture: Option<egui::TextureHandle>,
    /// Pre-converted image data for fast texture upload
    color_image: Option<egui::ColorImage>,
    image: Arc<DynamicImage>,

    // Recognition state
    detections: Vec<RawDetection>,
    placement: Option<Placement>,
    regions: HitRegions,
    session: RecognitionSession,
    state: UiState,
    rx: Receiver<RecognitionEvent>,
    tx: Sender<RecognitionEvent>,

    // Selection state
    engine: SelectionEngine<VisualPulse>,
    pub result: Arc<Mutex<Option<String>>>,
    notice: Option<(String, Instant)>,

    config: Config,
    settings: Settings,
    show_settings: bool,
}

impl LensOverlay {
    /// Creates an overlay for `image`.
    ///
    /// With `detections` given, recognition is skipped and the overlay opens
    /// ready for selection.
    pub fn new(
        image: DynamicImage,
        detections: Option<Vec<RawDetection>>,
        result: Arc<Mutex<Option<String>>>,
        config: Config,
    ) -> Self {
        let (tx, rx) = channel();

        // Pre-convert image to ColorImage for fast texture upload
        let image_buffer = image.to_rgba8();
        let size = [image.width() as usize, image.height() as usize];
        let pixels = image_buffer.as_flat_samples();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());

        let mut session = RecognitionSession::new(config.recognition_delay, Instant::now());
        let (detections, state) = match detections {
            Some(detections) => {
                session.cancel();
                (detections, UiState::Ready)
            }
            None => (Vec::new(), UiState::Waiting),
        };

        let engine = SelectionEngine::with_haptics(Vec::new(), VisualPulse::default())
            .with_pulse(config.haptic_pulse);

        Self {
            image_texture: None,
            color_image: Some(color_image),
            image: Arc::new(image),
            detections,
            placement: None,
            regions: HitRegions::default(),
            session,
            state,
            rx,
            tx,
            engine,
            result,
            notice: None,
            config,
            settings: Settings::load(),
            show_settings: false,
        }
    }

    /// Spawns the Vision request on a background thread.
    fn spawn_recognition(&mut self, ctx: &egui::Context, generation: u64) {
        self.state = UiState::Recognizing;

        let tx = self.tx.clone();
        let ctx = ctx.clone();
        let image = Arc::clone(&self.image);
        let mut config = self.config.clone();
        self.settings.apply_to(&mut config);

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();

            let outcome = match runtime {
                Ok(rt) => rt
                    .block_on(crate::recognize(&image, &config))
                    .map_err(|e| e.to_string()),
                Err(e) => Err(format!("Failed to create async runtime: {}", e)),
            };
            let _ = tx.send(RecognitionEvent {
                generation,
                outcome,
            });
            ctx.request_repaint();
        });
    }

    /// Applies finished recognition results for the current image.
    fn process_recognition_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            if !self.session.accepts(event.generation) {
                warn!(
                    generation = event.generation,
                    current = self.session.generation(),
                    "Dropping stale recognition result"
                );
                continue;
            }
            match event.outcome {
                Ok(detections) => {
                    info!(detections = detections.len(), "Recognition finished");
                    self.detections = detections;
                    self.state = UiState::Ready;
                }
                Err(err) => {
                    warn!(error = %err, "Recognition failed");
                    self.detections.clear();
                    self.state = UiState::Error(err);
                }
            }
            // Force re-projection into the current view.
            self.placement = None;
        }
    }

    /// Discards the current detections and schedules a fresh request.
    /// Responses still in flight for the old generation are dropped.
    fn restart_recognition(&mut self) {
        let generation = self.session.begin_image(Instant::now());
        info!(generation, "Recognition settings changed, recognizing again");
        self.detections.clear();
        self.state = UiState::Waiting;
        self.placement = None;
    }

    fn settings_edited(&mut self, before: &Settings) {
        if self.settings.changes_recognition(before) {
            self.restart_recognition();
        }
    }

    /// Re-projects the detections when the view changes.
    fn update_layout(&mut self, view: egui::Rect) {
        let mut placement = ImageProcessor::fit(
            (self.image.width(), self.image.height()),
            (view.width(), view.height()),
        );
        placement.origin = Point::new(
            placement.origin.x + view.min.x,
            placement.origin.y + view.min.y,
        );

        if self.placement == Some(placement) {
            return;
        }

        let density = self.config.pixel_density.unwrap_or(placement.pixel_density);
        let blocks = project(&self.detections, density);
        self.regions = HitRegions::from_blocks(&blocks, placement.origin);
        self.engine.replace_blocks(blocks);
        self.placement = Some(placement);
    }

    fn handle_gesture(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Tap(point) => match self.regions.first_hit(point) {
                Some(index) => self.engine.select_single(index),
                None => self.engine.reset(),
            },
            Gesture::DragStarted(point) => {
                self.engine.begin_drag();
                self.engine.extend_drag(point, &self.regions);
            }
            Gesture::DragMoved(point) => {
                self.engine.extend_drag(point, &self.regions);
            }
            Gesture::DragEnded => self.engine.end_drag(),
            Gesture::None => {}
        }
    }

    fn copy_selection(&mut self) {
        let Some(text) = self.engine.materialize() else {
            return;
        };
        let notice = match arboard::Clipboard::new().and_then(|mut c| c.set_text(text)) {
            Ok(()) => "Copied".to_string(),
            Err(e) => {
                warn!(error = %e, "Clipboard unavailable");
                format!("Copy failed: {}", e)
            }
        };
        self.notice = Some((notice, Instant::now()));
    }

    /// Stores the selection as the overlay's result and closes the window.
    fn confirm(&mut self, ctx: &egui::Context) {
        if self.settings.copy_on_confirm {
            self.copy_selection();
        }
        if let Ok(mut result) = self.result.lock() {
            *result = self.engine.materialize();
        }
        self.close(ctx);
    }

    fn close(&mut self, ctx: &egui::Context) {
        self.session.cancel();
        if let Err(e) = self.settings.save() {
            warn!(error = %e, "Failed to save settings");
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn draw_blocks(&self, painter: &egui::Painter) {
        let pulsing = self.engine.haptics().remaining(Instant::now()).is_some();
        let outline = self
            .settings
            .show_outlines
            .then(|| egui::Stroke::new(1.0, egui::Color32::from_white_alpha(90)));

        for index in 0..self.regions.len() {
            let Some(bounds) = self.regions.get(index) else {
                continue;
            };
            let selected = self.engine.is_selected(index);
            let stroke = if selected && pulsing {
                Some(egui::Stroke::new(2.0, egui::Color32::WHITE))
            } else {
                outline
            };
            draw_block(painter, bounds, if selected { SELECTED } else { HIGHLIGHTED }, stroke);
        }

        if let Some(span) = self.engine.span() {
            if let Some(start) = self.regions.get(*span.start()) {
                draw_handle(painter, start, HandleEnd::Start);
            }
            if let Some(end) = self.regions.get(*span.end()) {
                draw_handle(painter, end, HandleEnd::End);
            }
        }
    }

    /// Renders the status line in the top-left corner.
    ///
    /// The settings toggle lives here too, so a missing or rejected API key
    /// can be fixed while there is nothing to select.
    fn render_status(&mut self, ctx: &egui::Context, view: egui::Rect) {
        let message = match &self.state {
            UiState::Waiting | UiState::Recognizing => Some("Recognizing text...".to_string()),
            UiState::Ready if self.detections.is_empty() => Some("No text found".to_string()),
            UiState::Ready => None,
            UiState::Error(err) => Some(format!("Error: {}", err)),
        };
        let Some(message) = message else {
            return;
        };

        egui::Area::new(egui::Id::new("status_area"))
            .fixed_pos(view.min + egui::vec2(10.0, 10.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(egui::Color32::from_rgb(30, 30, 30))
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            if matches!(self.state, UiState::Waiting | UiState::Recognizing) {
                                ui.spinner();
                            }
                            let color = if matches!(self.state, UiState::Error(_)) {
                                egui::Color32::RED
                            } else {
                                egui::Color32::LIGHT_GRAY
                            };
                            ui.label(egui::RichText::new(message).color(color));
                            if ui.button("⚙").clicked() {
                                self.show_settings = !self.show_settings;
                            }
                        });

                        if self.show_settings {
                            self.render_settings_ui(ui);
                        }
                    });
            });
    }

    /// Renders the toolbar next to the current selection.
    fn render_toolbar(&mut self, ctx: &egui::Context, view: egui::Rect) {
        let Some(span) = self.engine.span() else {
            return;
        };
        let Some(selection_rect) = envelope(span.filter_map(|i| self.regions.get(i))) else {
            return;
        };
        let Some(text) = self.engine.materialize() else {
            return;
        };

        let toolbar_width = (view.width() * 0.3).clamp(260.0, 480.0);
        let (x, y, pivot) =
            calculate_toolbar_position(selection_rect, view, toolbar_width, 24.0, 160.0);

        egui::Area::new(egui::Id::new("selection_toolbar"))
            .fixed_pos(egui::pos2(x, y))
            .pivot(pivot)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(egui::Color32::from_rgb(30, 30, 30))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::GRAY))
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        ui.set_width(toolbar_width);
                        egui::ScrollArea::vertical().max_height(80.0).show(ui, |ui| {
                            ui.label(egui::RichText::new(text.as_str()).monospace());
                        });
                        ui.separator();

                        ui.horizontal(|ui| {
                            if ui.button("Copy").clicked() {
                                self.copy_selection();
                            }
                            if ui.button("Done").clicked() {
                                self.confirm(ctx);
                            }
                            if ui.button("Clear").clicked() {
                                self.engine.reset();
                            }
                            if ui.button("⚙").clicked() {
                                self.show_settings = !self.show_settings;
                            }
                            if let Some((notice, _)) = &self.notice {
                                ui.label(notice.as_str());
                            }
                        });

                        if self.show_settings {
                            self.render_settings_ui(ui);
                        }
                    });
            });
    }

    /// Renders the settings panel.
    fn render_settings_ui(&mut self, ui: &mut egui::Ui) {
        let before = self.settings.clone();
        ui.separator();
        ui.label("Settings");

        ui.checkbox(&mut self.settings.copy_on_confirm, "Copy on Done");
        ui.checkbox(&mut self.settings.show_outlines, "Outline recognized words");

        ui.label("API Key:");
        ui.add(
            egui::TextEdit::singleline(&mut self.settings.api_key)
                .password(true)
                .hint_text("Paste Vision API Key"),
        );

        ui.label("Language hints:");
        ui.add(
            egui::TextEdit::singleline(&mut self.settings.language_hints)
                .hint_text("e.g. en, ja"),
        );

        self.settings_edited(&before);
    }
}

impl eframe::App for LensOverlay {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Enforce dark mode
        ctx.set_visuals(egui::Visuals::dark());

        self.process_recognition_events();

        let now = Instant::now();
        if let Some(generation) = self.session.due(now) {
            self.spawn_recognition(ctx, generation);
        } else if let Some(left) = self.session.remaining(now) {
            ctx.request_repaint_after(left);
        }
        if let Some(left) = self.engine.haptics().remaining(now) {
            ctx.request_repaint_after(left);
        }
        if self
            .notice
            .as_ref()
            .is_some_and(|(_, at)| now.duration_since(*at) > Duration::from_secs(2))
        {
            self.notice = None;
        }

        // Upload texture on first frame using pre-converted data
        if self.image_texture.is_none() {
            if let Some(color_image) = self.color_image.take() {
                self.image_texture = Some(ctx.load_texture(
                    "lens_image",
                    color_image,
                    egui::TextureOptions::LINEAR,
                ));
            }
        }

        // Fullscreen panel with no margins
        let panel_frame = egui::Frame::default()
            .inner_margin(egui::Margin::same(0))
            .outer_margin(egui::Margin::same(0))
            .fill(egui::Color32::from_rgb(0x25, 0x2b, 0x2f));

        egui::CentralPanel::default()
            .frame(panel_frame)
            .show(ctx, |ui| {
                let view = ui.max_rect();
                self.update_layout(view);

                if let (Some(texture), Some(placement)) = (&self.image_texture, self.placement) {
                    let r = placement.rect();
                    let image_rect = egui::Rect::from_min_size(
                        egui::pos2(r.left, r.top),
                        egui::vec2(r.width, r.height),
                    );
                    ui.painter().image(
                        texture.id(),
                        image_rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                    draw_dim(ui.painter(), image_rect, DIM_ALPHA);
                }

                self.draw_blocks(ui.painter());

                let response = ui.interact(view, ui.id().with("lens_surface"), egui::Sense::click_and_drag());
                let gesture = classify(PointerFrame::from_response(&response));
                self.handle_gesture(gesture);

                self.render_status(ctx, view);
                self.render_toolbar(ctx, view);
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.close(ctx);
        }
        if !ctx.wants_keyboard_input() {
            if ctx.input(|i| i.key_pressed(egui::Key::Enter)) && self.engine.range().is_some() {
                self.confirm(ctx);
            }
            if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::C)) {
                self.copy_selection();
            }
        }
    }
}

/// Launches the overlay and returns the confirmed selection, if any.
///
/// # Arguments
/// * `image` - The image to overlay
/// * `config` - Application configuration
/// * `detections` - Previously recognized words; `None` runs recognition
pub fn run(
    image: DynamicImage,
    config: Config,
    detections: Option<Vec<RawDetection>>,
) -> Result<Option<String>> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 768.0])
            .with_title("Lens"),
        ..Default::default()
    };

    let result = Arc::new(Mutex::new(None));
    let app_result = result.clone();

    eframe::run_native(
        "Lens",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(LensOverlay::new(image, detections, app_result, config)) as Box<dyn eframe::App>)
        }),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))?;

    let lock = result
        .lock()
        .map_err(|_| AppError::ui("Failed to acquire result lock"))?;
    Ok(lock.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay() -> LensOverlay {
        let config = Config::builder().build().unwrap();
        LensOverlay::new(DynamicImage::new_rgba8(4, 4), None, Arc::default(), config)
    }

    #[test]
    fn edited_api_key_recognizes_again() {
        let mut overlay = overlay();
        let later = Instant::now() + Duration::from_secs(1);
        let failed = overlay.session.due(later).unwrap();
        overlay.state = UiState::Error("Missing required environment variable".into());

        let before = overlay.settings.clone();
        overlay.settings.api_key = format!("{}-fresh", before.api_key);
        overlay.settings_edited(&before);

        assert_eq!(overlay.state, UiState::Waiting);
        assert!(!overlay.session.accepts(failed));
        let retry = overlay.session.due(later + Duration::from_secs(1));
        assert_eq!(retry, Some(overlay.session.generation()));
        assert_ne!(retry, Some(failed));
    }

    #[test]
    fn cosmetic_settings_keep_recognition() {
        let mut overlay = overlay();
        let before = overlay.settings.clone();
        overlay.settings.show_outlines = !before.show_outlines;
        overlay.settings_edited(&before);

        assert_eq!(overlay.session.generation(), 0);
        assert_eq!(overlay.state, UiState::Waiting);
    }

    #[test]
    fn stale_recognition_result_is_dropped() {
        let mut overlay = overlay();
        overlay.restart_recognition();
        overlay
            .tx
            .send(RecognitionEvent {
                generation: 0,
                outcome: Ok(vec![RawDetection {
                    text: "old".into(),
                    vertices: Vec::new(),
                }]),
            })
            .unwrap();

        overlay.process_recognition_events();
        assert!(overlay.detections.is_empty());
        assert_eq!(overlay.state, UiState::Waiting);
    }

    #[test]
    fn visual_pulse_expires() {
        let mut pulse = VisualPulse::default();
        assert_eq!(pulse.remaining(Instant::now()), None);
        pulse.pulse(Duration::from_secs(60));
        assert!(pulse.remaining(Instant::now()).is_some());
        assert_eq!(pulse.remaining(Instant::now() + Duration::from_secs(61)), None);
    }
}
