#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::path::PathBuf;

use eframe::egui;
use regioncrop::{
    Corner, CropConfig, CropError, CropSession, EncodedImage, ImageSource, LayoutProvider,
    NativeSize, Point, Rect, SelectionState, load_config,
};

const PADDING: f32 = 20.0;
const ACCENT: egui::Color32 = egui::Color32::from_rgb(0x72, 0x24, 0x20);

/// This frame's measurements of the crop area, straight from egui layout.
#[derive(Clone, Copy)]
struct FrameLayout {
    container: egui::Rect,
    image: egui::Rect,
}

impl LayoutProvider for FrameLayout {
    fn container_origin(&self) -> Point {
        to_point(self.container.min)
    }

    fn image_bounds(&self) -> Rect {
        Rect::new(
            self.image.min.x,
            self.image.min.y,
            self.image.width(),
            self.image.height(),
        )
    }
}

fn to_point(p: egui::Pos2) -> Point {
    Point::new(p.x, p.y)
}

fn to_egui_rect(r: Rect) -> egui::Rect {
    egui::Rect::from_min_size(egui::pos2(r.x, r.y), egui::vec2(r.width, r.height))
}

/// Deferred until the layout for this frame has been measured.
#[derive(Clone, Copy, PartialEq)]
enum Action {
    Apply,
    Cancel,
}

struct RegionCropApp {
    config: CropConfig,
    session: Option<CropSession>,
    texture: Option<egui::TextureHandle>,
}

impl RegionCropApp {
    fn new(_cc: &eframe::CreationContext<'_>, config: CropConfig) -> Self {
        Self {
            config,
            session: None,
            texture: None,
        }
    }

    fn open(&mut self, ctx: &egui::Context, path: PathBuf) {
        if let Some(mut previous) = self.session.take() {
            previous.cancel();
        }
        self.texture = None;

        let source = ImageSource::Path(path);
        let image = match source.decode() {
            Ok(image) => image,
            Err(e) => {
                tracing::error!(error = %e, "failed to open image");
                show_error(&format!("Error loading image. Please try a different image.\n\n{e}"));
                return;
            }
        };

        let size = [image.width() as _, image.height() as _];
        let image_buffer = image.to_rgba8();
        let pixels = image_buffer.as_flat_samples();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
        self.texture = Some(ctx.load_texture("image", color_image, egui::TextureOptions::LINEAR));

        let mut session = match CropSession::new(
            source,
            None,
            self.config.clone(),
            save_cropped,
            || tracing::info!("crop discarded"),
        ) {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "invalid crop configuration");
                show_error(&format!("Invalid configuration.\n\n{e}"));
                self.texture = None;
                return;
            }
        };
        session.image_loaded(NativeSize::new(image.width(), image.height()));
        self.session = Some(session);
    }

    fn close(&mut self) {
        self.session = None;
        self.texture = None;
    }

    fn toolbar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) -> Option<Action> {
        let mut action = None;
        ui.horizontal(|ui| {
            if ui.button("Open Image").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Image", &["png", "jpg", "jpeg", "bmp", "webp", "gif"])
                    .pick_file()
                {
                    self.open(ctx, path);
                }
            }

            let Some(session) = self.session.as_mut() else {
                return;
            };

            ui.separator();
            ui.label("Zoom:");
            if ui
                .add_enabled(session.zoom().can_zoom_out(), egui::Button::new("-"))
                .clicked()
            {
                session.zoom_out();
            }
            ui.label(format!("{}%", session.zoom().percent()));
            if ui
                .add_enabled(session.zoom().can_zoom_in(), egui::Button::new("+"))
                .clicked()
            {
                session.zoom_in();
            }
            if ui.button("Reset").clicked() {
                session.reset_zoom();
            }

            ui.separator();
            if ui.button("Cancel").clicked() {
                action = Some(Action::Cancel);
            }
            if ui
                .add_enabled(session.can_apply(), egui::Button::new("Apply Crop"))
                .clicked()
            {
                action = Some(Action::Apply);
            }
        });

        if let Some(session) = &self.session {
            let hint = if session.selection().is_committed() {
                "Drag the box to move, use corners to resize, or click outside to create a new selection"
            } else {
                "Click and drag to create a free-form crop selection"
            };
            ui.label(hint);
        }
        action
    }

    fn measure(&self, ui: &egui::Ui, texture: &egui::TextureHandle, zoom: f32) -> FrameLayout {
        let container = ui.available_rect_before_wrap();
        let max_size = container.size() - egui::vec2(PADDING * 2.0, PADDING * 2.0);
        let image_size = texture.size_vec2();

        // Fit within the container while keeping the aspect ratio, then zoom
        // about the center.
        let fit = (max_size.x / image_size.x).min(max_size.y / image_size.y).max(0.0);
        let display_size = image_size * fit * zoom;
        FrameLayout {
            container,
            image: egui::Rect::from_center_size(container.center(), display_size),
        }
    }
}

impl eframe::App for RegionCropApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle dropped files
        if !ctx.input(|i| i.raw.dropped_files.is_empty()) {
            let dropped_files = ctx.input(|i| i.raw.dropped_files.clone());
            if let Some(path) = dropped_files.first().and_then(|f| f.path.clone()) {
                self.open(ctx, path);
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            let action = self.toolbar(ui, ctx);
            ui.separator();

            let (Some(texture), Some(session)) = (self.texture.clone(), self.session.as_ref())
            else {
                return;
            };
            let layout = self.measure(ui, &texture, session.zoom().scale());

            match action {
                Some(Action::Cancel) => {
                    if let Some(session) = self.session.as_mut() {
                        session.cancel();
                    }
                    self.close();
                    return;
                }
                Some(Action::Apply) => {
                    if let Some(session) = self.session.as_mut() {
                        match session.apply(&layout) {
                            Ok(()) => {
                                self.close();
                                return;
                            }
                            Err(e) if e.is_user_facing() => {
                                tracing::error!(error = %e, "crop failed");
                                show_error(&format!("Error cropping image. Please try again.\n\n{e}"));
                            }
                            Err(CropError::NotReady) => {}
                            Err(e) => tracing::debug!(error = %e, "apply ignored"),
                        }
                    }
                }
                None => {}
            }

            let Some(session) = self.session.as_mut() else {
                return;
            };
            session.layout_settled(&layout);

            let response = ui.allocate_rect(layout.container, egui::Sense::drag());
            if response.drag_started() {
                let origin = ctx.input(|i| i.pointer.press_origin());
                if let Some(pos) = origin.or(response.interact_pointer_pos()) {
                    session.pointer_down(&layout, to_point(pos));
                }
            }
            if response.dragged() {
                if let Some(pos) = response.interact_pointer_pos() {
                    session.pointer_move(&layout, to_point(pos));
                }
            }
            if response.drag_stopped() {
                session.pointer_up(&layout);
            }

            if let Some(pos) = response.hover_pos() {
                set_cursor(ctx, session, &layout, pos);
            }

            paint(ui, &texture, session, &layout);
        });
    }
}

fn set_cursor(ctx: &egui::Context, session: &CropSession, layout: &FrameLayout, pos: egui::Pos2) {
    let icon = match session.selection() {
        SelectionState::Moving { .. } => egui::CursorIcon::Grabbing,
        SelectionState::Resizing { corner, .. } => corner_cursor(*corner),
        SelectionState::Drafting { .. } => egui::CursorIcon::Crosshair,
        SelectionState::Committed { .. } | SelectionState::Idle => {
            match session.handle_at(layout, to_point(pos)) {
                Some(corner) => corner_cursor(corner),
                None => match session.selection_on_screen(layout) {
                    Some(rect) if to_egui_rect(rect).contains(pos) => egui::CursorIcon::Grab,
                    _ => egui::CursorIcon::Crosshair,
                },
            }
        }
    };
    ctx.set_cursor_icon(icon);
}

fn corner_cursor(corner: Corner) -> egui::CursorIcon {
    match corner {
        Corner::NW | Corner::SE => egui::CursorIcon::ResizeNwSe,
        Corner::NE | Corner::SW => egui::CursorIcon::ResizeNeSw,
    }
}

fn paint(ui: &egui::Ui, texture: &egui::TextureHandle, session: &CropSession, layout: &FrameLayout) {
    let painter = ui.painter_at(layout.container);
    let image_rect = layout.image;

    painter.image(
        texture.id(),
        image_rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );

    let Some(crop) = session.selection_on_screen(layout).map(to_egui_rect) else {
        return;
    };
    if crop.width() <= 0.0 || crop.height() <= 0.0 {
        return;
    }

    // Dim the image outside the selection
    let overlay_color = egui::Color32::from_black_alpha(150);
    for band in [
        egui::Rect::from_min_max(image_rect.min, egui::pos2(image_rect.max.x, crop.min.y)),
        egui::Rect::from_min_max(egui::pos2(image_rect.min.x, crop.max.y), image_rect.max),
        egui::Rect::from_min_max(
            egui::pos2(image_rect.min.x, crop.min.y),
            egui::pos2(crop.min.x, crop.max.y),
        ),
        egui::Rect::from_min_max(
            egui::pos2(crop.max.x, crop.min.y),
            egui::pos2(image_rect.max.x, crop.max.y),
        ),
    ] {
        painter.rect_filled(band, 0.0, overlay_color);
    }

    painter.rect_stroke(crop, 0.0, egui::Stroke::new(2.0, ACCENT));

    // Handles only once the selection is committed
    if session.selection().is_committed() {
        let handle_stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);
        for pos in [
            crop.min,
            crop.max,
            egui::pos2(crop.min.x, crop.max.y),
            egui::pos2(crop.max.x, crop.min.y),
        ] {
            painter.circle(pos, 6.0, ACCENT, handle_stroke);
        }
    }
}

fn save_cropped(encoded: EncodedImage) {
    let Some(path) = rfd::FileDialog::new()
        .add_filter("JPEG", &["jpg", "jpeg"])
        .set_file_name("cropped.jpg")
        .save_file()
    else {
        tracing::info!("save dialog dismissed; cropped image dropped");
        return;
    };

    match std::fs::write(&path, &encoded.bytes) {
        Ok(()) => tracing::info!(
            path = %path.display(),
            width = encoded.width,
            height = encoded.height,
            "cropped image saved"
        ),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to save image");
            show_error(&format!("Failed to save image: {e}"));
        }
    }
}

fn show_error(message: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title("Region Crop")
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config; using defaults");
            CropConfig::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([800.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Region Crop",
        options,
        Box::new(|cc| Ok(Box::new(RegionCropApp::new(cc, config)))),
    )
}
