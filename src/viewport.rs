use crate::config::CropConfig;
use crate::error::{CropError, CropResult};
use crate::geometry::{NativeSize, Point, Rect, ScaleFactors, clamp_rect_to_bounds, scale_factors};

/// Live layout measurements supplied by the host UI.
///
/// Both values are in the host's screen coordinates and must reflect the
/// layout as it is right now, including the current zoom. The engine never
/// caches them across events.
pub trait LayoutProvider {
    /// Top-left corner of the container the pointer coordinates are relative to.
    fn container_origin(&self) -> Point;

    /// On-screen box of the rendered image, after fitting and zoom.
    fn image_bounds(&self) -> Rect;
}

/// Answers where the container and the image are, and how large the image
/// really is.
#[derive(Debug, Default)]
pub struct Viewport {
    native: Option<NativeSize>,
    default_pending: bool,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the decoded size and arm the one-shot default selection.
    pub fn image_loaded(&mut self, native: NativeSize) {
        tracing::info!(width = native.width, height = native.height, "image loaded");
        self.native = Some(native);
        self.default_pending = true;
    }

    pub fn is_ready(&self) -> bool {
        self.native.is_some()
    }

    pub fn native_size(&self) -> CropResult<NativeSize> {
        self.native.ok_or(CropError::NotReady)
    }

    pub fn container_origin(&self, layout: &dyn LayoutProvider) -> Point {
        layout.container_origin()
    }

    /// Image box relative to the container origin.
    pub fn display_frame(&self, layout: &dyn LayoutProvider) -> Rect {
        let origin = layout.container_origin();
        let image = layout.image_bounds();
        Rect::new(
            image.x - origin.x,
            image.y - origin.y,
            image.width.max(0.0),
            image.height.max(0.0),
        )
    }

    pub fn to_viewport_point(&self, layout: &dyn LayoutProvider, screen: Point) -> Point {
        screen.offset_by(layout.container_origin())
    }

    pub fn scale_factors(&self, layout: &dyn LayoutProvider) -> CropResult<ScaleFactors> {
        let native = self.native_size()?;
        Ok(scale_factors(native, self.display_frame(layout).size()))
    }

    /// Called by the host once layout has settled after load. Returns the
    /// centered default selection the first time, `None` afterwards or when
    /// the image is not yet laid out.
    pub fn layout_settled(
        &mut self,
        layout: &dyn LayoutProvider,
        config: &CropConfig,
    ) -> Option<Rect> {
        if !self.default_pending || self.native.is_none() {
            return None;
        }
        let frame = self.display_frame(layout);
        if frame.is_empty() {
            return None;
        }
        self.default_pending = false;

        let mut width = frame.width * config.default_selection_fraction;
        if let Some(cap) = config.default_selection_max_width {
            width = width.min(cap);
        }
        let height = width * config.default_selection_aspect;
        let rect = Rect::new(
            frame.x + (frame.width - width) / 2.0,
            frame.y + (frame.height - height) / 2.0,
            width,
            height,
        );
        let rect = clamp_rect_to_bounds(rect, frame);
        tracing::debug!(?rect, "default selection placed");
        Some(rect)
    }

    /// The operator started a gesture; the default selection would only
    /// overwrite it.
    pub fn disarm_default(&mut self) {
        if self.default_pending {
            tracing::debug!("default selection skipped; gesture already started");
        }
        self.default_pending = false;
    }

    /// Forget the image; the next session starts from scratch.
    pub fn release(&mut self) {
        self.native = None;
        self.default_pending = false;
    }
}
