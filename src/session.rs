use crate::config::CropConfig;
use crate::error::{CropError, CropResult};
use crate::executor::{self, EncodedImage, ImageSource};
use crate::geometry::{NativeSize, Point, Rect};
use crate::selection::{Corner, SelectionLimits, SelectionState};
use crate::viewport::{LayoutProvider, Viewport};
use crate::zoom::Zoom;

/// One cropping session over one image.
///
/// All pointer positions are in the host's screen coordinates; the session
/// converts them to viewport coordinates against the layout passed with each
/// event.
pub struct CropSession {
    config: CropConfig,
    limits: SelectionLimits,
    source: Option<ImageSource>,
    aspect_hint: Option<f32>,
    viewport: Viewport,
    selection: SelectionState,
    zoom: Zoom,
    on_crop_complete: Box<dyn FnMut(EncodedImage)>,
    on_cancel: Box<dyn FnMut()>,
}

impl CropSession {
    /// Fails with [`CropError::Config`] when `config` does not validate.
    pub fn new(
        source: ImageSource,
        aspect_hint: Option<f32>,
        config: CropConfig,
        on_crop_complete: impl FnMut(EncodedImage) + 'static,
        on_cancel: impl FnMut() + 'static,
    ) -> CropResult<Self> {
        config.validate()?;
        // The hint is carried for the host; selection stays free-form.
        tracing::info!(?source, ?aspect_hint, "crop session opened");
        Ok(Self {
            limits: SelectionLimits::from(&config),
            zoom: Zoom::from_config(&config),
            config,
            source: Some(source),
            aspect_hint,
            viewport: Viewport::new(),
            selection: SelectionState::Idle,
            on_crop_complete: Box::new(on_crop_complete),
            on_cancel: Box::new(on_cancel),
        })
    }

    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    pub fn aspect_hint(&self) -> Option<f32> {
        self.aspect_hint
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn zoom(&self) -> &Zoom {
        &self.zoom
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// The image's load callback fired.
    pub fn image_loaded(&mut self, native: NativeSize) {
        self.viewport.image_loaded(native);
    }

    /// Host signal that layout is stable after load; places the default
    /// selection the first time it is called with a measurable image box,
    /// unless the operator has already started a gesture.
    pub fn layout_settled(&mut self, layout: &dyn LayoutProvider) {
        if self.selection != SelectionState::Idle {
            return;
        }
        if let Some(rect) = self.viewport.layout_settled(layout, &self.config) {
            self.transition(SelectionState::Committed { rect });
        }
    }

    /// Selection rectangle in screen coordinates, for drawing.
    pub fn selection_on_screen(&self, layout: &dyn LayoutProvider) -> Option<Rect> {
        let origin = layout.container_origin();
        self.selection
            .rect()
            .map(|r| r.translate(origin.x, origin.y))
    }

    pub fn handle_at(&self, layout: &dyn LayoutProvider, screen: Point) -> Option<Corner> {
        let p = self.viewport.to_viewport_point(layout, screen);
        self.selection.handle_at(p, self.limits.handle_tolerance)
    }

    pub fn pointer_down(&mut self, layout: &dyn LayoutProvider, screen: Point) {
        let Some((p, frame)) = self.measure(layout, screen) else {
            return;
        };
        let next = self.selection.pointer_down(p, frame, &self.limits);
        if next != SelectionState::Idle {
            self.viewport.disarm_default();
        }
        self.transition(next);
    }

    pub fn pointer_move(&mut self, layout: &dyn LayoutProvider, screen: Point) {
        let Some((p, frame)) = self.measure(layout, screen) else {
            return;
        };
        let next = self.selection.pointer_move(p, frame, &self.limits);
        self.transition(next);
    }

    pub fn pointer_up(&mut self, layout: &dyn LayoutProvider) {
        if !self.ready() {
            return;
        }
        let frame = self.viewport.display_frame(layout);
        let next = self.selection.pointer_up(frame, &self.limits);
        self.transition(next);
    }

    /// The pointer left the surface mid-gesture; settle as if released.
    pub fn pointer_cancel(&mut self, layout: &dyn LayoutProvider) {
        self.pointer_up(layout);
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.zoom.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.zoom.zoom_out()
    }

    /// Resetting zoom also drops the selection.
    pub fn reset_zoom(&mut self) -> f32 {
        self.transition(SelectionState::Idle);
        self.zoom.reset()
    }

    /// Whether the host should enable its "apply" control.
    pub fn can_apply(&self) -> bool {
        self.ready() && self.selection.settled_rect().is_some()
    }

    /// Crop, hand the result to `on_crop_complete` and end the session.
    ///
    /// On failure the selection is kept so the operator can retry.
    pub fn apply(&mut self, layout: &dyn LayoutProvider) -> CropResult<()> {
        let source = self.source.as_ref().ok_or(CropError::NotReady)?;
        let recorded = self.viewport.native_size()?;
        let frame = self.viewport.display_frame(layout);
        let settled = self.selection.reclamp(frame);

        let encoded = executor::execute(&settled, source, frame, recorded).inspect_err(|e| {
            if e.is_user_facing() {
                tracing::warn!(error = %e, "crop failed");
            }
        })?;

        (self.on_crop_complete)(encoded);
        self.end();
        Ok(())
    }

    /// Discard everything and notify `on_cancel`.
    pub fn cancel(&mut self) {
        if !self.is_open() {
            return;
        }
        tracing::info!("crop session cancelled");
        self.end();
        (self.on_cancel)();
    }

    fn end(&mut self) {
        self.transition(SelectionState::Idle);
        self.viewport.release();
        self.source = None;
    }

    fn ready(&self) -> bool {
        self.is_open() && self.viewport.is_ready()
    }

    fn measure(&self, layout: &dyn LayoutProvider, screen: Point) -> Option<(Point, Rect)> {
        if !self.ready() {
            tracing::trace!("pointer event before image load ignored");
            return None;
        }
        Some((
            self.viewport.to_viewport_point(layout, screen),
            self.viewport.display_frame(layout),
        ))
    }

    fn transition(&mut self, next: SelectionState) {
        if next.phase() != self.selection.phase() {
            tracing::debug!(from = self.selection.phase(), to = next.phase(), rect = ?next.rect(), "selection");
        }
        self.selection = next;
    }
}
