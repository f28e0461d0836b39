//! Rectangle math shared by the viewport model, the selection state machine
//! and the crop executor.
//!
//! Three coordinate spaces are in play:
//!
//! * **screen** — whatever the host toolkit reports pointer positions in;
//! * **viewport** — relative to the container's top-left corner;
//! * **native** — the source image's own pixel grid.
//!
//! `Rect` is used for the first two (f32, layout units) and for native
//! rectangles before they are snapped to pixels; `PixelRect` is the snapped
//! native form.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset_by(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

/// Axis-aligned rectangle, origin at the top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// True when `self` lies entirely within `outer`, allowing `eps` of float slack.
    pub fn is_within(&self, outer: &Rect, eps: f32) -> bool {
        self.x >= outer.x - eps
            && self.y >= outer.y - eps
            && self.right() <= outer.right() + eps
            && self.bottom() <= outer.bottom() + eps
    }
}

/// Rectangle spanned by two points, in either order.
pub fn normalize(a: Point, b: Point) -> Rect {
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    Rect::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
}

/// Nearest point to `p` inside `bounds`.
pub fn clamp_point(p: Point, bounds: Rect) -> Point {
    Point::new(
        p.x.max(bounds.x).min(bounds.right()),
        p.y.max(bounds.y).min(bounds.bottom()),
    )
}

/// Move `rect` so it lies inside `bounds`, keeping its size when it fits.
///
/// On an axis where `rect` is larger than `bounds` it is pinned to the bounds
/// origin and shrunk to the bounds extent.
pub fn clamp_rect_to_bounds(rect: Rect, bounds: Rect) -> Rect {
    let (x, width) = clamp_span(rect.x, rect.width, bounds.x, bounds.width);
    let (y, height) = clamp_span(rect.y, rect.height, bounds.y, bounds.height);
    Rect::new(x, y, width, height)
}

fn clamp_span(start: f32, len: f32, min: f32, extent: f32) -> (f32, f32) {
    let len = len.max(0.0);
    let extent = extent.max(0.0);
    if len >= extent {
        return (min, extent);
    }
    (start.max(min).min(min + extent - len), len)
}

/// Native image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NativeSize {
    pub width: u32,
    pub height: u32,
}

impl NativeSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }
}

/// Native-per-display ratio on each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleFactors {
    pub x: f32,
    pub y: f32,
}

impl ScaleFactors {
    pub const IDENTITY: ScaleFactors = ScaleFactors { x: 1.0, y: 1.0 };
}

/// Falls back to identity when the display box has no area.
pub fn scale_factors(native: NativeSize, display: Size) -> ScaleFactors {
    if display.is_degenerate() {
        return ScaleFactors::IDENTITY;
    }
    ScaleFactors {
        x: native.width as f32 / display.width,
        y: native.height as f32 / display.height,
    }
}

/// Map a viewport rectangle onto the native pixel grid of the image shown in `frame`.
pub fn to_native_rect(rect: Rect, frame: Rect, scale: ScaleFactors, native: NativeSize) -> Rect {
    let mapped = Rect::new(
        (rect.x - frame.x) * scale.x,
        (rect.y - frame.y) * scale.y,
        rect.width * scale.x,
        rect.height * scale.y,
    );
    clamp_rect_to_bounds(mapped, native.as_rect())
}

/// Inverse of [`to_native_rect`] for rectangles already inside the image.
pub fn to_viewport_rect(native_rect: Rect, frame: Rect, scale: ScaleFactors) -> Rect {
    Rect::new(
        native_rect.x / scale.x + frame.x,
        native_rect.y / scale.y + frame.y,
        native_rect.width / scale.x,
        native_rect.height / scale.y,
    )
}

/// Whole-pixel region of the native image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Snap a native rectangle to pixels, keeping at least one pixel on each
    /// axis and never reading past the right or bottom edge.
    pub fn snap(rect: Rect, native: NativeSize) -> PixelRect {
        let (x, width) = snap_span(rect.x, rect.width, native.width);
        let (y, height) = snap_span(rect.y, rect.height, native.height);
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }
}

fn snap_span(start: f32, len: f32, extent: u32) -> (u32, u32) {
    let last = extent.saturating_sub(1);
    let start = (start.round().max(0.0) as u32).min(last);
    let len = (len.round().max(0.0) as u32).clamp(1, (extent - start).max(1));
    (start, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rect_near(a: Rect, b: Rect, eps: f32) {
        assert!(
            (a.x - b.x).abs() <= eps
                && (a.y - b.y).abs() <= eps
                && (a.width - b.width).abs() <= eps
                && (a.height - b.height).abs() <= eps,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn normalize_orders_corners() {
        let r = normalize(Point::new(200.0, 175.0), Point::new(100.0, 100.0));
        assert_eq!(r, Rect::new(100.0, 100.0, 100.0, 75.0));
    }

    #[test]
    fn contains_is_inclusive() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(30.0, 30.0)));
        assert!(!r.contains(Point::new(30.1, 30.0)));
    }

    #[test]
    fn clamp_point_pins_to_nearest_edge() {
        let bounds = Rect::new(10.0, 10.0, 100.0, 50.0);
        assert_eq!(clamp_point(Point::new(-5.0, 30.0), bounds), Point::new(10.0, 30.0));
        assert_eq!(clamp_point(Point::new(500.0, 500.0), bounds), Point::new(110.0, 60.0));
    }

    #[test]
    fn clamp_translates_when_rect_fits() {
        let bounds = Rect::new(0.0, 0.0, 400.0, 300.0);
        let r = clamp_rect_to_bounds(Rect::new(350.0, -20.0, 100.0, 50.0), bounds);
        assert_eq!(r, Rect::new(300.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn clamp_shrinks_oversized_axis_to_bounds_origin() {
        let bounds = Rect::new(10.0, 20.0, 100.0, 100.0);
        let r = clamp_rect_to_bounds(Rect::new(50.0, 30.0, 150.0, 40.0), bounds);
        assert_eq!(r, Rect::new(10.0, 30.0, 100.0, 40.0));
    }

    #[test]
    fn scale_factors_fall_back_to_identity_on_empty_display() {
        let native = NativeSize::new(800, 600);
        assert_eq!(
            scale_factors(native, Size::new(0.0, 300.0)),
            ScaleFactors::IDENTITY
        );
        assert_eq!(
            scale_factors(native, Size::new(400.0, 0.0)),
            ScaleFactors::IDENTITY
        );
        assert_eq!(
            scale_factors(native, Size::new(400.0, 300.0)),
            ScaleFactors { x: 2.0, y: 2.0 }
        );
    }

    #[test]
    fn to_native_subtracts_frame_origin_then_scales() {
        let frame = Rect::new(50.0, 25.0, 400.0, 300.0);
        let native = NativeSize::new(800, 600);
        let scale = scale_factors(native, frame.size());
        let r = to_native_rect(Rect::new(150.0, 125.0, 100.0, 75.0), frame, scale, native);
        assert_eq!(r, Rect::new(200.0, 200.0, 200.0, 150.0));
    }

    #[test]
    fn to_native_clamps_into_image() {
        let frame = Rect::new(0.0, 0.0, 400.0, 300.0);
        let native = NativeSize::new(800, 600);
        let scale = scale_factors(native, frame.size());
        let r = to_native_rect(Rect::new(350.0, 280.0, 100.0, 50.0), frame, scale, native);
        assert!(r.is_within(&native.as_rect(), 0.0));
        assert_eq!(r, Rect::new(600.0, 500.0, 200.0, 100.0));
    }

    #[test]
    fn native_round_trip_within_one_pixel() {
        let frame = Rect::new(37.5, 12.25, 333.0, 217.0);
        let native = NativeSize::new(1021, 677);
        let scale = scale_factors(native, frame.size());
        let original = Rect::new(80.0, 40.0, 123.4, 98.7);

        let snapped = PixelRect::snap(to_native_rect(original, frame, scale, native), native);
        let back = to_viewport_rect(snapped.to_rect(), frame, scale);

        // One native pixel is at most 1/scale viewport units; both scales exceed 1 here.
        assert_rect_near(back, original, 1.0);
    }

    #[test]
    fn snap_keeps_region_inside_image() {
        let native = NativeSize::new(100, 50);
        let p = PixelRect::snap(Rect::new(99.6, 49.6, 10.0, 10.0), native);
        assert_eq!(
            p,
            PixelRect {
                x: 99,
                y: 49,
                width: 1,
                height: 1
            }
        );
        let p = PixelRect::snap(Rect::new(10.2, 5.0, 0.2, 0.0), native);
        assert_eq!(p.width, 1);
        assert_eq!(p.height, 1);
    }
}
