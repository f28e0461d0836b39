//! Drag/resize interaction for the crop rectangle.
//!
//! The rectangle is held in viewport coordinates and re-clamped against the
//! live display frame on every event, so it can never sit outside the image,
//! not even for a single frame.

use crate::config::CropConfig;
use crate::geometry::{Point, Rect, clamp_point, clamp_rect_to_bounds, normalize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    NW,
    NE,
    SW,
    SE,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::NW, Corner::NE, Corner::SW, Corner::SE];

    pub fn position(self, rect: &Rect) -> Point {
        match self {
            Corner::NW => Point::new(rect.x, rect.y),
            Corner::NE => Point::new(rect.right(), rect.y),
            Corner::SW => Point::new(rect.x, rect.bottom()),
            Corner::SE => Point::new(rect.right(), rect.bottom()),
        }
    }

    fn moves_left_edge(self) -> bool {
        matches!(self, Corner::NW | Corner::SW)
    }

    fn moves_top_edge(self) -> bool {
        matches!(self, Corner::NW | Corner::NE)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionLimits {
    pub min_commit_size: f32,
    pub min_resize_size: f32,
    pub handle_tolerance: f32,
}

impl Default for SelectionLimits {
    fn default() -> Self {
        Self::from(&CropConfig::default())
    }
}

impl From<&CropConfig> for SelectionLimits {
    fn from(config: &CropConfig) -> Self {
        Self {
            min_commit_size: config.min_commit_size,
            min_resize_size: config.min_resize_size,
            handle_tolerance: config.handle_tolerance,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SelectionState {
    #[default]
    Idle,
    /// Growing from `anchor` towards the pointer.
    Drafting { anchor: Point, rect: Rect },
    Committed { rect: Rect },
    Moving { rect: Rect, grab_offset: Point },
    Resizing { rect: Rect, corner: Corner },
}

impl SelectionState {
    pub fn phase(&self) -> &'static str {
        match self {
            SelectionState::Idle => "idle",
            SelectionState::Drafting { .. } => "drafting",
            SelectionState::Committed { .. } => "committed",
            SelectionState::Moving { .. } => "moving",
            SelectionState::Resizing { .. } => "resizing",
        }
    }

    pub fn rect(&self) -> Option<Rect> {
        match *self {
            SelectionState::Idle => None,
            SelectionState::Drafting { rect, .. }
            | SelectionState::Committed { rect }
            | SelectionState::Moving { rect, .. }
            | SelectionState::Resizing { rect, .. } => Some(rect),
        }
    }

    /// The rectangle a crop can be taken from. Moving and resizing count,
    /// since a pointer-up settles them into `Committed` unchanged.
    pub fn settled_rect(&self) -> Option<Rect> {
        match *self {
            SelectionState::Committed { rect }
            | SelectionState::Moving { rect, .. }
            | SelectionState::Resizing { rect, .. } => Some(rect),
            _ => None,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, SelectionState::Committed { .. })
    }

    /// Corner handle under `p`, only while a committed rectangle is shown.
    pub fn handle_at(&self, p: Point, tolerance: f32) -> Option<Corner> {
        let SelectionState::Committed { rect } = self else {
            return None;
        };
        Corner::ALL.into_iter().find(|corner| {
            let c = corner.position(rect);
            let (dx, dy) = (p.x - c.x, p.y - c.y);
            (dx * dx + dy * dy).sqrt() <= tolerance
        })
    }

    /// Pull any rectangle back inside `frame`, e.g. after the container or
    /// the zoom changed between events.
    pub fn reclamp(self, frame: Rect) -> Self {
        let clamp = |rect| clamp_rect_to_bounds(rect, frame);
        match self {
            SelectionState::Idle => SelectionState::Idle,
            SelectionState::Drafting { anchor, rect } => SelectionState::Drafting {
                anchor,
                rect: clamp(rect),
            },
            SelectionState::Committed { rect } => SelectionState::Committed { rect: clamp(rect) },
            SelectionState::Moving { rect, grab_offset } => SelectionState::Moving {
                rect: clamp(rect),
                grab_offset,
            },
            SelectionState::Resizing { rect, corner } => SelectionState::Resizing {
                rect: clamp(rect),
                corner,
            },
        }
    }

    pub fn pointer_down(self, p: Point, frame: Rect, limits: &SelectionLimits) -> Self {
        let state = self.reclamp(frame);

        // Handles straddle the rectangle edge, so they are tested before the
        // image-bounds guard.
        if let SelectionState::Committed { rect } = state {
            if let Some(corner) = state.handle_at(p, limits.handle_tolerance) {
                return SelectionState::Resizing { rect, corner };
            }
        }

        if !frame.contains(p) {
            return state;
        }

        match state {
            SelectionState::Committed { rect } if rect.contains(p) => SelectionState::Moving {
                rect,
                grab_offset: p.offset_by(rect.origin()),
            },
            SelectionState::Idle | SelectionState::Committed { .. } => SelectionState::Drafting {
                anchor: p,
                rect: Rect::new(p.x, p.y, 0.0, 0.0),
            },
            gesture => gesture,
        }
    }

    pub fn pointer_move(self, p: Point, frame: Rect, limits: &SelectionLimits) -> Self {
        match self {
            SelectionState::Drafting { anchor, .. } => SelectionState::Drafting {
                anchor,
                rect: clamp_rect_to_bounds(normalize(anchor, clamp_point(p, frame)), frame),
            },
            SelectionState::Moving { rect, grab_offset } => {
                let moved = Rect::new(p.x - grab_offset.x, p.y - grab_offset.y, rect.width, rect.height);
                SelectionState::Moving {
                    rect: clamp_rect_to_bounds(moved, frame),
                    grab_offset,
                }
            }
            SelectionState::Resizing { rect, corner } => SelectionState::Resizing {
                rect: resize_from_corner(rect, corner, p, frame, limits.min_resize_size),
                corner,
            },
            settled => settled.reclamp(frame),
        }
    }

    pub fn pointer_up(self, frame: Rect, limits: &SelectionLimits) -> Self {
        match self.reclamp(frame) {
            SelectionState::Drafting { rect, .. }
                if rect.width > limits.min_commit_size && rect.height > limits.min_commit_size =>
            {
                SelectionState::Committed { rect }
            }
            SelectionState::Drafting { rect, .. } => {
                tracing::debug!(?rect, "selection too small; discarded");
                SelectionState::Idle
            }
            SelectionState::Moving { rect, .. } | SelectionState::Resizing { rect, .. } => {
                SelectionState::Committed { rect }
            }
            settled => settled,
        }
    }
}

/// Drag `corner` to `p` while the opposite corner stays put.
///
/// Width and height are floored at `min_size`; when the frame itself is
/// smaller than that, containment wins.
fn resize_from_corner(rect: Rect, corner: Corner, p: Point, frame: Rect, min_size: f32) -> Rect {
    let Point { x: px, y: py } = clamp_point(p, frame);

    let (left, width) = if corner.moves_left_edge() {
        let right = rect.right();
        let width = (right - px).max(min_size);
        (right - width, width)
    } else {
        (rect.x, (px - rect.x).max(min_size))
    };
    let (top, height) = if corner.moves_top_edge() {
        let bottom = rect.bottom();
        let height = (bottom - py).max(min_size);
        (bottom - height, height)
    } else {
        (rect.y, (py - rect.y).max(min_size))
    };

    clamp_rect_to_bounds(Rect::new(left, top, width, height), frame)
}
