use crate::config::CropConfig;

/// Scale applied to the displayed image on top of its fit-to-container size.
///
/// The controller knows nothing about the selection: the viewport model
/// re-measures layout on every event, so the next pointer event observes the
/// new display frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Zoom {
    scale: f32,
    default: f32,
    min: f32,
    max: f32,
    step: f32,
}

impl Default for Zoom {
    fn default() -> Self {
        Self::from_config(&CropConfig::default())
    }
}

impl Zoom {
    /// Expects a validated config. An inverted range is swapped rather than
    /// trusted, so stepping never panics.
    pub fn from_config(config: &CropConfig) -> Self {
        let min = config.zoom_min.min(config.zoom_max);
        let max = config.zoom_min.max(config.zoom_max);
        Self {
            scale: config.zoom_default,
            default: config.zoom_default,
            min,
            max,
            step: config.zoom_step,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set(self.scale + self.step)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set(self.scale - self.step)
    }

    /// Back to the configured default. Callers reset the selection too.
    pub fn reset(&mut self) -> f32 {
        self.scale = self.default;
        tracing::debug!(scale = self.scale, "zoom reset");
        self.scale
    }

    pub fn can_zoom_in(&self) -> bool {
        self.scale < self.max
    }

    pub fn can_zoom_out(&self) -> bool {
        self.scale > self.min
    }

    fn set(&mut self, scale: f32) -> f32 {
        // Repeated ±0.1 steps drift in binary floating point.
        let rounded = (scale * 1000.0).round() / 1000.0;
        self.scale = rounded.max(self.min).min(self.max);
        tracing::debug!(scale = self.scale, "zoom changed");
        self.scale
    }
}
