use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CropError, CropResult};

pub const CONFIG_FILE_NAME: &str = "regioncrop.toml";

/// Tunables for one cropping session. Every field has a default, so an empty
/// file (or no file at all) yields [`CropConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    pub zoom_default: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub zoom_step: f32,
    /// A drafted rectangle must exceed this on both axes to be committed.
    pub min_commit_size: f32,
    /// Floor applied to width and height while resizing from a corner.
    pub min_resize_size: f32,
    /// Distance from a corner, in viewport units, that still grabs the handle.
    pub handle_tolerance: f32,
    /// Width of the initial selection as a fraction of the display width.
    pub default_selection_fraction: f32,
    /// Height-to-width ratio of the initial selection.
    pub default_selection_aspect: f32,
    pub default_selection_max_width: Option<f32>,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            zoom_default: 1.0,
            zoom_min: 0.1,
            zoom_max: 10.0,
            zoom_step: 0.1,
            min_commit_size: 10.0,
            min_resize_size: 20.0,
            handle_tolerance: 10.0,
            default_selection_fraction: 0.8,
            default_selection_aspect: 0.75,
            default_selection_max_width: None,
        }
    }
}

impl CropConfig {
    pub fn validate(&self) -> CropResult<()> {
        let fields = [
            ("zoom_default", self.zoom_default),
            ("zoom_min", self.zoom_min),
            ("zoom_max", self.zoom_max),
            ("zoom_step", self.zoom_step),
            ("min_commit_size", self.min_commit_size),
            ("min_resize_size", self.min_resize_size),
            ("handle_tolerance", self.handle_tolerance),
            ("default_selection_fraction", self.default_selection_fraction),
            ("default_selection_aspect", self.default_selection_aspect),
        ];
        let max_width = self
            .default_selection_max_width
            .map(|w| ("default_selection_max_width", w));
        if let Some((name, value)) = fields
            .into_iter()
            .chain(max_width)
            .find(|(_, v)| !v.is_finite())
        {
            return Err(CropError::Config(format!("{name} must be finite, got {value}")));
        }
        if !(self.zoom_min > 0.0 && self.zoom_min <= self.zoom_max) {
            return Err(CropError::Config(format!(
                "zoom range [{}, {}] is empty or non-positive",
                self.zoom_min, self.zoom_max
            )));
        }
        if !(self.zoom_min..=self.zoom_max).contains(&self.zoom_default) {
            return Err(CropError::Config(format!(
                "zoom_default {} outside [{}, {}]",
                self.zoom_default, self.zoom_min, self.zoom_max
            )));
        }
        if self.zoom_step <= 0.0 {
            return Err(CropError::Config("zoom_step must be positive".into()));
        }
        if self.min_commit_size < 0.0 || self.min_resize_size < 0.0 || self.handle_tolerance < 0.0
        {
            return Err(CropError::Config(
                "size thresholds and handle tolerance must be non-negative".into(),
            ));
        }
        if !(self.default_selection_fraction > 0.0 && self.default_selection_fraction <= 1.0) {
            return Err(CropError::Config(
                "default_selection_fraction must be in (0, 1]".into(),
            ));
        }
        if self.default_selection_aspect <= 0.0 {
            return Err(CropError::Config(
                "default_selection_aspect must be positive".into(),
            ));
        }
        if self.default_selection_max_width.is_some_and(|w| w <= 0.0) {
            return Err(CropError::Config(
                "default_selection_max_width must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Some(candidate);
            }
        }
    }

    let candidate = std::env::current_dir().ok()?.join(CONFIG_FILE_NAME);
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Some(candidate);
    }
    None
}

/// Load `regioncrop.toml` from next to the executable or the working
/// directory, falling back to defaults when neither exists.
pub fn load_config() -> CropResult<CropConfig> {
    match resolve_config_path() {
        Some(path) => load_config_from(&path),
        None => {
            tracing::debug!("no config file found; using defaults");
            Ok(CropConfig::default())
        }
    }
}

pub fn load_config_from(path: &Path) -> CropResult<CropConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: CropConfig = toml::from_str(&content)?;
    config.validate()?;
    tracing::info!(path = %path.display(), zoom = config.zoom_default, "config loaded");
    Ok(config)
}

pub fn save_config_to(path: &Path, config: &CropConfig) -> CropResult<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = CropConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.zoom_default, 1.0);
        assert_eq!(cfg.min_resize_size, 20.0);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "handle_tolerance = 6.0\ndefault_selection_max_width = 300.0\n")
            .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.handle_tolerance, 6.0);
        assert_eq!(cfg.default_selection_max_width, Some(300.0));
        assert_eq!(cfg.zoom_max, 10.0);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let cfg = CropConfig {
            zoom_step: 0.25,
            min_commit_size: 4.0,
            ..Default::default()
        };
        save_config_to(&path, &cfg).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }

    #[test]
    fn rejects_default_zoom_outside_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "zoom_default = 20.0\n").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(CropError::Config(_))
        ));
    }

    #[test]
    fn rejects_nan_and_infinite_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "zoom_step = nan\n").unwrap();
        assert!(matches!(load_config_from(&path), Err(CropError::Config(_))));

        std::fs::write(&path, "min_commit_size = nan\n").unwrap();
        assert!(matches!(load_config_from(&path), Err(CropError::Config(_))));

        std::fs::write(&path, "default_selection_max_width = inf\n").unwrap();
        assert!(matches!(load_config_from(&path), Err(CropError::Config(_))));

        let cfg = CropConfig {
            zoom_max: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(CropError::Config(_))));
    }

    #[test]
    fn rejects_inverted_zoom_range() {
        let cfg = CropConfig {
            zoom_min: 5.0,
            zoom_max: 1.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(CropError::Config(_))));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "zoom_step = \"fast\"\n").unwrap();
        assert!(matches!(load_config_from(&path), Err(CropError::TomlDe(_))));
    }
}
