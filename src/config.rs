//! Configuration for a splitting run.
//!
//! Every value has a default; an optional TOML file at
//! [`SplitConfig::default_config_path`] overrides them, and command-line
//! flags override the file.

use std::path::{Path, PathBuf};

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::annotate::LabelStyle;
use crate::confirm::ConfirmKeys;
use crate::error::{Result, SplitError};
use crate::export::{ExportPlan, OutputFormat, OutputPolicy};
use crate::geometry::{CropMode, RemainderPolicy};
use crate::preview::OverlayStyle;

/// Largest accepted label font scale (16 px font cells).
pub const MAX_FONT_SCALE: f32 = 4.0;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Grid size and remainder handling.
    pub grid: GridConfig,
    /// Tile shape.
    pub crop: CropConfig,
    /// Brightness labels.
    pub annotate: AnnotateConfig,
    /// Preview overlay and confirmation keys.
    pub preview: PreviewConfig,
    /// Where and how tiles are written.
    pub output: OutputConfig,
    /// Where source images are listed from.
    pub input: InputConfig,
}

/// Grid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of rows (None = ask the operator).
    pub rows: Option<u32>,
    /// Number of columns (None = ask the operator).
    pub cols: Option<u32>,
    /// What happens to remainder pixels at the trailing edges.
    pub remainder: RemainderPolicy,
}

/// Shape of each cut-out tile.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropShape {
    /// Plain grid rectangles.
    #[default]
    Rect,
    /// Squares around each cell's inscribed circle, clipped to the image.
    Circle,
}

/// Crop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    pub shape: CropShape,
    /// Circle radius as a fraction of the smaller cell side, in `(0, 1]`.
    ///
    /// Values between 0.15 and 0.40 keep circles clear of the cut lines.
    pub radius_ratio: f64,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            shape: CropShape::Rect,
            radius_ratio: 0.3,
        }
    }
}

/// Brightness label configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotateConfig {
    /// Stamp each tile with its mean brightness.
    pub enabled: bool,
    /// Font scale, typically 0.3 to 0.5.
    pub font_scale: f32,
    /// Text baseline origin `[x, y]` inside the tile.
    pub origin: [u32; 2],
    /// Text colour `[r, g, b]`.
    pub color: [u8; 3],
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            font_scale: 0.5,
            origin: [5, 20],
            color: [255, 0, 0],
        }
    }
}

/// Preview configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Cut line colour `[r, g, b]`.
    pub line_color: [u8; 3],
    /// Circle colour `[r, g, b]`.
    pub circle_color: [u8; 3],
    /// Stroke width in pixels.
    pub line_width: u32,
    /// Key that accepts the split.
    pub commit_key: char,
    /// Key that cancels the split.
    pub cancel_key: char,
    /// Launch the system image viewer for the preview.
    pub open_viewer: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            line_color: [0, 0, 255],
            circle_color: [255, 0, 0],
            line_width: 2,
            commit_key: 'c',
            cancel_key: 'q',
            open_viewer: true,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output root directory.
    pub dir: PathBuf,
    pub policy: OutputPolicy,
    pub format: OutputFormat,
    /// JPEG quality, 1 to 100.
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: crate::paths::output_dir(),
            policy: OutputPolicy::Timestamped,
            format: OutputFormat::Jpeg,
            jpeg_quality: 95,
        }
    }
}

/// Input configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory listed when no image path is given.
    pub samples_dir: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            samples_dir: crate::paths::samples_dir(),
        }
    }
}

impl SplitConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SplitError::Config(e.to_string()))
    }

    /// Load the default config file if it exists, otherwise the defaults.
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_config_path();
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading config file");
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SplitError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/gridsplit/config.toml`.
    pub fn default_config_path() -> PathBuf {
        crate::paths::config_file()
    }

    /// Check values the type system cannot.
    pub fn validate(&self) -> Result<()> {
        if self.grid.rows == Some(0) || self.grid.cols == Some(0) {
            return Err(SplitError::Config("rows and cols must be positive".to_owned()));
        }
        self.crop_mode().validate()?;
        let scale = self.annotate.font_scale;
        if scale.is_nan() || scale <= 0.0 || scale > MAX_FONT_SCALE {
            return Err(SplitError::Config(format!(
                "font scale must be in (0, {MAX_FONT_SCALE}], got {scale}"
            )));
        }
        if self.preview.line_width == 0 {
            return Err(SplitError::Config("line width must be at least 1".to_owned()));
        }
        if self
            .preview
            .commit_key
            .eq_ignore_ascii_case(&self.preview.cancel_key)
        {
            return Err(SplitError::Config(
                "commit and cancel keys must differ".to_owned(),
            ));
        }
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(SplitError::Config(format!(
                "jpeg quality must be 1-100, got {}",
                self.output.jpeg_quality
            )));
        }
        Ok(())
    }

    pub fn crop_mode(&self) -> CropMode {
        match self.crop.shape {
            CropShape::Rect => CropMode::Rectangular,
            CropShape::Circle => CropMode::CircularClipped {
                radius_ratio: self.crop.radius_ratio,
            },
        }
    }

    pub fn overlay_style(&self) -> OverlayStyle {
        OverlayStyle {
            line_color: Rgb(self.preview.line_color),
            circle_color: Rgb(self.preview.circle_color),
            line_width: self.preview.line_width,
        }
    }

    pub fn label_style(&self) -> LabelStyle {
        LabelStyle {
            scale: self.annotate.font_scale,
            origin: (self.annotate.origin[0], self.annotate.origin[1]),
            color: Rgb(self.annotate.color),
        }
    }

    pub fn confirm_keys(&self) -> ConfirmKeys {
        ConfirmKeys {
            commit: self.preview.commit_key,
            cancel: self.preview.cancel_key,
        }
    }

    pub fn export_plan(&self) -> ExportPlan {
        ExportPlan {
            mode: self.crop_mode(),
            remainder: self.grid.remainder,
            label: self.annotate.enabled.then(|| self.label_style()),
            format: self.output.format,
            jpeg_quality: self.output.jpeg_quality,
        }
    }
}
