//! End-to-end splitting session.
//!
//! Load → grid → preview → confirm → export. Nothing touches the output
//! directory until the operator accepts the preview.

use std::path::Path;

use image::RgbImage;

use crate::config::SplitConfig;
use crate::confirm::{self, Decision, PreviewSurface, RejectReason};
use crate::error::{Result, SplitError};
use crate::export::{self, ExportReport, OutputSession};
use crate::geometry::GridSpec;
use crate::preview;

/// How a session ended without error.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitOutcome {
    /// Tiles were written.
    Completed(ExportReport),
    /// The operator rejected the preview; nothing was written.
    Rejected(RejectReason),
}

/// Decode an image file into 8-bit RGB.
///
/// # Errors
///
/// [`SplitError::Decode`] when the file is missing, unreadable, or in an
/// unsupported format.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let decoded = image::open(path).map_err(|source| SplitError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let rgb = decoded.to_rgb8();
    tracing::info!(
        path = %path.display(),
        width = rgb.width(),
        height = rgb.height(),
        "source image loaded"
    );
    Ok(rgb)
}

/// Runs splitting sessions with one validated configuration.
#[derive(Debug, Clone)]
pub struct GridSplitter {
    config: SplitConfig,
}

impl GridSplitter {
    /// # Errors
    ///
    /// [`SplitError::Config`] when the configuration does not validate.
    pub fn new(config: SplitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Grid for `image`.
    pub fn grid(&self, image: &RgbImage, rows: u32, cols: u32) -> Result<GridSpec> {
        let grid = GridSpec::new(image.width(), image.height(), rows, cols)?;
        tracing::debug!(
            rows,
            cols,
            row_height = grid.row_height(),
            col_width = grid.col_width(),
            "grid computed"
        );
        Ok(grid)
    }

    /// Preview overlay for `image` under this configuration.
    pub fn preview(&self, image: &RgbImage, grid: &GridSpec) -> RgbImage {
        preview::render_overlay(
            image,
            grid,
            self.config.crop_mode(),
            &self.config.overlay_style(),
        )
    }

    /// Split an already decoded image.
    ///
    /// The preview is shown on `surface`; on acceptance an output session is
    /// opened under the configured root (named from `now` for timestamped
    /// sessions) and every cell is written.
    pub fn split(
        &self,
        image: &RgbImage,
        rows: u32,
        cols: u32,
        surface: &mut dyn PreviewSurface,
        now: chrono::NaiveDateTime,
    ) -> Result<SplitOutcome> {
        let grid = self.grid(image, rows, cols)?;
        let overlay = self.preview(image, &grid);

        match confirm::confirm(surface, &overlay, self.config.confirm_keys())? {
            Decision::Rejected(reason) => {
                tracing::info!(%reason, "split rejected, nothing written");
                Ok(SplitOutcome::Rejected(reason))
            }
            Decision::Accepted => {
                let output = &self.config.output;
                let session = OutputSession::open(&output.dir, output.policy, now)?;
                let report =
                    export::export_cells(image, &grid, &self.config.export_plan(), &session)?;
                Ok(SplitOutcome::Completed(report))
            }
        }
    }

    /// Load `path` and split it.
    pub fn run(
        &self,
        path: &Path,
        rows: u32,
        cols: u32,
        surface: &mut dyn PreviewSurface,
        now: chrono::NaiveDateTime,
    ) -> Result<SplitOutcome> {
        let image = load_image(path)?;
        self.split(&image, rows, cols, surface, now)
    }
}
