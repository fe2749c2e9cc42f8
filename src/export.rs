//! Crop-and-export pipeline and output sessions.
//!
//! Cells are cropped in row-major order into independent buffers, optionally
//! stamped with their mean brightness, and written one by one. Writes are not
//! transactional: when a write fails, the artifacts already on disk stay there
//! and the error reports how many there are.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ImageError, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};

use crate::annotate::{self, LabelStyle};
use crate::error::{Result, SplitError};
use crate::geometry::{CellRect, CropMode, GridSpec, RemainderPolicy};

/// Timestamp layout of session directory names.
pub const SESSION_NAME_FORMAT: &str = "%Y%m%d-%H%M%S";

/// How the session directory relates to the output root.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputPolicy {
    /// A fresh `<root>/<YYYYMMDD-HHMMSS>` subfolder per run.
    #[default]
    Timestamped,
    /// Write straight into `<root>`, keeping whatever is already there.
    Fixed,
    /// Delete `<root>` and everything in it, then write into a fresh `<root>`.
    Replace,
}

impl OutputPolicy {
    /// `true` when opening a session deletes existing files.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::Replace)
    }
}

/// Container format of the written tiles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Bmp,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Bmp => "bmp",
        }
    }
}

/// Filename of a cell, one-based: `row-col.ext`.
pub fn cell_filename(row: u32, col: u32, extension: &str) -> String {
    format!("{}-{}.{extension}", row + 1, col + 1)
}

/// Directory grouping every artifact of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSession {
    dir: PathBuf,
    policy: OutputPolicy,
}

impl OutputSession {
    /// Directory name for a run started at `now`.
    pub fn session_name(now: chrono::NaiveDateTime) -> String {
        now.format(SESSION_NAME_FORMAT).to_string()
    }

    /// Where a session would be written, without touching the filesystem.
    ///
    /// For [`OutputPolicy::Timestamped`] a `-2`, `-3`, ... suffix is added
    /// while the timestamped directory already exists.
    pub fn resolve(root: &Path, policy: OutputPolicy, now: chrono::NaiveDateTime) -> PathBuf {
        match policy {
            OutputPolicy::Fixed | OutputPolicy::Replace => root.to_path_buf(),
            OutputPolicy::Timestamped => {
                let name = Self::session_name(now);
                let mut dir = root.join(&name);
                let mut n = 2;
                while dir.exists() {
                    dir = root.join(format!("{name}-{n}"));
                    n += 1;
                }
                dir
            }
        }
    }

    /// Create (or, under [`OutputPolicy::Replace`], recreate) the session
    /// directory.
    ///
    /// # Errors
    ///
    /// [`SplitError::Config`] when asked to replace a directory that
    /// [`ensure_replaceable`] refuses, [`SplitError::Write`] when the
    /// directory cannot be removed or created.
    pub fn open(root: &Path, policy: OutputPolicy, now: chrono::NaiveDateTime) -> Result<Self> {
        let dir = Self::resolve(root, policy, now);
        let write_err = |source: std::io::Error| SplitError::Write {
            path: dir.clone(),
            written: 0,
            source: ImageError::IoError(source),
        };

        if policy == OutputPolicy::Replace && dir.exists() {
            ensure_replaceable(&dir)?;
            tracing::warn!(dir = %dir.display(), "removing existing output directory");
            std::fs::remove_dir_all(&dir).map_err(write_err)?;
        }
        std::fs::create_dir_all(&dir).map_err(write_err)?;

        tracing::info!(dir = %dir.display(), ?policy, "output session opened");
        Ok(Self { dir, policy })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn policy(&self) -> OutputPolicy {
        self.policy
    }

    /// Path of a cell's artifact inside this session.
    pub fn artifact_path(&self, row: u32, col: u32, format: OutputFormat) -> PathBuf {
        self.dir.join(cell_filename(row, col, format.extension()))
    }
}

/// Everything about a split besides the grid and the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportPlan {
    pub mode: CropMode,
    pub remainder: RemainderPolicy,
    /// Brightness label style, or `None` to write plain crops.
    pub label: Option<LabelStyle>,
    pub format: OutputFormat,
    /// JPEG quality, 1 to 100.
    pub jpeg_quality: u8,
}

impl Default for ExportPlan {
    fn default() -> Self {
        Self {
            mode: CropMode::Rectangular,
            remainder: RemainderPolicy::Drop,
            label: None,
            format: OutputFormat::Jpeg,
            jpeg_quality: 95,
        }
    }
}

/// One written tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub row: u32,
    pub col: u32,
    pub path: PathBuf,
    pub bounds: CellRect,
    /// Brightness label drawn on the tile, if any.
    pub label: Option<String>,
}

/// Result of a completed export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub dir: PathBuf,
    pub artifacts: Vec<Artifact>,
    /// Cells whose bounds were empty and so were not written.
    pub skipped: usize,
}

/// Check that `dir` is safe to delete under [`OutputPolicy::Replace`].
///
/// Refuses paths with `..` components, filesystem roots, and the working
/// directory or any of its ancestors.
pub fn ensure_replaceable(dir: &Path) -> Result<()> {
    let refuse = |why: &str| {
        Err(SplitError::Config(format!(
            "refusing to replace {}: {why}",
            dir.display()
        )))
    };
    if dir.as_os_str().is_empty() {
        return refuse("empty path");
    }
    if dir.components().any(|c| c == Component::ParentDir) {
        return refuse("path contains '..'");
    }
    let canonical = dir.canonicalize()?;
    if canonical.parent().is_none() {
        return refuse("filesystem root");
    }
    if let Ok(cwd) = std::env::current_dir().and_then(|cwd| cwd.canonicalize()) {
        if cwd.starts_with(&canonical) {
            return refuse("contains the working directory");
        }
    }
    Ok(())
}

/// Crop `bounds` out of `image` into a new buffer and label it if asked.
///
/// Returns the tile and the label text.
pub fn render_cell(
    image: &RgbImage,
    bounds: CellRect,
    label: Option<&LabelStyle>,
) -> (RgbImage, Option<String>) {
    let mut tile = image::imageops::crop_imm(
        image,
        bounds.left,
        bounds.top,
        bounds.width(),
        bounds.height(),
    )
    .to_image();
    let text = label.map(|style| annotate::annotate_cell(&mut tile, style));
    (tile, text)
}

fn write_tile(
    tile: &RgbImage,
    path: &Path,
    format: OutputFormat,
    quality: u8,
) -> image::ImageResult<()> {
    let file = File::create(path).map_err(ImageError::IoError)?;
    let mut writer = BufWriter::new(file);
    match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
            tile.write_with_encoder(encoder)?
        }
        OutputFormat::Png => tile.write_to(&mut writer, ImageFormat::Png)?,
        OutputFormat::Bmp => tile.write_to(&mut writer, ImageFormat::Bmp)?,
    }
    writer.flush().map_err(ImageError::IoError)
}

/// Crop, optionally label, and write every cell of `grid` into `session`.
///
/// # Errors
///
/// Stops at the first failed write with [`SplitError::Write`]; tiles written
/// before it are left in place.
pub fn export_cells(
    image: &RgbImage,
    grid: &GridSpec,
    plan: &ExportPlan,
    session: &OutputSession,
) -> Result<ExportReport> {
    let mut artifacts = Vec::with_capacity(grid.cell_count());
    let mut skipped = 0;

    for (row, col) in grid.cells() {
        let bounds = grid.bounds(row, col, plan.mode, plan.remainder);
        if bounds.is_empty() {
            tracing::debug!(row, col, "skipping empty cell");
            skipped += 1;
            continue;
        }

        let (tile, label) = render_cell(image, bounds, plan.label.as_ref());
        let path = session.artifact_path(row, col, plan.format);
        write_tile(&tile, &path, plan.format, plan.jpeg_quality).map_err(|source| {
            SplitError::Write {
                path: path.clone(),
                written: artifacts.len(),
                source,
            }
        })?;

        tracing::debug!(
            path = %path.display(),
            width = tile.width(),
            height = tile.height(),
            label = label.as_deref().unwrap_or(""),
            "tile written"
        );
        artifacts.push(Artifact {
            row,
            col,
            path,
            bounds,
            label,
        });
    }

    tracing::info!(
        dir = %session.dir().display(),
        written = artifacts.len(),
        skipped,
        "export finished"
    );
    Ok(ExportReport {
        dir: session.dir().to_path_buf(),
        artifacts,
        skipped,
    })
}
