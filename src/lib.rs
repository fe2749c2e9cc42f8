//! gridsplit: cut an image into a confirmed grid of tiles.
//!
//! A session runs strictly in order:
//! Load → Grid → Preview → Confirm → Crop & Export
//!
//! # Architecture
//!
//! - **Geometry**: floor-division grid, rectangular and circular-clipped cell bounds
//! - **Preview**: cut lines and circles drawn on a throwaway copy via `imageproc`
//! - **Confirm**: one-key accept/reject behind the [`confirm::PreviewSurface`] trait
//! - **Annotate**: mean BT.601 brightness stamped with a bitmap font
//! - **Export**: row-major crop and write into an [`export::OutputSession`]

pub mod annotate;
pub mod config;
pub mod confirm;
pub mod console;
pub mod error;
pub mod export;
pub mod geometry;
pub mod paths;
pub mod preview;
pub mod samples;
pub mod splitter;

pub use config::SplitConfig;
pub use confirm::{ConfirmKeys, Decision, PreviewSurface, RejectReason};
pub use error::{Result, SplitError};
pub use export::{ExportReport, OutputFormat, OutputPolicy, OutputSession};
pub use geometry::{CellRect, CropMode, GridSpec, RemainderPolicy};
pub use splitter::{GridSplitter, SplitOutcome};
