//! End-to-end splitting sessions.
//!
//! These tests drive `GridSplitter` from a source file on disk through
//! preview confirmation to the files in the output directory.

use std::path::{Path, PathBuf};

use gridsplit::annotate::{self, LabelStyle};
use gridsplit::confirm::{ScriptedSurface, ViewerSurface};
use gridsplit::console::Console;
use gridsplit::export::render_cell;
use gridsplit::{
    GridSpec, GridSplitter, OutputFormat, OutputPolicy, RejectReason, RemainderPolicy,
    SplitConfig, SplitOutcome,
};
use image::{Rgb, RgbImage};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now() -> chrono::NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

/// 120 wide, 180 tall, every pixel distinct enough to catch misplaced crops.
fn synthetic() -> RgbImage {
    RgbImage::from_fn(120, 180, |x, y| {
        Rgb([(x * 2) as u8, y as u8, ((x + y) % 256) as u8])
    })
}

fn write_source(dir: &Path) -> PathBuf {
    let path = dir.join("real_img.png");
    synthetic().save(&path).unwrap();
    path
}

fn splitter(output: &Path, policy: OutputPolicy, format: OutputFormat) -> GridSplitter {
    let mut config = SplitConfig::default();
    config.output.dir = output.to_path_buf();
    config.output.policy = policy;
    config.output.format = format;
    GridSplitter::new(config).unwrap()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ---------------------------------------------------------------------------
// Plain rectangular split
// ---------------------------------------------------------------------------

#[test]
fn three_by_four_split_writes_twelve_jpegs() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path());
    let output = tmp.path().join("output");
    let s = splitter(&output, OutputPolicy::Fixed, OutputFormat::Jpeg);

    let mut surface = ScriptedSurface::accepting('c');
    let outcome = s.run(&source, 3, 4, &mut surface, now()).unwrap();
    let SplitOutcome::Completed(report) = outcome else {
        panic!("expected completion");
    };

    assert_eq!(report.artifacts.len(), 12);
    let mut expected = Vec::new();
    for row in 1..=3 {
        for col in 1..=4 {
            expected.push(format!("{row}-{col}.jpg"));
        }
    }
    expected.sort();
    assert_eq!(file_names(&output), expected);

    for artifact in &report.artifacts {
        // row height 180 / 3, column width 120 / 4
        assert_eq!(image::image_dimensions(&artifact.path).unwrap(), (30, 60));
    }
}

#[test]
fn tiles_match_the_grid_rectangles() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path());
    let output = tmp.path().join("output");
    let s = splitter(&output, OutputPolicy::Fixed, OutputFormat::Png);

    let mut surface = ScriptedSurface::accepting('c');
    s.run(&source, 3, 4, &mut surface, now()).unwrap();

    let src = synthetic();
    let tile = image::open(output.join("2-3.png")).unwrap().to_rgb8();
    // cell (1, 2) starts at x = 60, y = 60
    for (x, y, px) in tile.enumerate_pixels() {
        assert_eq!(px, src.get_pixel(60 + x, 60 + y));
    }
}

#[test]
fn absorb_policy_grows_trailing_tiles() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path());
    let output = tmp.path().join("output");
    let mut config = SplitConfig::default();
    config.output.dir = output.clone();
    config.output.policy = OutputPolicy::Fixed;
    config.output.format = OutputFormat::Png;
    config.grid.remainder = RemainderPolicy::Absorb;
    let s = GridSplitter::new(config).unwrap();

    let mut surface = ScriptedSurface::accepting('c');
    s.run(&source, 7, 7, &mut surface, now()).unwrap();

    // 120 / 7 = 17 rem 1, 180 / 7 = 25 rem 5
    assert_eq!(image::image_dimensions(output.join("1-1.png")).unwrap(), (17, 25));
    assert_eq!(image::image_dimensions(output.join("7-7.png")).unwrap(), (18, 30));
}

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

#[test]
fn annotation_changes_only_the_label_region() {
    let src = synthetic();
    let grid = GridSpec::new(120, 180, 3, 4).unwrap();
    let style = LabelStyle::default();

    for (row, col) in grid.cells() {
        let bounds = grid.cell_rect(row, col, RemainderPolicy::Drop);
        let (plain, _) = render_cell(&src, bounds, None);
        let (stamped, label) = render_cell(&src, bounds, Some(&style));
        let label = label.unwrap();
        assert_eq!(label, annotate::format_label(annotate::mean_brightness(&plain)));

        let region = annotate::label_bounds(&label, &style);
        let mut changed = 0;
        for (x, y, px) in stamped.enumerate_pixels() {
            if px != plain.get_pixel(x, y) {
                assert!(region.contains(x, y));
                changed += 1;
            }
        }
        assert!(changed > 0, "no label drawn on cell ({row}, {col})");
    }
}

#[test]
fn annotated_png_tiles_differ_in_top_left_only() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path());

    let plain_dir = tmp.path().join("plain");
    splitter(&plain_dir, OutputPolicy::Fixed, OutputFormat::Png)
        .run(&source, 3, 4, &mut ScriptedSurface::accepting('c'), now())
        .unwrap();

    let labelled_dir = tmp.path().join("labelled");
    let mut config = SplitConfig::default();
    config.output.dir = labelled_dir.clone();
    config.output.policy = OutputPolicy::Fixed;
    config.output.format = OutputFormat::Png;
    config.annotate.enabled = true;
    let SplitOutcome::Completed(report) = GridSplitter::new(config)
        .unwrap()
        .run(&source, 3, 4, &mut ScriptedSurface::accepting('c'), now())
        .unwrap()
    else {
        panic!("expected completion");
    };

    let style = LabelStyle::default();
    for artifact in &report.artifacts {
        let name = artifact.path.file_name().unwrap();
        let plain = image::open(plain_dir.join(name)).unwrap().to_rgb8();
        let labelled = image::open(&artifact.path).unwrap().to_rgb8();
        assert_ne!(plain, labelled);

        let region = annotate::label_bounds(artifact.label.as_deref().unwrap(), &style);
        for (x, y, px) in labelled.enumerate_pixels() {
            if !region.contains(x, y) {
                assert_eq!(px, plain.get_pixel(x, y));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rejection and errors
// ---------------------------------------------------------------------------

#[test]
fn rejected_preview_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path());
    let output = tmp.path().join("output");
    std::fs::create_dir_all(&output).unwrap();
    let s = splitter(&output, OutputPolicy::Replace, OutputFormat::Jpeg);
    std::fs::write(output.join("keep.txt"), "x").unwrap();

    for key in [Some('x'), Some('q'), None] {
        let mut surface = ScriptedSurface::new([key]);
        let outcome = s.run(&source, 3, 4, &mut surface, now()).unwrap();
        assert!(matches!(outcome, SplitOutcome::Rejected(_)));
        assert_eq!(surface.released(), 1);
    }
    // even the destructive policy leaves the directory alone when rejected
    assert_eq!(file_names(&output), vec!["keep.txt"]);

    let mut surface = ScriptedSurface::new([Some('q')]);
    assert_eq!(
        s.run(&source, 3, 4, &mut surface, now()).unwrap(),
        SplitOutcome::Rejected(RejectReason::Cancelled)
    );
}

#[test]
fn typed_word_is_not_a_commit_even_under_replace() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path());
    let output = tmp.path().join("output");
    std::fs::create_dir_all(&output).unwrap();
    std::fs::write(output.join("keep.txt"), "x").unwrap();
    let s = splitter(&output, OutputPolicy::Replace, OutputFormat::Jpeg);

    let console = Console::new("cancel\n".as_bytes(), Vec::new());
    let mut surface = ViewerSurface::new(console).without_viewer();
    let outcome = s.run(&source, 3, 4, &mut surface, now()).unwrap();

    assert_eq!(outcome, SplitOutcome::Rejected(RejectReason::InvalidReply));
    assert_eq!(file_names(&output), vec!["keep.txt"]);
}

#[test]
fn unreadable_source_fails_without_output() {
    let tmp = tempfile::tempdir().unwrap();
    let output = tmp.path().join("output");
    let s = splitter(&output, OutputPolicy::Timestamped, OutputFormat::Jpeg);
    let mut surface = ScriptedSurface::accepting('c');

    let err = s
        .run(&tmp.path().join("missing.png"), 3, 4, &mut surface, now())
        .unwrap_err();
    assert!(matches!(err, gridsplit::SplitError::Decode { .. }));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(surface.displayed(), 0);
    assert!(!output.exists());
}

// ---------------------------------------------------------------------------
// Output directory policies
// ---------------------------------------------------------------------------

#[test]
fn replace_policy_deletes_unrelated_files() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path());
    let output = tmp.path().join("output");
    std::fs::create_dir_all(&output).unwrap();
    std::fs::write(output.join("unrelated.txt"), "old run").unwrap();

    splitter(&output, OutputPolicy::Replace, OutputFormat::Jpeg)
        .run(&source, 3, 4, &mut ScriptedSurface::accepting('c'), now())
        .unwrap();

    assert!(!output.join("unrelated.txt").exists());
    assert_eq!(file_names(&output).len(), 12);
}

#[test]
fn timestamped_policy_keeps_unrelated_files() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path());
    let output = tmp.path().join("output");
    std::fs::create_dir_all(&output).unwrap();
    std::fs::write(output.join("unrelated.txt"), "old run").unwrap();

    let SplitOutcome::Completed(report) =
        splitter(&output, OutputPolicy::Timestamped, OutputFormat::Jpeg)
            .run(&source, 3, 4, &mut ScriptedSurface::accepting('c'), now())
            .unwrap()
    else {
        panic!("expected completion");
    };

    assert_eq!(report.dir, output.join("20261019-093000"));
    assert_eq!(
        std::fs::read_to_string(output.join("unrelated.txt")).unwrap(),
        "old run"
    );
    assert_eq!(file_names(&report.dir).len(), 12);
}

// ---------------------------------------------------------------------------
// Circular-clipped mode
// ---------------------------------------------------------------------------

#[test]
fn circular_mode_writes_clipped_squares() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path());
    let output = tmp.path().join("output");
    let mut config = SplitConfig::default();
    config.output.dir = output.clone();
    config.output.policy = OutputPolicy::Fixed;
    config.crop.shape = gridsplit::config::CropShape::Circle;
    config.crop.radius_ratio = 0.4;
    config.annotate.enabled = true;
    config.annotate.font_scale = 0.3;
    let s = GridSplitter::new(config).unwrap();

    let mut surface = ScriptedSurface::accepting('c');
    let outcome = s.run(&source, 3, 4, &mut surface, now()).unwrap();
    let SplitOutcome::Completed(report) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(report.artifacts.len(), 12);
    for artifact in &report.artifacts {
        // radius floor(min(60, 30) * 0.4) = 12
        assert_eq!(image::image_dimensions(&artifact.path).unwrap(), (24, 24));
        assert!(artifact.label.is_some());
    }
}
