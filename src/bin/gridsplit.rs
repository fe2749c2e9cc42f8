//! CLI binary for gridsplit.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use gridsplit::config::CropShape;
use gridsplit::confirm::{ScriptedSurface, ViewerSurface};
use gridsplit::console::Console;
use gridsplit::{
    GridSplitter, OutputFormat, OutputPolicy, RemainderPolicy, SplitConfig, SplitError,
    SplitOutcome, samples,
};
use tracing_subscriber::EnvFilter;

/// Split an image into a grid of tiles after previewing the cut.
#[derive(Parser)]
#[command(name = "gridsplit", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source image. When omitted, pick one from the samples directory.
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Directory listed when no image is given.
    #[arg(long)]
    samples_dir: Option<PathBuf>,

    /// Number of rows (prompted when not configured).
    #[arg(long)]
    rows: Option<u32>,

    /// Number of columns (prompted when not configured).
    #[arg(long)]
    cols: Option<u32>,

    /// Tile shape.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Circle radius as a fraction of the smaller cell side.
    #[arg(long)]
    radius_ratio: Option<f64>,

    /// Stamp each tile with its mean brightness.
    #[arg(short, long)]
    annotate: bool,

    /// What to do with remainder pixels at the right and bottom edges.
    #[arg(long, value_enum)]
    remainder: Option<RemainderArg>,

    /// Output root directory.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// How the session directory is chosen under the output root.
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Tile file format.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Print the preview path instead of opening a viewer.
    #[arg(long)]
    no_viewer: bool,

    /// Accept the split without showing a preview.
    #[arg(short, long)]
    yes: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Rect,
    Circle,
}

#[derive(Clone, Copy, ValueEnum)]
enum RemainderArg {
    Drop,
    Absorb,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Timestamped,
    Fixed,
    Replace,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Jpeg,
    Png,
    Bmp,
}

impl Cli {
    /// Overlay command-line flags onto the loaded configuration.
    fn apply(&self, config: &mut SplitConfig) {
        if let Some(dir) = &self.samples_dir {
            config.input.samples_dir = dir.clone();
        }
        if let Some(rows) = self.rows {
            config.grid.rows = Some(rows);
        }
        if let Some(cols) = self.cols {
            config.grid.cols = Some(cols);
        }
        if let Some(mode) = self.mode {
            config.crop.shape = match mode {
                ModeArg::Rect => CropShape::Rect,
                ModeArg::Circle => CropShape::Circle,
            };
        }
        if let Some(ratio) = self.radius_ratio {
            config.crop.radius_ratio = ratio;
        }
        if self.annotate {
            config.annotate.enabled = true;
        }
        if let Some(remainder) = self.remainder {
            config.grid.remainder = match remainder {
                RemainderArg::Drop => RemainderPolicy::Drop,
                RemainderArg::Absorb => RemainderPolicy::Absorb,
            };
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(policy) = self.policy {
            config.output.policy = match policy {
                PolicyArg::Timestamped => OutputPolicy::Timestamped,
                PolicyArg::Fixed => OutputPolicy::Fixed,
                PolicyArg::Replace => OutputPolicy::Replace,
            };
        }
        if let Some(format) = self.format {
            config.output.format = match format {
                FormatArg::Jpeg => OutputFormat::Jpeg,
                FormatArg::Png => OutputFormat::Png,
                FormatArg::Bmp => OutputFormat::Bmp,
            };
        }
        if self.no_viewer {
            config.preview.open_viewer = false;
        }
    }
}

fn main() {
    // Logs go to stderr so prompts on stdout stay readable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridsplit=info")),
        )
        .init();

    let cli = Cli::parse();
    let code = match run(&cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> gridsplit::Result<()> {
    let mut config = match &cli.config {
        Some(path) => SplitConfig::from_file(path)?,
        None => SplitConfig::load_or_default()?,
    };
    cli.apply(&mut config);
    let splitter = GridSplitter::new(config)?;
    let config = splitter.config();

    let mut console = Console::stdio();

    let image_path = match &cli.image {
        Some(path) => path.clone(),
        None => choose_sample(&mut console, &config.input.samples_dir)?,
    };
    let image = gridsplit::splitter::load_image(&image_path)?;

    let rows = match config.grid.rows {
        Some(rows) => rows,
        None => console.prompt_positive("Rows")?,
    };
    let cols = match config.grid.cols {
        Some(cols) => cols,
        None => console.prompt_positive("Columns")?,
    };

    if config.output.policy.is_destructive() {
        console.say(format!(
            "Warning: {} and everything in it will be deleted when you accept.",
            config.output.dir.display()
        ))?;
    }

    let now = chrono::Local::now().naive_local();
    let outcome = if cli.yes {
        let mut surface = ScriptedSurface::accepting(config.preview.commit_key);
        splitter.split(&image, rows, cols, &mut surface, now)
    } else {
        let mut surface = ViewerSurface::new(console);
        if !config.preview.open_viewer {
            surface = surface.without_viewer();
        }
        let outcome = splitter.split(&image, rows, cols, &mut surface, now);
        console = surface.into_console();
        outcome
    };

    match outcome {
        Ok(SplitOutcome::Completed(report)) => {
            console.say(format!(
                "Saved {} tile(s) to {}",
                report.artifacts.len(),
                report.dir.display()
            ))?;
            if report.skipped > 0 {
                console.say(format!("Skipped {} empty cell(s)", report.skipped))?;
            }
            Ok(())
        }
        Ok(SplitOutcome::Rejected(reason)) => {
            console.say(format!("Split not saved: {reason}. Nothing was written."))?;
            Ok(())
        }
        Err(e @ SplitError::Write { .. }) => {
            console.say("Tiles written before the failure were left in place.")?;
            Err(e)
        }
        Err(e) => Err(e),
    }
}

fn choose_sample<R, W>(
    console: &mut Console<R, W>,
    dir: &std::path::Path,
) -> gridsplit::Result<PathBuf>
where
    R: std::io::BufRead,
    W: std::io::Write,
{
    let mut images = samples::list_images(dir)?;
    console.say(format!("Images in {}:", dir.display()))?;
    for line in samples::menu_lines(&images) {
        console.say(line)?;
    }
    let index = console.prompt_selection(images.len())?;
    Ok(images.swap_remove(index))
}
