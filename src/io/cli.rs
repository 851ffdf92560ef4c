//! Command-line interface for building tile stores and composing mosaics

use crate::dataset::ingest::BatchIngestor;
use crate::dataset::store;
use crate::dataset::tile::TileShape;
use crate::io::configuration::{
    BATCH_FILE_PREFIX, DEFAULT_LOG_SPEC, DEFAULT_STORE_FILE, IngestConfig, OUTPUT_EXTENSION,
    OUTPUT_SUFFIX, PHOTO_EXTENSIONS, TILE_CHANNELS, TILE_HEIGHT, TILE_WIDTH,
};
use crate::io::error::{Result, WithPath, invalid_parameter};
use crate::io::image::{load_photo, save_image};
use crate::io::progress::ProgressManager;
use crate::mosaic::MosaicContext;
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Clone, Debug)]
#[command(name = "photomosaic")]
#[command(
    author,
    version,
    about = "Build tile datasets and recompose photos as tile mosaics"
)]
/// Command-line arguments for the photomosaic tool
pub struct Cli {
    /// Operation to run
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log filter, e.g. `info` or `photomosaic=debug` (RUST_LOG overrides)
    #[arg(long, global = true, default_value = DEFAULT_LOG_SPEC)]
    pub log_level: String,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Available operations
#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Ingest pickled batches and write the tile store
    Build(BuildArgs),
    /// Recompose photos from tiles in the store
    Compose(ComposeArgs),
    /// Summarize the contents of a tile store
    Inspect(InspectArgs),
}

/// Arguments for `build`
#[derive(Args, Clone, Debug)]
pub struct BuildArgs {
    /// Directory containing the batch files
    #[arg(value_name = "BATCH_DIR")]
    pub batch_dir: PathBuf,

    /// Store file to write
    #[arg(short, long, default_value = DEFAULT_STORE_FILE)]
    pub output: PathBuf,

    /// File name prefix identifying batch files
    #[arg(long, default_value = BATCH_FILE_PREFIX)]
    pub prefix: String,

    /// Tile width in pixels
    #[arg(long, default_value_t = TILE_WIDTH)]
    pub tile_width: usize,

    /// Tile height in pixels
    #[arg(long, default_value_t = TILE_HEIGHT)]
    pub tile_height: usize,

    /// Channels per tile (1 or 3)
    #[arg(long, default_value_t = TILE_CHANNELS)]
    pub channels: usize,
}

impl BuildArgs {
    /// Ingestion settings described by these arguments
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            batch_prefix: self.prefix.clone(),
            shape: TileShape::new(self.tile_height, self.tile_width, self.channels),
        }
    }
}

/// Arguments for `compose`
#[derive(Args, Clone, Debug)]
pub struct ComposeArgs {
    /// Photo file or directory of photos to recompose
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Tile store to read
    #[arg(short, long, default_value = DEFAULT_STORE_FILE)]
    pub store: PathBuf,

    /// Directory for composed mosaics (defaults to each photo's directory)
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,

    /// Process photos even if their mosaic already exists
    #[arg(short, long)]
    pub no_skip: bool,
}

impl ComposeArgs {
    /// Check if existing mosaics should be skipped
    pub const fn skip_existing(&self) -> bool {
        !self.no_skip
    }
}

/// Arguments for `inspect`
#[derive(Args, Clone, Debug)]
pub struct InspectArgs {
    /// Tile store to read
    #[arg(short, long, default_value = DEFAULT_STORE_FILE)]
    pub store: PathBuf,
}

/// Runs the parsed command with progress tracking
pub struct CommandRunner {
    cli: Cli,
    progress: ProgressManager,
}

impl CommandRunner {
    /// Create a runner for the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress = if cli.should_show_progress() {
            ProgressManager::new()
        } else {
            ProgressManager::hidden()
        };

        Self { cli, progress }
    }

    /// Run the selected command
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails; see [`Self::build`],
    /// [`Self::compose`], and [`Self::inspect`]
    pub fn run(&mut self) -> Result<()> {
        match self.cli.command.clone() {
            Command::Build(args) => self.build(&args),
            Command::Compose(args) => self.compose(&args),
            Command::Inspect(args) => Self::inspect(&args),
        }
    }

    /// Ingest the batch directory and write the tile store
    ///
    /// # Errors
    ///
    /// Returns an error if ingestion fails or the store cannot be written
    pub fn build(&mut self, args: &BuildArgs) -> Result<()> {
        let start_time = Instant::now();
        let ingestor = BatchIngestor::new(args.ingest_config())?;
        let batches = ingestor.discover(&args.batch_dir)?;

        self.progress.begin("batches", batches.len());
        let progress = &self.progress;
        let corpus = ingestor.ingest_paths(&args.batch_dir, &batches, |batch| {
            progress.advance(&batch.source);
        })?;
        self.progress.finish(&format!("{} tiles", corpus.len()));

        store::write(&corpus, &args.output)?;
        info!(
            "Built store {} with {} tiles in {:.2?}",
            args.output.display(),
            corpus.len(),
            start_time.elapsed()
        );
        Ok(())
    }

    /// Recompose every target photo against one shared context
    ///
    /// # Errors
    ///
    /// Returns an error if the target is invalid, the store cannot be read,
    /// or any photo fails to load, compose, or save
    pub fn compose(&mut self, args: &ComposeArgs) -> Result<()> {
        let photos = collect_photos(args)?;
        if photos.is_empty() {
            info!("No photos to compose in {}", args.target.display());
            return Ok(());
        }

        let context = MosaicContext::open(&args.store)?;

        self.progress.begin("photos", photos.len());
        for photo in &photos {
            let start_time = Instant::now();
            let source = load_photo(photo)?;
            let mosaic = context.compose_image(&source)?;
            let output_path = mosaic_output_path(photo, args.output_dir.as_deref());
            save_image(&mosaic, &output_path)?;
            self.progress.advance(photo);
            info!(
                "Composed {} -> {} ({}x{}) in {:.2?}",
                photo.display(),
                output_path.display(),
                mosaic.width(),
                mosaic.height(),
                start_time.elapsed()
            );
        }
        let composed = self.progress.position();
        self.progress.finish(&format!("{composed} mosaics"));

        Ok(())
    }

    /// Log a summary of the store
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read
    pub fn inspect(args: &InspectArgs) -> Result<()> {
        let dataset = store::read(&args.store)?;
        let shape = dataset.tile_shape();
        info!(
            "{}: {} tiles of {}x{}x{}",
            args.store.display(),
            dataset.len(),
            shape.height,
            shape.width,
            shape.channels
        );
        for (label, count) in dataset.label_histogram() {
            info!("  label {label:>3}: {count} tiles");
        }
        Ok(())
    }
}

/// Whether `path` has one of the accepted photo extensions
pub fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            PHOTO_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Where the mosaic of `input` is written
pub fn mosaic_output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let output_name = format!(
        "{}{}.{}",
        stem.to_string_lossy(),
        OUTPUT_SUFFIX,
        OUTPUT_EXTENSION
    );

    match output_dir.or_else(|| input.parent()) {
        Some(directory) => directory.join(output_name),
        None => PathBuf::from(output_name),
    }
}

/// Photos named by the compose target, in path order
///
/// Directory targets skip previously composed mosaics and, unless
/// `--no-skip` is given, photos whose mosaic already exists.
///
/// # Errors
///
/// Returns an error if the target is neither a photo nor a readable directory
pub fn collect_photos(args: &ComposeArgs) -> Result<Vec<PathBuf>> {
    let target = &args.target;
    if target.is_file() {
        if !is_photo(target) {
            return Err(invalid_parameter(
                "target",
                &target.display(),
                &format!("photo must have one of the extensions {PHOTO_EXTENSIONS:?}"),
            ));
        }
        return Ok(should_process(args, target)
            .then(|| target.clone())
            .into_iter()
            .collect());
    }

    if !target.is_dir() {
        return Err(invalid_parameter(
            "target",
            &target.display(),
            &"target must be a photo or a directory",
        ));
    }

    let mut photos = Vec::new();
    for entry in std::fs::read_dir(target).with_path(target, "list photo directory")? {
        let path = entry.with_path(target, "list photo directory")?.path();
        if path.is_file() && is_photo(&path) && !is_mosaic(&path) && should_process(args, &path) {
            photos.push(path);
        }
    }
    photos.sort();
    Ok(photos)
}

fn is_mosaic(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.ends_with(OUTPUT_SUFFIX))
}

fn should_process(args: &ComposeArgs, photo: &Path) -> bool {
    if !args.skip_existing() {
        return true;
    }

    let output_path = mosaic_output_path(photo, args.output_dir.as_deref());
    if output_path.exists() {
        warn!("Skipping: {} (mosaic exists)", photo.display());
        false
    } else {
        true
    }
}
