//! annoconv: convert COCO annotations to Pascal VOC.
//!
//! annoconv reads a COCO dataset laid out as `<data_dir>/annotations/*.json`
//! and writes one Pascal VOC XML file per image into
//! `<out_dir>/PASCAL_VOC_<YYYYMMDD_HHMMSS>/Annotations/`.
//!
//! # Modules
//!
//! - [`annotations`]: COCO reader, Pascal VOC document/writer, category lookup
//! - [`conversion`]: the conversion run and its report
//! - [`error`]: Error types for annoconv operations

pub mod annotations;
pub mod conversion;
pub mod error;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::info;

pub use error::AnnoconvError;

use conversion::{ConvertOptions, ErrorPolicy, FileNameMode, Format};

/// Convert the given dataset annotation to another format.
#[derive(Parser)]
#[command(name = "annoconv")]
#[command(version, about)]
struct Cli {
    /// Path to the dataset to convert.
    #[arg(long = "data_dir", visible_alias = "data-dir", default_value = "./")]
    data_dir: PathBuf,

    /// Annotation format of the input dataset (COCO).
    #[arg(long = "in_format", visible_alias = "in-format", default_value = "")]
    in_format: String,

    /// Annotation format of the output dataset (PASCALVOC).
    #[arg(long = "out_format", visible_alias = "out-format", default_value = "")]
    out_format: String,

    /// Output directory (default: same as the input directory).
    #[arg(long = "out_dir", visible_alias = "out-dir", env = "ANNOCONV_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// How XML file names are derived from image file names.
    #[arg(long, value_enum, default_value_t = CliFileNameMode::FirstDot)]
    file_name_mode: CliFileNameMode,

    /// Skip COCO files that cannot be read or parsed instead of aborting.
    #[arg(long)]
    continue_on_error: bool,

    /// Do not draw a progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Output format for the conversion report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

/// File name derivation, as spelled on the command line.
///
/// Mirrors [`FileNameMode`] but keeps clap out of the library types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CliFileNameMode {
    /// Keep the text before the first '.' (photo.v2.jpg -> photo.xml).
    FirstDot,
    /// Replace only the last extension (photo.v2.jpg -> photo.v2.xml).
    LastExtension,
}

impl From<CliFileNameMode> for FileNameMode {
    fn from(mode: CliFileNameMode) -> Self {
        match mode {
            CliFileNameMode::FirstDot => FileNameMode::FirstDot,
            CliFileNameMode::LastExtension => FileNameMode::LastExtension,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Run the annoconv CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), AnnoconvError> {
    init_logger();
    let cli = Cli::parse();

    let in_format = Format::parse_input(&cli.in_format)?;
    let out_format = Format::parse_output(&cli.out_format)?;

    // If no output directory is provided, write next to the input.
    let out_dir = cli.out_dir.clone().unwrap_or_else(|| cli.data_dir.clone());

    let opts = ConvertOptions {
        file_name_mode: cli.file_name_mode.into(),
        error_policy: if cli.continue_on_error {
            ErrorPolicy::Continue
        } else {
            ErrorPolicy::Abort
        },
        show_progress: !cli.no_progress,
    };

    let report = match (in_format, out_format) {
        (Format::Coco, Format::PascalVoc) => {
            info!(
                "Converting {} -> {}: {}",
                in_format.name(),
                out_format.name(),
                cli.data_dir.display()
            );
            conversion::convert(&cli.data_dir, &out_dir, &opts)?
        }
        (from, to) => {
            return Err(AnnoconvError::UnsupportedFormat(format!(
                "conversion {} -> {}",
                from.name(),
                to.name()
            )));
        }
    };

    match cli.report {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|source| AnnoconvError::Io(source.into()))?;
            println!("{}", json);
        }
        ReportFormat::Text => print!("{}", report),
    }

    Ok(())
}

fn init_logger() {
    // A second init (e.g. from an embedding binary) is harmless; keep the first.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
