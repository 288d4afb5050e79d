//! COCO → Pascal VOC conversion.
//!
//! [`convert`] reads every COCO annotation file found directly inside
//! `<input_dir>/annotations/` and writes one Pascal VOC XML document per
//! image into a fresh `<output_dir>/PASCAL_VOC_<YYYYMMDD_HHMMSS>/Annotations/`
//! directory. The run returns a [`ConversionReport`]; nothing is printed
//! except through `log` and an optional progress bar.

pub mod report;

pub use report::{
    ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity, FileSummary,
};

pub use crate::annotations::io_voc_xml::FileNameMode;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::annotations::io_coco_json::{
    read_coco_json, CocoAnnotation, CocoAnnotationSet, CocoCategory, CocoImage,
};
use crate::annotations::io_voc_xml::{
    derive_xml_file_name, escapes_output_dir, write_voc_xml, VocAnnotation, VocBndBox,
};
use crate::annotations::{resolve_category_name, ImageId, UNKNOWN_CATEGORY};
use crate::error::AnnoconvError;

/// Subdirectory of the input dataset holding COCO JSON files.
pub const COCO_ANNOTATIONS_DIR: &str = "annotations";
/// Subdirectory of the run directory holding Pascal VOC XML files.
pub const VOC_ANNOTATIONS_DIR: &str = "Annotations";
/// Prefix of the per-run output directory.
pub const OUTPUT_DIR_PREFIX: &str = "PASCAL_VOC_";
/// `chrono` format of the per-run timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const COCO_JSON_EXTENSION: &str = "json";

/// Annotation formats known to the converter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Coco,
    PascalVoc,
}

/// Formats accepted as conversion input.
pub const VALID_IN_FORMATS: &[Format] = &[Format::Coco];
/// Formats accepted as conversion output.
pub const VALID_OUT_FORMATS: &[Format] = &[Format::PascalVoc];

impl Format {
    /// Upper-case format name as accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Coco => "COCO",
            Format::PascalVoc => "PASCALVOC",
        }
    }

    /// Parse an input format name (case-insensitive).
    pub fn parse_input(raw: &str) -> Result<Format, AnnoconvError> {
        parse_format(raw, VALID_IN_FORMATS, "input")
    }

    /// Parse an output format name (case-insensitive).
    pub fn parse_output(raw: &str) -> Result<Format, AnnoconvError> {
        parse_format(raw, VALID_OUT_FORMATS, "output")
    }
}

fn parse_format(raw: &str, valid: &[Format], direction: &str) -> Result<Format, AnnoconvError> {
    let upper = raw.trim().to_uppercase();
    valid
        .iter()
        .copied()
        .find(|format| format.name() == upper)
        .ok_or_else(|| {
            let supported: Vec<&str> = valid.iter().map(Format::name).collect();
            AnnoconvError::UnsupportedFormat(format!(
                "{} format '{}' (supported: {})",
                direction,
                upper,
                supported.join(", ")
            ))
        })
}

/// What to do when a COCO file cannot be read or parsed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop the whole run on the first bad file.
    #[default]
    Abort,
    /// Record the file as skipped and carry on with the next one.
    Continue,
}

/// Options for a conversion run.
#[derive(Clone, Debug, Default)]
pub struct ConvertOptions {
    pub file_name_mode: FileNameMode,
    pub error_policy: ErrorPolicy,
    /// Draw a per-file progress bar on stderr.
    pub show_progress: bool,
}

/// Convert a COCO dataset to Pascal VOC, stamping the run with the current
/// local time.
///
/// See [`convert_at`] for the full contract.
pub fn convert(
    input_dir: &Path,
    output_dir: &Path,
    opts: &ConvertOptions,
) -> Result<ConversionReport, AnnoconvError> {
    convert_at(input_dir, output_dir, opts, Local::now().naive_local())
}

/// Convert a COCO dataset to Pascal VOC.
///
/// `started_at` names the run directory
/// (`<output_dir>/PASCAL_VOC_<YYYYMMDD_HHMMSS>/Annotations/`).
///
/// # Errors
/// - [`AnnoconvError::DirectoryNotFound`] if `input_dir` is not a directory.
/// - [`AnnoconvError::MissingAnnotationsDirectory`] if `input_dir` has no
///   `annotations/` subdirectory. Nothing is written in that case.
/// - [`AnnoconvError::OutputDirectoryCollision`] if the run directory
///   already exists.
/// - [`AnnoconvError::AnnotationRead`] / [`AnnoconvError::AnnotationParse`]
///   for a bad COCO file, unless `opts.error_policy` is
///   [`ErrorPolicy::Continue`].
/// - I/O errors while creating directories or writing XML. Files written
///   before the failure are left in place.
///
/// A missing `output_dir` is not an error: the input directory is used
/// instead and the substitution is reported.
pub fn convert_at(
    input_dir: &Path,
    output_dir: &Path,
    opts: &ConvertOptions,
    started_at: NaiveDateTime,
) -> Result<ConversionReport, AnnoconvError> {
    if !input_dir.is_dir() {
        return Err(AnnoconvError::DirectoryNotFound {
            path: input_dir.to_path_buf(),
        });
    }

    let mut report = ConversionReport::new(Format::Coco.name(), Format::PascalVoc.name());
    report.input_dir = input_dir.to_path_buf();

    let output_dir = if output_dir.exists() {
        output_dir
    } else {
        let message = format!(
            "The output directory '{}' does not exist; using the input directory '{}'",
            output_dir.display(),
            input_dir.display()
        );
        warn!("{}", message);
        report.add(ConversionIssue::warning(
            ConversionIssueCode::OutputDirectoryMissing,
            message,
        ));
        input_dir
    };

    let coco_annotations_dir = input_dir.join(COCO_ANNOTATIONS_DIR);
    if !coco_annotations_dir.is_dir() {
        return Err(AnnoconvError::MissingAnnotationsDirectory {
            path: input_dir.to_path_buf(),
        });
    }

    let json_files = collect_json_files(&coco_annotations_dir, &mut report)?;
    report.json_files_found = json_files.len();
    info!(
        "{} JSON file{} found",
        json_files.len(),
        if json_files.len() == 1 { "" } else { "s" }
    );

    let timestamp = started_at.format(TIMESTAMP_FORMAT).to_string();
    let run_dir = output_dir.join(format!("{OUTPUT_DIR_PREFIX}{timestamp}"));
    if run_dir.exists() {
        return Err(AnnoconvError::OutputDirectoryCollision {
            path: run_dir,
            timestamp,
        });
    }

    let voc_annotations_dir = run_dir.join(VOC_ANNOTATIONS_DIR);
    fs::create_dir_all(&voc_annotations_dir)?;
    report.output_dir = voc_annotations_dir.clone();
    info!("Writing Pascal VOC annotations to {}", voc_annotations_dir.display());

    let progress = create_progress_bar(json_files.len() as u64, opts.show_progress);
    let mut written = HashSet::new();

    for json_path in &json_files {
        progress.set_message(display_file_name(json_path));

        let set = match read_coco_json(json_path) {
            Ok(set) => set,
            Err(err) if err.is_per_file() && opts.error_policy == ErrorPolicy::Continue => {
                error!("Skipping annotation file: {}", err);
                report.add(ConversionIssue::error(
                    ConversionIssueCode::AnnotationFileSkipped,
                    err.to_string(),
                ));
                report.files.push(FileSummary {
                    skipped: true,
                    ..FileSummary::new(json_path)
                });
                progress.inc(1);
                continue;
            }
            Err(err) => return Err(err),
        };

        let summary = convert_annotation_set(
            &set,
            json_path,
            &voc_annotations_dir,
            opts.file_name_mode,
            &mut written,
            &mut report,
        )?;
        debug!(
            "{}: {} image(s), {} object(s)",
            json_path.display(),
            summary.images,
            summary.objects
        );
        report.files.push(summary);
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(report)
}

/// Write one XML document per image of a single COCO annotation set.
fn convert_annotation_set(
    set: &CocoAnnotationSet,
    source: &Path,
    voc_annotations_dir: &Path,
    file_name_mode: FileNameMode,
    written: &mut HashSet<PathBuf>,
    report: &mut ConversionReport,
) -> Result<FileSummary, AnnoconvError> {
    let mut summary = FileSummary::new(source);

    let mut annotations_by_image: HashMap<ImageId, Vec<&CocoAnnotation>> = HashMap::new();
    for annotation in &set.annotations {
        annotations_by_image
            .entry(annotation.image_id)
            .or_default()
            .push(annotation);
    }

    for image in &set.images {
        let annotations = annotations_by_image
            .get(&image.id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let doc = build_voc_annotation(image, annotations, &set.categories, source, report);

        let xml_path = voc_annotations_dir.join(derive_xml_file_name(&image.file_name, file_name_mode));
        if escapes_output_dir(&image.file_name) {
            let message = format!(
                "{}: image file name '{}' points outside the output directory; writing {}",
                source.display(),
                image.file_name,
                xml_path.display()
            );
            warn!("{}", message);
            report.add(ConversionIssue::warning(
                ConversionIssueCode::OutputPathRewritten,
                message,
            ));
        }
        if let Some(parent) = xml_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if !written.insert(xml_path.clone()) {
            let message = format!(
                "{} overwritten by image '{}' from {}",
                xml_path.display(),
                image.file_name,
                source.display()
            );
            warn!("{}", message);
            report.add(ConversionIssue::warning(
                ConversionIssueCode::OutputFileOverwritten,
                message,
            ));
        }

        write_voc_xml(&xml_path, &doc)?;
        summary.images += 1;
        summary.objects += doc.objects.len();
    }

    Ok(summary)
}

fn build_voc_annotation(
    image: &CocoImage,
    annotations: &[&CocoAnnotation],
    categories: &[CocoCategory],
    source: &Path,
    report: &mut ConversionReport,
) -> VocAnnotation {
    let mut doc = VocAnnotation::new(image.file_name.as_str(), image.width, image.height);

    for annotation in annotations {
        let name = resolve_category_name(categories, annotation.category_id);
        if name.is_unknown() {
            let annotation_label = annotation
                .id
                .as_ref()
                .map(|id| format!("annotation {id}"))
                .unwrap_or_else(|| "annotation".to_string());
            report.add(ConversionIssue::warning(
                ConversionIssueCode::UnknownCategory,
                format!(
                    "{}: {} on image '{}' references unknown category {}; written as '{}'",
                    source.display(),
                    annotation_label,
                    image.file_name,
                    annotation.category_id,
                    UNKNOWN_CATEGORY
                ),
            ));
        }

        doc.push_object(name.as_str(), VocBndBox::from(&annotation.bbox));
    }

    doc
}

fn collect_json_files(
    dir: &Path,
    report: &mut ConversionReport,
) -> Result<Vec<PathBuf>, AnnoconvError> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_json_extension(&path) {
            files.push(path);
        }
    }

    files.sort_by_cached_key(|path| display_file_name(path));

    // Only feeds the nested-file warning, so walk errors are not fatal.
    let mut nested_json = Vec::new();
    for entry in WalkDir::new(dir).min_depth(2) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!("Ignoring unreadable entry below {}: {}", dir.display(), err);
                continue;
            }
        };

        if entry.file_type().is_file() && has_json_extension(entry.path()) {
            nested_json.push(entry.path().to_path_buf());
        }
    }

    if !nested_json.is_empty() {
        nested_json.sort();
        let message = format!(
            "{} scanned flat (non-recursive); skipping {} nested .json file(s), e.g. {}",
            dir.display(),
            nested_json.len(),
            nested_json[0].display()
        );
        warn!("{}", message);
        report.add(ConversionIssue::warning(
            ConversionIssueCode::NestedJsonIgnored,
            message,
        ));
    }

    Ok(files)
}

fn create_progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .map(|style| style.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(COCO_JSON_EXTENSION))
        .unwrap_or(false)
}

fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
