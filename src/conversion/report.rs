//! Conversion report types.
//!
//! A [`ConversionReport`] is what a run hands back instead of printing:
//! where it wrote, what it wrote per COCO file, and every recoverable issue
//! it worked around.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Outcome of one COCO → Pascal VOC conversion run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Source format name.
    pub from: String,
    /// Target format name.
    pub to: String,
    /// Dataset root that was read.
    pub input_dir: PathBuf,
    /// The `Annotations/` directory XML files were written to.
    pub output_dir: PathBuf,
    /// Number of `.json` files discovered in `annotations/`.
    pub json_files_found: usize,
    /// One entry per discovered JSON file, in processing order.
    pub files: Vec<FileSummary>,
    /// Issues recovered from during the run.
    pub issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    /// Create a new empty report for a conversion between formats.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            ..Default::default()
        }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    /// Total XML documents written (overwrites count once per write).
    pub fn images_written(&self) -> usize {
        self.files.iter().map(|file| file.images).sum()
    }

    /// Total `<object>` elements written.
    pub fn objects_written(&self) -> usize {
        self.files.iter().map(|file| file.objects).sum()
    }

    /// Count of JSON files that were skipped under continue-on-error.
    pub fn files_skipped(&self) -> usize {
        self.files.iter().filter(|file| file.skipped).count()
    }

    pub fn warning_count(&self) -> usize {
        self.count(ConversionSeverity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.count(ConversionSeverity::Error)
    }

    /// Issues carrying the given code.
    pub fn issues_with_code(
        &self,
        code: ConversionIssueCode,
    ) -> impl Iterator<Item = &ConversionIssue> {
        self.issues.iter().filter(move |issue| issue.code == code)
    }

    fn count(&self, severity: ConversionSeverity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Converted {} -> {}: {}",
            self.from,
            self.to,
            self.output_dir.display()
        )?;
        writeln!(
            f,
            "  {} JSON file(s), {} image(s), {} object(s)",
            self.json_files_found,
            self.images_written(),
            self.objects_written()
        )?;

        let skipped = self.files_skipped();
        if skipped > 0 {
            writeln!(f, "  {} JSON file(s) skipped", skipped)?;
        }

        for (severity, title) in [
            (ConversionSeverity::Error, "Errors"),
            (ConversionSeverity::Warning, "Warnings"),
        ] {
            let count = self.count(severity);
            if count == 0 {
                continue;
            }

            writeln!(f)?;
            writeln!(f, "{} ({}):", title, count)?;
            for issue in self.issues.iter().filter(|i| i.severity == severity) {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// What one COCO annotation file contributed to the output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub path: PathBuf,
    pub images: usize,
    pub objects: usize,
    /// True when the file could not be read or parsed and was passed over.
    pub skipped: bool,
}

impl FileSummary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            images: 0,
            objects: 0,
            skipped: false,
        }
    }
}

/// A single recoverable issue hit during conversion.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    pub message: String,
}

impl ConversionIssue {
    /// Create a warning-level issue (data was substituted or overwritten).
    pub fn warning(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Create an error-level issue (an input file produced no output).
    pub fn error(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Error,
            code,
            message: message.into(),
        }
    }
}

/// Severity level for conversion issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    Warning,
    Error,
}

/// Stable issue codes for programmatic consumption.
///
/// These codes are part of the JSON report and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    /// Requested output directory is absent; the input directory was used.
    OutputDirectoryMissing,
    /// `.json` files below `annotations/` subdirectories were not read.
    NestedJsonIgnored,
    /// An annotation references a category missing from `categories`.
    UnknownCategory,
    /// Two images mapped to the same XML file name; the later one won.
    OutputFileOverwritten,
    /// An image `file_name` had root, prefix or `..` components that were
    /// dropped to keep the XML inside `Annotations/`.
    OutputPathRewritten,
    /// A COCO file could not be read or parsed (continue-on-error only).
    AnnotationFileSkipped,
}
