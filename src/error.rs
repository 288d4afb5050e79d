use std::path::PathBuf;
use thiserror::Error;

/// The main error type for annoconv operations.
///
/// Every variant here aborts a conversion run. Per-record data problems
/// (unknown categories, overwritten outputs) are reported through
/// [`crate::conversion::ConversionReport`] instead.
#[derive(Debug, Error)]
pub enum AnnoconvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("The directory '{}' does not exist", .path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error(
        "The directory named 'annotations' does not exist in '{}'. \
         Make sure your dataset is organised in the standard COCO format.",
        .path.display()
    )]
    MissingAnnotationsDirectory { path: PathBuf },

    #[error("An output directory with the time stamp {timestamp} exists: {}", .path.display())]
    OutputDirectoryCollision { path: PathBuf, timestamp: String },

    #[error("Failed to read COCO JSON from {}: {source}", .path.display())]
    AnnotationRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse COCO JSON from {}: {source}", .path.display())]
    AnnotationParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write Pascal VOC XML to {}: {source}", .path.display())]
    VocWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl AnnoconvError {
    /// Returns true for failures confined to a single COCO input file.
    ///
    /// These are the errors a continue-on-error run may skip past.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            AnnoconvError::AnnotationRead { .. } | AnnoconvError::AnnotationParse { .. }
        )
    }
}
