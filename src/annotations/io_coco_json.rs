//! COCO JSON annotation reader.
//!
//! Only the parts of the COCO schema the Pascal VOC writer consumes are
//! modelled: `categories`, `images` and `annotations`. Other top-level keys
//! (`info`, `licenses`) and per-record extras (`segmentation`, `area`,
//! `iscrowd`, ...) are accepted and ignored.
//!
//! # Bounding boxes
//!
//! `bbox` is kept as four raw JSON numbers. The converter copies them
//! positionally into `<xmin> <ymin> <xmax> <ymax>`, so preserving the
//! original number rendition (`5` vs `5.0`) keeps the output text faithful
//! to the input.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::{CategoryId, ImageId};
use crate::error::AnnoconvError;

const BBOX_EXPECTED: &str = "a bbox array with at least 4 numbers";

// ============================================================================
// COCO Schema Types
// ============================================================================

/// One COCO annotation file: categories, images and their annotations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CocoAnnotationSet {
    pub categories: Vec<CocoCategory>,

    pub images: Vec<CocoImage>,

    pub annotations: Vec<CocoAnnotation>,
}

/// COCO category entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CocoCategory {
    pub id: CategoryId,
    pub name: String,
}

impl CocoCategory {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// COCO image entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: ImageId,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

impl CocoImage {
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
        }
    }
}

/// COCO annotation entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CocoAnnotation {
    /// Annotation ID, only used to give diagnostics some context. Kept as
    /// raw JSON since exporters disagree on its type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    pub image_id: ImageId,
    pub category_id: CategoryId,
    pub bbox: CocoBBox,
}

impl CocoAnnotation {
    pub fn new(
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        bbox: CocoBBox,
    ) -> Self {
        Self {
            id: None,
            image_id: image_id.into(),
            category_id: category_id.into(),
            bbox,
        }
    }
}

/// The first four numbers of a COCO `bbox` array, in source order.
///
/// No coordinate interpretation happens here: index 0 is written as
/// `xmin`, 1 as `ymin`, 2 as `xmax` and 3 as `ymax`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CocoBBox([Number; 4]);

impl CocoBBox {
    pub fn new(values: [Number; 4]) -> Self {
        Self(values)
    }

    #[inline]
    pub fn xmin(&self) -> &Number {
        &self.0[0]
    }

    #[inline]
    pub fn ymin(&self) -> &Number {
        &self.0[1]
    }

    #[inline]
    pub fn xmax(&self) -> &Number {
        &self.0[2]
    }

    #[inline]
    pub fn ymax(&self) -> &Number {
        &self.0[3]
    }

    pub fn values(&self) -> &[Number; 4] {
        &self.0
    }
}

impl From<[u64; 4]> for CocoBBox {
    fn from(values: [u64; 4]) -> Self {
        Self(values.map(Number::from))
    }
}

impl<'de> Deserialize<'de> for CocoBBox {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<Number>::deserialize(deserializer)?;
        let [xmin, ymin, xmax, ymax, ..] = values.as_slice() else {
            return Err(de::Error::invalid_length(values.len(), &BBOX_EXPECTED));
        };
        Ok(Self([xmin.clone(), ymin.clone(), xmax.clone(), ymax.clone()]))
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Reads one COCO annotation set from a JSON file.
///
/// # Errors
/// [`AnnoconvError::AnnotationRead`] if the file cannot be opened,
/// [`AnnoconvError::AnnotationParse`] if it is not COCO-shaped JSON
/// (malformed JSON, a missing `categories`/`images`/`annotations` key, or a
/// `bbox` shorter than four numbers).
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use annoconv::annotations::io_coco_json::read_coco_json;
///
/// let set = read_coco_json(Path::new("annotations/instances_val.json"))?;
/// println!("{} images", set.images.len());
/// # Ok::<(), annoconv::AnnoconvError>(())
/// ```
pub fn read_coco_json(path: &Path) -> Result<CocoAnnotationSet, AnnoconvError> {
    let file = File::open(path).map_err(|source| AnnoconvError::AnnotationRead {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| AnnoconvError::AnnotationParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a COCO annotation set from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_coco_str(json: &str) -> Result<CocoAnnotationSet, serde_json::Error> {
    serde_json::from_str(json)
}

/// Reads a COCO annotation set from a JSON byte slice.
///
/// Useful for fuzzing and processing raw bytes without UTF-8 validation overhead.
pub fn from_coco_slice(bytes: &[u8]) -> Result<CocoAnnotationSet, serde_json::Error> {
    serde_json::from_slice(bytes)
}
