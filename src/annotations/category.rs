//! Category name lookup for COCO annotations.

use std::fmt;

use log::warn;

use super::io_coco_json::CocoCategory;
use super::CategoryId;

/// Name written for objects whose category is missing from the table.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Result of resolving a category ID against a COCO category table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryName<'a> {
    Known(&'a str),
    Unknown,
}

impl<'a> CategoryName<'a> {
    /// The name to write into `<object><name>`.
    pub fn as_str(&self) -> &'a str {
        match *self {
            CategoryName::Known(name) => name,
            CategoryName::Unknown => UNKNOWN_CATEGORY,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, CategoryName::Unknown)
    }
}

impl fmt::Display for CategoryName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look up the name of `category_id` in `categories`.
///
/// The first record with a matching ID wins. A missing ID is not an error:
/// a warning is logged and [`CategoryName::Unknown`] is returned so the
/// caller can keep converting.
pub fn resolve_category_name(
    categories: &[CocoCategory],
    category_id: CategoryId,
) -> CategoryName<'_> {
    match categories.iter().find(|category| category.id == category_id) {
        Some(category) => CategoryName::Known(&category.name),
        None => {
            warn!("Category unknown for ID {}", category_id);
            CategoryName::Unknown
        }
    }
}
