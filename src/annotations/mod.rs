//! Annotation formats handled by annoconv.
//!
//! COCO is the input side: one JSON file describes many images, their
//! categories and bounding-box annotations. Pascal VOC is the output side:
//! one XML document per image.
//!
//! # Example
//!
//! ```
//! use annoconv::annotations::io_coco_json::from_coco_str;
//! use annoconv::annotations::io_voc_xml::{to_voc_xml_string, VocAnnotation, VocBndBox};
//! use annoconv::annotations::resolve_category_name;
//!
//! let set = from_coco_str(r#"{
//!     "categories": [{"id": 1, "name": "cat"}],
//!     "images": [{"id": 10, "file_name": "a.jpg", "width": 100, "height": 200}],
//!     "annotations": [{"image_id": 10, "category_id": 1, "bbox": [5, 6, 50, 60]}]
//! }"#).unwrap();
//!
//! let image = &set.images[0];
//! let mut doc = VocAnnotation::new(image.file_name.as_str(), image.width, image.height);
//! for ann in &set.annotations {
//!     let name = resolve_category_name(&set.categories, ann.category_id);
//!     doc.push_object(name.as_str(), VocBndBox::from(&ann.bbox));
//! }
//! assert!(to_voc_xml_string(&doc).contains("<name>cat</name>"));
//! ```

mod category;
mod ids;
pub mod io_coco_json;
pub mod io_voc_xml;

pub use category::{resolve_category_name, CategoryName, UNKNOWN_CATEGORY};
pub use ids::{CategoryId, ImageId};
