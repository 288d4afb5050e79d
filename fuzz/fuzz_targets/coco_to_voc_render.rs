//! Fuzz target for the COCO -> VOC document path.
//!
//! Anything that parses as COCO must render to well-formed VOC XML text
//! without panicking, including unknown categories and odd file names.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_to_voc_render

#![no_main]

use annoconv::annotations::io_coco_json::from_coco_slice;
use annoconv::annotations::io_voc_xml::{
    derive_xml_file_name, to_voc_xml_string, FileNameMode, VocAnnotation, VocBndBox,
};
use annoconv::annotations::resolve_category_name;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(set) = from_coco_slice(data) else {
        return;
    };

    for image in &set.images {
        let mut doc = VocAnnotation::new(image.file_name.as_str(), image.width, image.height);
        for ann in set.annotations.iter().filter(|ann| ann.image_id == image.id) {
            let name = resolve_category_name(&set.categories, ann.category_id);
            doc.push_object(name.as_str(), VocBndBox::from(&ann.bbox));
        }

        let xml = to_voc_xml_string(&doc);
        assert!(xml.starts_with("<annotation>\n"));
        let _ = derive_xml_file_name(&image.file_name, FileNameMode::FirstDot);
        let _ = derive_xml_file_name(&image.file_name, FileNameMode::LastExtension);
    }
});
