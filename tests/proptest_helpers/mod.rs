#![allow(dead_code)]

use std::collections::BTreeMap;

use annoconv::annotations::io_coco_json::{
    CocoAnnotation, CocoAnnotationSet, CocoBBox, CocoCategory, CocoImage,
};
use annoconv::annotations::{CategoryId, ImageId, UNKNOWN_CATEGORY};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::Number;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Integers or quarter-step floats, so both renditions get exercised.
pub fn arb_coord() -> impl Strategy<Value = Number> {
    prop_oneof![
        (0u64..5000).prop_map(Number::from),
        (0u32..20000).prop_map(|quarters| {
            Number::from_f64(quarters as f64 / 4.0).expect("finite coordinate")
        }),
    ]
}

pub fn arb_bbox() -> impl Strategy<Value = CocoBBox> {
    proptest::array::uniform4(arb_coord()).prop_map(CocoBBox::new)
}

/// A COCO annotation set with unique image file names.
///
/// Annotations may point at image IDs that do not exist and at category IDs
/// missing from the category table.
pub fn arb_coco_set(
    max_categories: usize,
    max_images: usize,
    max_annotations: usize,
) -> impl Strategy<Value = CocoAnnotationSet> {
    let categories = proptest::collection::vec("[a-z]{1,8}", 0..=max_categories);
    let images = proptest::collection::vec((1u32..4000, 1u32..4000), 0..=max_images);

    (categories, images).prop_flat_map(move |(category_names, sizes)| {
        let category_count = category_names.len() as u64;
        let image_count = sizes.len() as u64;

        let categories: Vec<CocoCategory> = category_names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| CocoCategory::new(idx as u64 + 1, name))
            .collect();
        let images: Vec<CocoImage> = sizes
            .into_iter()
            .enumerate()
            .map(|(idx, (width, height))| {
                CocoImage::new(idx as u64 + 1, format!("img_{idx:04}.jpg"), width, height)
            })
            .collect();

        let annotation = (1..=image_count + 1, 1..=category_count + 2, arb_bbox()).prop_map(
            |(image_id, category_id, bbox)| CocoAnnotation::new(image_id, category_id, bbox),
        );
        let annotations = proptest::collection::vec(annotation, 0..=max_annotations);

        annotations.prop_map(move |annotations| CocoAnnotationSet {
            categories: categories.clone(),
            images: images.clone(),
            annotations,
        })
    })
}

/// Expected `(name, [xmin, ymin, xmax, ymax])` per object, grouped by image.
pub fn expected_objects(set: &CocoAnnotationSet) -> BTreeMap<ImageId, Vec<(String, [String; 4])>> {
    let names: BTreeMap<CategoryId, &str> = set
        .categories
        .iter()
        .map(|cat| (cat.id, cat.name.as_str()))
        .collect();

    let mut by_image: BTreeMap<ImageId, Vec<(String, [String; 4])>> = BTreeMap::new();
    for ann in &set.annotations {
        let name = names
            .get(&ann.category_id)
            .copied()
            .unwrap_or(UNKNOWN_CATEGORY)
            .to_string();
        let coords = ann.bbox.values().clone().map(|value| value.to_string());
        by_image.entry(ann.image_id).or_default().push((name, coords));
    }
    by_image
}
