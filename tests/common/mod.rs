#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

pub const FIXED_STAMP: &str = "20240517_093000";

pub fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 17)
        .expect("valid date")
        .and_hms_opt(9, 30, 0)
        .expect("valid time")
}

pub fn later_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 17)
        .expect("valid date")
        .and_hms_opt(9, 30, 1)
        .expect("valid time")
}

/// Write `json` as `<root>/annotations/<name>`.
pub fn write_coco_file(root: &Path, name: &str, json: &str) -> PathBuf {
    let dir = root.join("annotations");
    fs::create_dir_all(&dir).expect("create annotations dir");
    let path = dir.join(name);
    fs::write(&path, json).expect("write coco json");
    path
}

/// `<output>/PASCAL_VOC_<stamp>/Annotations`.
pub fn voc_dir(output: &Path, stamp: &str) -> PathBuf {
    output
        .join(format!("PASCAL_VOC_{stamp}"))
        .join("Annotations")
}

/// Every file in `dir` (flat), keyed by file name.
pub fn read_xml_files(dir: &Path) -> BTreeMap<String, String> {
    fs::read_dir(dir)
        .expect("read output dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| path.is_file())
        .map(|path| {
            let name = path
                .file_name()
                .expect("file name")
                .to_string_lossy()
                .to_string();
            let content = fs::read_to_string(&path).expect("read xml");
            (name, content)
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParsedObject {
    pub name: String,
    pub truncated: String,
    pub difficult: String,
    pub bndbox: [String; 4],
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParsedVoc {
    pub filename: String,
    pub width: String,
    pub height: String,
    pub depth: String,
    pub segmented: String,
    pub objects: Vec<ParsedObject>,
}

/// Parse an emitted VOC document back with roxmltree.
pub fn parse_voc(xml: &str) -> ParsedVoc {
    let doc = roxmltree::Document::parse(xml).expect("well-formed xml");
    let root = doc.root_element();
    assert_eq!(root.tag_name().name(), "annotation");

    let size = child(root, "size");
    let objects = root
        .children()
        .filter(|node| node.has_tag_name("object"))
        .map(|object| {
            let bndbox = child(object, "bndbox");
            ParsedObject {
                name: text(object, "name"),
                truncated: text(object, "truncated"),
                difficult: text(object, "difficult"),
                bndbox: [
                    text(bndbox, "xmin"),
                    text(bndbox, "ymin"),
                    text(bndbox, "xmax"),
                    text(bndbox, "ymax"),
                ],
            }
        })
        .collect();

    ParsedVoc {
        filename: text(root, "filename"),
        width: text(size, "width"),
        height: text(size, "height"),
        depth: text(size, "depth"),
        segmented: text(root, "segmented"),
        objects,
    }
}

fn child<'a, 'input>(node: roxmltree::Node<'a, 'input>, tag: &str) -> roxmltree::Node<'a, 'input> {
    node.children()
        .find(|c| c.has_tag_name(tag))
        .unwrap_or_else(|| panic!("missing <{tag}>"))
}

fn text(node: roxmltree::Node<'_, '_>, tag: &str) -> String {
    child(node, tag).text().unwrap_or_default().to_string()
}
