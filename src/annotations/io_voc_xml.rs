//! Pascal VOC XML document model and writer.
//!
//! A [`VocAnnotation`] is the in-memory tree for one image's
//! `Annotations/<name>.xml` file. It is rendered with two-space
//! indentation, no XML declaration, and a trailing newline, so two
//! conversions of the same input produce identical bytes.

use std::fmt::{Display, Write as _};
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde_json::Number;

use super::io_coco_json::CocoBBox;
use crate::error::AnnoconvError;

const VOC_XML_EXTENSION: &str = "xml";

/// Channel count written to `<size><depth>`. Images are never inspected.
pub const DEFAULT_DEPTH: u32 = 3;

/// How an image `file_name` becomes an XML file name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FileNameMode {
    /// Keep only the text before the first `.` (`a.b.jpg` -> `a.xml`).
    ///
    /// Names with internal dots can collide; the converter flags every
    /// overwrite this causes.
    #[default]
    FirstDot,
    /// Replace only the final extension (`a.b.jpg` -> `a.b.xml`).
    LastExtension,
}

/// Root `<annotation>` element of a Pascal VOC file.
#[derive(Clone, Debug, PartialEq)]
pub struct VocAnnotation {
    pub filename: String,
    pub size: VocSize,
    pub segmented: u8,
    pub objects: Vec<VocObject>,
}

/// `<size>` element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VocSize {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

/// `<object>` element.
#[derive(Clone, Debug, PartialEq)]
pub struct VocObject {
    pub name: String,
    pub truncated: u8,
    pub difficult: u8,
    pub bndbox: VocBndBox,
}

/// `<bndbox>` element. Values are JSON numbers so they print exactly as
/// they appeared in the source annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct VocBndBox {
    pub xmin: Number,
    pub ymin: Number,
    pub xmax: Number,
    pub ymax: Number,
}

impl From<&CocoBBox> for VocBndBox {
    fn from(bbox: &CocoBBox) -> Self {
        Self {
            xmin: bbox.xmin().clone(),
            ymin: bbox.ymin().clone(),
            xmax: bbox.xmax().clone(),
            ymax: bbox.ymax().clone(),
        }
    }
}

impl VocAnnotation {
    /// Start a document for one image with no objects.
    pub fn new(filename: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            filename: filename.into(),
            size: VocSize {
                width,
                height,
                depth: DEFAULT_DEPTH,
            },
            segmented: 0,
            objects: Vec::new(),
        }
    }

    /// Append an object that is neither truncated nor difficult.
    pub fn push_object(&mut self, name: impl Into<String>, bndbox: VocBndBox) {
        self.objects.push(VocObject {
            name: name.into(),
            truncated: 0,
            difficult: 0,
            bndbox,
        });
    }
}

/// Derive the XML file name (relative to `Annotations/`) for an image.
///
/// Root, drive prefix, `.` and `..` components of `file_name` are dropped
/// first, so the result is always a plain relative path. Directory
/// segments that remain are kept (`train/0001.jpg` -> `train/0001.xml`).
pub fn derive_xml_file_name(file_name: &str, mode: FileNameMode) -> PathBuf {
    let relative = relative_segments(file_name);

    match mode {
        FileNameMode::FirstDot => {
            let relative = relative.to_string_lossy();
            let stem = relative
                .split_once('.')
                .map_or(&*relative, |(stem, _)| stem);
            PathBuf::from(format!("{stem}.{VOC_XML_EXTENSION}"))
        }
        FileNameMode::LastExtension if relative.as_os_str().is_empty() => {
            PathBuf::from(format!(".{VOC_XML_EXTENSION}"))
        }
        FileNameMode::LastExtension => relative.with_extension(VOC_XML_EXTENSION),
    }
}

/// True if `file_name` has components [`derive_xml_file_name`] drops to
/// stay inside the output directory.
pub fn escapes_output_dir(file_name: &str) -> bool {
    Path::new(file_name).components().any(|component| {
        matches!(
            component,
            Component::Prefix(_) | Component::RootDir | Component::ParentDir
        )
    })
}

fn relative_segments(file_name: &str) -> PathBuf {
    Path::new(file_name)
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment),
            _ => None,
        })
        .collect()
}

/// Render a document as pretty-printed XML.
pub fn to_voc_xml_string(doc: &VocAnnotation) -> String {
    let mut xml = String::new();

    writeln!(xml, "<annotation>").expect("write to string");
    write_leaf(&mut xml, 1, "filename", xml_escape(&doc.filename));
    writeln!(xml, "  <size>").expect("write to string");
    write_leaf(&mut xml, 2, "width", doc.size.width);
    write_leaf(&mut xml, 2, "height", doc.size.height);
    write_leaf(&mut xml, 2, "depth", doc.size.depth);
    writeln!(xml, "  </size>").expect("write to string");
    write_leaf(&mut xml, 1, "segmented", doc.segmented);

    for object in &doc.objects {
        writeln!(xml, "  <object>").expect("write to string");
        write_leaf(&mut xml, 2, "name", xml_escape(&object.name));
        write_leaf(&mut xml, 2, "truncated", object.truncated);
        write_leaf(&mut xml, 2, "difficult", object.difficult);
        writeln!(xml, "    <bndbox>").expect("write to string");
        write_leaf(&mut xml, 3, "xmin", &object.bndbox.xmin);
        write_leaf(&mut xml, 3, "ymin", &object.bndbox.ymin);
        write_leaf(&mut xml, 3, "xmax", &object.bndbox.xmax);
        write_leaf(&mut xml, 3, "ymax", &object.bndbox.ymax);
        writeln!(xml, "    </bndbox>").expect("write to string");
        writeln!(xml, "  </object>").expect("write to string");
    }

    writeln!(xml, "</annotation>").expect("write to string");
    xml
}

/// Write a document to `xml_path`, replacing any existing file.
pub fn write_voc_xml(xml_path: &Path, doc: &VocAnnotation) -> Result<(), AnnoconvError> {
    fs::write(xml_path, to_voc_xml_string(doc)).map_err(|source| AnnoconvError::VocWrite {
        path: xml_path.to_path_buf(),
        source,
    })
}

fn write_leaf(xml: &mut String, depth: usize, tag: &str, text: impl Display) {
    writeln!(xml, "{:indent$}<{tag}>{text}</{tag}>", "", indent = depth * 2)
        .expect("write to string");
}

// Text content only; attribute values are never written.
fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> VocAnnotation {
        let mut doc = VocAnnotation::new("a.jpg", 100, 200);
        doc.push_object("cat", VocBndBox::from(&CocoBBox::from([5, 6, 50, 60])));
        doc
    }

    #[test]
    fn renders_expected_layout() {
        let expected = "\
<annotation>
  <filename>a.jpg</filename>
  <size>
    <width>100</width>
    <height>200</height>
    <depth>3</depth>
  </size>
  <segmented>0</segmented>
  <object>
    <name>cat</name>
    <truncated>0</truncated>
    <difficult>0</difficult>
    <bndbox>
      <xmin>5</xmin>
      <ymin>6</ymin>
      <xmax>50</xmax>
      <ymax>60</ymax>
    </bndbox>
  </object>
</annotation>
";
        assert_eq!(to_voc_xml_string(&sample_doc()), expected);
    }

    #[test]
    fn renders_document_without_objects() {
        let doc = VocAnnotation::new("empty.png", 1, 2);
        let xml = to_voc_xml_string(&doc);
        assert!(xml.contains("<segmented>0</segmented>\n</annotation>\n"));
        assert!(!xml.contains("<object>"));
    }

    #[test]
    fn escapes_text_content() {
        let mut doc = VocAnnotation::new("R&D <1>.jpg", 10, 10);
        doc.push_object("a<b", VocBndBox::from(&CocoBBox::from([0, 0, 1, 1])));
        let xml = to_voc_xml_string(&doc);
        assert!(xml.contains("<filename>R&amp;D &lt;1&gt;.jpg</filename>"));
        assert!(xml.contains("<name>a&lt;b</name>"));

        let parsed = roxmltree::Document::parse(&xml).expect("output is well-formed");
        let filename = parsed
            .descendants()
            .find(|node| node.has_tag_name("filename"))
            .and_then(|node| node.text());
        assert_eq!(filename, Some("R&D <1>.jpg"));
    }

    #[test]
    fn float_coordinates_keep_their_rendition() {
        let bbox = CocoBBox::new([
            Number::from_f64(1.5).unwrap(),
            Number::from_f64(2.0).unwrap(),
            Number::from(3u64),
            Number::from_f64(4.25).unwrap(),
        ]);
        let mut doc = VocAnnotation::new("f.jpg", 10, 10);
        doc.push_object("x", VocBndBox::from(&bbox));
        let xml = to_voc_xml_string(&doc);
        assert!(xml.contains("<xmin>1.5</xmin>"));
        assert!(xml.contains("<ymin>2.0</ymin>"));
        assert!(xml.contains("<xmax>3</xmax>"));
        assert!(xml.contains("<ymax>4.25</ymax>"));
    }

    #[test]
    fn first_dot_mode_keeps_text_before_first_dot() {
        let mode = FileNameMode::FirstDot;
        assert_eq!(derive_xml_file_name("photo.jpg", mode), PathBuf::from("photo.xml"));
        assert_eq!(derive_xml_file_name("a.b.jpg", mode), PathBuf::from("a.xml"));
        assert_eq!(derive_xml_file_name("noext", mode), PathBuf::from("noext.xml"));
    }

    #[test]
    fn last_extension_mode_replaces_final_extension() {
        let mode = FileNameMode::LastExtension;
        assert_eq!(derive_xml_file_name("photo.jpg", mode), PathBuf::from("photo.xml"));
        assert_eq!(derive_xml_file_name("a.b.jpg", mode), PathBuf::from("a.b.xml"));
        assert_eq!(derive_xml_file_name("noext", mode), PathBuf::from("noext.xml"));
    }

    #[test]
    fn directory_segments_are_kept() {
        for mode in [FileNameMode::FirstDot, FileNameMode::LastExtension] {
            assert_eq!(
                derive_xml_file_name("train/0001.jpg", mode),
                PathBuf::from("train/0001.xml")
            );
            assert_eq!(
                derive_xml_file_name("./train/0001.jpg", mode),
                PathBuf::from("train/0001.xml")
            );
        }
    }

    #[test]
    fn rooted_and_parent_names_stay_relative() {
        let cases = [
            ("/tmp/escaped.jpg", "tmp/escaped.xml", "tmp/escaped.xml"),
            ("/tmp/.hidden/escaped.jpg", "tmp/.xml", "tmp/.hidden/escaped.xml"),
            ("../../../pwn.jpg", "pwn.xml", "pwn.xml"),
            ("a/../../b.v2.jpg", "a/b.xml", "a/b.v2.xml"),
            ("..", ".xml", ".xml"),
            ("/", ".xml", ".xml"),
        ];

        for (file_name, first_dot, last_extension) in cases {
            let derived = derive_xml_file_name(file_name, FileNameMode::FirstDot);
            assert_eq!(derived, PathBuf::from(first_dot), "{file_name}");
            let derived = derive_xml_file_name(file_name, FileNameMode::LastExtension);
            assert_eq!(derived, PathBuf::from(last_extension), "{file_name}");
        }

        for mode in [FileNameMode::FirstDot, FileNameMode::LastExtension] {
            for (file_name, _, _) in cases {
                let derived = derive_xml_file_name(file_name, mode);
                assert!(derived.is_relative(), "{file_name} -> {}", derived.display());
                assert!(
                    derived
                        .components()
                        .all(|component| matches!(component, Component::Normal(_))),
                    "{file_name} -> {}",
                    derived.display()
                );
            }
        }
    }

    #[test]
    fn only_root_prefix_and_parent_components_escape() {
        assert!(escapes_output_dir("/abs/x.jpg"));
        assert!(escapes_output_dir("../x.jpg"));
        assert!(escapes_output_dir("train/../../x.jpg"));
        assert!(!escapes_output_dir("train/0001.jpg"));
        assert!(!escapes_output_dir("./x.jpg"));
        assert!(!escapes_output_dir("..x.jpg"));
    }

    #[test]
    fn write_voc_xml_overwrites_existing_file() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("a.xml");
        fs::write(&path, "stale").expect("write stale file");

        write_voc_xml(&path, &sample_doc()).expect("write xml");
        let written = fs::read_to_string(&path).expect("read xml");
        assert_eq!(written, to_voc_xml_string(&sample_doc()));
    }
}
