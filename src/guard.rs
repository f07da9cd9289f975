//! Ingestion guard: defensive checks that run before any parser sees a
//! submitted document.
//!
//! The guard enforces, in order:
//!
//! 1. size limits ([`check_size`]),
//! 2. zip containment rules ([`validate_zip`]) for archive uploads,
//! 3. a forward-only scan for dangerous XML constructs
//!    ([`dangerous_xml_check`]) with DTDs, external entities, and entity
//!    expansion disabled.
//!
//! A document that fails any check is never partially parsed: the scan
//! stops at the first offending construct and nothing downstream runs.

use std::io::{Cursor, Read};
use std::str;

use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{Error, Result};

/// Magic bytes identifying a zip archive (local file header).
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

/// A submitted document: raw bytes plus the declared filename.
///
/// Created once at ingestion and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Declared filename of the upload
    pub filename: String,
    /// Raw byte content
    pub content: Vec<u8>,
}

impl RawDocument {
    /// Creates a new raw document.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
        }
    }

    /// Declared size in bytes.
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    /// Returns true if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns true if the declared filename carries the given extension,
    /// compared case-insensitively.
    pub fn has_extension(&self, extension: &str) -> bool {
        name_has_extension(&self.filename, extension)
    }
}

fn name_has_extension(name: &str, extension: &str) -> bool {
    let suffix = format!(".{}", extension.to_lowercase());
    name.to_lowercase().ends_with(&suffix)
}

/// Checks the declared size of a document against a byte limit.
///
/// The length comes from the buffer itself; the content is not read.
pub fn check_size(doc: &RawDocument, max_bytes: u64) -> Result<()> {
    if doc.len() > max_bytes {
        return Err(Error::FileTooLarge {
            size: doc.len(),
            max: max_bytes,
        });
    }
    Ok(())
}

/// Validates a zip upload and returns the names of entries carrying the
/// required data extension.
///
/// Checks run in a fixed order so that size violations are caught from
/// archive metadata alone, before any entry content is opened:
///
/// 1. empty uploads are rejected ([`Error::NoDataFound`]);
/// 2. the declared archive size, then the summed uncompressed entry sizes,
///    are compared against `max_bytes` ([`Error::ZipTooLarge`]);
/// 3. entry names are screened for `.zip` suffixes, any case
///    ([`Error::NestedZipForbidden`]);
/// 4. each entry's leading bytes are sniffed for the zip magic, catching
///    renamed archives ([`Error::NestedZipForbidden`]);
/// 5. at least one entry must match `required_ext`
///    ([`Error::NoDataFound`]).
pub fn validate_zip(doc: &RawDocument, max_bytes: u64, required_ext: &str) -> Result<Vec<String>> {
    if doc.is_empty() {
        return Err(Error::NoDataFound {
            extension: required_ext.to_string(),
        });
    }
    if doc.len() > max_bytes {
        return Err(Error::ZipTooLarge {
            size: doc.len(),
            max: max_bytes,
        });
    }

    let mut archive = ZipArchive::new(Cursor::new(doc.content.as_slice()))?;

    // Metadata pass: names and summed uncompressed sizes, no decompression.
    let mut total_uncompressed: u64 = 0;
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        if entry.is_dir() {
            continue;
        }
        if name_has_extension(entry.name(), "zip") {
            return Err(Error::NestedZipForbidden {
                entry: entry.name().to_string(),
            });
        }
        total_uncompressed = total_uncompressed.saturating_add(entry.size());
    }
    if total_uncompressed > max_bytes {
        return Err(Error::ZipTooLarge {
            size: total_uncompressed,
            max: max_bytes,
        });
    }

    // Content pass: sniff each entry's magic bytes to catch renamed zips.
    let mut data_entries = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        if entry.size() >= ZIP_MAGIC.len() as u64 {
            let mut magic = [0u8; 4];
            entry.read_exact(&mut magic)?;
            if magic == ZIP_MAGIC {
                return Err(Error::NestedZipForbidden {
                    entry: entry.name().to_string(),
                });
            }
        }
        if name_has_extension(entry.name(), required_ext) {
            data_entries.push(entry.name().to_string());
        }
    }

    if data_entries.is_empty() {
        return Err(Error::NoDataFound {
            extension: required_ext.to_string(),
        });
    }
    Ok(data_entries)
}

/// Scans a byte buffer for dangerous XML constructs without building a tree.
///
/// DOCTYPE declarations (which carry internal and external entity
/// definitions) and non-predefined entity references each produce
/// [`Error::DangerousXml`]. Malformed documents produce
/// [`Error::XmlSyntax`] with the line of the first offending byte; the
/// line defaults to 1 when the scanner cannot attribute a position.
pub fn dangerous_xml_check(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(Error::XmlSyntax {
            line: 1,
            message: "empty document".to_string(),
        });
    }

    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::with_capacity(1024);

    loop {
        buf.clear();
        let position = reader.buffer_position();
        match reader.read_event_into(&mut buf) {
            Ok(XmlEvent::DocType(_)) => {
                return Err(Error::DangerousXml {
                    construct: "DOCTYPE declaration".to_string(),
                });
            }
            Ok(XmlEvent::GeneralRef(ref e)) => {
                let name = str::from_utf8(e.as_ref())?;
                if !is_predefined_reference(name) {
                    return Err(Error::DangerousXml {
                        construct: format!("entity reference &{};", name),
                    });
                }
            }
            Ok(XmlEvent::Eof) => return Ok(()),
            Ok(_) => {}
            Err(e) => {
                return Err(Error::XmlSyntax {
                    line: line_at(bytes, position),
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Returns true for the five predefined XML entities and character
/// references, which expand to a bounded amount of text.
fn is_predefined_reference(name: &str) -> bool {
    matches!(name, "amp" | "lt" | "gt" | "apos" | "quot") || name.starts_with('#')
}

/// 1-based line number of a byte offset.
fn line_at(bytes: &[u8], offset: u64) -> u64 {
    let end = (offset as usize).min(bytes.len());
    bytes[..end].iter().filter(|&&b| b == b'\n').count() as u64 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_check_size_rejects_oversized() {
        let doc = RawDocument::new("big.xml", vec![0u8; 100]);
        assert!(matches!(
            check_size(&doc, 99),
            Err(Error::FileTooLarge { size: 100, max: 99 })
        ));
        assert!(check_size(&doc, 100).is_ok());
    }

    #[test]
    fn test_validate_zip_accepts_plain_archive() {
        let bytes = build_zip(&[("route_1.xml", b"<x/>"), ("readme.txt", b"hi")]);
        let doc = RawDocument::new("upload.zip", bytes);
        let entries = validate_zip(&doc, 1_000_000, "xml").unwrap();
        assert_eq!(entries, vec!["route_1.xml".to_string()]);
    }

    #[test]
    fn test_validate_zip_rejects_nested_by_name() {
        let bytes = build_zip(&[("a.xml", b"<x/>"), ("INNER.ZIP", b"whatever")]);
        let doc = RawDocument::new("upload.zip", bytes);
        assert!(matches!(
            validate_zip(&doc, 1_000_000, "xml"),
            Err(Error::NestedZipForbidden { .. })
        ));
    }

    #[test]
    fn test_validate_zip_rejects_nested_by_magic() {
        // A zip renamed to .xml must still be caught by its magic bytes.
        let inner = build_zip(&[("hidden.txt", b"boo")]);
        let bytes = build_zip(&[("data.xml", inner.as_slice())]);
        let doc = RawDocument::new("upload.zip", bytes);
        assert!(matches!(
            validate_zip(&doc, 1_000_000, "xml"),
            Err(Error::NestedZipForbidden { .. })
        ));
    }

    #[test]
    fn test_validate_zip_rejects_oversized_declared_size() {
        let big = vec![b'a'; 4096];
        let bytes = build_zip(&[("big.xml", big.as_slice()), ("ok.xml", b"<x/>")]);
        let doc = RawDocument::new("upload.zip", bytes);
        assert!(matches!(
            validate_zip(&doc, 1024, "xml"),
            Err(Error::ZipTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_zip_rejects_oversized_uncompressed_sum() {
        // A small archive whose entries inflate past the limit: the
        // summed uncompressed sizes fire from metadata alone, before any
        // entry content is opened.
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file("bomb.xml", deflated).unwrap();
        writer.write_all(&vec![b'a'; 65536]).unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(bytes.len() < 4096);

        let doc = RawDocument::new("upload.zip", bytes);
        assert!(matches!(
            validate_zip(&doc, 4096, "xml"),
            Err(Error::ZipTooLarge { size: 65536, .. })
        ));
    }

    #[test]
    fn test_validate_zip_requires_data_entries() {
        let bytes = build_zip(&[("notes.txt", b"nothing here")]);
        let doc = RawDocument::new("upload.zip", bytes);
        assert!(matches!(
            validate_zip(&doc, 1_000_000, "xml"),
            Err(Error::NoDataFound { .. })
        ));
    }

    #[test]
    fn test_validate_zip_rejects_empty_upload() {
        let doc = RawDocument::new("upload.zip", Vec::new());
        assert!(matches!(
            validate_zip(&doc, 1_000_000, "xml"),
            Err(Error::NoDataFound { .. })
        ));
    }

    #[test]
    fn test_dangerous_xml_rejects_doctype() {
        let xml = b"<?xml version=\"1.0\"?>\n<!DOCTYPE foo [<!ENTITY xxe SYSTEM \"file:///etc/passwd\">]>\n<foo>&xxe;</foo>";
        assert!(matches!(
            dangerous_xml_check(xml),
            Err(Error::DangerousXml { .. })
        ));
    }

    #[test]
    fn test_dangerous_xml_rejects_entity_reference() {
        let xml = b"<foo>&undeclared;</foo>";
        assert!(matches!(
            dangerous_xml_check(xml),
            Err(Error::DangerousXml { .. })
        ));
    }

    #[test]
    fn test_dangerous_xml_allows_predefined_entities() {
        let xml = b"<foo attr=\"a&amp;b\">1 &lt; 2 &#163;</foo>";
        assert!(dangerous_xml_check(xml).is_ok());
    }

    #[test]
    fn test_dangerous_xml_reports_syntax_line() {
        let xml = b"<foo>\n  <bar>\n</foo>";
        match dangerous_xml_check(xml) {
            Err(Error::XmlSyntax { line, .. }) => assert!(line >= 2),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_dangerous_xml_accepts_wellformed() {
        let xml = b"<?xml version=\"1.0\"?>\n<TransXChange><Services/></TransXChange>";
        assert!(dangerous_xml_check(xml).is_ok());
    }

    #[test]
    fn test_raw_document_extension() {
        let doc = RawDocument::new("Upload.XML", Vec::new());
        assert!(doc.has_extension("xml"));
        assert!(!doc.has_extension("zip"));
    }
}
