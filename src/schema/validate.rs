//! XSD validation of parsed documents against a materialised bundle.
//!
//! Requires the `validation` feature and a system libxml2. The schema is
//! compiled once per validator; every structural defect in a document is
//! collected rather than stopping at the first, so one pass reports them
//! all.

use std::str;

use libxml::parser::Parser;
use libxml::schemas::{SchemaParserContext, SchemaValidationContext};

use crate::error::ConfigError;
use crate::schema::{SchemaDefinition, SchemaStore};

/// One structural defect reported by the schema validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// 1-based line the defect was reported at
    pub line: u64,
    /// Validator message
    pub message: String,
}

/// A compiled schema ready to validate documents.
pub struct SchemaValidator {
    context: SchemaValidationContext,
}

impl SchemaValidator {
    /// Materialises the bundle through the store's cache and compiles
    /// its root schema. Compilation failures are configuration errors:
    /// they mean the bundle itself is broken, not the document.
    pub fn from_store(store: &SchemaStore, def: &SchemaDefinition) -> Result<Self, ConfigError> {
        let root = store.materialise(def)?;
        let mut parser = SchemaParserContext::from_file(&root.to_string_lossy());
        let context = SchemaValidationContext::from_parser(&mut parser).map_err(|errors| {
            let details = errors
                .iter()
                .map(|e| e.message.clone().unwrap_or_default())
                .collect::<Vec<_>>()
                .join("; ");
            ConfigError::SchemaCompile {
                category: def.category.as_str().to_string(),
                details,
            }
        })?;
        Ok(Self { context })
    }

    /// Validates a document, returning every structural defect found.
    /// An empty vector means the document is structurally valid.
    pub fn validate(&mut self, xml: &[u8]) -> Vec<SchemaIssue> {
        let text = match str::from_utf8(xml) {
            Ok(text) => text,
            Err(e) => {
                return vec![SchemaIssue {
                    line: 1,
                    message: format!("document is not UTF-8: {e}"),
                }]
            }
        };

        let parser = Parser::default();
        let doc = match parser.parse_string(text) {
            Ok(doc) => doc,
            Err(e) => {
                return vec![SchemaIssue {
                    line: 1,
                    message: format!("failed to parse document: {e:?}"),
                }]
            }
        };

        match self.context.validate_document(&doc) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .iter()
                .map(|e| SchemaIssue {
                    line: e.line.unwrap_or(1).max(1) as u64,
                    message: e.message.clone().unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaCategory;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    const STOP_SCHEMA: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Stops">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="Stop" type="xs:string" maxOccurs="unbounded"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    fn schema_bundle() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file("stops.xsd", options).unwrap();
        writer.write_all(STOP_SCHEMA.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_validate_collects_all_defects() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::new(dir.path());
        let def = SchemaDefinition {
            category: SchemaCategory::Timetables,
            version: "2.4".to_string(),
            bundle: schema_bundle(),
        };
        let mut validator = SchemaValidator::from_store(&store, &def).unwrap();

        let valid = b"<Stops><Stop>A</Stop><Stop>B</Stop></Stops>";
        assert!(validator.validate(valid).is_empty());

        let invalid = b"<Stops><Wrong/></Stops>";
        let issues = validator.validate(invalid);
        assert!(!issues.is_empty());
    }
}
