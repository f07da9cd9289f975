//! The validation pipeline: guard, parse, map, validate, report.
//!
//! One synchronous, single-threaded pass per document:
//!
//! ```text
//! Received -> SizeChecked -> (ZipValidated) -> XmlParsed -> SchemaMapped
//!          -> {StructurallyValidated, RuleValidated} -> Reported
//! ```
//!
//! Terminal failure can occur at `SizeChecked`, `ZipValidated`, or
//! `XmlParsed`; later stages accumulate violations instead of aborting,
//! and structural and rule validation run independently of each other's
//! findings. Each invocation is side-effect-free apart from the shared
//! schema and catalogue caches.

use std::io::{Cursor, Read};
use std::str;

use serde::Deserialize;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{ConfigError, Error};
use crate::guard::{check_size, dangerous_xml_check, validate_zip, RawDocument};
use crate::navigator::{parse_document, Element};
use crate::pti::{default_catalogue, LiveAttributes, PtiValidator};
use crate::records::{map_fares_document, map_timetable_document, DomainRecord};
use crate::report::{
    normalise, Stage, ValidationResult, ValidationStatus, Violation, ViolationCode,
};
use crate::schema::SchemaCategory;

/// Resource limits applied before any parsing starts.
///
/// Deserializable so an embedding service can carry them in its own
/// configuration file; every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum size of a single uploaded file in bytes
    pub max_file_bytes: u64,
    /// Maximum declared or summed-uncompressed archive size in bytes
    pub max_zip_bytes: u64,
    /// Extension data entries must carry inside an archive
    pub data_extension: String,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_bytes: 450 * 1024 * 1024,
            max_zip_bytes: 2 * 1024 * 1024 * 1024,
            data_extension: "xml".to_string(),
        }
    }
}

/// The validation pipeline for one schema category.
#[derive(Debug, Clone)]
pub struct Pipeline {
    category: SchemaCategory,
    limits: Limits,
}

impl Pipeline {
    /// Creates a pipeline with default limits.
    pub fn new(category: SchemaCategory) -> Self {
        Self::with_limits(category, Limits::default())
    }

    /// Creates a pipeline with explicit limits.
    pub fn with_limits(category: SchemaCategory, limits: Limits) -> Self {
        Self { category, limits }
    }

    /// Validates an upload, dispatching on its extension: archives go
    /// through zip containment checks and then per-entry validation,
    /// anything else is treated as a single XML document.
    ///
    /// `live` supplies the attributes of currently-published documents
    /// for cross-revision rules. Returns `Err` only for environment
    /// faults; every document problem comes back inside the result.
    pub fn validate_upload(
        &self,
        doc: &RawDocument,
        live: Option<&[LiveAttributes]>,
    ) -> Result<ValidationResult, ConfigError> {
        info!(filename = %doc.filename, size = doc.len(), "validating upload");

        if let Err(e) = check_size(doc, self.limits.max_file_bytes) {
            return Ok(ValidationResult::failed_at(
                Stage::SizeChecked,
                vec![Violation::from_error(&e, &doc.filename)],
            ));
        }
        if doc.is_empty() {
            // An empty upload can never contain a data file.
            let e = Error::NoDataFound {
                extension: self.limits.data_extension.clone(),
            };
            return Ok(ValidationResult::failed_at(
                Stage::SizeChecked,
                vec![Violation::from_error(&e, &doc.filename)],
            ));
        }

        if doc.has_extension("zip") {
            self.validate_archive(doc, live)
        } else {
            self.validate_document(&doc.content, &doc.filename, live)
        }
    }

    /// Validates every data entry of an already size-checked archive.
    fn validate_archive(
        &self,
        doc: &RawDocument,
        live: Option<&[LiveAttributes]>,
    ) -> Result<ValidationResult, ConfigError> {
        let entries = match validate_zip(doc, self.limits.max_zip_bytes, &self.limits.data_extension)
        {
            Ok(entries) => entries,
            Err(e) => {
                return Ok(ValidationResult::failed_at(
                    Stage::ZipValidated,
                    vec![Violation::from_error(&e, &doc.filename)],
                ));
            }
        };

        let mut archive = match ZipArchive::new(Cursor::new(doc.content.as_slice())) {
            Ok(archive) => archive,
            Err(e) => {
                return Ok(ValidationResult::failed_at(
                    Stage::ZipValidated,
                    vec![Violation::from_error(&Error::Zip(e), &doc.filename)],
                ));
            }
        };

        let mut violations = Vec::new();
        for name in &entries {
            let mut content = Vec::new();
            {
                let mut entry = match archive.by_name(name) {
                    Ok(entry) => entry,
                    Err(e) => {
                        violations.push(Violation::from_error(&Error::Zip(e), name));
                        continue;
                    }
                };
                if let Err(e) = entry.read_to_end(&mut content) {
                    violations.push(Violation::from_error(&Error::Io(e), name));
                    continue;
                }
            }

            let result = self.validate_document(&content, name, live)?;
            let dangerous = result
                .violations
                .iter()
                .any(|v| v.code == ViolationCode::DangerousXmlError);
            violations.extend(result.violations);
            if dangerous {
                // A dangerous entry aborts the whole upload; no further
                // entries are opened.
                break;
            }
        }
        Ok(self.finish(violations))
    }

    /// Validates one XML document through every stage.
    pub fn validate_document(
        &self,
        bytes: &[u8],
        filename: &str,
        live: Option<&[LiveAttributes]>,
    ) -> Result<ValidationResult, ConfigError> {
        // Guard scan before any tree is built.
        if let Err(e) = dangerous_xml_check(bytes) {
            return Ok(ValidationResult::failed_at(
                Stage::XmlParsed,
                vec![Violation::from_error(&e, filename)],
            ));
        }

        let text = match str::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                return Ok(ValidationResult::failed_at(
                    Stage::XmlParsed,
                    vec![Violation::from_error(&Error::Utf8(e), filename)],
                ));
            }
        };
        let doc = match parse_document(text) {
            Ok(doc) => doc,
            Err(e) => {
                return Ok(ValidationResult::failed_at(
                    Stage::XmlParsed,
                    vec![Violation::from_error(&e, filename)],
                ));
            }
        };
        let root = self.root_element(&doc);

        let mut violations = Vec::new();

        // Schema declaration checks accumulate rather than abort.
        match self.category.declared_version(&root) {
            None => violations.push(Violation::new(
                ViolationCode::SchemaUnknown,
                filename,
                root.line_number(),
                "the document does not declare a recognisable schema version",
            )),
            Some(version) if !self.category.is_supported(&version) => {
                violations.push(Violation::new(
                    ViolationCode::SchemaMismatch,
                    filename,
                    root.line_number(),
                    format!(
                        "declared schema version {version} is not supported for {}",
                        self.category
                    ),
                ));
            }
            Some(_) => {}
        }

        let records = self.map_records(&root);
        debug!(filename, records = records.len(), "schema mapping finished");

        if self.category == SchemaCategory::Timetables {
            let catalogue = default_catalogue()?;
            let validator = PtiValidator::new(catalogue);
            violations.extend(validator.validate(&root, filename, live));
        }

        Ok(self.finish(violations))
    }

    /// Validates a document and additionally runs it against a compiled
    /// structural schema. Structural and rule findings accumulate
    /// independently; a terminal guard or parse failure still aborts
    /// before either runs.
    #[cfg(feature = "validation")]
    pub fn validate_document_with_schema(
        &self,
        bytes: &[u8],
        filename: &str,
        validator: &mut crate::schema::SchemaValidator,
        live: Option<&[LiveAttributes]>,
    ) -> Result<ValidationResult, ConfigError> {
        let mut result = self.validate_document(bytes, filename, live)?;
        if matches!(
            result.status,
            ValidationStatus::FailedAt(Stage::XmlParsed)
        ) {
            return Ok(result);
        }

        let structural = validator.validate(bytes).into_iter().map(|issue| {
            Violation::new(ViolationCode::SchemaError, filename, issue.line, issue.message)
        });
        result.violations.extend(structural);
        Ok(self.finish(result.violations))
    }

    /// Builds the typed domain representation of a document, or the
    /// guard/syntax error preventing one. The "valid document" half of
    /// the pipeline's contract: callers get records or violations,
    /// never a half-parsed tree.
    pub fn extract_records(&self, bytes: &[u8], filename: &str) -> Result<Vec<DomainRecord>, Error> {
        dangerous_xml_check(bytes)?;
        let text = str::from_utf8(bytes)?;
        let doc = parse_document(text)?;
        let root = self.root_element(&doc);
        let records = self.map_records(&root);
        debug!(filename, records = records.len(), "extracted records");
        Ok(records)
    }

    fn root_element<'a, 'input>(
        &self,
        doc: &'a roxmltree::Document<'input>,
    ) -> Element<'a, 'input> {
        match self.category {
            SchemaCategory::Timetables => Element::transxchange_root(doc),
            SchemaCategory::Fares => Element::netex_root(doc),
        }
    }

    fn map_records(&self, root: &Element<'_, '_>) -> Vec<DomainRecord> {
        match self.category {
            SchemaCategory::Timetables => map_timetable_document(root),
            SchemaCategory::Fares => map_fares_document(root),
        }
    }

    /// Normalises accumulated violations and derives the terminal
    /// status from the earliest stage that produced one.
    fn finish(&self, violations: Vec<Violation>) -> ValidationResult {
        let violations = normalise(violations);
        let status = violations
            .iter()
            .map(|v| failure_stage(v.code))
            .min()
            .map_or(ValidationStatus::Passed, ValidationStatus::FailedAt);
        ValidationResult { violations, status }
    }
}

/// The stage at which each violation code is raised.
fn failure_stage(code: ViolationCode) -> Stage {
    match code {
        ViolationCode::FileTooLarge => Stage::SizeChecked,
        ViolationCode::ZipTooLarge
        | ViolationCode::NestedZipForbidden
        | ViolationCode::NoDataFound => Stage::ZipValidated,
        ViolationCode::XmlSyntaxError | ViolationCode::DangerousXmlError => Stage::XmlParsed,
        ViolationCode::SchemaUnknown
        | ViolationCode::SchemaMismatch
        | ViolationCode::SchemaError => Stage::StructurallyValidated,
        ViolationCode::PtiViolationFound => Stage::RuleValidated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    const VALID_TIMETABLE: &str = r#"<?xml version="1.0"?>
<TransXChange xmlns="http://www.transxchange.org.uk/" SchemaVersion="2.4"
    RevisionNumber="2" ModificationDateTime="2024-03-01T10:30:00">
  <Services>
    <Service>
      <ServiceCode>PB0002032:467</ServiceCode>
      <Lines><Line id="l_1"><LineName>42A</LineName></Line></Lines>
      <OperatingPeriod>
        <StartDate>2024-01-01</StartDate>
        <EndDate>2024-12-31</EndDate>
      </OperatingPeriod>
      <StandardService>
        <JourneyPattern id="jp_1">
          <JourneyPatternSectionRefs>jps_1</JourneyPatternSectionRefs>
        </JourneyPattern>
      </StandardService>
    </Service>
  </Services>
  <VehicleJourneys>
    <VehicleJourney>
      <VehicleJourneyCode>vj_1</VehicleJourneyCode>
      <ServiceRef>PB0002032:467</ServiceRef>
      <LineRef>l_1</LineRef>
      <JourneyPatternRef>jp_1</JourneyPatternRef>
      <OperatingProfile>
        <RegularDayType><DaysOfWeek><MondayToFriday/></DaysOfWeek></RegularDayType>
      </OperatingProfile>
    </VehicleJourney>
  </VehicleJourneys>
</TransXChange>"#;

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
    fn test_valid_document_passes() {
        let pipeline = Pipeline::new(SchemaCategory::Timetables);
        let doc = RawDocument::new("timetable.xml", VALID_TIMETABLE.as_bytes().to_vec());
        let result = pipeline.validate_upload(&doc, None).unwrap();
        assert!(result.is_valid(), "violations: {:?}", result.violations);
        assert_eq!(result.status, ValidationStatus::Passed);
    }

    #[test]
    fn test_oversized_upload_fails_at_size_check() {
        let limits = Limits {
            max_file_bytes: 16,
            ..Limits::default()
        };
        let pipeline = Pipeline::with_limits(SchemaCategory::Timetables, limits);
        let doc = RawDocument::new("timetable.xml", VALID_TIMETABLE.as_bytes().to_vec());
        let result = pipeline.validate_upload(&doc, None).unwrap();
        assert_eq!(result.status, ValidationStatus::FailedAt(Stage::SizeChecked));
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].code, ViolationCode::FileTooLarge);
    }

    #[test]
    fn test_zip_with_oversized_entry_never_reaches_parsing() {
        // One entry over the uncompressed limit plus one valid entry:
        // the archive itself compresses under the limit, but the summed
        // uncompressed sizes exceed it, so the whole upload fails
        // containment and no entry is parsed.
        let oversized = vec![b'x'; 8192];
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file("big.xml", deflated).unwrap();
        writer.write_all(&oversized).unwrap();
        writer.start_file("good.xml", deflated).unwrap();
        writer.write_all(VALID_TIMETABLE.as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(bytes.len() < 4096);

        let limits = Limits {
            max_zip_bytes: 4096,
            ..Limits::default()
        };
        let pipeline = Pipeline::with_limits(SchemaCategory::Timetables, limits);
        let doc = RawDocument::new("upload.zip", bytes);

        let result = pipeline.validate_upload(&doc, None).unwrap();
        assert_eq!(result.status, ValidationStatus::FailedAt(Stage::ZipValidated));
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].code, ViolationCode::ZipTooLarge);
    }

    #[test]
    fn test_zip_of_valid_documents_passes() {
        let bytes = build_zip(&[("timetable.xml", VALID_TIMETABLE.as_bytes())]);
        let pipeline = Pipeline::new(SchemaCategory::Timetables);
        let doc = RawDocument::new("upload.zip", bytes);
        let result = pipeline.validate_upload(&doc, None).unwrap();
        assert!(result.is_valid(), "violations: {:?}", result.violations);
    }

    #[test]
    fn test_empty_upload_is_no_data_found() {
        let pipeline = Pipeline::new(SchemaCategory::Timetables);
        let doc = RawDocument::new("empty.xml", Vec::new());
        let result = pipeline.validate_upload(&doc, None).unwrap();
        assert_eq!(result.status, ValidationStatus::FailedAt(Stage::SizeChecked));
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].code, ViolationCode::NoDataFound);
    }

    #[test]
    fn test_doctype_aborts_at_parse_stage() {
        let xml = b"<!DOCTYPE TransXChange><TransXChange/>";
        let pipeline = Pipeline::new(SchemaCategory::Timetables);
        let result = pipeline
            .validate_document(xml, "evil.xml", None)
            .unwrap();
        assert_eq!(result.status, ValidationStatus::FailedAt(Stage::XmlParsed));
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].code, ViolationCode::DangerousXmlError);
    }

    #[test]
    fn test_malformed_document_reports_syntax_violation() {
        let xml = b"<TransXChange>\n  <Services>\n</TransXChange>";
        let pipeline = Pipeline::new(SchemaCategory::Timetables);
        let result = pipeline.validate_document(xml, "bad.xml", None).unwrap();
        assert_eq!(result.status, ValidationStatus::FailedAt(Stage::XmlParsed));
        assert_eq!(result.violations[0].code, ViolationCode::XmlSyntaxError);
        assert!(result.violations[0].line >= 2);
    }

    #[test]
    fn test_missing_schema_version_is_unknown() {
        let xml = b"<TransXChange xmlns=\"http://www.transxchange.org.uk/\"/>";
        let pipeline = Pipeline::new(SchemaCategory::Timetables);
        let result = pipeline.validate_document(xml, "t.xml", None).unwrap();
        assert!(result
            .violations
            .iter()
            .any(|v| v.code == ViolationCode::SchemaUnknown));
    }

    #[test]
    fn test_unsupported_schema_version_is_mismatch() {
        let xml =
            b"<TransXChange xmlns=\"http://www.transxchange.org.uk/\" SchemaVersion=\"9.9\"/>";
        let pipeline = Pipeline::new(SchemaCategory::Timetables);
        let result = pipeline.validate_document(xml, "t.xml", None).unwrap();
        assert!(result
            .violations
            .iter()
            .any(|v| v.code == ViolationCode::SchemaMismatch));
        assert_eq!(
            result.status,
            ValidationStatus::FailedAt(Stage::StructurallyValidated)
        );
    }

    #[test]
    fn test_validation_is_idempotent() {
        let pipeline = Pipeline::new(SchemaCategory::Timetables);
        let doc = RawDocument::new("timetable.xml", VALID_TIMETABLE.as_bytes().to_vec());
        let first = pipeline.validate_upload(&doc, None).unwrap();
        let second = pipeline.validate_upload(&doc, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_extract_records_for_valid_document() {
        let pipeline = Pipeline::new(SchemaCategory::Timetables);
        let records = pipeline
            .extract_records(VALID_TIMETABLE.as_bytes(), "timetable.xml")
            .unwrap();
        assert!(records
            .iter()
            .any(|r| matches!(r, DomainRecord::Service(_))));
        assert!(records
            .iter()
            .any(|r| matches!(r, DomainRecord::VehicleJourney(_))));
    }

    #[test]
    fn test_extract_records_refuses_dangerous_document() {
        let pipeline = Pipeline::new(SchemaCategory::Timetables);
        let err = pipeline
            .extract_records(b"<!DOCTYPE x><x/>", "evil.xml")
            .unwrap_err();
        assert!(matches!(err, Error::DangerousXml { .. }));
    }

    #[test]
    fn test_fares_document_maps_and_passes() {
        let xml = br#"<PublicationDelivery xmlns="http://www.netex.org.uk/netex" version="1.1">
  <dataObjects>
    <CompositeFrame id="cf_1">
      <frames>
        <FareFrame id="ff_1">
          <fareZones><FareZone id="fz_1"><Name>City</Name></FareZone></fareZones>
        </FareFrame>
      </frames>
    </CompositeFrame>
  </dataObjects>
</PublicationDelivery>"#;
        let pipeline = Pipeline::new(SchemaCategory::Fares);
        let result = pipeline.validate_document(xml, "fares.xml", None).unwrap();
        assert!(result.is_valid(), "violations: {:?}", result.violations);

        let records = pipeline.extract_records(xml, "fares.xml").unwrap();
        assert_eq!(records.len(), 1);
    }
}
