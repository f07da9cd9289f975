//! Violations and the reporter that normalizes them.
//!
//! Every defect found by any stage ends up as one [`Violation`] with the
//! same shape: a closed code, a file and line, and the observation
//! metadata when the rule engine raised it. [`normalise`] puts mixed
//! sources into one stable order.

use serde::Serialize;

use crate::error::Error;

/// The closed set of violation codes this pipeline can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    /// Upload exceeds the file size limit
    FileTooLarge,
    /// Archive exceeds the uncompressed size limit
    ZipTooLarge,
    /// Archive contains another archive
    NestedZipForbidden,
    /// Archive contains no data files
    NoDataFound,
    /// Document is not well-formed XML
    XmlSyntaxError,
    /// Document carries a DOCTYPE or entity declaration
    DangerousXmlError,
    /// Document violates the structural schema
    SchemaError,
    /// Document declares no recognisable schema version
    SchemaUnknown,
    /// Document declares an unsupported schema version
    SchemaMismatch,
    /// Document violates a PTI observation
    PtiViolationFound,
}

impl ViolationCode {
    /// The wire name of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationCode::FileTooLarge => "FILE_TOO_LARGE",
            ViolationCode::ZipTooLarge => "ZIP_TOO_LARGE",
            ViolationCode::NestedZipForbidden => "NESTED_ZIP_FORBIDDEN",
            ViolationCode::NoDataFound => "NO_DATA_FOUND",
            ViolationCode::XmlSyntaxError => "XML_SYNTAX_ERROR",
            ViolationCode::DangerousXmlError => "DANGEROUS_XML_ERROR",
            ViolationCode::SchemaError => "SCHEMA_ERROR",
            ViolationCode::SchemaUnknown => "SCHEMA_UNKNOWN",
            ViolationCode::SchemaMismatch => "SCHEMA_MISMATCH",
            ViolationCode::PtiViolationFound => "PTI_VIOLATION_FOUND",
        }
    }

    /// Fixed ordering of the stage that raises each code, used as the
    /// final sort key so mixed sources interleave deterministically.
    fn stage_precedence(&self) -> u8 {
        match self {
            ViolationCode::FileTooLarge
            | ViolationCode::ZipTooLarge
            | ViolationCode::NestedZipForbidden
            | ViolationCode::NoDataFound => 0,
            ViolationCode::DangerousXmlError | ViolationCode::XmlSyntaxError => 1,
            ViolationCode::SchemaUnknown | ViolationCode::SchemaMismatch => 2,
            ViolationCode::SchemaError => 3,
            ViolationCode::PtiViolationFound => 4,
        }
    }
}

impl std::fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One reported defect, structural or semantic, with file and line
/// attribution. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Violation code
    pub code: ViolationCode,
    /// File the defect was found in
    pub filename: String,
    /// 1-based line the defect is attributed to
    pub line: u64,
    /// Observation category, empty for non-rule violations
    pub category: String,
    /// Guidance reference, empty for non-rule violations
    pub reference: String,
    /// Element context, empty for non-rule violations
    pub context: String,
    /// Human-readable message
    pub message: String,
    /// Observation number, 0 for non-rule violations
    pub numeric_id: i64,
}

impl Violation {
    /// Creates a violation with empty observation metadata.
    pub fn new(
        code: ViolationCode,
        filename: impl Into<String>,
        line: u64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            filename: filename.into(),
            line,
            category: String::new(),
            reference: String::new(),
            context: String::new(),
            message: message.into(),
            numeric_id: 0,
        }
    }

    /// Converts a guard or parse error into its violation.
    ///
    /// Unreadable archives surface as [`ViolationCode::NoDataFound`]: a
    /// container the reader cannot open yields no data files. Low-level
    /// read failures surface as syntax errors at line 1.
    pub fn from_error(err: &Error, filename: &str) -> Self {
        let message = err.to_string();
        match err {
            Error::FileTooLarge { .. } => {
                Self::new(ViolationCode::FileTooLarge, filename, 1, message)
            }
            Error::ZipTooLarge { .. } => {
                Self::new(ViolationCode::ZipTooLarge, filename, 1, message)
            }
            Error::NestedZipForbidden { .. } => {
                Self::new(ViolationCode::NestedZipForbidden, filename, 1, message)
            }
            Error::NoDataFound { .. } | Error::Zip(_) => {
                Self::new(ViolationCode::NoDataFound, filename, 1, message)
            }
            Error::DangerousXml { .. } => {
                Self::new(ViolationCode::DangerousXmlError, filename, 1, message)
            }
            Error::XmlSyntax { line, .. } => {
                Self::new(ViolationCode::XmlSyntaxError, filename, *line, message)
            }
            Error::XmlScan(_) | Error::Utf8(_) | Error::Io(_) | Error::NoParent(_) => {
                Self::new(ViolationCode::XmlSyntaxError, filename, 1, message)
            }
        }
    }
}

/// Pipeline stages, in execution order. The derived ordering follows
/// declaration order, so earlier stages compare smaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Stage {
    /// Document received, nothing checked yet
    Received,
    /// Size limits verified
    SizeChecked,
    /// Zip containment rules verified
    ZipValidated,
    /// Parsed into a navigable tree
    XmlParsed,
    /// Typed records mapped
    SchemaMapped,
    /// Checked against the structural schema
    StructurallyValidated,
    /// Checked against the PTI rule catalogue
    RuleValidated,
    /// Violations normalised and returned
    Reported,
}

/// Terminal status of one validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationStatus {
    /// No violations of any kind
    Passed,
    /// The pipeline stopped at (or accumulated violations up to) a stage
    FailedAt(Stage),
}

/// The ordered violation list plus terminal status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    /// Violations in reporting order
    pub violations: Vec<Violation>,
    /// Terminal status
    pub status: ValidationStatus,
}

impl ValidationResult {
    /// A passing result with no violations.
    pub fn passed() -> Self {
        Self {
            violations: Vec::new(),
            status: ValidationStatus::Passed,
        }
    }

    /// A result that failed at `stage` with the given violations.
    pub fn failed_at(stage: Stage, violations: Vec<Violation>) -> Self {
        Self {
            violations: normalise(violations),
            status: ValidationStatus::FailedAt(stage),
        }
    }

    /// True when the document passed every stage.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Sorts violations into the stable reporting order: filename, then
/// line, then stage precedence, then observation number.
///
/// Idempotent: normalising an already-normalised list is the identity.
pub fn normalise(mut violations: Vec<Violation>) -> Vec<Violation> {
    violations.sort_by(|a, b| {
        a.filename
            .cmp(&b.filename)
            .then(a.line.cmp(&b.line))
            .then(a.code.stage_precedence().cmp(&b.code.stage_precedence()))
            .then(a.numeric_id.cmp(&b.numeric_id))
    });
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_names() {
        assert_eq!(ViolationCode::FileTooLarge.as_str(), "FILE_TOO_LARGE");
        assert_eq!(ViolationCode::DangerousXmlError.as_str(), "DANGEROUS_XML_ERROR");
        assert_eq!(ViolationCode::PtiViolationFound.as_str(), "PTI_VIOLATION_FOUND");
    }

    #[test]
    fn test_serialized_shape() {
        let violation = Violation::new(ViolationCode::SchemaError, "a.xml", 7, "bad element");
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["code"], "SCHEMA_ERROR");
        assert_eq!(json["filename"], "a.xml");
        assert_eq!(json["line"], 7);
        assert_eq!(json["message"], "bad element");
    }

    #[test]
    fn test_normalise_order_and_idempotence() {
        let violations = vec![
            Violation::new(ViolationCode::PtiViolationFound, "b.xml", 3, "pti"),
            Violation::new(ViolationCode::SchemaError, "a.xml", 9, "schema"),
            Violation::new(ViolationCode::PtiViolationFound, "a.xml", 9, "pti"),
            Violation::new(ViolationCode::XmlSyntaxError, "a.xml", 2, "syntax"),
        ];

        let sorted = normalise(violations);
        let order: Vec<(&str, u64, &str)> = sorted
            .iter()
            .map(|v| (v.filename.as_str(), v.line, v.code.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.xml", 2, "XML_SYNTAX_ERROR"),
                ("a.xml", 9, "SCHEMA_ERROR"),
                ("a.xml", 9, "PTI_VIOLATION_FOUND"),
                ("b.xml", 3, "PTI_VIOLATION_FOUND"),
            ]
        );

        let again = normalise(sorted.clone());
        assert_eq!(again, sorted);
    }

    #[test]
    fn test_from_error_carries_line() {
        let err = Error::XmlSyntax {
            line: 41,
            message: "mismatched tag".to_string(),
        };
        let violation = Violation::from_error(&err, "bad.xml");
        assert_eq!(violation.code, ViolationCode::XmlSyntaxError);
        assert_eq!(violation.line, 41);
        assert_eq!(violation.filename, "bad.xml");
    }
}
