//! Error types for the transport-schedule validation library.

use thiserror::Error;

/// Errors raised while processing a single submitted document.
///
/// Every variant here is attributable to the input document itself.
/// Environment faults (missing schema bundles, unreadable rule catalogues)
/// live in [`ConfigError`] instead, because they must alarm the operator
/// rather than be reported against the upload.
#[derive(Error, Debug)]
pub enum Error {
    /// Declared file size exceeds the configured maximum
    #[error("file too large: {size} bytes exceeds the {max} byte limit")]
    FileTooLarge {
        /// Observed size in bytes
        size: u64,
        /// Configured maximum in bytes
        max: u64,
    },

    /// Declared or summed uncompressed zip size exceeds the maximum
    #[error("zip too large: {size} bytes uncompressed exceeds the {max} byte limit")]
    ZipTooLarge {
        /// Declared or summed uncompressed size in bytes
        size: u64,
        /// Configured maximum in bytes
        max: u64,
    },

    /// A zip entry is itself a zip archive
    #[error("nested zip forbidden: entry {entry}")]
    NestedZipForbidden {
        /// Name of the offending entry
        entry: String,
    },

    /// No entry with the required data extension was found
    #[error("no data found: no .{extension} entry in the archive")]
    NoDataFound {
        /// Extension the caller required
        extension: String,
    },

    /// The document contains a DOCTYPE or entity declaration
    #[error("dangerous XML construct: {construct}")]
    DangerousXml {
        /// Which construct was found
        construct: String,
    },

    /// The document is not well-formed XML
    #[error("XML syntax error at line {line}: {message}")]
    XmlSyntax {
        /// 1-based line of the first offending byte
        line: u64,
        /// Parser message
        message: String,
    },

    /// A non-root element unexpectedly has no parent
    #[error("element {0} has no parent")]
    NoParent(String),

    /// Zip container error
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML scanning error
    #[error("XML scanning error: {0}")]
    XmlScan(#[from] quick_xml::Error),

    /// UTF-8 conversion error
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Environment misconfiguration, distinct from bad input documents.
///
/// Callers treat these as operational alarms: the pipeline refuses to run
/// rather than reporting a violation against the document.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No schema bundle registered for a supported (category, version) pair
    #[error("no schema bundle for {category} version {version}")]
    SchemaBundleMissing {
        /// Schema category name
        category: String,
        /// Requested version
        version: String,
    },

    /// A registered bundle contains no schema files
    #[error("schema bundle for {category} contains no .xsd entry")]
    SchemaBundleEmpty {
        /// Schema category name
        category: String,
    },

    /// Schema compilation failed
    #[error("schema for {category} failed to compile: {details}")]
    SchemaCompile {
        /// Schema category name
        category: String,
        /// libxml2 error messages, joined
        details: String,
    },

    /// The rule catalogue could not be read or parsed
    #[error("rule catalogue error: {0}")]
    Catalogue(String),

    /// Cache directory creation or extraction failed
    #[error("schema cache error: {0}")]
    Cache(#[from] std::io::Error),
}

/// Result type alias for document-processing operations.
pub type Result<T> = std::result::Result<T, Error>;
