//! Transport-schedule XML validation library for Rust.
//!
//! This crate ingests TransXChange-like timetable and NeTEx-like fares
//! documents and produces either a typed domain representation or a
//! structured, ordered list of violations.
//!
//! # Features
//!
//! - **Ingestion Guard**: size limits, zip containment rules, and a
//!   defensive scan that rejects DOCTYPEs and entity references before
//!   any tree is built.
//! - **Element Navigator**: namespace-aware traversal with three-way
//!   lookups and line-number tracking for diagnostics.
//! - **Schema Mapper**: typed records for stops, services, journeys,
//!   operating profiles, routes, serviced organisations, and fares.
//! - **Structural Validation**: XSD validation against versioned,
//!   cached schema bundles (optional `validation` feature).
//! - **PTI Rules**: a declarative observation catalogue evaluated with
//!   memoised document accessors, including cross-revision checks.
//!
//! # Quick Start
//!
//! ```rust
//! use txc_validate::{Pipeline, RawDocument, SchemaCategory};
//!
//! let xml = br#"<TransXChange xmlns="http://www.transxchange.org.uk/"
//!     SchemaVersion="2.4"/>"#;
//! let pipeline = Pipeline::new(SchemaCategory::Timetables);
//! let doc = RawDocument::new("timetable.xml", xml.to_vec());
//!
//! let result = pipeline.validate_upload(&doc, None).unwrap();
//! for violation in &result.violations {
//!     println!("{}:{} {}", violation.filename, violation.line, violation.code);
//! }
//! ```
//!
//! # Module Structure
//!
//! - [`guard`] - pre-parse defensive checks
//! - [`navigator`] - namespace-aware tree navigation
//! - [`records`] - typed domain records and their mappers
//! - [`schema`] - versioned schema bundles and structural validation
//! - [`pti`] - the semantic rule engine
//! - [`report`] - violations and the normalising reporter
//! - [`pipeline`] - stage orchestration
//! - [`error`] - error types
//!
//! # Optional Features
//!
//! - `validation` - XSD validation backed by libxml2

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod guard;
pub mod navigator;
pub mod pipeline;
pub mod pti;
pub mod records;
pub mod report;
pub mod schema;

// Re-export commonly used types at the crate root
pub use error::{ConfigError, Error, Result};
pub use guard::RawDocument;
pub use navigator::{Element, Lookup};
pub use pipeline::{Limits, Pipeline};
pub use pti::{LiveAttributes, PtiValidator, RuleCatalogue};
pub use records::DomainRecord;
pub use report::{Stage, ValidationResult, ValidationStatus, Violation, ViolationCode};
pub use schema::{SchemaCategory, SchemaDefinition, SchemaRegistry, SchemaStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
