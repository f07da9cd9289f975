//! The declarative PTI observation catalogue.
//!
//! Observations are published as a JSON document with a header and a
//! list of numbered observations, each carrying its guidance reference,
//! element context, and path/predicate tests. The catalogue is loaded
//! once and read-only for the process lifetime.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::ConfigError;

/// The catalogue shipped with this crate.
const DEFAULT_CATALOGUE_JSON: &str = include_str!("../../data/pti_observations.json");

/// Catalogue header metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogueHeader {
    /// Namespace prefixes used by observation contexts
    #[serde(default)]
    pub namespaces: HashMap<String, String>,
    /// Catalogue version
    pub version: String,
    /// Free-text notes
    #[serde(default)]
    pub notes: String,
    /// Guidance document the references point into
    #[serde(default)]
    pub guidance_document: String,
}

/// One path/predicate test of an observation.
#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    /// The test expression, as published
    pub test: String,
}

/// One numbered observation.
#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
    /// What the observation checks, used as the violation message
    pub details: String,
    /// Grouping category
    pub category: String,
    /// Which service types the observation applies to
    #[serde(default)]
    pub service_type: String,
    /// Section of the guidance document
    #[serde(default)]
    pub reference: String,
    /// Element context the observation evaluates under
    #[serde(default)]
    pub context: String,
    /// Stable observation number
    pub number: i64,
    /// Declarative tests
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// The loaded observation catalogue.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleCatalogue {
    /// Header metadata
    pub header: CatalogueHeader,
    /// All observations, in publication order
    pub observations: Vec<Observation>,
}

impl RuleCatalogue {
    /// Parses a catalogue from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(bytes).map_err(|e| ConfigError::Catalogue(e.to_string()))
    }

    /// Looks up an observation by number.
    pub fn observation(&self, number: i64) -> Option<&Observation> {
        self.observations.iter().find(|o| o.number == number)
    }
}

static DEFAULT: OnceLock<std::result::Result<RuleCatalogue, String>> = OnceLock::new();

/// The catalogue shipped with the crate, parsed once per process.
///
/// A parse failure is an environment fault (a bad build), reported as
/// [`ConfigError::Catalogue`] on every call rather than a panic.
pub fn default_catalogue() -> Result<&'static RuleCatalogue, ConfigError> {
    DEFAULT
        .get_or_init(|| {
            RuleCatalogue::from_json(DEFAULT_CATALOGUE_JSON.as_bytes())
                .map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| ConfigError::Catalogue(e.clone()))
}
