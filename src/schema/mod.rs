//! Versioned schema bundles and their on-disk cache.
//!
//! Schema files ship as one zip bundle per (category, version). On first
//! use a bundle is extracted to `{cache_root}/{category}/{entry_path}`
//! so the validator can resolve `xs:include`s between files. Extraction
//! is process-wide state with an init-once-then-read-only lifecycle: a
//! single mutex guards the check-then-create, each file is written to a
//! temporary sibling and renamed into place, and files that already
//! exist are never rewritten.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use tracing::debug;
use zip::ZipArchive;

use crate::error::ConfigError;
use crate::navigator::Element;
use crate::records::parse_int;

#[cfg(feature = "validation")]
mod validate;
#[cfg(feature = "validation")]
pub use validate::{SchemaIssue, SchemaValidator};

/// The two schema families this pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaCategory {
    /// TransXChange timetable documents
    Timetables,
    /// NeTEx fares documents
    Fares,
}

impl SchemaCategory {
    /// Cache-directory name for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaCategory::Timetables => "timetables",
            SchemaCategory::Fares => "fares",
        }
    }

    /// Schema versions with a published bundle.
    pub fn supported_versions(&self) -> &'static [&'static str] {
        match self {
            SchemaCategory::Timetables => &["2.1", "2.4"],
            SchemaCategory::Fares => &["1.1"],
        }
    }

    /// Returns true when `version` has a published bundle.
    pub fn is_supported(&self, version: &str) -> bool {
        self.supported_versions().contains(&version)
    }

    /// Reads the schema version a document declares on its root element.
    ///
    /// Timetable roots carry `SchemaVersion`; fares roots carry
    /// `version`. Returns `None` when the attribute is missing or not a
    /// dotted number, which callers report as an unknown schema.
    pub fn declared_version(&self, root: &Element<'_, '_>) -> Option<String> {
        let raw = match self {
            SchemaCategory::Timetables => root.attribute("SchemaVersion")?,
            SchemaCategory::Fares => root.attribute("version")?,
        };
        let raw = raw.trim();
        let plausible = !raw.is_empty()
            && raw
                .split('.')
                .all(|part| parse_int(part).is_some());
        plausible.then(|| raw.to_string())
    }
}

impl std::fmt::Display for SchemaCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A schema bundle resolved for one (category, version) pair.
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    /// Schema family
    pub category: SchemaCategory,
    /// Bundle version
    pub version: String,
    /// The zip-packaged schema file set
    pub bundle: Vec<u8>,
}

/// Registered schema bundles, resolved by (category, version).
///
/// The embedding service registers every bundle it ships at startup;
/// resolution failures for a supported version are environment faults,
/// not document violations.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    bundles: HashMap<(SchemaCategory, String), SchemaDefinition>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bundle, replacing any earlier one for the same
    /// (category, version).
    pub fn register(&mut self, def: SchemaDefinition) {
        self.bundles
            .insert((def.category, def.version.clone()), def);
    }

    /// Resolves the bundle for a (category, version) pair.
    pub fn resolve(
        &self,
        category: SchemaCategory,
        version: &str,
    ) -> Result<&SchemaDefinition, ConfigError> {
        self.bundles
            .get(&(category, version.to_string()))
            .ok_or_else(|| ConfigError::SchemaBundleMissing {
                category: category.as_str().to_string(),
                version: version.to_string(),
            })
    }
}

/// Ledger of bundles already extracted in this process.
static EXTRACTED: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();

fn extraction_ledger() -> &'static Mutex<HashSet<String>> {
    EXTRACTED.get_or_init(|| Mutex::new(HashSet::new()))
}

/// The on-disk schema cache.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    cache_root: PathBuf,
}

impl SchemaStore {
    /// Creates a store rooted at `cache_root`. Nothing is created on
    /// disk until a bundle is materialised.
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
        }
    }

    /// Extracts a bundle into the cache if this process has not already
    /// done so, and returns the path of the bundle's root `.xsd`.
    ///
    /// Safe against concurrent first use: callers racing on the same
    /// bundle serialize on the ledger mutex, and each file lands via a
    /// temp-write-then-rename so a crash can never leave a half-written
    /// schema where the next run would trust it.
    pub fn materialise(&self, def: &SchemaDefinition) -> Result<PathBuf, ConfigError> {
        let target_dir = self.cache_root.join(def.category.as_str());
        let key = format!("{}|{}|{}", target_dir.display(), def.category, def.version);

        let ledger = extraction_ledger();
        {
            let mut extracted = ledger
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if !extracted.contains(&key) {
                self.extract_bundle(def, &target_dir)?;
                extracted.insert(key);
            }
        }

        self.root_schema_path(def, &target_dir)
    }

    fn extract_bundle(&self, def: &SchemaDefinition, target_dir: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(target_dir)?;
        let mut archive = ZipArchive::new(Cursor::new(def.bundle.as_slice()))
            .map_err(|e| ConfigError::Catalogue(format!("unreadable schema bundle: {e}")))?;

        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| ConfigError::Catalogue(format!("unreadable schema bundle: {e}")))?;
            // enclosed_name rejects absolute and parent-traversal paths.
            let Some(relative) = entry.enclosed_name() else {
                continue;
            };
            if entry.is_dir() {
                continue;
            }
            let target = target_dir.join(relative);
            if target.exists() {
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut content = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut content)?;

            let tmp = target.with_extension("tmp-extract");
            fs::write(&tmp, &content)?;
            fs::rename(&tmp, &target)?;
            debug!(path = %target.display(), "extracted schema file");
        }
        Ok(())
    }

    /// Locates the bundle's root schema: the shallowest `.xsd`,
    /// tie-broken by name, so wrapper schemas at the archive root win
    /// over their includes.
    fn root_schema_path(
        &self,
        def: &SchemaDefinition,
        target_dir: &Path,
    ) -> Result<PathBuf, ConfigError> {
        let mut archive = ZipArchive::new(Cursor::new(def.bundle.as_slice()))
            .map_err(|e| ConfigError::Catalogue(format!("unreadable schema bundle: {e}")))?;

        let mut candidates: Vec<PathBuf> = Vec::new();
        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|e| ConfigError::Catalogue(format!("unreadable schema bundle: {e}")))?;
            if entry.is_dir() {
                continue;
            }
            if let Some(name) = entry.enclosed_name() {
                if name.extension().is_some_and(|ext| ext == "xsd") {
                    candidates.push(name);
                }
            }
        }
        candidates
            .into_iter()
            .min_by_key(|p| (p.components().count(), p.to_path_buf()))
            .map(|root| target_dir.join(root))
            .ok_or_else(|| ConfigError::SchemaBundleEmpty {
                category: def.category.as_str().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::parse_document;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn bundle(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_materialise_extracts_and_finds_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::new(dir.path());
        let def = SchemaDefinition {
            category: SchemaCategory::Timetables,
            version: "2.4".to_string(),
            bundle: bundle(&[
                ("includes/types.xsd", "<included/>"),
                ("transxchange.xsd", "<root/>"),
                ("README.txt", "not a schema"),
            ]),
        };

        let root = store.materialise(&def).unwrap();
        assert!(root.ends_with("timetables/transxchange.xsd"));
        assert_eq!(fs::read_to_string(&root).unwrap(), "<root/>");
        assert!(dir.path().join("timetables/includes/types.xsd").exists());
    }

    #[test]
    fn test_materialise_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::new(dir.path());
        let def = SchemaDefinition {
            category: SchemaCategory::Fares,
            version: "1.1".to_string(),
            bundle: bundle(&[("netex.xsd", "<original/>")]),
        };

        let first = store.materialise(&def).unwrap();
        // Existing files are never rewritten, even by a fresh store.
        fs::write(&first, "<tampered/>").unwrap();
        let second = SchemaStore::new(dir.path()).materialise(&def).unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(&second).unwrap(), "<tampered/>");
    }

    #[test]
    fn test_empty_bundle_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::new(dir.path());
        let def = SchemaDefinition {
            category: SchemaCategory::Timetables,
            version: "2.1".to_string(),
            bundle: bundle(&[("README.txt", "no schemas")]),
        };
        assert!(matches!(
            store.materialise(&def),
            Err(ConfigError::SchemaBundleEmpty { .. })
        ));
    }

    #[test]
    fn test_declared_version() {
        let doc = parse_document("<TransXChange SchemaVersion=\"2.4\"/>").unwrap();
        let root = Element::root(&doc);
        assert_eq!(
            SchemaCategory::Timetables.declared_version(&root),
            Some("2.4".to_string())
        );

        let doc = parse_document("<TransXChange SchemaVersion=\"latest\"/>").unwrap();
        let root = Element::root(&doc);
        assert_eq!(SchemaCategory::Timetables.declared_version(&root), None);

        let doc = parse_document("<PublicationDelivery version=\"1.1\"/>").unwrap();
        let root = Element::root(&doc);
        assert_eq!(
            SchemaCategory::Fares.declared_version(&root),
            Some("1.1".to_string())
        );
    }

    #[test]
    fn test_registry_resolves_registered_bundles() {
        let mut registry = SchemaRegistry::new();
        registry.register(SchemaDefinition {
            category: SchemaCategory::Timetables,
            version: "2.4".to_string(),
            bundle: bundle(&[("transxchange.xsd", "<root/>")]),
        });

        let def = registry.resolve(SchemaCategory::Timetables, "2.4").unwrap();
        assert_eq!(def.version, "2.4");

        // A supported version without a registered bundle is an
        // environment fault, not a document violation.
        assert!(matches!(
            registry.resolve(SchemaCategory::Timetables, "2.1"),
            Err(ConfigError::SchemaBundleMissing { .. })
        ));
        assert!(matches!(
            registry.resolve(SchemaCategory::Fares, "1.1"),
            Err(ConfigError::SchemaBundleMissing { .. })
        ));
    }

    #[test]
    fn test_supported_versions() {
        assert!(SchemaCategory::Timetables.is_supported("2.4"));
        assert!(!SchemaCategory::Timetables.is_supported("3.0"));
        assert!(SchemaCategory::Fares.is_supported("1.1"));
    }
}
