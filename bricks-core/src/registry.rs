//! Global class registry used to resolve HTML class names.
//!
//! The registry maps a class name to the builder's global class ID and the
//! framework it came from. It is built once from the site's class list (or
//! loaded from a cache file) and only read during conversion.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ID prefix the site uses for imported framework utility classes.
pub const ACSS_ID_PREFIX: &str = "acss_import_";

/// Errors that can occur while persisting or restoring the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// An I/O error occurred while reading or writing the cache file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The cache file could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Where a global class comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassOrigin {
    /// Framework utility class (Automatic.css import).
    Acss,
    /// Component class (Frames and anything user-defined).
    Frames,
}

impl ClassOrigin {
    /// Classify a class by its global class ID.
    #[must_use]
    pub fn from_class_id(id: &str) -> Self {
        if id.starts_with(ACSS_ID_PREFIX) {
            Self::Acss
        } else {
            Self::Frames
        }
    }

    /// Wire name of the origin.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Acss => "acss",
            Self::Frames => "frames",
        }
    }
}

impl std::fmt::Display for ClassOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved global class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    /// Global class ID.
    pub id: String,
    /// Class origin.
    pub origin: ClassOrigin,
}

/// Aggregate counts for a registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// All classes.
    pub total: usize,
    /// Framework utility classes.
    pub acss: usize,
    /// Component classes.
    pub frames: usize,
}

/// Class name to global class mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassRegistry {
    by_name: HashMap<String, ClassEntry>,
}

impl ClassRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a class.
    pub fn add(&mut self, name: impl Into<String>, id: impl Into<String>, origin: ClassOrigin) {
        self.by_name.insert(
            name.into(),
            ClassEntry {
                id: id.into(),
                origin,
            },
        );
    }

    /// Look up a class by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&ClassEntry> {
        self.by_name.get(name)
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the registry holds no classes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Counts by origin.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        self.by_name
            .values()
            .fold(RegistryStats::default(), |mut stats, entry| {
                stats.total += 1;
                match entry.origin {
                    ClassOrigin::Acss => stats.acss += 1,
                    ClassOrigin::Frames => stats.frames += 1,
                }
                stats
            })
    }

    /// All class names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// Class names with the given origin, sorted.
    #[must_use]
    pub fn by_origin(&self, origin: ClassOrigin) -> Vec<String> {
        let mut names: Vec<String> = self
            .by_name
            .iter()
            .filter(|(_, entry)| entry.origin == origin)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Build a registry from the site's raw class records.
    ///
    /// Each record is expected to carry string `id` and `name` fields.
    /// Records missing either are skipped.
    #[must_use]
    pub fn build_from_source(records: &[serde_json::Value]) -> Self {
        let mut registry = Self::new();
        for record in records {
            let id = record.get("id").and_then(serde_json::Value::as_str);
            let name = record.get("name").and_then(serde_json::Value::as_str);
            match (id, name) {
                (Some(id), Some(name)) if !id.is_empty() && !name.is_empty() => {
                    registry.add(name, id, ClassOrigin::from_class_id(id));
                }
                _ => tracing::trace!("Skipping class record without id or name"),
            }
        }
        tracing::debug!("Built class registry with {} classes", registry.len());
        registry
    }

    /// Write the registry to a JSON cache file.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] if the file cannot be written.
    pub fn save_to_file(&self, path: impl AsRef<Path>, site_url: &str) -> Result<(), RegistryError> {
        let cache = RegistryCache {
            fetched_at: Utc::now(),
            site_url: site_url.to_string(),
            by_name: self
                .by_name
                .iter()
                .map(|(name, entry)| (name.clone(), (entry.id.clone(), entry.origin)))
                .collect(),
        };
        let json = serde_json::to_string_pretty(&cache)?;
        std::fs::write(path.as_ref(), json)?;
        tracing::debug!(
            "Saved {} classes to {}",
            self.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Read a registry from a JSON cache file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be parsed.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        Ok(RegistryCache::load(path)?.into_registry())
    }

    /// Read a registry from a cache file, treating any failure as "no cache".
    #[must_use]
    pub fn load_cached(path: impl AsRef<Path>) -> Option<Self> {
        match Self::load_from_file(path.as_ref()) {
            Ok(registry) => Some(registry),
            Err(e) => {
                tracing::warn!(
                    "Ignoring class registry cache {}: {e}",
                    path.as_ref().display()
                );
                None
            }
        }
    }
}

/// On-disk form of the class registry cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryCache {
    /// When the class list was fetched.
    pub fetched_at: DateTime<Utc>,
    /// Site the classes were fetched from.
    pub site_url: String,
    /// Class name to `[id, origin]`.
    pub by_name: BTreeMap<String, (String, ClassOrigin)>,
}

impl RegistryCache {
    /// Read and parse a cache file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Convert the cache into a registry.
    #[must_use]
    pub fn into_registry(self) -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        for (name, (id, origin)) in self.by_name {
            registry.add(name, id, origin);
        }
        registry
    }
}
