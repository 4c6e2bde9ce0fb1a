//! SQL template registry.
//!
//! All SQL in this application lives in `*.sql.yml` documents, one per
//! module, scanned once at startup. Keeping statements out of application
//! code means they can be copied straight into psql for troubleshooting,
//! and every statement reaches the database as a parameterized query.
//!
//! A template file looks like:
//!
//! ```yaml
//! sql:
//!   people:
//!     findById: >-
//!       SELECT
//!         id,
//!         first_name AS "firstName",
//!         last_name AS "lastName",
//!         age
//!       FROM
//!         people
//!       WHERE
//!         id = $1
//! ```
//!
//! Each operation registers under the composite key `"<module>.<operation>"`,
//! where the module namespace comes from the file name (`people.sql.yml` →
//! `people`), never from the file's internal content. Any malformed file,
//! mismatched module name, or duplicate key aborts startup: a broken
//! template set is a deployment defect, not something to degrade around.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::db::errors::TemplateError;

/// File extension (compound suffix) that marks a template document.
const TEMPLATE_SUFFIX: &str = ".sql.yml";

/// Shape of one template document: a `sql:` root holding the module's
/// operation → SQL-text mapping.
#[derive(Debug, Deserialize)]
struct TemplateFile {
    sql: BTreeMap<String, BTreeMap<String, String>>,
}

/// Immutable registry of named SQL templates.
///
/// Built exactly once at startup via [`TemplateRegistry::load`] (or
/// [`TemplateRegistry::from_entries`] in tests) and shared by reference
/// with every consumer; there is no global instance and no mutation after
/// construction.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, String>,
}

impl TemplateRegistry {
    /// Recursively scan `root` for `*.sql.yml` files and register every
    /// template they define.
    ///
    /// Keys are globally unique by construction, so the scan order never
    /// affects the resulting map. Fails fast on the first unreadable or
    /// malformed file and on any duplicate key.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let root = root.as_ref();
        let mut registry = Self::default();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| TemplateError::Io {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let Some(module) = file_name.strip_suffix(TEMPLATE_SUFFIX) else {
                continue;
            };

            registry.load_file(entry.path(), module)?;
        }

        Ok(registry)
    }

    /// Build a registry from in-memory `(key, sql)` pairs.
    ///
    /// This is the substitution point for tests: a fake template set can be
    /// injected without touching the filesystem. The same uniqueness and
    /// non-empty-segment rules apply.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut registry = Self::default();
        for (key, sql) in entries {
            registry.insert(key.into(), sql.into(), Path::new("<inline>"))?;
        }
        Ok(registry)
    }

    /// Return the SQL text registered for `key`, verbatim.
    ///
    /// A missing key is [`TemplateError::NotFound`]; this never falls back
    /// to an empty or placeholder value.
    pub fn get(&self, key: &str) -> Result<&str, TemplateError> {
        self.templates
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| TemplateError::NotFound { key: key.to_owned() })
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn load_file(&mut self, path: &Path, module: &str) -> Result<(), TemplateError> {
        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: TemplateFile = serde_yaml::from_str(&text).map_err(|source| TemplateError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        // The namespace comes from the file name; a file declaring anything
        // else under `sql:` would register under a name nobody expects.
        if file.sql.len() != 1 || !file.sql.contains_key(module) {
            return Err(TemplateError::ModuleMismatch {
                path: path.to_path_buf(),
                expected: module.to_owned(),
                found: file.sql.keys().cloned().collect(),
            });
        }

        let operations = &file.sql[module];
        debug!(module, count = operations.len(), file = %path.display(), "registering SQL templates");

        for (operation, sql) in operations {
            self.insert(format!("{module}.{operation}"), sql.clone(), path)?;
        }
        Ok(())
    }

    fn insert(&mut self, key: String, sql: String, path: &Path) -> Result<(), TemplateError> {
        match key.split_once('.') {
            Some((module, operation)) if !module.is_empty() && !operation.is_empty() => {}
            _ => return Err(TemplateError::EmptySegment { key }),
        }

        match self.templates.entry(key) {
            std::collections::hash_map::Entry::Occupied(occupied) => Err(TemplateError::Duplicate {
                key: occupied.key().clone(),
                path: path.to_path_buf(),
            }),
            std::collections::hash_map::Entry::Vacant(vacant) => {
                vacant.insert(sql);
                Ok(())
            }
        }
    }
}
