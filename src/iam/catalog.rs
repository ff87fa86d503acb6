//! Offline role definitions loaded from a file
//!
//! The file maps role identifiers to their included permissions:
//!
//! ```yaml
//! roles/viewer:
//!   - resourcemanager.projects.get
//! roles/storage.admin:
//!   - storage.buckets.get
//!   - storage.buckets.delete
//! ```

use super::RoleResolver;
use crate::config::{decode_document, InputFormat};
use crate::error::{PolicyError, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Role→permissions table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleCatalog {
    roles: HashMap<String, Vec<String>>,
}

impl RoleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a role definition
    pub fn insert<I, S>(&mut self, role: impl Into<String>, permissions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles
            .insert(role.into(), permissions.into_iter().map(Into::into).collect());
    }

    /// Parse a catalog from YAML or JSON text
    pub fn parse(text: &str, format: InputFormat) -> Result<Self> {
        let doc = decode_document(text, format)?;
        let roles: HashMap<String, Vec<String>> = serde_json::from_value(doc).map_err(|e| {
            PolicyError::MalformedDocument(format!(
                "role catalog must map role names to permission lists: {e}"
            ))
        })?;
        debug!(roles = roles.len(), "loaded role catalog");
        Ok(RoleCatalog { roles })
    }

    /// Load a catalog file; `.json` files are read as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PolicyError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read {}: {e}", path.display()),
            ))
        })?;
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Yaml,
        };
        Self::parse(&text, format)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RoleResolver for RoleCatalog {
    fn permissions(&mut self, role: &str) -> Result<Option<Vec<String>>> {
        let found = self.roles.get(role).cloned();
        if found.is_none() {
            warn!("role {} not in catalog, skipping", role);
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_parse_yaml_catalog() {
        let mut catalog = RoleCatalog::parse(
            "roles/viewer:\n  - resourcemanager.projects.get\nroles/owner:\n  - resourcemanager.projects.get\n  - resourcemanager.projects.delete\n",
            InputFormat::Yaml,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);

        let roles: BTreeSet<String> = ["roles/viewer", "roles/owner", "roles/editor"]
            .into_iter()
            .map(String::from)
            .collect();
        let matching = catalog
            .roles_with_permission(&roles, "resourcemanager.projects.delete")
            .unwrap();
        assert_eq!(matching, BTreeSet::from(["roles/owner".to_string()]));
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        let err = RoleCatalog::parse(r#"{"roles/viewer": "not-a-list"}"#, InputFormat::Json)
            .unwrap_err();
        assert!(matches!(err, PolicyError::MalformedDocument(_)));
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut catalog = RoleCatalog::new();
        assert!(catalog.is_empty());
        catalog.insert("roles/run.invoker", ["run.routes.invoke"]);

        assert_eq!(
            catalog.permissions("roles/run.invoker").unwrap(),
            Some(vec!["run.routes.invoke".to_string()])
        );
        assert_eq!(catalog.permissions("roles/unknown").unwrap(), None);
    }

    #[test]
    fn test_load_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roles.json");
        std::fs::write(&path, r#"{"roles/editor": ["storage.buckets.get"]}"#).unwrap();

        let catalog = RoleCatalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);
    }
}
