//! Reflection configuration (redact.toml)
//!
//! ```toml
//! [reflect.permissions]
//! global = "ALL"              # default for everything else
//! sealed = ["Account"]        # class entries that cannot be changed later
//!
//! [reflect.permissions.modules]
//! "app" = "ALL"
//! "vendor/*" = "PUBLIC_ONLY"
//!
//! [reflect.permissions.classes]
//! "Account" = "READ_ALL|WRITE_PUBLIC"
//! ```
//!
//! Wildcard module patterns are tried most specific (longest) first.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::{
    ClassId, ClassRegistry, ModulePermissionRule, PermissionError, PermissionStore,
    ReflectionPermission,
};

/// Errors that can occur while loading or applying configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Unrecognized permission value
    #[error("Invalid permission value for {key}: {value}")]
    InvalidPermission { key: String, value: String },

    /// Class entry names a class that is not registered
    #[error("Unknown class in permissions: {0}")]
    UnknownClass(String),

    /// The permission store refused the change
    #[error(transparent)]
    Permission(#[from] PermissionError),
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReflectConfig {
    #[serde(default)]
    pub reflect: ReflectSection,
}

/// `[reflect]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReflectSection {
    #[serde(default)]
    pub permissions: PermissionsConfig,
}

/// `[reflect.permissions]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PermissionsConfig {
    /// Global default (`ALL` when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<String>,

    /// Module name or pattern to permissions
    #[serde(default)]
    pub modules: BTreeMap<String, String>,

    /// Class name to permissions
    #[serde(default)]
    pub classes: BTreeMap<String, String>,

    /// Classes whose entries are sealed after loading
    #[serde(default)]
    pub sealed: Vec<String>,
}

impl ReflectConfig {
    /// Parse configuration from a TOML string
    pub fn from_str(toml_content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_content)?)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Apply the permission section to a store.
    ///
    /// Class names are resolved against `registry`, so classes must be
    /// registered before the configuration is applied. Every entry is
    /// validated before the store is touched: on error the store is left
    /// unchanged.
    pub fn apply(&self, registry: &ClassRegistry, store: &mut PermissionStore) -> Result<(), ConfigError> {
        let permissions = &self.reflect.permissions;

        let global = permissions
            .global
            .as_deref()
            .map(|value| parse_permission("global", value))
            .transpose()?;

        let mut modules = Vec::new();
        let mut rules = Vec::new();
        for (pattern, value) in &permissions.modules {
            let perms = parse_permission(pattern, value)?;
            if pattern.contains('*') {
                rules.push(ModulePermissionRule {
                    pattern: pattern.clone(),
                    permissions: perms,
                });
            } else {
                modules.push((pattern.as_str(), perms));
            }
        }
        rules.sort_by_key(|rule| std::cmp::Reverse(rule.pattern.trim_end_matches('*').len()));

        let mut classes = Vec::with_capacity(permissions.classes.len());
        for (name, value) in &permissions.classes {
            let perms = parse_permission(name, value)?;
            let class_id = resolve_class(registry, name)?;
            if store.is_class_sealed(class_id) {
                return Err(PermissionError::SealedClass(class_id).into());
            }
            classes.push((class_id, perms));
        }

        let sealed = permissions
            .sealed
            .iter()
            .map(|name| resolve_class(registry, name))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(global) = global {
            store.set_global(global);
        }
        for (module, perms) in modules {
            store.set_module(module, perms);
        }
        for rule in rules {
            store.add_module_rule(rule);
        }
        for (class_id, perms) in classes {
            store.set_class(class_id, perms)?;
        }
        for class_id in sealed {
            store.seal_class(class_id);
        }

        tracing::debug!(
            modules = permissions.modules.len(),
            classes = permissions.classes.len(),
            restricted = store.has_any_restrictions(),
            "applied reflection permissions"
        );
        Ok(())
    }
}

fn resolve_class(registry: &ClassRegistry, name: &str) -> Result<ClassId, ConfigError> {
    registry
        .get_class_by_name(name)
        .map(|class| class.id)
        .ok_or_else(|| ConfigError::UnknownClass(name.to_string()))
}

fn parse_permission(key: &str, value: &str) -> Result<ReflectionPermission, ConfigError> {
    ReflectionPermission::parse_combined(value).ok_or_else(|| ConfigError::InvalidPermission {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_unrestricted() {
        let config = ReflectConfig::from_str("").unwrap();
        assert_eq!(config, ReflectConfig::default());

        let registry = ClassRegistry::new();
        let mut store = PermissionStore::new();
        config.apply(&registry, &mut store).unwrap();
        assert!(!store.has_any_restrictions());
    }

    #[test]
    fn test_specific_wildcards_win() {
        let toml = r#"
[reflect.permissions.modules]
"**" = "NONE"
"vendor/**" = "PUBLIC_ONLY"
"#;
        let config = ReflectConfig::from_str(toml).unwrap();
        let registry = ClassRegistry::new();
        let mut store = PermissionStore::new();
        config.apply(&registry, &mut store).unwrap();

        assert_eq!(
            store.get_module_resolved("vendor/crm"),
            Some(ReflectionPermission::PUBLIC_ONLY)
        );
        assert_eq!(store.get_module_resolved("app"), Some(ReflectionPermission::NONE));
    }

    #[test]
    fn test_invalid_permission() {
        let toml = r#"
[reflect.permissions]
global = "EVERYTHING"
"#;
        let config = ReflectConfig::from_str(toml).unwrap();
        let mut store = PermissionStore::new();
        let err = config.apply(&ClassRegistry::new(), &mut store).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPermission { ref key, .. } if key == "global"));
    }

    #[test]
    fn test_malformed_toml() {
        let result = ReflectConfig::from_str("[reflect.permissions\nglobal = ");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_failed_apply_leaves_store_untouched() {
        let toml = r#"
[reflect.permissions]
global = "PUBLIC_ONLY"
sealed = ["Ghost"]

[reflect.permissions.modules]
"app" = "NONE"
"vendor/*" = "READ_ALL"
"#;
        let config = ReflectConfig::from_str(toml).unwrap();
        let mut store = PermissionStore::new();
        let err = config.apply(&ClassRegistry::new(), &mut store).unwrap_err();

        assert!(matches!(err, ConfigError::UnknownClass(ref name) if name == "Ghost"));
        assert_eq!(store.get_global(), ReflectionPermission::ALL);
        assert_eq!(store.get_module("app"), None);
        assert_eq!(store.get_module_resolved("vendor/crm"), None);
        assert!(!store.has_any_restrictions());
    }
}
