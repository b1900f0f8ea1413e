//! Reflection Security & Permissions
//!
//! Controls which reflective access grants the host type system allows.
//! Accessor and invoker operations always ask for access before acting; the
//! policy here decides whether that grant succeeds. A refused grant is
//! reported as a [`Fault::PermissionDenied`].
//!
//! Resolution order (most specific first):
//! 1. class-level entry of the member's declaring class
//! 2. module-level entry (exact module name, then wildcard rules)
//! 3. global default (`ALL`)

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::error::Fault;

use super::class::Visibility;
use super::class_registry::ClassId;

/// Reflection permission flags (bitflags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReflectionPermission(u8);

impl ReflectionPermission {
    /// No reflection allowed
    pub const NONE: Self = Self(0x00);
    /// Read public fields
    pub const READ_PUBLIC: Self = Self(0x01);
    /// Read non-public fields
    pub const READ_PRIVATE: Self = Self(0x02);
    /// Write public fields
    pub const WRITE_PUBLIC: Self = Self(0x04);
    /// Write non-public fields
    pub const WRITE_PRIVATE: Self = Self(0x08);
    /// Invoke public constructors and methods
    pub const INVOKE_PUBLIC: Self = Self(0x10);
    /// Invoke non-public constructors and methods
    pub const INVOKE_PRIVATE: Self = Self(0x20);

    // Common combinations
    /// READ_PUBLIC | READ_PRIVATE
    pub const READ_ALL: Self = Self(0x03);
    /// WRITE_PUBLIC | WRITE_PRIVATE
    pub const WRITE_ALL: Self = Self(0x0C);
    /// INVOKE_PUBLIC | INVOKE_PRIVATE
    pub const INVOKE_ALL: Self = Self(0x30);
    /// READ_PUBLIC | WRITE_PUBLIC | INVOKE_PUBLIC
    pub const PUBLIC_ONLY: Self = Self(0x15);
    /// Everything
    pub const ALL: Self = Self(0x3F);

    /// Create from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Get raw bits
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Check if permission contains a flag
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of permissions
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Intersection of permissions
    pub const fn intersection(&self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Difference (remove flags)
    pub const fn difference(&self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Flag required to read a field of the given visibility
    pub const fn read(visibility: Visibility) -> Self {
        match visibility {
            Visibility::Public => Self::READ_PUBLIC,
            Visibility::Protected | Visibility::Private => Self::READ_PRIVATE,
        }
    }

    /// Flag required to write a field of the given visibility
    pub const fn write(visibility: Visibility) -> Self {
        match visibility {
            Visibility::Public => Self::WRITE_PUBLIC,
            Visibility::Protected | Visibility::Private => Self::WRITE_PRIVATE,
        }
    }

    /// Flag required to invoke an executable of the given visibility
    pub const fn invoke(visibility: Visibility) -> Self {
        match visibility {
            Visibility::Public => Self::INVOKE_PUBLIC,
            Visibility::Protected | Visibility::Private => Self::INVOKE_PRIVATE,
        }
    }

    /// Parse a single flag name, hex (`0x3F`) or decimal value
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NONE" => Some(Self::NONE),
            "READ_PUBLIC" => Some(Self::READ_PUBLIC),
            "READ_PRIVATE" => Some(Self::READ_PRIVATE),
            "WRITE_PUBLIC" => Some(Self::WRITE_PUBLIC),
            "WRITE_PRIVATE" => Some(Self::WRITE_PRIVATE),
            "INVOKE_PUBLIC" => Some(Self::INVOKE_PUBLIC),
            "INVOKE_PRIVATE" => Some(Self::INVOKE_PRIVATE),
            "READ_ALL" => Some(Self::READ_ALL),
            "WRITE_ALL" => Some(Self::WRITE_ALL),
            "INVOKE_ALL" => Some(Self::INVOKE_ALL),
            "PUBLIC_ONLY" => Some(Self::PUBLIC_ONLY),
            "ALL" => Some(Self::ALL),
            _ => {
                let bits = if let Some(hex) = s.strip_prefix("0x") {
                    u8::from_str_radix(hex, 16).ok()
                } else {
                    s.parse::<u8>().ok()
                };
                bits.filter(|b| b & !Self::ALL.0 == 0).map(Self::from_bits)
            }
        }
    }

    /// Parse combined flags from pipe-separated string (e.g., "READ_PUBLIC|WRITE_PUBLIC")
    pub fn parse_combined(s: &str) -> Option<Self> {
        let mut result = Self::NONE;
        for part in s.split('|') {
            let perm = Self::parse(part.trim())?;
            result = result.union(perm);
        }
        Some(result)
    }

    fn name(&self) -> Option<&'static str> {
        let name = match *self {
            Self::NONE => "NONE",
            Self::READ_PUBLIC => "READ_PUBLIC",
            Self::READ_PRIVATE => "READ_PRIVATE",
            Self::WRITE_PUBLIC => "WRITE_PUBLIC",
            Self::WRITE_PRIVATE => "WRITE_PRIVATE",
            Self::INVOKE_PUBLIC => "INVOKE_PUBLIC",
            Self::INVOKE_PRIVATE => "INVOKE_PRIVATE",
            Self::READ_ALL => "READ_ALL",
            Self::WRITE_ALL => "WRITE_ALL",
            Self::INVOKE_ALL => "INVOKE_ALL",
            Self::PUBLIC_ONLY => "PUBLIC_ONLY",
            Self::ALL => "ALL",
            _ => return None,
        };
        Some(name)
    }
}

impl Default for ReflectionPermission {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for ReflectionPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

/// Errors raised while editing the permission store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermissionError {
    #[error("Cannot modify sealed permissions of class #{0}")]
    SealedClass(ClassId),
}

/// Module permission pattern (supports wildcards)
#[derive(Debug, Clone)]
pub struct ModulePermissionRule {
    /// Pattern (e.g., "myapp", "plugins/*", "**")
    pub pattern: String,
    /// Permissions for matching modules
    pub permissions: ReflectionPermission,
}

impl ModulePermissionRule {
    /// Check if a module name matches this pattern
    pub fn matches(&self, module_name: &str) -> bool {
        if self.pattern == "**" || self.pattern == "*" {
            return true;
        }

        if let Some(prefix) = self.pattern.strip_suffix("/*") {
            module_name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|rest| !rest.is_empty())
        } else if let Some(prefix) = self.pattern.strip_suffix("/**") {
            module_name
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        } else {
            self.pattern == module_name
        }
    }
}

/// Store for reflection permissions
#[derive(Debug)]
pub struct PermissionStore {
    /// Global default permissions
    global_default: ReflectionPermission,

    /// Class-level permissions
    class_permissions: FxHashMap<ClassId, ReflectionPermission>,

    /// Module-level permissions (exact names)
    module_permissions: FxHashMap<String, ReflectionPermission>,

    /// Module permission rules (for wildcard patterns, first match wins)
    module_rules: Vec<ModulePermissionRule>,

    /// Sealed classes
    sealed_classes: FxHashSet<ClassId>,
}

impl PermissionStore {
    /// Create a new permission store with default (ALL) permissions
    pub fn new() -> Self {
        Self {
            global_default: ReflectionPermission::ALL,
            class_permissions: FxHashMap::default(),
            module_permissions: FxHashMap::default(),
            module_rules: Vec::new(),
            sealed_classes: FxHashSet::default(),
        }
    }

    /// Check if any permissions are configured
    pub fn has_any_restrictions(&self) -> bool {
        self.global_default != ReflectionPermission::ALL
            || !self.class_permissions.is_empty()
            || !self.module_permissions.is_empty()
            || !self.module_rules.is_empty()
    }

    // ===== Global Permissions =====

    /// Set global default permissions
    pub fn set_global(&mut self, permissions: ReflectionPermission) {
        self.global_default = permissions;
    }

    /// Get global default permissions
    pub fn get_global(&self) -> ReflectionPermission {
        self.global_default
    }

    // ===== Class Permissions =====

    /// Set class-level permissions
    pub fn set_class(
        &mut self,
        class_id: ClassId,
        permissions: ReflectionPermission,
    ) -> Result<(), PermissionError> {
        if self.sealed_classes.contains(&class_id) {
            return Err(PermissionError::SealedClass(class_id));
        }
        self.class_permissions.insert(class_id, permissions);
        Ok(())
    }

    /// Get class-level permissions (not resolved)
    pub fn get_class(&self, class_id: ClassId) -> Option<ReflectionPermission> {
        self.class_permissions.get(&class_id).copied()
    }

    /// Clear class-level permissions
    pub fn clear_class(&mut self, class_id: ClassId) -> Result<(), PermissionError> {
        if self.sealed_classes.contains(&class_id) {
            return Err(PermissionError::SealedClass(class_id));
        }
        self.class_permissions.remove(&class_id);
        Ok(())
    }

    /// Seal class permissions
    pub fn seal_class(&mut self, class_id: ClassId) {
        self.sealed_classes.insert(class_id);
    }

    /// Check if class permissions are sealed
    pub fn is_class_sealed(&self, class_id: ClassId) -> bool {
        self.sealed_classes.contains(&class_id)
    }

    // ===== Module Permissions =====

    /// Set module-level permissions
    pub fn set_module(&mut self, module_name: &str, permissions: ReflectionPermission) {
        self.module_permissions
            .insert(module_name.to_string(), permissions);
    }

    /// Get module-level permissions (not resolved, direct match only)
    pub fn get_module(&self, module_name: &str) -> Option<ReflectionPermission> {
        self.module_permissions.get(module_name).copied()
    }

    /// Get module permissions with pattern matching
    pub fn get_module_resolved(&self, module_name: &str) -> Option<ReflectionPermission> {
        if let Some(perms) = self.module_permissions.get(module_name) {
            return Some(*perms);
        }

        self.module_rules
            .iter()
            .find(|rule| rule.matches(module_name))
            .map(|rule| rule.permissions)
    }

    /// Clear module-level permissions
    pub fn clear_module(&mut self, module_name: &str) {
        self.module_permissions.remove(module_name);
    }

    /// Add a module permission rule
    pub fn add_module_rule(&mut self, rule: ModulePermissionRule) {
        self.module_rules.push(rule);
    }

    /// Clear all module rules
    pub fn clear_module_rules(&mut self) {
        self.module_rules.clear();
    }

    // ===== Permission Resolution =====

    /// Resolve permissions for a member declared by `class_id` in `module_name`
    pub fn resolve(&self, class_id: Option<ClassId>, module_name: Option<&str>) -> ReflectionPermission {
        if let Some(perms) = class_id.and_then(|cid| self.get_class(cid)) {
            return perms;
        }

        if let Some(perms) = module_name.and_then(|name| self.get_module_resolved(name)) {
            return perms;
        }

        self.global_default
    }

    /// Check if a specific permission is allowed
    pub fn check_permission(
        &self,
        class_id: Option<ClassId>,
        module_name: Option<&str>,
        required: ReflectionPermission,
    ) -> bool {
        self.resolve(class_id, module_name).contains(required)
    }
}

impl Default for PermissionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn denied(action: &str, visibility: Visibility, member: &str) -> Fault {
    Fault::PermissionDenied(format!(
        "cannot {} {} member {}",
        action, visibility, member
    ))
}

/// Check field read permission
pub fn check_field_read(
    store: &PermissionStore,
    class_id: ClassId,
    module_name: &str,
    visibility: Visibility,
    member: &str,
) -> Result<(), Fault> {
    let required = ReflectionPermission::read(visibility);
    if !store.check_permission(Some(class_id), Some(module_name), required) {
        return Err(denied("read", visibility, member));
    }
    Ok(())
}

/// Check field write permission
pub fn check_field_write(
    store: &PermissionStore,
    class_id: ClassId,
    module_name: &str,
    visibility: Visibility,
    member: &str,
) -> Result<(), Fault> {
    let required = ReflectionPermission::write(visibility);
    if !store.check_permission(Some(class_id), Some(module_name), required) {
        return Err(denied("write", visibility, member));
    }
    Ok(())
}

/// Check constructor/method invocation permission
pub fn check_invoke(
    store: &PermissionStore,
    class_id: ClassId,
    module_name: &str,
    visibility: Visibility,
    member: &str,
) -> Result<(), Fault> {
    let required = ReflectionPermission::invoke(visibility);
    if !store.check_permission(Some(class_id), Some(module_name), required) {
        return Err(denied("invoke", visibility, member));
    }
    Ok(())
}
