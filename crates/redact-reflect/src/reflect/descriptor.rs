//! Field, constructor and method descriptors
//!
//! Descriptors are owned snapshots resolved from the live [`ClassRegistry`]
//! on every call. Each one carries its own access grant, so two callers
//! never share a mutable accessibility flag.
//!
//! **Do not cache descriptors.** The grant lives in a [`Cell`], so a
//! descriptor is `!Sync` and cannot be shared between threads. Re-resolve
//! descriptors instead of keeping them across calls.

use std::cell::Cell;
use std::fmt;

use crate::error::Fault;
use crate::runtime::{
    check_field_read, check_field_write, check_invoke, Class, ClassId, ClassRegistry,
    ConstructorDef, ConstructorFn, FieldDef, MethodDef, MethodFn, PermissionStore,
    ReflectionPermission, Type, Visibility,
};

/// Access granted to a single descriptor
#[derive(Debug)]
struct AccessFlag {
    granted: Cell<ReflectionPermission>,
}

impl AccessFlag {
    fn new() -> Self {
        Self {
            granted: Cell::new(ReflectionPermission::NONE),
        }
    }

    fn is_granted(&self, required: ReflectionPermission) -> bool {
        self.granted.get().contains(required)
    }

    /// Grant `required` unless already granted, asking the policy first
    fn grant<F>(&self, required: ReflectionPermission, member: &dyn fmt::Display, check: F) -> Result<(), Fault>
    where
        F: FnOnce() -> Result<(), Fault>,
    {
        if self.is_granted(required) {
            return Ok(());
        }

        match check() {
            Ok(()) => {
                self.granted.set(self.granted.get().union(required));
                tracing::debug!(member = %member, granted = %required, "reflective access granted");
                Ok(())
            }
            Err(fault) => {
                tracing::warn!(member = %member, required = %required, "reflective access refused");
                Err(fault)
            }
        }
    }
}

/// Field descriptor
#[derive(Debug)]
pub struct Field {
    declaring_class: ClassId,
    declaring_class_name: String,
    module: String,
    name: String,
    ty: Type,
    type_name: String,
    visibility: Visibility,
    slot: usize,
    access: AccessFlag,
}

impl Field {
    pub(crate) fn new(registry: &ClassRegistry, class: &Class, def: &FieldDef) -> Self {
        Self {
            declaring_class: class.id,
            declaring_class_name: class.name.clone(),
            module: class.module.clone(),
            name: def.name.clone(),
            ty: def.ty.clone(),
            type_name: registry.type_name(&def.ty),
            visibility: def.visibility,
            slot: def.slot,
            access: AccessFlag::new(),
        }
    }

    pub fn declaring_class(&self) -> ClassId {
        self.declaring_class
    }

    pub fn declaring_class_name(&self) -> &str {
        &self.declaring_class_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Storage slot in instances of the declaring class and its subclasses
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Whether this descriptor already holds read access
    pub fn is_readable(&self) -> bool {
        self.access
            .is_granted(ReflectionPermission::read(self.visibility))
    }

    /// Whether this descriptor already holds write access
    pub fn is_writable(&self) -> bool {
        self.access
            .is_granted(ReflectionPermission::write(self.visibility))
    }

    pub(crate) fn grant_read(&self, permissions: &PermissionStore) -> Result<(), Fault> {
        self.access
            .grant(ReflectionPermission::read(self.visibility), self, || {
                check_field_read(
                    permissions,
                    self.declaring_class,
                    &self.module,
                    self.visibility,
                    &self.qualified_name(),
                )
            })
    }

    pub(crate) fn grant_write(&self, permissions: &PermissionStore) -> Result<(), Fault> {
        self.access
            .grant(ReflectionPermission::write(self.visibility), self, || {
                check_field_write(
                    permissions,
                    self.declaring_class,
                    &self.module,
                    self.visibility,
                    &self.qualified_name(),
                )
            })
    }

    fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_class_name, self.name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}.{}",
            self.visibility, self.type_name, self.declaring_class_name, self.name
        )
    }
}

/// Constructor descriptor
pub struct Constructor {
    declaring_class: ClassId,
    class_name: String,
    module: String,
    parameter_types: Vec<Type>,
    signature: String,
    visibility: Visibility,
    body: ConstructorFn,
    access: AccessFlag,
}

impl Constructor {
    pub(crate) fn new(registry: &ClassRegistry, class: &Class, def: &ConstructorDef) -> Self {
        Self {
            declaring_class: class.id,
            class_name: class.name.clone(),
            module: class.module.clone(),
            parameter_types: def.parameter_types.clone(),
            signature: registry.signature(&def.parameter_types),
            visibility: def.visibility,
            body: def.body.clone(),
            access: AccessFlag::new(),
        }
    }

    pub fn declaring_class(&self) -> ClassId {
        self.declaring_class
    }

    pub fn parameter_types(&self) -> &[Type] {
        &self.parameter_types
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether this descriptor already holds invoke access
    pub fn is_accessible(&self) -> bool {
        self.access
            .is_granted(ReflectionPermission::invoke(self.visibility))
    }

    pub(crate) fn body(&self) -> &ConstructorFn {
        &self.body
    }

    pub(crate) fn grant_invoke(&self, permissions: &PermissionStore) -> Result<(), Fault> {
        self.access
            .grant(ReflectionPermission::invoke(self.visibility), self, || {
                check_invoke(
                    permissions,
                    self.declaring_class,
                    &self.module,
                    self.visibility,
                    &self.to_string(),
                )
            })
    }
}

impl fmt::Display for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.class_name, self.signature)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("declaring_class", &self.declaring_class)
            .field("signature", &self.to_string())
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

/// Method descriptor
pub struct Method {
    declaring_class: ClassId,
    class_name: String,
    module: String,
    name: String,
    parameter_types: Vec<Type>,
    signature: String,
    return_type: Type,
    return_type_name: String,
    visibility: Visibility,
    body: MethodFn,
    access: AccessFlag,
}

impl Method {
    pub(crate) fn new(registry: &ClassRegistry, class: &Class, def: &MethodDef) -> Self {
        Self {
            declaring_class: class.id,
            class_name: class.name.clone(),
            module: class.module.clone(),
            name: def.name.clone(),
            parameter_types: def.parameter_types.clone(),
            signature: registry.signature(&def.parameter_types),
            return_type: def.return_type.clone(),
            return_type_name: registry.type_name(&def.return_type),
            visibility: def.visibility,
            body: def.body.clone(),
            access: AccessFlag::new(),
        }
    }

    pub fn declaring_class(&self) -> ClassId {
        self.declaring_class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_types(&self) -> &[Type] {
        &self.parameter_types
    }

    pub fn return_type(&self) -> &Type {
        &self.return_type
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether this descriptor already holds invoke access
    pub fn is_accessible(&self) -> bool {
        self.access
            .is_granted(ReflectionPermission::invoke(self.visibility))
    }

    pub(crate) fn body(&self) -> &MethodFn {
        &self.body
    }

    pub(crate) fn grant_invoke(&self, permissions: &PermissionStore) -> Result<(), Fault> {
        self.access
            .grant(ReflectionPermission::invoke(self.visibility), self, || {
                check_invoke(
                    permissions,
                    self.declaring_class,
                    &self.module,
                    self.visibility,
                    &self.to_string(),
                )
            })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({}) -> {}",
            self.class_name, self.name, self.signature, self.return_type_name
        )
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("declaring_class", &self.declaring_class)
            .field("signature", &self.to_string())
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ClassBuilder, Value};

    fn registry_with_user() -> (ClassRegistry, ClassId) {
        let mut registry = ClassRegistry::new();
        let user = ClassBuilder::new("User")
            .in_module("vendor/crm")
            .field("ssn", Type::Str, Visibility::Private)
            .constructor(vec![Type::Str, Type::Int], Visibility::Private, |_, _| Ok(()))
            .method("mask", vec![Type::Int], Type::Str, Visibility::Public, |_, _| {
                Ok(Value::Null)
            })
            .build(&mut registry)
            .unwrap();
        (registry, user)
    }

    #[test]
    fn test_descriptor_display() {
        let (registry, user) = registry_with_user();
        let class = registry.get_class(user).unwrap();

        let field = Field::new(&registry, class, &class.fields()[0]);
        assert_eq!(field.to_string(), "private string User.ssn");

        let ctor = Constructor::new(&registry, class, &class.constructors()[0]);
        assert_eq!(ctor.to_string(), "User(string, int)");

        let method = Method::new(&registry, class, &class.methods()[0]);
        assert_eq!(method.to_string(), "User.mask(int) -> string");
    }

    #[test]
    fn test_grant_is_per_descriptor_and_per_kind() {
        let (registry, user) = registry_with_user();
        let class = registry.get_class(user).unwrap();
        let permissions = PermissionStore::new();

        let first = Field::new(&registry, class, &class.fields()[0]);
        let second = Field::new(&registry, class, &class.fields()[0]);
        assert!(!first.is_readable());

        first.grant_read(&permissions).unwrap();
        assert!(first.is_readable());
        assert!(!first.is_writable());
        assert!(!second.is_readable());
    }

    #[test]
    fn test_refused_grant_leaves_descriptor_inaccessible() {
        let (registry, user) = registry_with_user();
        let class = registry.get_class(user).unwrap();
        let mut permissions = PermissionStore::new();
        permissions.set_module("vendor/crm", ReflectionPermission::PUBLIC_ONLY);

        let ctor = Constructor::new(&registry, class, &class.constructors()[0]);
        let fault = ctor.grant_invoke(&permissions).unwrap_err();
        assert!(matches!(fault, Fault::PermissionDenied(_)));
        assert!(!ctor.is_accessible());

        let method = Method::new(&registry, class, &class.methods()[0]);
        method.grant_invoke(&permissions).unwrap();
        assert!(method.is_accessible());
    }
}
