//! Redact reflective access layer
//!
//! This crate provides the introspection-and-mutation toolkit the Redact
//! masking engine uses to rewrite sensitive fields inside arbitrary object
//! graphs:
//! - Field enumeration across a class and all of its ancestors
//! - Field reads and writes regardless of declared visibility
//! - Exact-signature constructor and method lookup and invocation
//! - Array allocation for a runtime element type
//! - Runtime type extraction
//!
//! The host type system lives in [`runtime`]; the reflective operations in
//! [`reflect`]. Which visibility bypasses are allowed is decided by a
//! [`PermissionStore`], optionally loaded from `redact.toml` via
//! [`ReflectConfig`].
//!
//! Descriptors returned by this crate must not be cached or shared between
//! threads: each call resolves fresh descriptors and grants access on them.

pub mod config;
pub mod error;
pub mod reflect;
pub mod runtime;

pub use config::{ConfigError, ReflectConfig};
pub use error::{Fault, ReflectError, ReflectResult, Thrown};
pub use reflect::{
    class_hierarchy, class_of, declared_fields, find_field, get_declared_constructor,
    get_declared_method, get_field_value, invoke_method, is_instance_of, is_subclass_of,
    list_all_fields, new_array, new_instance, runtime_type_of, set_field_value, Constructor,
    Field, Method,
};
pub use runtime::{
    ArrayRef, Class, ClassBuilder, ClassId, ClassRegistry, DefinitionError, FromValue, ObjectRef,
    PermissionStore, ReflectionPermission, Type, Value, Visibility, ROOT_CLASS_ID,
};
