//! Host type system
//!
//! A small dynamic object model standing in for a native reflection
//! facility: classes with single inheritance and declared members, object
//! instances with slot storage, dynamically typed values, and the
//! permission policy that decides whether visibility may be bypassed.
//!
//! The reflective core in [`crate::reflect`] only ever queries this model;
//! it never keeps anything it reads from it.

mod class;
mod class_registry;
mod object;
mod permissions;
mod type_builder;
mod value;

pub use class::{Class, ConstructorDef, ConstructorFn, FieldDef, MethodDef, MethodFn, Visibility};
pub use class_registry::{ClassId, ClassRegistry, ROOT_CLASS_ID, ROOT_CLASS_NAME};
pub use object::{Array, ArrayRef, Object, ObjectRef};
pub use permissions::{
    check_field_read, check_field_write, check_invoke, ModulePermissionRule, PermissionError,
    PermissionStore, ReflectionPermission,
};
pub use type_builder::{ClassBuilder, DefinitionError};
pub use value::{FromValue, Type, Value};
