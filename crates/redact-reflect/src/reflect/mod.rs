//! Reflective access layer
//!
//! Four primitive capabilities consumed by the masking engine:
//! enumerate fields, get a field, set a field, and instantiate/invoke.
//! Plus array allocation and runtime type extraction.
//!
//! ## Operations
//!
//! | Operation                   | Failure                    |
//! |-----------------------------|----------------------------|
//! | `list_all_fields`           | none (absent type → empty) |
//! | `get_field_value`           | `ReflectError::Access`     |
//! | `set_field_value`           | `ReflectError::Access`     |
//! | `get_declared_constructor`  | none (miss → `None`)       |
//! | `get_declared_method`       | `ReflectError::Resolution` |
//! | `new_instance`              | `ReflectError::Invocation` |
//! | `invoke_method`             | `ReflectError::Invocation` |
//! | `new_array`                 | `ReflectError::Allocation` |
//! | `runtime_type_of`           | none (`Null` → `None`)     |
//!
//! Every entry point resolves descriptors from the live registry and every
//! access/invoke grants itself access on the descriptor before acting.
//! Nothing is cached between calls.

mod access;
mod array;
mod descriptor;
mod executable;
mod fields;
mod introspection;

pub use access::{get_field_value, set_field_value};
pub use array::new_array;
pub use descriptor::{Constructor, Field, Method};
pub use executable::{get_declared_constructor, get_declared_method, invoke_method, new_instance};
pub use fields::{declared_fields, find_field, list_all_fields};
pub use introspection::{class_hierarchy, class_of, is_instance_of, is_subclass_of, runtime_type_of};
