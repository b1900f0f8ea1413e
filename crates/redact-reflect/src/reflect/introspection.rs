//! Runtime type queries

use crate::runtime::{Class, ClassId, ClassRegistry, ObjectRef, Type, Value};

/// Exact runtime type of a value.
///
/// Returns the concrete class of an instance rather than any declared
/// supertype. `Null` has no runtime type; callers must not pass it.
pub fn runtime_type_of(value: &Value) -> Option<Type> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(Type::Bool),
        Value::Int(_) => Some(Type::Int),
        Value::Float(_) => Some(Type::Float),
        Value::Str(_) => Some(Type::Str),
        Value::Object(obj) => Some(Type::Class(obj.class_id())),
        Value::Array(arr) => Some(Type::array(arr.element_type().clone())),
    }
}

/// Concrete class of an instance
pub fn class_of(obj: &ObjectRef) -> ClassId {
    obj.class_id()
}

/// Check if a class is a subclass of (or the same as) another class
pub fn is_subclass_of(registry: &ClassRegistry, sub_class_id: ClassId, super_class_id: ClassId) -> bool {
    registry.is_subclass_of(sub_class_id, super_class_id)
}

/// Check if a value is an instance of a class
pub fn is_instance_of(registry: &ClassRegistry, value: &Value, class_id: ClassId) -> bool {
    match value {
        Value::Object(obj) => registry.is_subclass_of(obj.class_id(), class_id),
        _ => false,
    }
}

/// Get the inheritance chain of a class.
///
/// The first element is the class itself, the last is the outermost
/// ancestor below the root class. The root class is never included.
pub fn class_hierarchy(registry: &ClassRegistry, class_id: ClassId) -> Vec<&Class> {
    let mut hierarchy = Vec::new();
    let mut current_id = Some(class_id);

    while let Some(id) = current_id {
        match registry.get_class(id) {
            Some(class) if !class.is_root() => {
                hierarchy.push(class);
                current_id = class.parent_id;
            }
            _ => break,
        }
    }

    hierarchy
}
