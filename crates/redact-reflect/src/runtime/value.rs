//! Dynamically typed values and declared types

use std::fmt;

use super::class_registry::{ClassId, ClassRegistry};
use super::object::{ArrayRef, ObjectRef};

/// Declared type of a field, parameter, return value or array element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    Int,
    Float,
    Str,
    /// Any reference or primitive value
    Any,
    /// Instances of a registered class (or its subclasses)
    Class(ClassId),
    /// Arrays with the given element type
    Array(Box<Type>),
}

impl Type {
    /// Create an array type
    pub fn array(element_type: Type) -> Self {
        Type::Array(Box::new(element_type))
    }

    /// Primitive types cannot hold `null`
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Bool | Type::Int | Type::Float)
    }

    /// Default value of a freshly allocated slot of this type
    pub fn default_value(&self) -> Value {
        match self {
            Type::Bool => Value::Bool(false),
            Type::Int => Value::Int(0),
            Type::Float => Value::Float(0.0),
            Type::Str | Type::Any | Type::Class(_) | Type::Array(_) => Value::Null,
        }
    }
}

/// Runtime value
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Object(ObjectRef),
    Array(ArrayRef),
}

impl Value {
    /// Check for `null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value's kind, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
        }
    }

    /// Check whether this value may be stored in a slot of type `ty`.
    ///
    /// No widening or boxing: an `Int` is not assignable to `Float`.
    /// Objects are assignable to any ancestor of their runtime class.
    pub fn is_assignable_to(&self, ty: &Type, registry: &ClassRegistry) -> bool {
        match (self, ty) {
            (_, Type::Any) => true,
            (Value::Null, ty) => !ty.is_primitive(),
            (Value::Bool(_), Type::Bool)
            | (Value::Int(_), Type::Int)
            | (Value::Float(_), Type::Float)
            | (Value::Str(_), Type::Str) => true,
            (Value::Object(obj), Type::Class(class_id)) => {
                registry.is_subclass_of(obj.class_id(), *class_id)
            }
            (Value::Array(arr), Type::Array(element_type)) => {
                is_element_compatible(arr.element_type(), element_type, registry)
            }
            _ => false,
        }
    }
}

fn is_element_compatible(actual: &Type, expected: &Type, registry: &ClassRegistry) -> bool {
    match (actual, expected) {
        (_, Type::Any) => !actual.is_primitive(),
        (Type::Class(sub), Type::Class(sup)) => registry.is_subclass_of(*sub, *sup),
        (Type::Array(a), Type::Array(b)) => is_element_compatible(a, b, registry),
        _ => actual == expected,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Object(obj) => write!(f, "object#{}", obj.object_id()),
            Value::Array(arr) => write!(f, "array[{}]", arr.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<ArrayRef> for Value {
    fn from(arr: ArrayRef) -> Self {
        Value::Array(arr)
    }
}

/// Conversion from a dynamically typed invocation result.
///
/// On mismatch the original value is handed back so the caller can
/// report it.
pub trait FromValue: Sized {
    /// Name of the expected type, for diagnostics
    const EXPECTED: &'static str;

    /// Convert the value, or return it unchanged on mismatch
    fn from_value(value: Value) -> Result<Self, Value>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any";

    fn from_value(value: Value) -> Result<Self, Value> {
        Ok(value)
    }
}

impl FromValue for () {
    const EXPECTED: &'static str = "null";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Null => Ok(()),
            other => Err(other),
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(other),
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Float(x) => Ok(x),
            other => Err(other),
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(other),
        }
    }
}

impl FromValue for ObjectRef {
    const EXPECTED: &'static str = "object";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Object(obj) => Ok(obj),
            other => Err(other),
        }
    }
}

impl FromValue for ArrayRef {
    const EXPECTED: &'static str = "array";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Array(arr) => Ok(arr),
            other => Err(other),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
