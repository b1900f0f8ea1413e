//! Reflection error model
//!
//! Every fault raised by the host type system while reading, writing,
//! resolving, invoking or allocating is caught where it happens and
//! re-raised as exactly one [`ReflectError`] carrying enough context
//! (type names, member names, argument snapshots) to diagnose it without
//! a debugger attached. The underlying [`Fault`] is kept as the error
//! source.

use thiserror::Error;

/// A fault raised by user code running inside a constructor or method body
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Thrown {
    /// Human-readable description of the fault
    pub message: String,
}

impl Thrown {
    /// Create a new thrown fault
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Low-level fault reported by the host type system
#[derive(Debug, Error)]
pub enum Fault {
    /// The field is not declared anywhere in the target's hierarchy
    #[error("field `{field}` declared by {declaring_class} is not part of {target_class}")]
    NoSuchField {
        field: String,
        declaring_class: String,
        target_class: String,
    },

    /// No method with the requested name and signature is declared
    #[error("no such method: {0}")]
    NoSuchMethod(String),

    /// Wrong argument count, wrong argument type or wrong receiver
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// The permission policy refused the access grant
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The invoked body raised a fault of its own
    #[error("invoked body threw: {0}")]
    Thrown(#[from] Thrown),

    /// The invocation result could not be coerced to the expected type
    #[error("cannot coerce {value} to {expected}")]
    ResultMismatch { value: String, expected: &'static str },

    /// Array allocation with a negative length
    #[error("negative array size: {0}")]
    NegativeArraySize(i64),

    /// A type that is not registered with the host type system
    #[error("unknown type: {0}")]
    UnknownType(String),
}

/// Reflection error
#[derive(Debug, Error)]
pub enum ReflectError {
    /// A field exists but could not be read, written or made accessible
    #[error("failed to access field `{field}` of {type_name}")]
    Access {
        type_name: String,
        field: String,
        #[source]
        cause: Fault,
    },

    /// A named method could not be located with the exact signature
    #[error("failed to resolve method {type_name}.{method}({signature})")]
    Resolution {
        type_name: String,
        method: String,
        signature: String,
        #[source]
        cause: Fault,
    },

    /// A located constructor or method failed while being invoked
    #[error("failed to invoke {executable} with [{args}]")]
    Invocation {
        executable: String,
        args: String,
        #[source]
        cause: Fault,
    },

    /// Array creation received an invalid length or element type
    #[error("failed to allocate {element_type}[{length}]")]
    Allocation {
        element_type: String,
        length: i64,
        #[source]
        cause: Fault,
    },
}

impl ReflectError {
    /// The underlying fault
    pub fn cause(&self) -> &Fault {
        match self {
            ReflectError::Access { cause, .. }
            | ReflectError::Resolution { cause, .. }
            | ReflectError::Invocation { cause, .. }
            | ReflectError::Allocation { cause, .. } => cause,
        }
    }
}

/// Result of a reflective operation
pub type ReflectResult<T> = Result<T, ReflectError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_source_is_cause() {
        let err = ReflectError::Invocation {
            executable: "constructor User(string)".to_string(),
            args: "\"bob\"".to_string(),
            cause: Fault::Thrown(Thrown::new("boom")),
        };

        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "invoked body threw: boom");
        assert!(matches!(err.cause(), Fault::Thrown(t) if t.message == "boom"));
    }

    #[test]
    fn test_error_messages() {
        let err = ReflectError::Resolution {
            type_name: "User".to_string(),
            method: "mask".to_string(),
            signature: "string, int".to_string(),
            cause: Fault::NoSuchMethod("User.mask(string, int)".to_string()),
        };
        assert_eq!(err.to_string(), "failed to resolve method User.mask(string, int)");

        let err = ReflectError::Allocation {
            element_type: "int".to_string(),
            length: -1,
            cause: Fault::NegativeArraySize(-1),
        };
        assert_eq!(err.to_string(), "failed to allocate int[-1]");
    }
}
