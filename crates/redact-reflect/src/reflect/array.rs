//! Array allocation for a runtime element type

use crate::error::{Fault, ReflectError, ReflectResult};
use crate::runtime::{Array, ArrayRef, ClassRegistry, Type};

/// Allocate an array of `length` default-initialized elements.
///
/// Fails with [`ReflectError::Allocation`] on a negative length or when the
/// element type mentions an unregistered class. A length whose storage
/// cannot be reserved is reported the same way.
pub fn new_array(registry: &ClassRegistry, element_type: &Type, length: i64) -> ReflectResult<ArrayRef> {
    let fail = |cause| ReflectError::Allocation {
        element_type: registry.type_name(element_type),
        length,
        cause,
    };

    if length < 0 {
        return Err(fail(Fault::NegativeArraySize(length)));
    }
    if !registry.contains_type(element_type) {
        return Err(fail(Fault::UnknownType(registry.type_name(element_type))));
    }
    let length = usize::try_from(length)
        .map_err(|_| fail(Fault::IllegalArgument(format!("array length {} is too large", length))))?;

    tracing::trace!(element_type = %registry.type_name(element_type), length, "allocating array");
    let array = Array::try_new(element_type.clone(), length)
        .map_err(|e| fail(Fault::IllegalArgument(format!("array length {} is too large: {}", length, e))))?;
    Ok(ArrayRef::new(array))
}
