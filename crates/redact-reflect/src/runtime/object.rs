//! Object and array instances

use std::collections::TryReserveError;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::class_registry::ClassId;
use super::value::{Type, Value};

/// Global counter for generating unique object IDs
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique object ID
fn generate_object_id() -> u64 {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Object instance
///
/// Holds one slot per instance field of its class and every ancestor.
/// The runtime class never changes after allocation.
pub struct Object {
    /// Unique object ID (assigned on creation)
    object_id: u64,
    /// Runtime class
    class_id: ClassId,
    /// Field values, indexed by slot
    fields: RwLock<Vec<Value>>,
}

impl Object {
    /// Create a new object with the given slot values
    pub fn new(class_id: ClassId, fields: Vec<Value>) -> Self {
        Self {
            object_id: generate_object_id(),
            class_id,
            fields: RwLock::new(fields),
        }
    }

    /// Unique object ID
    pub fn object_id(&self) -> u64 {
        self.object_id
    }

    /// Runtime class ID
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    /// Get a field value by slot
    pub fn get_field(&self, index: usize) -> Option<Value> {
        self.fields.read().get(index).cloned()
    }

    /// Set a field value by slot
    pub fn set_field(&self, index: usize, value: Value) -> Result<(), String> {
        let mut fields = self.fields.write();
        let count = fields.len();
        match fields.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(format!(
                "Field index {} out of bounds (object has {} fields)",
                index, count
            )),
        }
    }

    /// Get number of slots
    pub fn field_count(&self) -> usize {
        self.fields.read().len()
    }
}

/// Shared handle to an [`Object`]
#[derive(Clone)]
pub struct ObjectRef(Arc<Object>);

impl ObjectRef {
    /// Wrap a freshly created object
    pub fn new(object: Object) -> Self {
        Self(Arc::new(object))
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ObjectRef {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.0
    }
}

// Objects may reference themselves, so never recurse into slots.
impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("object_id", &self.object_id)
            .field("class_id", &self.class_id)
            .finish()
    }
}

/// Array instance with a fixed element type and length
pub struct Array {
    element_type: Type,
    elements: RwLock<Vec<Value>>,
}

impl Array {
    /// Create a new array of `length` default-initialized elements.
    ///
    /// Fails instead of aborting when the backing storage cannot be
    /// reserved.
    pub fn try_new(element_type: Type, length: usize) -> Result<Self, TryReserveError> {
        let mut elements = Vec::new();
        elements.try_reserve_exact(length)?;
        elements.resize(length, element_type.default_value());
        Ok(Self {
            element_type,
            elements: RwLock::new(elements),
        })
    }

    /// Element type
    pub fn element_type(&self) -> &Type {
        &self.element_type
    }

    /// Get array length
    pub fn len(&self) -> usize {
        self.elements.read().len()
    }

    /// Check if array is empty
    pub fn is_empty(&self) -> bool {
        self.elements.read().is_empty()
    }

    /// Get element at index
    pub fn get(&self, index: usize) -> Option<Value> {
        self.elements.read().get(index).cloned()
    }

    /// Set element at index
    pub fn set(&self, index: usize, value: Value) -> Result<(), String> {
        let mut elements = self.elements.write();
        let len = elements.len();
        match elements.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(format!(
                "Array index {} out of bounds (length {})",
                index, len
            )),
        }
    }

    /// Snapshot of all elements
    pub fn to_vec(&self) -> Vec<Value> {
        self.elements.read().clone()
    }
}

/// Shared handle to an [`Array`]
#[derive(Clone)]
pub struct ArrayRef(Arc<Array>);

impl ArrayRef {
    /// Wrap a freshly created array
    pub fn new(array: Array) -> Self {
        Self(Arc::new(array))
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ArrayRef {
    type Target = Array;

    fn deref(&self) -> &Array {
        &self.0
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayRef")
            .field("element_type", &self.element_type)
            .field("len", &self.len())
            .finish()
    }
}
