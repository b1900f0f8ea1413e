//! Class definitions: the host type system's type descriptors

use std::fmt;
use std::sync::Arc;

use crate::error::Thrown;

use super::class_registry::ClassId;
use super::object::ObjectRef;
use super::value::{Type, Value};

/// Declared access level of a class member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// Constructor body: initializes a freshly allocated instance
pub type ConstructorFn = Arc<dyn Fn(&ObjectRef, &[Value]) -> Result<(), Thrown> + Send + Sync>;

/// Method body: runs against a receiver and returns a result
pub type MethodFn = Arc<dyn Fn(&ObjectRef, &[Value]) -> Result<Value, Thrown> + Send + Sync>;

/// Instance field declared by a class
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: Type,
    pub visibility: Visibility,
    /// Slot in the instance layout (inherited slots come first)
    pub slot: usize,
}

/// Constructor declared by a class
#[derive(Clone)]
pub struct ConstructorDef {
    pub parameter_types: Vec<Type>,
    pub visibility: Visibility,
    pub body: ConstructorFn,
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("parameter_types", &self.parameter_types)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

/// Instance method declared by a class
#[derive(Clone)]
pub struct MethodDef {
    pub name: String,
    pub parameter_types: Vec<Type>,
    pub return_type: Type,
    pub visibility: Visibility,
    pub body: MethodFn,
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("parameter_types", &self.parameter_types)
            .field("return_type", &self.return_type)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

/// Class definition metadata
#[derive(Debug, Clone)]
pub struct Class {
    /// Class ID (unique identifier)
    pub id: ClassId,
    /// Class name
    pub name: String,
    /// Module the class belongs to (used by the permission policy)
    pub module: String,
    /// Parent class ID (None only for the root class)
    pub parent_id: Option<ClassId>,
    /// Number of instance slots (including inherited)
    pub field_count: usize,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) constructors: Vec<ConstructorDef>,
    pub(crate) methods: Vec<MethodDef>,
}

impl Class {
    /// Create the universal root class
    pub(crate) fn root(id: ClassId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            module: String::new(),
            parent_id: None,
            field_count: 0,
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Fields declared directly on this class, in declaration order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Direct supertype
    pub fn ancestor(&self) -> Option<ClassId> {
        self.parent_id
    }

    /// Constructors declared directly on this class
    pub fn constructors(&self) -> &[ConstructorDef] {
        &self.constructors
    }

    /// Methods declared directly on this class
    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// Whether this is the universal root class
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
