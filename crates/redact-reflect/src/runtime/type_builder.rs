//! Class builder
//!
//! Defines classes against a [`ClassRegistry`]: declared fields, constructors
//! and methods with their visibility. The builder computes the instance
//! layout (inherited slots first, then the class's own fields in
//! declaration order) and validates the definition before registering it.

use std::sync::Arc;

use thiserror::Error;

use crate::error::Thrown;

use super::class::{Class, ConstructorDef, FieldDef, MethodDef, Visibility};
use super::class_registry::{ClassId, ClassRegistry, ROOT_CLASS_ID};
use super::object::ObjectRef;
use super::value::{Type, Value};

/// Errors that can occur while defining a class
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    /// Parent class is not registered
    #[error("Unknown parent class #{0}")]
    UnknownParent(ClassId),

    /// A class with the same name already exists
    #[error("Class `{0}` is already defined")]
    DuplicateClass(String),

    /// Two fields with the same name on one class
    #[error("Field `{field}` is declared twice on `{class}`")]
    DuplicateField { class: String, field: String },

    /// Two constructors with the same signature on one class
    #[error("Constructor `{class}({signature})` is declared twice")]
    DuplicateConstructor { class: String, signature: String },

    /// Two methods with the same name and signature on one class
    #[error("Method `{class}.{method}({signature})` is declared twice")]
    DuplicateMethod {
        class: String,
        method: String,
        signature: String,
    },

    /// A member type mentions an unregistered class
    #[error("Member `{member}` of `{class}` uses an unknown class #{class_id}")]
    UnknownType {
        class: String,
        member: String,
        class_id: ClassId,
    },
}

/// Builder for a single class definition
pub struct ClassBuilder {
    name: String,
    module: Option<String>,
    parent_id: ClassId,
    fields: Vec<(String, Type, Visibility)>,
    constructors: Vec<ConstructorDef>,
    methods: Vec<MethodDef>,
}

impl ClassBuilder {
    /// Start a class extending the root class
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            parent_id: ROOT_CLASS_ID,
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Set the owning module (defaults to the parent's module)
    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Set the parent class
    pub fn extends(mut self, parent_id: ClassId) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Declare an instance field
    pub fn field(mut self, name: impl Into<String>, ty: Type, visibility: Visibility) -> Self {
        self.fields.push((name.into(), ty, visibility));
        self
    }

    /// Declare a constructor
    pub fn constructor<F>(mut self, parameter_types: Vec<Type>, visibility: Visibility, body: F) -> Self
    where
        F: Fn(&ObjectRef, &[Value]) -> Result<(), Thrown> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorDef {
            parameter_types,
            visibility,
            body: Arc::new(body),
        });
        self
    }

    /// Declare an instance method
    pub fn method<F>(
        mut self,
        name: impl Into<String>,
        parameter_types: Vec<Type>,
        return_type: Type,
        visibility: Visibility,
        body: F,
    ) -> Self
    where
        F: Fn(&ObjectRef, &[Value]) -> Result<Value, Thrown> + Send + Sync + 'static,
    {
        self.methods.push(MethodDef {
            name: name.into(),
            parameter_types,
            return_type,
            visibility,
            body: Arc::new(body),
        });
        self
    }

    /// Validate the definition and register it
    pub fn build(self, registry: &mut ClassRegistry) -> Result<ClassId, DefinitionError> {
        let parent = registry
            .get_class(self.parent_id)
            .ok_or(DefinitionError::UnknownParent(self.parent_id))?;
        if registry.get_class_by_name(&self.name).is_some() {
            return Err(DefinitionError::DuplicateClass(self.name));
        }

        let id = registry.next_class_id();
        let module = self.module.unwrap_or_else(|| parent.module.clone());
        let first_slot = parent.field_count;

        let known = |ty: &Type| match ty {
            Type::Class(class_id) if *class_id == id => true,
            Type::Array(element_type) if **element_type == Type::Class(id) => true,
            other => registry.contains_type(other),
        };
        let unknown_type = |member: &str, ty: &Type| DefinitionError::UnknownType {
            class: self.name.clone(),
            member: member.to_string(),
            class_id: first_class_id(ty).unwrap_or(id),
        };

        let mut fields: Vec<FieldDef> = Vec::with_capacity(self.fields.len());
        for (index, (name, ty, visibility)) in self.fields.into_iter().enumerate() {
            if fields.iter().any(|f| f.name == name) {
                return Err(DefinitionError::DuplicateField {
                    class: self.name.clone(),
                    field: name,
                });
            }
            if !known(&ty) {
                return Err(unknown_type(&name, &ty));
            }
            fields.push(FieldDef {
                name,
                ty,
                visibility,
                slot: first_slot + index,
            });
        }

        for (index, ctor) in self.constructors.iter().enumerate() {
            if let Some(ty) = ctor.parameter_types.iter().find(|ty| !known(ty)) {
                return Err(unknown_type("<constructor>", ty));
            }
            let duplicate = self.constructors[..index]
                .iter()
                .any(|other| other.parameter_types == ctor.parameter_types);
            if duplicate {
                return Err(DefinitionError::DuplicateConstructor {
                    class: self.name.clone(),
                    signature: registry.signature(&ctor.parameter_types),
                });
            }
        }

        for (index, method) in self.methods.iter().enumerate() {
            let mentioned = method
                .parameter_types
                .iter()
                .chain(std::iter::once(&method.return_type));
            for ty in mentioned {
                if !known(ty) {
                    return Err(unknown_type(&method.name, ty));
                }
            }
            let duplicate = self.methods[..index].iter().any(|other| {
                other.name == method.name && other.parameter_types == method.parameter_types
            });
            if duplicate {
                return Err(DefinitionError::DuplicateMethod {
                    class: self.name.clone(),
                    method: method.name.clone(),
                    signature: registry.signature(&method.parameter_types),
                });
            }
        }

        let class = Class {
            id,
            name: self.name,
            module,
            parent_id: Some(self.parent_id),
            field_count: first_slot + fields.len(),
            fields,
            constructors: self.constructors,
            methods: self.methods,
        };

        tracing::debug!(class = %class.name, id, parent = self.parent_id, "registering class");
        Ok(registry.register_class(class))
    }
}

fn first_class_id(ty: &Type) -> Option<ClassId> {
    match ty {
        Type::Class(id) => Some(*id),
        Type::Array(element_type) => first_class_id(element_type),
        _ => None,
    }
}
