//! Class registry: the live type system reflective lookups run against

use rustc_hash::FxHashMap;

use super::class::Class;
use super::object::{Object, ObjectRef};
use super::value::{Type, Value};

/// Index of a class in its registry
pub type ClassId = usize;

/// ID of the universal root class, registered by every registry
pub const ROOT_CLASS_ID: ClassId = 0;

/// Name of the universal root class
pub const ROOT_CLASS_NAME: &str = "Object";

/// Class registry
#[derive(Debug)]
pub struct ClassRegistry {
    /// Classes indexed by ID
    classes: Vec<Class>,
    /// Class name to ID mapping
    name_to_id: FxHashMap<String, ClassId>,
}

impl ClassRegistry {
    /// Create a registry holding only the root class
    pub fn new() -> Self {
        let mut registry = Self {
            classes: Vec::new(),
            name_to_id: FxHashMap::default(),
        };
        registry.register_class(Class::root(ROOT_CLASS_ID, ROOT_CLASS_NAME));
        registry
    }

    /// Register a class built against this registry
    pub(crate) fn register_class(&mut self, class: Class) -> ClassId {
        let id = class.id;
        debug_assert_eq!(id, self.classes.len());

        self.name_to_id.insert(class.name.clone(), id);
        self.classes.push(class);

        id
    }

    /// Get class by ID
    pub fn get_class(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(id)
    }

    /// Get class by name
    pub fn get_class_by_name(&self, name: &str) -> Option<&Class> {
        self.name_to_id
            .get(name)
            .and_then(|id| self.classes.get(*id))
    }

    /// Get next available class ID
    pub fn next_class_id(&self) -> ClassId {
        self.classes.len()
    }

    /// Iterate over all classes with their IDs
    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &Class)> {
        self.classes.iter().enumerate()
    }

    /// Number of registered classes (including the root)
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always false: the root class is registered on creation
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Name of a class, or a placeholder for unknown IDs
    pub fn class_name(&self, id: ClassId) -> String {
        match self.get_class(id) {
            Some(class) => class.name.clone(),
            None => format!("<unknown class #{}>", id),
        }
    }

    /// Check if a class is the same as, or a descendant of, another class
    pub fn is_subclass_of(&self, sub_class_id: ClassId, super_class_id: ClassId) -> bool {
        let mut current = Some(sub_class_id);
        while let Some(id) = current {
            if id == super_class_id {
                return true;
            }
            current = self.get_class(id).and_then(|class| class.parent_id);
        }
        false
    }

    /// Check that every class a type mentions is registered
    pub fn contains_type(&self, ty: &Type) -> bool {
        match ty {
            Type::Class(id) => self.get_class(*id).is_some(),
            Type::Array(element_type) => self.contains_type(element_type),
            _ => true,
        }
    }

    /// Display name of a type
    pub fn type_name(&self, ty: &Type) -> String {
        match ty {
            Type::Bool => "bool".to_string(),
            Type::Int => "int".to_string(),
            Type::Float => "float".to_string(),
            Type::Str => "string".to_string(),
            Type::Any => "any".to_string(),
            Type::Class(id) => self.class_name(*id),
            Type::Array(element_type) => format!("{}[]", self.type_name(element_type)),
        }
    }

    /// Comma-separated display of a parameter signature
    pub fn signature(&self, parameter_types: &[Type]) -> String {
        parameter_types
            .iter()
            .map(|ty| self.type_name(ty))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Allocate an instance with every slot set to its type's default value.
    ///
    /// No constructor runs. Returns None for unknown classes.
    pub fn allocate(&self, class_id: ClassId) -> Option<ObjectRef> {
        let class = self.get_class(class_id)?;
        let mut slots = vec![Value::Null; class.field_count];

        let mut current = Some(class);
        while let Some(level) = current {
            for field in level.fields() {
                if let Some(slot) = slots.get_mut(field.slot) {
                    *slot = field.ty.default_value();
                }
            }
            current = level.parent_id.and_then(|id| self.get_class(id));
        }

        Some(ObjectRef::new(Object::new(class_id, slots)))
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::type_builder::ClassBuilder;
    use crate::runtime::Visibility;

    #[test]
    fn test_root_is_registered() {
        let registry = ClassRegistry::new();
        assert_eq!(registry.len(), 1);

        let root = registry.get_class(ROOT_CLASS_ID).unwrap();
        assert_eq!(root.name, "Object");
        assert!(root.is_root());
        assert!(root.fields().is_empty());
    }

    #[test]
    fn test_get_class_by_name() {
        let mut registry = ClassRegistry::new();
        let point = ClassBuilder::new("Point").build(&mut registry).unwrap();

        let retrieved = registry.get_class_by_name("Point").unwrap();
        assert_eq!(retrieved.id, point);
        assert!(registry.get_class_by_name("Unknown").is_none());
    }

    #[test]
    fn test_next_class_id() {
        let mut registry = ClassRegistry::new();
        assert_eq!(registry.next_class_id(), 1);

        ClassBuilder::new("Point").build(&mut registry).unwrap();
        assert_eq!(registry.next_class_id(), 2);
    }

    #[test]
    fn test_is_subclass_of() {
        let mut registry = ClassRegistry::new();
        let animal = ClassBuilder::new("Animal").build(&mut registry).unwrap();
        let dog = ClassBuilder::new("Dog")
            .extends(animal)
            .build(&mut registry)
            .unwrap();

        assert!(registry.is_subclass_of(dog, animal));
        assert!(registry.is_subclass_of(dog, dog));
        assert!(registry.is_subclass_of(dog, ROOT_CLASS_ID));
        assert!(!registry.is_subclass_of(animal, dog));
    }

    #[test]
    fn test_type_names() {
        let mut registry = ClassRegistry::new();
        let user = ClassBuilder::new("User").build(&mut registry).unwrap();

        assert_eq!(registry.type_name(&Type::array(Type::Class(user))), "User[]");
        assert_eq!(
            registry.signature(&[Type::Str, Type::Int, Type::array(Type::Bool)]),
            "string, int, bool[]"
        );
        assert_eq!(registry.type_name(&Type::Class(99)), "<unknown class #99>");
    }

    #[test]
    fn test_allocate_defaults_inherited_slots() {
        let mut registry = ClassRegistry::new();
        let base = ClassBuilder::new("Base")
            .field("count", Type::Int, Visibility::Private)
            .build(&mut registry)
            .unwrap();
        let derived = ClassBuilder::new("Derived")
            .extends(base)
            .field("enabled", Type::Bool, Visibility::Public)
            .field("label", Type::Str, Visibility::Public)
            .build(&mut registry)
            .unwrap();

        let obj = registry.allocate(derived).unwrap();
        assert_eq!(obj.class_id(), derived);
        assert_eq!(obj.field_count(), 3);
        assert_eq!(obj.get_field(0), Some(Value::Int(0)));
        assert_eq!(obj.get_field(1), Some(Value::Bool(false)));
        assert_eq!(obj.get_field(2), Some(Value::Null));

        assert!(registry.allocate(42).is_none());
    }
}
