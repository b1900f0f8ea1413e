//! Field enumeration across a class hierarchy

use crate::runtime::{ClassId, ClassRegistry};

use super::descriptor::Field;

/// List every field declared by a class and all of its ancestors.
///
/// Order is leaf-to-root: the class's own fields in declaration order,
/// then its parent's, and so on. The root class contributes nothing.
/// Same-named fields on different levels are distinct slots and are all
/// returned. An absent or unknown class yields an empty list.
///
/// The returned descriptors must not be cached; see [`Field`].
pub fn list_all_fields(registry: &ClassRegistry, class_id: Option<ClassId>) -> Vec<Field> {
    let Some(class) = class_id
        .and_then(|id| registry.get_class(id))
        .filter(|class| !class.is_root())
    else {
        return Vec::new();
    };

    let mut fields: Vec<Field> = class
        .fields()
        .iter()
        .map(|def| Field::new(registry, class, def))
        .collect();
    fields.extend(list_all_fields(registry, class.ancestor()));
    fields
}

/// List the fields declared directly on a class
pub fn declared_fields(registry: &ClassRegistry, class_id: ClassId) -> Vec<Field> {
    registry
        .get_class(class_id)
        .map(|class| {
            class
                .fields()
                .iter()
                .map(|def| Field::new(registry, class, def))
                .collect()
        })
        .unwrap_or_default()
}

/// Find the nearest field with the given name, searching leaf-to-root
pub fn find_field(registry: &ClassRegistry, class_id: ClassId, name: &str) -> Option<Field> {
    let mut current = registry.get_class(class_id);
    while let Some(class) = current.filter(|class| !class.is_root()) {
        if let Some(def) = class.fields().iter().find(|def| def.name == name) {
            return Some(Field::new(registry, class, def));
        }
        current = class.ancestor().and_then(|id| registry.get_class(id));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ClassBuilder, Type, Visibility, ROOT_CLASS_ID};

    #[test]
    fn test_absent_and_root_yield_nothing() {
        let registry = ClassRegistry::new();
        assert!(list_all_fields(&registry, None).is_empty());
        assert!(list_all_fields(&registry, Some(ROOT_CLASS_ID)).is_empty());
        assert!(list_all_fields(&registry, Some(99)).is_empty());
    }

    #[test]
    fn test_leaf_to_root_order_keeps_shadowed_fields() {
        let mut registry = ClassRegistry::new();
        let base = ClassBuilder::new("Base")
            .field("id", Type::Int, Visibility::Private)
            .field("secret", Type::Str, Visibility::Private)
            .build(&mut registry)
            .unwrap();
        let derived = ClassBuilder::new("Derived")
            .extends(base)
            .field("secret", Type::Str, Visibility::Public)
            .build(&mut registry)
            .unwrap();

        let fields = list_all_fields(&registry, Some(derived));
        let names: Vec<_> = fields
            .iter()
            .map(|f| (f.declaring_class_name(), f.name()))
            .collect();
        assert_eq!(
            names,
            vec![("Derived", "secret"), ("Base", "id"), ("Base", "secret")]
        );
        assert_ne!(fields[0].slot(), fields[2].slot());
    }

    #[test]
    fn test_declared_and_find() {
        let mut registry = ClassRegistry::new();
        let base = ClassBuilder::new("Base")
            .field("secret", Type::Str, Visibility::Private)
            .build(&mut registry)
            .unwrap();
        let derived = ClassBuilder::new("Derived")
            .extends(base)
            .field("secret", Type::Int, Visibility::Private)
            .build(&mut registry)
            .unwrap();

        assert_eq!(declared_fields(&registry, derived).len(), 1);
        assert!(declared_fields(&registry, 42).is_empty());

        let nearest = find_field(&registry, derived, "secret").unwrap();
        assert_eq!(nearest.declaring_class(), derived);
        assert_eq!(nearest.ty(), &Type::Int);
        assert!(find_field(&registry, derived, "missing").is_none());
    }
}
