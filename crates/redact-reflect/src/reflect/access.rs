//! Field read/write regardless of declared visibility

use crate::error::{Fault, ReflectError, ReflectResult};
use crate::runtime::{ClassRegistry, ObjectRef, PermissionStore, Value};

use super::descriptor::Field;

/// Read a field of `target`, granting read access on the descriptor first.
///
/// Fails with [`ReflectError::Access`] when the field is not declared in the
/// target's hierarchy or the permission policy refuses the grant.
pub fn get_field_value(
    registry: &ClassRegistry,
    permissions: &PermissionStore,
    target: &ObjectRef,
    field: &Field,
) -> ReflectResult<Value> {
    let fail = |cause| access_error(registry, target, field, cause);

    check_membership(registry, target, field).map_err(fail)?;
    field.grant_read(permissions).map_err(fail)?;

    let value = target
        .get_field(field.slot())
        .ok_or_else(|| fail(no_such_field(registry, target, field)))?;
    tracing::trace!(object = target.object_id(), field = %field, "read field");
    Ok(value)
}

/// Overwrite a field of `target` in place, granting write access first.
///
/// Fails with [`ReflectError::Access`] when the field is not declared in the
/// target's hierarchy, the permission policy refuses the grant, or
/// `new_value` is not assignable to the field's declared type.
pub fn set_field_value(
    registry: &ClassRegistry,
    permissions: &PermissionStore,
    target: &ObjectRef,
    field: &Field,
    new_value: Value,
) -> ReflectResult<()> {
    let fail = |cause| access_error(registry, target, field, cause);

    check_membership(registry, target, field).map_err(fail)?;
    field.grant_write(permissions).map_err(fail)?;

    if !new_value.is_assignable_to(field.ty(), registry) {
        return Err(fail(Fault::IllegalArgument(format!(
            "cannot assign {} value {} to field {}",
            new_value.kind_name(),
            new_value,
            field
        ))));
    }

    target
        .set_field(field.slot(), new_value)
        .map_err(|e| fail(Fault::IllegalArgument(e)))?;
    tracing::trace!(object = target.object_id(), field = %field, "wrote field");
    Ok(())
}

fn check_membership(registry: &ClassRegistry, target: &ObjectRef, field: &Field) -> Result<(), Fault> {
    if registry.is_subclass_of(target.class_id(), field.declaring_class()) {
        Ok(())
    } else {
        Err(no_such_field(registry, target, field))
    }
}

fn no_such_field(registry: &ClassRegistry, target: &ObjectRef, field: &Field) -> Fault {
    Fault::NoSuchField {
        field: field.name().to_string(),
        declaring_class: field.declaring_class_name().to_string(),
        target_class: registry.class_name(target.class_id()),
    }
}

fn access_error(registry: &ClassRegistry, target: &ObjectRef, field: &Field, cause: Fault) -> ReflectError {
    ReflectError::Access {
        type_name: registry.class_name(target.class_id()),
        field: field.name().to_string(),
        cause,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::list_all_fields;
    use crate::runtime::{ClassBuilder, ClassId, ReflectionPermission, Type, Visibility};

    fn account_registry() -> (ClassRegistry, ClassId, ClassId) {
        let mut registry = ClassRegistry::new();
        let account = ClassBuilder::new("Account")
            .in_module("billing")
            .field("iban", Type::Str, Visibility::Private)
            .field("balance", Type::Int, Visibility::Public)
            .build(&mut registry)
            .unwrap();
        let other = ClassBuilder::new("Other").build(&mut registry).unwrap();
        (registry, account, other)
    }

    #[test]
    fn test_private_round_trip() {
        let (registry, account, _) = account_registry();
        let permissions = PermissionStore::new();
        let target = registry.allocate(account).unwrap();
        let fields = list_all_fields(&registry, Some(account));

        let iban = &fields[0];
        assert_eq!(get_field_value(&registry, &permissions, &target, iban).unwrap(), Value::Null);

        set_field_value(&registry, &permissions, &target, iban, Value::from("DE89****")).unwrap();
        assert_eq!(
            get_field_value(&registry, &permissions, &target, iban).unwrap(),
            Value::from("DE89****")
        );
        assert!(iban.is_readable());
        assert!(iban.is_writable());
    }

    #[test]
    fn test_foreign_field_is_access_failure() {
        let (registry, account, other) = account_registry();
        let permissions = PermissionStore::new();
        let target = registry.allocate(other).unwrap();
        let fields = list_all_fields(&registry, Some(account));

        let err = get_field_value(&registry, &permissions, &target, &fields[0]).unwrap_err();
        match err {
            ReflectError::Access { type_name, field, cause } => {
                assert_eq!(type_name, "Other");
                assert_eq!(field, "iban");
                assert!(matches!(cause, Fault::NoSuchField { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_type_mismatch_is_access_failure() {
        let (registry, account, _) = account_registry();
        let permissions = PermissionStore::new();
        let target = registry.allocate(account).unwrap();
        let fields = list_all_fields(&registry, Some(account));

        let err = set_field_value(&registry, &permissions, &target, &fields[1], Value::from("lots"))
            .unwrap_err();
        assert!(matches!(err.cause(), Fault::IllegalArgument(_)));
        assert_eq!(target.get_field(fields[1].slot()), Some(Value::Int(0)));
    }

    #[test]
    fn test_policy_denial_is_access_failure() {
        let (registry, account, _) = account_registry();
        let mut permissions = PermissionStore::new();
        permissions.set_module("billing", ReflectionPermission::READ_ALL);
        let target = registry.allocate(account).unwrap();
        let fields = list_all_fields(&registry, Some(account));

        assert!(get_field_value(&registry, &permissions, &target, &fields[0]).is_ok());
        let err = set_field_value(&registry, &permissions, &target, &fields[0], Value::Null)
            .unwrap_err();
        assert!(matches!(err, ReflectError::Access { .. }));
        assert!(matches!(err.cause(), Fault::PermissionDenied(_)));
    }
}
