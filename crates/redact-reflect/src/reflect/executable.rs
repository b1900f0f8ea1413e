//! Constructor and method resolution and invocation
//!
//! Lookups match the parameter signature exactly (no overload resolution,
//! no widening) and only search the class's own declarations. A missing
//! constructor is reported as `None` so callers can probe for optional
//! constructors; a missing method is a [`ReflectError::Resolution`].

use crate::error::{Fault, ReflectError, ReflectResult};
use crate::runtime::{
    ClassId, ClassRegistry, FromValue, ObjectRef, PermissionStore, Type, Value,
};

use super::descriptor::{Constructor, Method};

/// Find a constructor declared directly on `class_id` with exactly the
/// given parameter types.
///
/// A found constructor is made accessible straight away when the policy
/// allows it; a refused grant is not reported here and resurfaces when the
/// constructor is invoked.
pub fn get_declared_constructor(
    registry: &ClassRegistry,
    permissions: &PermissionStore,
    class_id: ClassId,
    parameter_types: &[Type],
) -> Option<Constructor> {
    let class = registry.get_class(class_id)?;
    let def = class
        .constructors()
        .iter()
        .find(|def| def.parameter_types == parameter_types)?;

    let ctor = Constructor::new(registry, class, def);
    if ctor.grant_invoke(permissions).is_err() {
        tracing::debug!(constructor = %ctor, "constructor resolved without access");
    }
    Some(ctor)
}

/// Find a method declared directly on `class_id` by name and exact
/// parameter types.
pub fn get_declared_method(
    registry: &ClassRegistry,
    class_id: ClassId,
    name: &str,
    parameter_types: &[Type],
) -> ReflectResult<Method> {
    let found = registry.get_class(class_id).and_then(|class| {
        class
            .methods()
            .iter()
            .find(|def| def.name == name && def.parameter_types == parameter_types)
            .map(|def| Method::new(registry, class, def))
    });

    match found {
        Some(method) => {
            tracing::trace!(method = %method, "resolved method");
            Ok(method)
        }
        None => {
            let type_name = registry.class_name(class_id);
            let signature = registry.signature(parameter_types);
            Err(ReflectError::Resolution {
                cause: Fault::NoSuchMethod(format!("{}.{}({})", type_name, name, signature)),
                type_name,
                method: name.to_string(),
                signature,
            })
        }
    }
}

/// Construct a new instance with `ctor`.
///
/// Grants invoke access, checks the arguments against the signature,
/// allocates a default-initialized instance and runs the constructor body.
pub fn new_instance(
    registry: &ClassRegistry,
    permissions: &PermissionStore,
    ctor: &Constructor,
    args: &[Value],
) -> ReflectResult<ObjectRef> {
    let fail = |cause| ReflectError::Invocation {
        executable: format!("constructor {}", ctor),
        args: describe_args(args),
        cause,
    };

    ctor.grant_invoke(permissions).map_err(fail)?;
    check_arguments(registry, ctor.parameter_types(), args).map_err(fail)?;

    let instance = registry
        .allocate(ctor.declaring_class())
        .ok_or_else(|| fail(Fault::UnknownType(registry.class_name(ctor.declaring_class()))))?;
    (ctor.body())(&instance, args).map_err(|thrown| fail(Fault::Thrown(thrown)))?;

    tracing::debug!(constructor = %ctor, object = instance.object_id(), "constructed instance");
    Ok(instance)
}

/// Invoke `method` on `target` and coerce the result to `T`.
///
/// Grants invoke access, checks that `target` is an instance of the
/// declaring class and that the arguments match the signature.
pub fn invoke_method<T: FromValue>(
    registry: &ClassRegistry,
    permissions: &PermissionStore,
    target: &ObjectRef,
    method: &Method,
    args: &[Value],
) -> ReflectResult<T> {
    let fail = |cause| ReflectError::Invocation {
        executable: format!(
            "method {} on {}#{}",
            method,
            registry.class_name(target.class_id()),
            target.object_id()
        ),
        args: describe_args(args),
        cause,
    };

    method.grant_invoke(permissions).map_err(fail)?;
    if !registry.is_subclass_of(target.class_id(), method.declaring_class()) {
        return Err(fail(Fault::IllegalArgument(format!(
            "object of class {} is not an instance of {}",
            registry.class_name(target.class_id()),
            registry.class_name(method.declaring_class())
        ))));
    }
    check_arguments(registry, method.parameter_types(), args).map_err(fail)?;

    let result = (method.body())(target, args).map_err(|thrown| fail(Fault::Thrown(thrown)))?;
    tracing::trace!(method = %method, object = target.object_id(), "invoked method");

    T::from_value(result).map_err(|value| {
        fail(Fault::ResultMismatch {
            value: value.to_string(),
            expected: T::EXPECTED,
        })
    })
}

fn check_arguments(registry: &ClassRegistry, parameter_types: &[Type], args: &[Value]) -> Result<(), Fault> {
    if parameter_types.len() != args.len() {
        return Err(Fault::IllegalArgument(format!(
            "wrong number of arguments: expected {}, got {}",
            parameter_types.len(),
            args.len()
        )));
    }

    for (index, (ty, arg)) in parameter_types.iter().zip(args).enumerate() {
        if !arg.is_assignable_to(ty, registry) {
            return Err(Fault::IllegalArgument(format!(
                "argument {} is {} {}, expected {}",
                index,
                arg.kind_name(),
                arg,
                registry.type_name(ty)
            )));
        }
    }
    Ok(())
}

fn describe_args(args: &[Value]) -> String {
    args.iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Thrown;
    use crate::runtime::{ClassBuilder, ReflectionPermission, Visibility};

    fn masker_registry() -> (ClassRegistry, ClassId) {
        let mut registry = ClassRegistry::new();
        let masker = ClassBuilder::new("Masker")
            .in_module("masking")
            .field("keep", Type::Int, Visibility::Private)
            .constructor(vec![Type::Int], Visibility::Private, |this, args| {
                this.set_field(0, args[0].clone()).map_err(Thrown::new)
            })
            .constructor(vec![Type::Str], Visibility::Public, |_, args| {
                Err(Thrown::new(format!("unsupported pattern {}", args[0])))
            })
            .method("mask", vec![Type::Str], Type::Str, Visibility::Private, |this, args| {
                let keep = match this.get_field(0) {
                    Some(Value::Int(n)) => n as usize,
                    _ => 0,
                };
                match &args[0] {
                    Value::Str(s) => {
                        let visible: String = s.chars().take(keep).collect();
                        let hidden = s.chars().count().saturating_sub(keep);
                        Ok(Value::Str(format!("{}{}", visible, "*".repeat(hidden))))
                    }
                    _ => Ok(Value::Null),
                }
            })
            .build(&mut registry)
            .unwrap();
        (registry, masker)
    }

    #[test]
    fn test_construct_and_invoke_private_members() {
        let (registry, masker) = masker_registry();
        let permissions = PermissionStore::new();

        let ctor = get_declared_constructor(&registry, &permissions, masker, &[Type::Int]).unwrap();
        assert!(ctor.is_accessible());
        let instance = new_instance(&registry, &permissions, &ctor, &[Value::Int(2)]).unwrap();

        let method = get_declared_method(&registry, masker, "mask", &[Type::Str]).unwrap();
        let masked: String =
            invoke_method(&registry, &permissions, &instance, &method, &[Value::from("secret")])
                .unwrap();
        assert_eq!(masked, "se****");
        assert!(method.is_accessible());
    }

    #[test]
    fn test_constructor_lookup_is_exact() {
        let (registry, masker) = masker_registry();
        let permissions = PermissionStore::new();

        assert!(get_declared_constructor(&registry, &permissions, masker, &[]).is_none());
        assert!(get_declared_constructor(&registry, &permissions, masker, &[Type::Float]).is_none());
        assert!(get_declared_constructor(&registry, &permissions, 77, &[Type::Int]).is_none());
    }

    #[test]
    fn test_missing_method_is_resolution_failure() {
        let (registry, masker) = masker_registry();

        let err = get_declared_method(&registry, masker, "mask", &[Type::Int]).unwrap_err();
        match &err {
            ReflectError::Resolution { type_name, method, signature, cause } => {
                assert_eq!(type_name, "Masker");
                assert_eq!(method, "mask");
                assert_eq!(signature, "int");
                assert!(matches!(cause, Fault::NoSuchMethod(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "failed to resolve method Masker.mask(int)");
    }

    #[test]
    fn test_thrown_fault_is_the_cause() {
        let (registry, masker) = masker_registry();
        let permissions = PermissionStore::new();

        let ctor = get_declared_constructor(&registry, &permissions, masker, &[Type::Str]).unwrap();
        let err = new_instance(&registry, &permissions, &ctor, &[Value::from("x")]).unwrap_err();
        assert!(matches!(err, ReflectError::Invocation { .. }));
        assert!(matches!(err.cause(), Fault::Thrown(t) if t.message == "unsupported pattern \"x\""));
    }

    #[test]
    fn test_argument_mismatch() {
        let (registry, masker) = masker_registry();
        let permissions = PermissionStore::new();

        let ctor = get_declared_constructor(&registry, &permissions, masker, &[Type::Int]).unwrap();
        let err = new_instance(&registry, &permissions, &ctor, &[]).unwrap_err();
        assert!(matches!(err.cause(), Fault::IllegalArgument(_)));

        let err = new_instance(&registry, &permissions, &ctor, &[Value::Float(1.0)]).unwrap_err();
        assert!(matches!(err.cause(), Fault::IllegalArgument(_)));
    }

    #[test]
    fn test_result_coercion_and_receiver_check() {
        let (mut registry, masker) = masker_registry();
        let stranger = ClassBuilder::new("Stranger").build(&mut registry).unwrap();
        let permissions = PermissionStore::new();

        let ctor = get_declared_constructor(&registry, &permissions, masker, &[Type::Int]).unwrap();
        let instance = new_instance(&registry, &permissions, &ctor, &[Value::Int(0)]).unwrap();
        let method = get_declared_method(&registry, masker, "mask", &[Type::Str]).unwrap();

        let err = invoke_method::<i64>(&registry, &permissions, &instance, &method, &[Value::from("a")])
            .unwrap_err();
        assert!(matches!(err.cause(), Fault::ResultMismatch { expected: "int", .. }));

        let other = registry.allocate(stranger).unwrap();
        let err = invoke_method::<Value>(&registry, &permissions, &other, &method, &[Value::from("a")])
            .unwrap_err();
        assert!(matches!(err.cause(), Fault::IllegalArgument(_)));
    }

    #[test]
    fn test_denied_constructor_fails_on_invocation() {
        let (registry, masker) = masker_registry();
        let mut permissions = PermissionStore::new();
        permissions.set_class(masker, ReflectionPermission::PUBLIC_ONLY).unwrap();

        let ctor = get_declared_constructor(&registry, &permissions, masker, &[Type::Int]).unwrap();
        assert!(!ctor.is_accessible());

        let err = new_instance(&registry, &permissions, &ctor, &[Value::Int(1)]).unwrap_err();
        assert!(matches!(err, ReflectError::Invocation { .. }));
        assert!(matches!(err.cause(), Fault::PermissionDenied(_)));
    }
}
