//! Dynamic object construction through the type registry.
//!
//! Every attribute is validated against the resolved type before the
//! object is constructed, so an error never leaves a partially-configured
//! object behind.

use std::rc::Rc;

use thiserror::Error;

use super::object::{ObjectHandle, SimObject};
use super::types::{Capability, TypeRegistry};
use super::Attributes;

/// Errors raised while resolving a type or applying its attributes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FactoryError {
    #[error("unknown type \"{0}\"")]
    UnknownType(String),

    #[error("unknown attribute \"{attribute}\" of type \"{type_name}\"")]
    UnknownAttribute {
        type_name: String,
        attribute: String,
    },

    #[error("bad value \"{value}\" for attribute \"{attribute}\" of type \"{type_name}\"")]
    BadAttributeValue {
        type_name: String,
        attribute: String,
        value: String,
    },
}

/// Create an object of the named type and apply `attributes`.
///
/// Attribute application order follows the map's iteration order; callers
/// must not rely on it for side-effecting setters.
pub fn create(
    registry: &TypeRegistry,
    type_name: &str,
    attributes: &Attributes,
) -> Result<ObjectHandle, FactoryError> {
    let spec = registry
        .resolve(type_name)
        .ok_or_else(|| FactoryError::UnknownType(type_name.to_string()))?;

    for (key, value) in attributes {
        let attr = spec
            .attribute(key)
            .ok_or_else(|| FactoryError::UnknownAttribute {
                type_name: type_name.to_string(),
                attribute: key.clone(),
            })?;
        if !attr.kind().validate(value) {
            return Err(FactoryError::BadAttributeValue {
                type_name: type_name.to_string(),
                attribute: key.clone(),
                value: value.clone(),
            });
        }
    }

    let object = SimObject::new(Rc::clone(spec));
    for (key, value) in attributes {
        // validated above, the fail-safe setter cannot reject here
        object.set_attribute(key, value);
    }

    Ok(object)
}

/// Typed variant: additionally requires the resolved type to carry
/// `capability`. A type without it is reported as unknown.
pub fn create_with_capability(
    registry: &TypeRegistry,
    type_name: &str,
    attributes: &Attributes,
    capability: Capability,
) -> Result<ObjectHandle, FactoryError> {
    resolve_with_capability(registry, type_name, capability)?;
    create(registry, type_name, attributes)
}

/// Check that `type_name` resolves and carries `capability`, without
/// constructing anything.
pub fn resolve_with_capability(
    registry: &TypeRegistry,
    type_name: &str,
    capability: Capability,
) -> Result<(), FactoryError> {
    let spec = registry
        .resolve(type_name)
        .ok_or_else(|| FactoryError::UnknownType(type_name.to_string()))?;
    if spec.capability() != capability {
        return Err(FactoryError::UnknownType(type_name.to_string()));
    }
    Ok(())
}
