//! Build-time error taxonomy.

use thiserror::Error;

use crate::names::DuplicateError;
use crate::runtime::FactoryError;

/// Fatal errors raised while building the object graph. Any of these
/// aborts the remaining build phases; a failed build leaves no guarantee
/// about which entities were registered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelBuildError {
    #[error("unknown type \"{type_name}\" of entity named \"{entity}\"")]
    UnknownType { entity: String, type_name: String },

    #[error("unknown attribute \"{attribute}\" of \"{entity}\"")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("bad value \"{value}\" of attribute \"{attribute}\" of \"{entity}\"")]
    BadAttributeValue {
        entity: String,
        attribute: String,
        value: String,
    },

    #[error("failed to create connection: unknown node with name \"{name}\"")]
    UnknownNode { name: String },

    #[error("failed to create connection: unknown interface of \"{node}\" with name \"{device}\"")]
    UnknownInterface { node: String, device: String },

    #[error("malformed interface reference \"{reference}\", expected \"node/device\"")]
    BadInterfaceReference { reference: String },

    #[error("can't find interface \"{device}\" for route on node \"{node}\"")]
    UnknownRouteTarget { node: String, device: String },

    #[error("can't attach {device_kind} device \"{device}\" to {channel_kind} channel \"{channel}\"")]
    ChannelKindMismatch {
        device: String,
        device_kind: String,
        channel: String,
        channel_kind: String,
    },

    #[error("device \"{device}\" is already attached to channel \"{channel}\"")]
    AlreadyAttached { device: String, channel: String },

    #[error("can't assign address {address} to interface \"{device}\"")]
    AddressAssignment { device: String, address: String },

    #[error("bad time \"{value}\" for \"{entity}\"")]
    BadTime { entity: String, value: String },

    #[error(transparent)]
    DuplicateName(#[from] DuplicateError),
}

impl ModelBuildError {
    /// Re-raise a factory error against the authored entity that triggered
    /// it, so user-facing errors reference the topology, not factory
    /// vocabulary.
    pub(crate) fn from_factory(entity: &str, error: FactoryError) -> Self {
        match error {
            FactoryError::UnknownType(type_name) => ModelBuildError::UnknownType {
                entity: entity.to_string(),
                type_name,
            },
            FactoryError::UnknownAttribute { attribute, .. } => ModelBuildError::UnknownAttribute {
                entity: entity.to_string(),
                attribute,
            },
            FactoryError::BadAttributeValue {
                attribute, value, ..
            } => ModelBuildError::BadAttributeValue {
                entity: entity.to_string(),
                attribute,
                value,
            },
        }
    }
}
