//! Argument introspection.
//!
//! Turns a nickname into owned descriptors: the [`OperationDescriptor`] and
//! its ordered [`ArgumentDescriptor`]s. Value types are resolved to a
//! [`SemanticType`] by testing the registry kinds in [`TYPE_PRECEDENCE`]
//! order; the first kind a type satisfies decides.

use crate::registry::{RawArgument, TypeHandle, TypeRegistry, ValueKind};
use crate::types::{
    ArgumentDescriptor, ArgumentFlags, OperationDescriptor, OperationFlags, SemanticType,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntrospectError {
    #[error("operation '{0}' not found")]
    NotFound(String),
}

/// Resolution order for argument value types.
///
/// Images and the boxed array/blob types come first: in the native registry
/// they also answer as generic object types.
pub const TYPE_PRECEDENCE: [ValueKind; 13] = [
    ValueKind::Image,
    ValueKind::ArrayDouble,
    ValueKind::ArrayInt,
    ValueKind::ArrayImage,
    ValueKind::Blob,
    ValueKind::Double,
    ValueKind::Int,
    ValueKind::UInt,
    ValueKind::Boolean,
    ValueKind::String,
    ValueKind::RefString,
    ValueKind::Enum,
    ValueKind::Flags,
];

/// Order in which argument descriptors are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentOrder {
    /// Registry declaration order.
    #[default]
    Declaration,
    /// Stable sort by (priority, name).
    Priority,
}

/// An operation and its arguments, ready for emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub descriptor: OperationDescriptor,
    pub arguments: Vec<ArgumentDescriptor>,
}

/// Map a registry value type to its semantic type.
pub fn resolve_semantic_type<R: TypeRegistry + ?Sized>(
    registry: &R,
    value_type: TypeHandle,
) -> SemanticType {
    if !value_type.is_valid() {
        return SemanticType::Unknown;
    }
    let Some(kind) = TYPE_PRECEDENCE
        .into_iter()
        .find(|k| registry.value_type_is(value_type, *k))
    else {
        return SemanticType::Unknown;
    };

    let type_name = || registry.type_name(value_type);
    match kind {
        ValueKind::Image => SemanticType::Image,
        ValueKind::ArrayDouble => SemanticType::ArrayDouble,
        ValueKind::ArrayInt => SemanticType::ArrayInt,
        ValueKind::ArrayImage => SemanticType::ArrayImage,
        ValueKind::Blob => SemanticType::Blob,
        ValueKind::Double => SemanticType::Double,
        ValueKind::Int | ValueKind::UInt => SemanticType::Int,
        ValueKind::Boolean => SemanticType::Boolean,
        ValueKind::String | ValueKind::RefString => SemanticType::String,
        // An anonymous enum still carries an integer.
        ValueKind::Enum => type_name().map_or(SemanticType::Int, SemanticType::Enum),
        ValueKind::Flags => type_name().map_or(SemanticType::Unknown, SemanticType::Flags),
    }
}

fn to_descriptor<R: TypeRegistry + ?Sized>(registry: &R, raw: RawArgument) -> ArgumentDescriptor {
    ArgumentDescriptor {
        semantic_type: resolve_semantic_type(registry, raw.value_type),
        flags: ArgumentFlags::from_bits_retain(raw.flags),
        priority: raw.priority,
        description: raw.blurb,
        name: raw.name,
    }
}

/// Describe an operation by nickname.
pub fn describe_operation<R: TypeRegistry + ?Sized>(
    registry: &R,
    nickname: &str,
    order: ArgumentOrder,
) -> Result<Operation, IntrospectError> {
    let raw = registry
        .lookup_operation(nickname)
        .ok_or_else(|| IntrospectError::NotFound(nickname.to_string()))?;

    let mut arguments: Vec<ArgumentDescriptor> = raw
        .arguments
        .into_iter()
        .map(|a| to_descriptor(registry, a))
        .collect();
    if order == ArgumentOrder::Priority {
        arguments.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
    }

    Ok(Operation {
        descriptor: OperationDescriptor {
            name: raw.type_name,
            nickname: raw.nickname,
            description: raw.description,
            flags: OperationFlags::from_bits_retain(raw.flags),
        },
        arguments,
    })
}

/// The ordered argument descriptors of an operation.
pub fn get_arguments<R: TypeRegistry + ?Sized>(
    registry: &R,
    nickname: &str,
    order: ArgumentOrder,
) -> Result<Vec<ArgumentDescriptor>, IntrospectError> {
    describe_operation(registry, nickname, order).map(|op| op.arguments)
}
