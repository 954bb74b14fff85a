//! Discovery of concrete operation types.
//!
//! Two sources feed the result:
//!
//! 1. A depth-first walk of the subtype tree under `VipsOperation`, in
//!    registry child order.
//! 2. The library's flat class listing, filtered to types that derive from
//!    the root.
//!
//! Only concrete types with a non-empty nickname are kept, and the first
//! occurrence of a nickname wins. On a consistent registry the second pass
//! finds nothing new; results carry their [`DiscoverySource`] so that can
//! be checked against a real library build.

use crate::registry::{ROOT_TYPE_NAME, TypeHandle, TypeRegistry};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoverySource {
    SubtypeWalk,
    ClassList,
}

/// A discovered operation type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationType {
    pub handle: TypeHandle,
    pub nickname: String,
    pub source: DiscoverySource,
}

/// Every concrete operation type in the registry, deduplicated by nickname.
///
/// Returns an empty list when the root type is missing.
pub fn list_operation_types<R: TypeRegistry + ?Sized>(registry: &R) -> Vec<OperationType> {
    let Some(root) = registry.find_type(ROOT_TYPE_NAME) else {
        log::warn!("registry has no {ROOT_TYPE_NAME} type; nothing to discover");
        return Vec::new();
    };

    let mut found = Vec::new();
    let mut seen = HashSet::new();
    walk(registry, root, &mut found, &mut seen);

    let walked = found.len();
    for class_name in registry.list_classes() {
        let Some(ty) = registry.find_type(&class_name) else {
            continue;
        };
        if ty != root && registry.is_a(ty, root) {
            consider(registry, ty, DiscoverySource::ClassList, &mut found, &mut seen);
        }
    }
    if found.len() > walked {
        log::debug!(
            "class listing contributed {} operation(s) the subtype walk missed",
            found.len() - walked
        );
    }

    found
}

fn walk<R: TypeRegistry + ?Sized>(
    registry: &R,
    ty: TypeHandle,
    found: &mut Vec<OperationType>,
    seen: &mut HashSet<String>,
) {
    for child in registry.children(ty) {
        consider(registry, child, DiscoverySource::SubtypeWalk, found, seen);
        walk(registry, child, found, seen);
    }
}

fn consider<R: TypeRegistry + ?Sized>(
    registry: &R,
    ty: TypeHandle,
    source: DiscoverySource,
    found: &mut Vec<OperationType>,
    seen: &mut HashSet<String>,
) {
    if registry.is_abstract(ty) {
        return;
    }
    let Some(nickname) = registry.nickname(ty).filter(|n| !n.is_empty()) else {
        return;
    };
    if seen.insert(nickname.clone()) {
        found.push(OperationType {
            handle: ty,
            nickname,
            source,
        });
    }
}
