//! JSON snapshot of a registry.
//!
//! A snapshot records the operation type tree under [`ROOT_TYPE_NAME`], the
//! metadata of every concrete operation, and the kinds of every value type
//! those operations reference. It is captured once from a live library
//! (`vips-codegen snapshot`) and can then drive generation anywhere.
//!
//! ```json
//! {
//!   "version": 1,
//!   "types": [
//!     { "name": "VipsOperation", "is_abstract": true },
//!     { "name": "VipsInvert", "parent": "VipsOperation", "nickname": "invert",
//!       "description": "invert an image",
//!       "arguments": [
//!         { "name": "in", "value_type": "VipsImage", "flags": 19, "priority": 0 },
//!         { "name": "out", "value_type": "VipsImage", "flags": 35, "priority": 10 }
//!       ] }
//!   ],
//!   "value_types": [ { "name": "VipsImage", "kinds": ["image"] } ]
//! }
//! ```
//!
//! Argument lists are flat: inherited arguments are listed on every concrete
//! type, as the live registry reports them.

use super::{
    ROOT_TYPE_NAME, RawArgument, RawOperation, RegistryError, TypeHandle, TypeRegistry, ValueKind,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Version of the snapshot format. Bump when the layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    pub version: u32,
    pub types: Vec<TypeEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value_types: Vec<ValueTypeEntry>,
    /// Result of the library's class listing, kept for the second discovery pass.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            types: Vec::new(),
            value_types: Vec::new(),
            classes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_abstract: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Raw `VipsOperationFlags` bits.
    #[serde(default)]
    pub flags: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArgumentEntry {
    pub name: String,
    /// Name of the value type; unknown names resolve to no handle.
    pub value_type: String,
    /// Raw `VipsArgumentFlags` bits.
    pub flags: u32,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub blurb: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueTypeEntry {
    pub name: String,
    pub kinds: Vec<ValueKind>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, RegistryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Copy everything under the root operation type out of `registry`.
    ///
    /// Returns an empty snapshot when the registry has no root type.
    pub fn capture<R: TypeRegistry + ?Sized>(registry: &R) -> Snapshot {
        let mut snapshot = Snapshot::default();
        let Some(root) = registry.find_type(ROOT_TYPE_NAME) else {
            return snapshot;
        };

        let mut seen_values = HashSet::new();
        let mut stack = vec![(root, None::<String>)];
        while let Some((ty, parent)) = stack.pop() {
            let Some(name) = registry.type_name(ty) else {
                continue;
            };
            let is_abstract = registry.is_abstract(ty);
            let nickname = registry.nickname(ty).filter(|n| !n.is_empty());

            let mut entry = TypeEntry {
                name: name.clone(),
                parent,
                is_abstract,
                nickname: nickname.clone(),
                description: String::new(),
                flags: 0,
                arguments: Vec::new(),
            };

            let op = match (is_abstract, nickname.as_deref()) {
                (false, Some(nick)) => registry.lookup_operation(nick),
                _ => None,
            };
            if let Some(op) = op {
                entry.description = op.description;
                entry.flags = op.flags;
                for arg in op.arguments {
                    let value_name = registry.type_name(arg.value_type).unwrap_or_default();
                    if arg.value_type.is_valid() && seen_values.insert(arg.value_type) {
                        snapshot.value_types.push(ValueTypeEntry {
                            name: value_name.clone(),
                            kinds: ValueKind::ALL
                                .into_iter()
                                .filter(|k| registry.value_type_is(arg.value_type, *k))
                                .collect(),
                        });
                    }
                    entry.arguments.push(ArgumentEntry {
                        name: arg.name,
                        value_type: value_name,
                        flags: arg.flags,
                        priority: arg.priority,
                        blurb: arg.blurb,
                    });
                }
            }
            snapshot.types.push(entry);

            // Reverse so the depth-first pop order matches registry order.
            for child in registry.children(ty).into_iter().rev() {
                stack.push((child, Some(name.clone())));
            }
        }

        snapshot.classes = registry.list_classes();
        snapshot
    }
}

/// Registry backed by a [`Snapshot`].
///
/// Handles `1..=types.len()` are operation types in snapshot order; value
/// types follow directly after.
#[derive(Debug, Clone)]
pub struct SnapshotRegistry {
    snapshot: Snapshot,
    /// Name → slot in the combined type/value-type space. Built at load.
    index: HashMap<String, usize>,
    /// Slot → child slots, in snapshot order.
    children: Vec<Vec<usize>>,
    parents: Vec<Option<usize>>,
}

impl SnapshotRegistry {
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    /// Validate and index a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, RegistryError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(RegistryError::InvalidSnapshot(format!(
                "unsupported version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        let mut index = HashMap::new();
        let names = snapshot
            .types
            .iter()
            .map(|t| &t.name)
            .chain(snapshot.value_types.iter().map(|v| &v.name));
        for (slot, name) in names.enumerate() {
            if index.insert(name.clone(), slot).is_some() {
                return Err(RegistryError::InvalidSnapshot(format!(
                    "type '{name}' is declared twice"
                )));
            }
        }

        let mut parents = Vec::with_capacity(snapshot.types.len());
        let mut children = vec![Vec::new(); snapshot.types.len()];
        for (slot, entry) in snapshot.types.iter().enumerate() {
            let parent = match &entry.parent {
                None => None,
                Some(parent) => match index.get(parent) {
                    Some(&p) if p < snapshot.types.len() => Some(p),
                    _ => {
                        return Err(RegistryError::InvalidSnapshot(format!(
                            "type '{}' has unknown parent '{parent}'",
                            entry.name
                        )));
                    }
                },
            };
            if let Some(p) = parent {
                children[p].push(slot);
            }
            parents.push(parent);
        }

        let registry = Self {
            snapshot,
            index,
            children,
            parents,
        };
        registry.check_acyclic()?;
        Ok(registry)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn check_acyclic(&self) -> Result<(), RegistryError> {
        for start in 0..self.parents.len() {
            let mut steps = 0;
            let mut cursor = self.parents[start];
            while let Some(p) = cursor {
                steps += 1;
                if steps > self.parents.len() {
                    return Err(RegistryError::InvalidSnapshot(format!(
                        "type '{}' is its own ancestor",
                        self.snapshot.types[start].name
                    )));
                }
                cursor = self.parents[p];
            }
        }
        Ok(())
    }

    fn handle(slot: usize) -> TypeHandle {
        TypeHandle(slot as u64 + 1)
    }

    fn slot(ty: TypeHandle) -> Option<usize> {
        (ty.0 as usize).checked_sub(1)
    }

    fn type_entry(&self, ty: TypeHandle) -> Option<&TypeEntry> {
        Self::slot(ty).and_then(|s| self.snapshot.types.get(s))
    }

    fn value_entry(&self, ty: TypeHandle) -> Option<&ValueTypeEntry> {
        Self::slot(ty)
            .and_then(|s| s.checked_sub(self.snapshot.types.len()))
            .and_then(|s| self.snapshot.value_types.get(s))
    }
}

impl TypeRegistry for SnapshotRegistry {
    fn find_type(&self, name: &str) -> Option<TypeHandle> {
        self.index.get(name).map(|&slot| Self::handle(slot))
    }

    fn children(&self, ty: TypeHandle) -> Vec<TypeHandle> {
        Self::slot(ty)
            .and_then(|s| self.children.get(s))
            .map(|kids| kids.iter().map(|&k| Self::handle(k)).collect())
            .unwrap_or_default()
    }

    fn parent(&self, ty: TypeHandle) -> Option<TypeHandle> {
        Self::slot(ty)
            .and_then(|s| self.parents.get(s).copied().flatten())
            .map(Self::handle)
    }

    fn type_name(&self, ty: TypeHandle) -> Option<String> {
        self.type_entry(ty)
            .map(|t| t.name.clone())
            .or_else(|| self.value_entry(ty).map(|v| v.name.clone()))
    }

    fn nickname(&self, ty: TypeHandle) -> Option<String> {
        self.type_entry(ty).and_then(|t| t.nickname.clone())
    }

    fn is_abstract(&self, ty: TypeHandle) -> bool {
        self.type_entry(ty).is_some_and(|t| t.is_abstract)
    }

    fn is_a(&self, ty: TypeHandle, ancestor: TypeHandle) -> bool {
        if self.type_entry(ty).is_none() {
            return ty.is_valid() && ty == ancestor;
        }
        let mut cursor = Some(ty);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    fn value_type_is(&self, ty: TypeHandle, kind: ValueKind) -> bool {
        self.value_entry(ty).is_some_and(|v| v.kinds.contains(&kind))
    }

    fn list_classes(&self) -> Vec<String> {
        self.snapshot.classes.clone()
    }

    fn lookup_operation(&self, nickname: &str) -> Option<RawOperation> {
        let entry = self
            .snapshot
            .types
            .iter()
            .find(|t| !t.is_abstract && t.nickname.as_deref() == Some(nickname))?;

        let arguments = entry
            .arguments
            .iter()
            .map(|a| RawArgument {
                name: a.name.clone(),
                value_type: self.find_type(&a.value_type).unwrap_or(TypeHandle::INVALID),
                flags: a.flags,
                priority: a.priority,
                blurb: a.blurb.clone(),
            })
            .collect();

        Some(RawOperation {
            type_name: entry.name.clone(),
            nickname: nickname.to_string(),
            description: entry.description.clone(),
            flags: entry.flags,
            arguments,
        })
    }
}
