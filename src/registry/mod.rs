//! Read-only access to the library's type registry.
//!
//! The [`TypeRegistry`] trait is the only surface the generator uses to reach
//! the native library. Everything above it (walker, introspector, emitter)
//! is written against the trait, so the same pipeline runs against:
//!
//! | Implementation | Source of truth |
//! |---|---|
//! | [`SnapshotRegistry`] | a JSON snapshot captured earlier (also the test fake) |
//! | `NativeRegistry` | live libvips through FFI, behind the `libvips` feature |
//!
//! Registry handles are opaque. The native backend uses the `GType` value
//! directly, the snapshot uses a 1-based index; `0` is never a valid handle
//! in either.

mod snapshot;

#[cfg(feature = "libvips")]
mod native;

#[cfg(feature = "libvips")]
pub use native::NativeRegistry;
pub use snapshot::{ArgumentEntry, SNAPSHOT_VERSION, Snapshot, SnapshotRegistry, TypeEntry, ValueTypeEntry};

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Abstract base type every operation derives from.
pub const ROOT_TYPE_NAME: &str = "VipsOperation";

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to initialize libvips: {0}")]
    Init(String),
    #[error(
        "built without libvips support; rebuild with `--features libvips` or pass --registry <snapshot.json>"
    )]
    Unavailable,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid registry snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Opaque reference to a registry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(pub u64);

impl TypeHandle {
    pub const INVALID: TypeHandle = TypeHandle(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Kinds a value type can be tested against.
///
/// These are the predicates the introspector chains to resolve a
/// [`SemanticType`](crate::types::SemanticType). A single type may satisfy
/// several (array types are also boxed/object types in the native registry),
/// which is why resolution order matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Image,
    ArrayDouble,
    ArrayInt,
    ArrayImage,
    Blob,
    Double,
    Int,
    UInt,
    Boolean,
    String,
    RefString,
    Enum,
    Flags,
}

impl ValueKind {
    pub const ALL: [ValueKind; 13] = [
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
}

/// Argument metadata exactly as the registry declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArgument {
    pub name: String,
    pub value_type: TypeHandle,
    pub flags: u32,
    pub priority: i32,
    pub blurb: String,
}

/// Operation metadata captured from a transient instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOperation {
    pub type_name: String,
    pub nickname: String,
    pub description: String,
    pub flags: u32,
    /// Declaration order.
    pub arguments: Vec<RawArgument>,
}

/// Read-only reflection surface of the native library.
///
/// Implementations must not register or mutate types. `lookup_operation`
/// may instantiate an operation to read its metadata, but the instance must
/// be released before the call returns.
pub trait TypeRegistry {
    /// Resolve a type by its registry name.
    fn find_type(&self, name: &str) -> Option<TypeHandle>;

    /// Direct subtypes, in registry order.
    fn children(&self, ty: TypeHandle) -> Vec<TypeHandle>;

    fn parent(&self, ty: TypeHandle) -> Option<TypeHandle>;

    fn type_name(&self, ty: TypeHandle) -> Option<String>;

    /// Operation nickname of a type, if it has one.
    fn nickname(&self, ty: TypeHandle) -> Option<String>;

    fn is_abstract(&self, ty: TypeHandle) -> bool;

    /// True when `ty` is `ancestor` or derives from it.
    fn is_a(&self, ty: TypeHandle, ancestor: TypeHandle) -> bool;

    /// Test a value type against one of the fixed kinds.
    fn value_type_is(&self, ty: TypeHandle, kind: ValueKind) -> bool;

    /// Names of every instantiable class the library lists.
    fn list_classes(&self) -> Vec<String>;

    /// Look up a concrete operation by nickname.
    fn lookup_operation(&self, nickname: &str) -> Option<RawOperation>;
}

/// Open the registry the CLI should run against.
///
/// A snapshot path wins; otherwise the live library is initialized when the
/// crate is built with the `libvips` feature.
pub fn open(snapshot: Option<&Path>) -> Result<Box<dyn TypeRegistry>, RegistryError> {
    if let Some(path) = snapshot {
        return Ok(Box::new(SnapshotRegistry::load(path)?));
    }
    open_native()
}

#[cfg(feature = "libvips")]
fn open_native() -> Result<Box<dyn TypeRegistry>, RegistryError> {
    Ok(Box::new(NativeRegistry::init()?))
}

#[cfg(not(feature = "libvips"))]
fn open_native() -> Result<Box<dyn TypeRegistry>, RegistryError> {
    Err(RegistryError::Unavailable)
}
