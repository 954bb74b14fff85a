//! Descriptor types shared by every pipeline stage.
//!
//! Descriptors are owned copies of registry metadata. They are built by
//! [`introspect`](crate::introspect), consumed by [`emit`](crate::emit), and
//! dropped at the end of the generation pass; nothing here points back into
//! the registry.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Operation-level flags, bit-compatible with `VipsOperationFlags`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OperationFlags: u32 {
        const SEQUENTIAL = 1;
        const SEQUENTIAL_UNBUFFERED = 1 << 1;
        const NOCACHE = 1 << 2;
        const DEPRECATED = 1 << 3;
        const UNTRUSTED = 1 << 4;
        const BLOCKED = 1 << 5;
        const REVALIDATE = 1 << 6;
    }
}

bitflags! {
    /// Argument flags, bit-compatible with `VipsArgumentFlags`.
    ///
    /// Built with [`from_bits_retain`](Self::from_bits_retain) so bits this
    /// crate does not know about survive the copy untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ArgumentFlags: u32 {
        const REQUIRED = 1;
        const CONSTRUCT = 1 << 1;
        const SET_ONCE = 1 << 2;
        const SET_ALWAYS = 1 << 3;
        const INPUT = 1 << 4;
        const OUTPUT = 1 << 5;
        const DEPRECATED = 1 << 6;
        const MODIFY = 1 << 7;
        const NON_HASHABLE = 1 << 8;
    }
}

/// An operation as seen at generation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// Registry type name, e.g. `VipsInvert`.
    pub name: String,
    /// Lookup key, e.g. `invert`.
    pub nickname: String,
    /// One-line human description from the operation class.
    pub description: String,
    pub flags: OperationFlags,
}

impl OperationDescriptor {
    pub fn is_deprecated(&self) -> bool {
        self.flags.contains(OperationFlags::DEPRECATED)
    }
}

/// What an argument carries, resolved from its registry value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Image,
    ArrayDouble,
    ArrayInt,
    ArrayImage,
    Blob,
    Double,
    Int,
    Boolean,
    String,
    /// Enumeration, carrying the registry type name (`VipsInterpretation`).
    Enum(String),
    /// Bit-flags type, carrying the registry type name (`VipsForeignKeep`).
    Flags(String),
    Unknown,
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Image => f.write_str("image"),
            SemanticType::ArrayDouble => f.write_str("array of double"),
            SemanticType::ArrayInt => f.write_str("array of int"),
            SemanticType::ArrayImage => f.write_str("array of image"),
            SemanticType::Blob => f.write_str("blob"),
            SemanticType::Double => f.write_str("double"),
            SemanticType::Int => f.write_str("int"),
            SemanticType::Boolean => f.write_str("boolean"),
            SemanticType::String => f.write_str("string"),
            SemanticType::Enum(name) => write!(f, "enum {name}"),
            SemanticType::Flags(name) => write!(f, "flags {name}"),
            SemanticType::Unknown => f.write_str("unknown"),
        }
    }
}

/// One declared argument of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDescriptor {
    /// Registry property name (`in`, `Q`, `page-height`, ...).
    pub name: String,
    pub semantic_type: SemanticType,
    pub flags: ArgumentFlags,
    /// Display ordering hint only.
    pub priority: i32,
    /// Property blurb, may be empty.
    pub description: String,
}

impl ArgumentDescriptor {
    pub fn is_required(&self) -> bool {
        self.flags.contains(ArgumentFlags::REQUIRED)
    }

    pub fn is_input(&self) -> bool {
        self.flags.contains(ArgumentFlags::INPUT)
    }

    pub fn is_output(&self) -> bool {
        self.flags.contains(ArgumentFlags::OUTPUT)
    }

    pub fn is_deprecated(&self) -> bool {
        self.flags.contains(ArgumentFlags::DEPRECATED)
    }

    /// Output flag set, input flag clear.
    pub fn is_pure_output(&self) -> bool {
        self.is_output() && !self.is_input()
    }

    /// Something a caller can pass in: not deprecated and not output-only.
    pub fn is_consumable(&self) -> bool {
        !self.is_deprecated() && !self.is_pure_output()
    }

    pub fn is_image(&self) -> bool {
        self.semantic_type == SemanticType::Image
    }
}
