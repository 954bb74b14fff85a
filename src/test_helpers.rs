//! Shared test fixtures for the vips-codegen test suite.
//!
//! [`sample_registry`] is a small but realistic registry: a few abstract
//! family types, one or two concrete operations per category, and a handful
//! of operations that exist only to exercise skip rules.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let registry = sample_registry();
//! let op = describe(&registry, "invert");
//! assert_eq!(op.descriptor.description, "invert an image");
//! ```

use crate::introspect::{ArgumentOrder, Operation, describe_operation};
use crate::registry::{ArgumentEntry, Snapshot, SnapshotRegistry, TypeEntry, ValueKind, ValueTypeEntry};
use crate::types::{ArgumentDescriptor, ArgumentFlags, OperationDescriptor, OperationFlags, SemanticType};

// =========================================================================
// Raw flag words, as the library declares them
// =========================================================================

pub const IN_REQUIRED: u32 = ArgumentFlags::REQUIRED
    .union(ArgumentFlags::CONSTRUCT)
    .union(ArgumentFlags::INPUT)
    .bits();
pub const IN_OPTIONAL: u32 = ArgumentFlags::CONSTRUCT.union(ArgumentFlags::INPUT).bits();
pub const OUT_REQUIRED: u32 = ArgumentFlags::REQUIRED
    .union(ArgumentFlags::CONSTRUCT)
    .union(ArgumentFlags::OUTPUT)
    .bits();
pub const OUT_OPTIONAL: u32 = ArgumentFlags::CONSTRUCT.union(ArgumentFlags::OUTPUT).bits();
pub const IN_DEPRECATED: u32 = IN_OPTIONAL | ArgumentFlags::DEPRECATED.bits();
pub const IN_MODIFY: u32 = IN_REQUIRED | ArgumentFlags::MODIFY.bits();

// =========================================================================
// Fixture registry
// =========================================================================

fn family(name: &str, parent: &str, nickname: &str) -> TypeEntry {
    TypeEntry {
        name: name.to_string(),
        parent: Some(parent.to_string()),
        is_abstract: true,
        nickname: Some(nickname.to_string()),
        description: String::new(),
        flags: 0,
        arguments: Vec::new(),
    }
}

fn operation(
    name: &str,
    parent: &str,
    nickname: &str,
    description: &str,
    args: &[(&str, &str, u32, &str)],
) -> TypeEntry {
    TypeEntry {
        name: name.to_string(),
        parent: Some(parent.to_string()),
        is_abstract: false,
        nickname: Some(nickname.to_string()),
        description: description.to_string(),
        flags: 0,
        arguments: args
            .iter()
            .enumerate()
            .map(|(i, (arg, value_type, flags, blurb))| ArgumentEntry {
                name: arg.to_string(),
                value_type: value_type.to_string(),
                flags: *flags,
                priority: (i as i32 + 1) * 10,
                blurb: blurb.to_string(),
            })
            .collect(),
    }
}

fn value_type(name: &str, kinds: &[ValueKind]) -> ValueTypeEntry {
    ValueTypeEntry {
        name: name.to_string(),
        kinds: kinds.to_vec(),
    }
}

/// The snapshot behind [`sample_registry`], for tests that want to tweak it.
pub fn sample_snapshot() -> Snapshot {
    let root = TypeEntry {
        name: "VipsOperation".to_string(),
        parent: None,
        is_abstract: true,
        nickname: Some("operation".to_string()),
        description: String::new(),
        flags: 0,
        arguments: Vec::new(),
    };

    let mut matcher = operation(
        "VipsMatch",
        "VipsOperation",
        "match",
        "first-order match of two images",
        &[
            ("ref", "VipsImage", IN_REQUIRED, "Reference image"),
            ("sec", "VipsImage", IN_REQUIRED, "Secondary image"),
            ("out", "VipsImage", OUT_REQUIRED, "Output image"),
            ("xr1", "gint", IN_REQUIRED, "Position of first reference tie-point"),
        ],
    );
    matcher.flags = OperationFlags::DEPRECATED.bits();

    let types = vec![
        root,
        family("VipsArithmetic", "VipsOperation", "arithmetic"),
        operation(
            "VipsAdd",
            "VipsArithmetic",
            "add",
            "add two images",
            &[
                ("left", "VipsImage", IN_REQUIRED, "Left-hand image argument"),
                ("right", "VipsImage", IN_REQUIRED, "Right-hand image argument"),
                ("out", "VipsImage", OUT_REQUIRED, "Output image"),
            ],
        ),
        operation(
            "VipsAvg",
            "VipsArithmetic",
            "avg",
            "find image average",
            &[
                ("in", "VipsImage", IN_REQUIRED, "Input image"),
                ("out", "gdouble", OUT_REQUIRED, "Output value"),
            ],
        ),
        operation(
            "VipsInvert",
            "VipsArithmetic",
            "invert",
            "invert an image",
            &[
                ("in", "VipsImage", IN_REQUIRED, "Input image"),
                ("out", "VipsImage", OUT_REQUIRED, "Output image"),
            ],
        ),
        family("VipsConversion", "VipsOperation", "conversion"),
        operation(
            "VipsFlip",
            "VipsConversion",
            "flip",
            "flip an image",
            &[
                ("in", "VipsImage", IN_REQUIRED, "Input image"),
                ("out", "VipsImage", OUT_REQUIRED, "Output image"),
                ("direction", "VipsDirection", IN_REQUIRED, "Direction to flip image"),
            ],
        ),
        operation(
            "VipsEmbed",
            "VipsConversion",
            "embed",
            "embed an image in a larger image",
            &[
                ("in", "VipsImage", IN_REQUIRED, "Input image"),
                ("out", "VipsImage", OUT_REQUIRED, "Output image"),
                ("x", "gint", IN_REQUIRED, "Left edge of input in output"),
                ("y", "gint", IN_REQUIRED, "Top edge of input in output"),
                ("width", "gint", IN_REQUIRED, "Image width in pixels"),
                ("height", "gint", IN_REQUIRED, "Image height in pixels"),
                ("extend", "VipsExtend", IN_OPTIONAL, "How to generate the extra pixels"),
                ("background", "VipsArrayDouble", IN_OPTIONAL, "Color for background pixels"),
            ],
        ),
        family("VipsCreate", "VipsOperation", "create"),
        operation(
            "VipsBlack",
            "VipsCreate",
            "black",
            "make a black image",
            &[
                ("out", "VipsImage", OUT_REQUIRED, "Output image"),
                ("width", "gint", IN_REQUIRED, "Image width in pixels"),
                ("height", "gint", IN_REQUIRED, "Image height in pixels"),
                ("bands", "gint", IN_OPTIONAL, "Number of bands in image"),
            ],
        ),
        family("VipsForeign", "VipsOperation", "foreign"),
        family("VipsForeignLoad", "VipsForeign", "foreignload"),
        operation(
            "VipsForeignLoadJpegFile",
            "VipsForeignLoad",
            "jpegload",
            "load jpeg from file",
            &[
                ("filename", "gchararray", IN_REQUIRED, "Filename to load from"),
                ("out", "VipsImage", OUT_REQUIRED, "Output image"),
                ("flags", "VipsForeignFlags", OUT_OPTIONAL, "Flags for this file"),
                ("memory", "gboolean", IN_OPTIONAL, "Force open via memory"),
                ("shrink", "gint", IN_OPTIONAL, "Shrink factor on load"),
            ],
        ),
        family("VipsForeignSave", "VipsForeign", "foreignsave"),
        operation(
            "VipsForeignSaveJpegFile",
            "VipsForeignSave",
            "jpegsave",
            "save image to jpeg file",
            &[
                ("in", "VipsImage", IN_REQUIRED, "Image to save"),
                ("filename", "gchararray", IN_REQUIRED, "Filename to save to"),
                ("Q", "gint", IN_OPTIONAL, "Q factor"),
                ("keep", "VipsForeignKeep", IN_OPTIONAL, "Which metadata to retain"),
                ("strip", "gboolean", IN_DEPRECATED, "Strip all metadata from image"),
            ],
        ),
        operation(
            "VipsForeignSaveJpegBuffer",
            "VipsForeignSave",
            "jpegsave_buffer",
            "save image to jpeg buffer",
            &[
                ("in", "VipsImage", IN_REQUIRED, "Image to save"),
                ("buffer", "VipsBlob", OUT_REQUIRED, "Buffer to save to"),
                ("Q", "gint", IN_OPTIONAL, "Q factor"),
            ],
        ),
        family("VipsDraw", "VipsOperation", "draw"),
        operation(
            "VipsDrawRect",
            "VipsDraw",
            "draw_rect",
            "paint a rectangle on an image",
            &[
                ("image", "VipsImage", IN_MODIFY, "Image to draw on"),
                ("ink", "VipsArrayDouble", IN_REQUIRED, "Color for pixels"),
                ("left", "gint", IN_REQUIRED, "Rect to fill"),
            ],
        ),
        family("VipsMorphology", "VipsOperation", "morphology"),
        operation(
            "VipsMorphPair",
            "VipsMorphology",
            "morphpair",
            "split an image into body and edges",
            &[
                ("in", "VipsImage", IN_REQUIRED, "Input image"),
                ("out", "VipsImage", OUT_REQUIRED, "Body image"),
                ("edges", "VipsImage", OUT_REQUIRED, "Edge image"),
            ],
        ),
        family("VipsConvolution", "VipsOperation", "convolution"),
        operation(
            "VipsSobelLegacy",
            "VipsConvolution",
            "sobel_legacy",
            "sobel edge detector",
            &[
                ("in", "VipsImage", IN_DEPRECATED, "Input image"),
                ("out", "VipsImage", OUT_REQUIRED, "Output image"),
            ],
        ),
        operation("VipsSystem", "VipsOperation", "system", "run an external command", &[]),
        matcher,
    ];

    Snapshot {
        version: crate::registry::SNAPSHOT_VERSION,
        types,
        value_types: vec![
            value_type("VipsImage", &[ValueKind::Image]),
            value_type("VipsArrayDouble", &[ValueKind::ArrayDouble]),
            value_type("VipsBlob", &[ValueKind::Blob]),
            value_type("gdouble", &[ValueKind::Double]),
            value_type("gint", &[ValueKind::Int]),
            value_type("gboolean", &[ValueKind::Boolean]),
            value_type("gchararray", &[ValueKind::String]),
            value_type("VipsDirection", &[ValueKind::Enum]),
            value_type("VipsExtend", &[ValueKind::Enum]),
            value_type("VipsForeignFlags", &[ValueKind::Flags]),
            value_type("VipsForeignKeep", &[ValueKind::Flags]),
        ],
        classes: vec!["VipsInvert".to_string(), "VipsAdd".to_string()],
    }
}

/// Registry over [`sample_snapshot`].
pub fn sample_registry() -> SnapshotRegistry {
    SnapshotRegistry::from_snapshot(sample_snapshot()).unwrap()
}

/// Describe an operation from a registry. Panics if it is missing.
pub fn describe(registry: &SnapshotRegistry, nickname: &str) -> Operation {
    describe_operation(registry, nickname, ArgumentOrder::Declaration)
        .unwrap_or_else(|e| panic!("operation '{nickname}' not describable: {e}"))
}

// =========================================================================
// Descriptor builders for emitter unit tests
// =========================================================================

pub fn op_descriptor(nickname: &str, description: &str) -> OperationDescriptor {
    OperationDescriptor {
        name: format!("Vips{nickname}"),
        nickname: nickname.to_string(),
        description: description.to_string(),
        flags: OperationFlags::empty(),
    }
}

pub fn arg(name: &str, semantic_type: SemanticType, flags: u32) -> ArgumentDescriptor {
    ArgumentDescriptor {
        name: name.to_string(),
        semantic_type,
        flags: ArgumentFlags::from_bits_retain(flags),
        priority: 0,
        description: String::new(),
    }
}
