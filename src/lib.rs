//! # vips-codegen
//!
//! Generates typed Rust wrappers for libvips operations from the library's
//! own reflection metadata. Every operation the library registers becomes a
//! method on the image type, grouped into one source unit per category.
//!
//! # Architecture: One-Shot Pipeline
//!
//! ```text
//! 1. Walk        registry      →  operation types   (subtype tree + class list)
//! 2. Introspect  nickname      →  descriptors       (owned copies, no registry refs)
//! 3. Classify    nickname      →  category          (ordered substring rules)
//! 4. Emit        descriptors   →  method text       (or a skip reason)
//! 5. Generate    categories    →  output_dir/       (units, mod.rs, README.md)
//! ```
//!
//! The registry is only ever read, through the [`registry::TypeRegistry`]
//! trait. The live library sits behind the `libvips` feature; a JSON
//! snapshot of it drives generation anywhere else and doubles as the test
//! fixture.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`registry`] | `TypeRegistry` trait, JSON snapshot registry, libvips FFI registry |
//! | [`walker`] | Discovers concrete operation types under `VipsOperation` |
//! | [`introspect`] | Builds operation and argument descriptors, resolves semantic types |
//! | [`types`] | Descriptor types and flag sets shared by every stage |
//! | [`category`] | Category set and the name-based classifier |
//! | [`naming`] | Registry names to Rust identifiers |
//! | [`emit`] | Wrapper planning and method rendering |
//! | [`generate`] | Per-category rendering, writing, manifest, drift check |
//! | [`config`] | `codegen.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Snapshots
//!
//! Linking libvips is only needed to read the registry, not to generate from
//! it. `vips-codegen snapshot` captures everything the generator consumes
//! into one JSON file, so CI and contributors without libvips can still
//! regenerate and check the bindings.
//!
//! ## Skip, Don't Fail
//!
//! An operation that cannot be described or wrapped is reported and left
//! out. One odd operation in a new library release must not block
//! regeneration of the other few hundred.
//!
//! ## Stable Output
//!
//! Output depends only on registry contents and config. Discovery follows
//! registry order, nothing is timestamped, and unchanged files are not
//! rewritten, so regenerating is a no-op in version control until the
//! library actually changes.

pub mod category;
pub mod config;
pub mod emit;
pub mod generate;
pub mod introspect;
pub mod naming;
pub mod output;
pub mod registry;
pub mod types;
pub mod walker;

#[cfg(test)]
pub(crate) mod test_helpers;
