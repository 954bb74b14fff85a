//! Generation orchestrator.
//!
//! Discovers operations once, describes each once, then renders one unit
//! per configured category. Rendering is pure ([`render_all`]); writing is
//! a separate step ([`generate_all`]) so [`check`] can compare the same
//! output against what is on disk.
//!
//! ## Output Structure
//!
//! ```text
//! src/generated/
//! ├── README.md          # Manifest: regeneration notes, per-unit counts and digests
//! ├── mod.rs             # Declares every written unit
//! ├── arithmetic.rs      # impl VipsImage { .. } for one category
//! ├── foreign_jpeg.rs
//! └── ...
//! ```
//!
//! A category that yields no wrapper writes no file, and a unit left over
//! from an earlier run is removed. Files are only rewritten when their
//! contents change.
//!
//! ## Failure handling
//!
//! An operation that cannot be introspected is reported and skipped; the
//! run continues. Output I/O errors abort the run.

use crate::category::Category;
use crate::config::CodegenConfig;
use crate::emit::{self, Emission, GENERATED_HEADER, SkipReason};
use crate::introspect::{IntrospectError, Operation, describe_operation};
use crate::registry::TypeRegistry;
use crate::walker;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

pub const MANIFEST_FILE: &str = "README.md";
pub const MOD_FILE: &str = "mod.rs";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why an operation produced no wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipCause {
    Introspection(IntrospectError),
    Emit(SkipReason),
}

impl fmt::Display for SkipCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipCause::Introspection(e) => write!(f, "introspection failed: {e}"),
            SkipCause::Emit(reason) => write!(f, "{reason}"),
        }
    }
}

/// Progress events, sent while generating.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateEvent {
    CategoryStarted {
        category: Category,
    },
    OperationSkipped {
        nickname: String,
        cause: SkipCause,
    },
    CategoryWritten {
        category: Category,
        count: usize,
        path: PathBuf,
        /// Contents matched the existing file; nothing was written.
        unchanged: bool,
    },
    CategoryEmpty {
        category: Category,
        /// A unit from an earlier run was deleted.
        removed: bool,
    },
}

fn send(progress: Option<&Sender<GenerateEvent>>, event: GenerateEvent) {
    if let Some(tx) = progress {
        // A dropped receiver only means nobody is listening.
        let _ = tx.send(event);
    }
}

/// One category's rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedUnit {
    pub category: Category,
    /// Nicknames of the wrapped operations, in registry order.
    pub operations: Vec<String>,
    /// Unit source; empty when no operation qualified.
    pub contents: String,
}

impl RenderedUnit {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn file_name(&self) -> String {
        self.category.file_name()
    }

    pub fn digest(&self) -> String {
        sha256_hex(&self.contents)
    }
}

/// A unit written (or found up to date) by [`generate_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenUnit {
    pub category: Category,
    pub count: usize,
    pub path: PathBuf,
    pub unchanged: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub written: Vec<WrittenUnit>,
    pub empty: Vec<Category>,
    /// Generated files deleted because no configured category produces them.
    pub pruned: Vec<PathBuf>,
    /// Number of configured categories.
    pub categories: usize,
}

impl GenerateSummary {
    pub fn operation_count(&self) -> usize {
        self.written.iter().map(|u| u.count).sum()
    }
}

/// Drift between rendered output and the files on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub missing: Vec<String>,
    pub stale: Vec<String>,
    /// Generated files no configured category produces.
    pub extraneous: Vec<String>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.stale.is_empty() && self.extraneous.is_empty()
    }
}

pub fn sha256_hex(contents: &str) -> String {
    format!("{:x}", Sha256::digest(contents.as_bytes()))
}

// ============================================================================
// Rendering
// ============================================================================

/// Describe every discovered operation once.
///
/// Failures are reported and dropped.
pub fn describe_all<R: TypeRegistry + ?Sized>(
    registry: &R,
    config: &CodegenConfig,
    progress: Option<&Sender<GenerateEvent>>,
) -> Vec<Operation> {
    let types = walker::list_operation_types(registry);
    log::info!("discovered {} operation types", types.len());

    let mut operations = Vec::with_capacity(types.len());
    for ty in types {
        match describe_operation(registry, &ty.nickname, config.arguments.order) {
            Ok(op) => operations.push(op),
            Err(e) => {
                log::warn!("skipping {}: {e}", ty.nickname);
                send(
                    progress,
                    GenerateEvent::OperationSkipped {
                        nickname: ty.nickname,
                        cause: SkipCause::Introspection(e),
                    },
                );
            }
        }
    }
    operations
}

/// Render the unit for one category.
pub fn render_category(
    operations: &[Operation],
    category: Category,
    config: &CodegenConfig,
    progress: Option<&Sender<GenerateEvent>>,
) -> RenderedUnit {
    send(progress, GenerateEvent::CategoryStarted { category });

    let mut wrappers = Vec::new();
    for op in operations {
        match emit::plan(op, category, config.operations.skip_deprecated) {
            Emission::Wrapper(mut w) => {
                w.min_version = config
                    .operations
                    .required_version(&w.nickname)
                    .map(str::to_string);
                wrappers.push(w);
            }
            Emission::Skip(SkipReason::OtherCategory) => {}
            Emission::Skip(reason) => {
                log::debug!("{category}: skipping {}: {reason}", op.descriptor.nickname);
                send(
                    progress,
                    GenerateEvent::OperationSkipped {
                        nickname: op.descriptor.nickname.clone(),
                        cause: SkipCause::Emit(reason),
                    },
                );
            }
        }
    }

    if wrappers.is_empty() {
        return RenderedUnit {
            category,
            operations: Vec::new(),
            contents: String::new(),
        };
    }
    RenderedUnit {
        category,
        operations: wrappers.iter().map(|w| w.nickname.clone()).collect(),
        contents: emit::render_unit(category, &wrappers, &config.runtime),
    }
}

/// Render every configured category, in configured order.
pub fn render_all<R: TypeRegistry + ?Sized>(
    registry: &R,
    config: &CodegenConfig,
    progress: Option<&Sender<GenerateEvent>>,
) -> Vec<RenderedUnit> {
    let operations = describe_all(registry, config, progress);
    config
        .categories
        .iter()
        .map(|&category| render_category(&operations, category, config, progress))
        .collect()
}

/// `mod.rs` declaring every non-empty unit.
pub fn render_mod(units: &[RenderedUnit]) -> String {
    let mut out = format!("{GENERATED_HEADER}\n\n");
    for unit in units.iter().filter(|u| !u.is_empty()) {
        out.push_str(&format!("pub mod {};\n", unit.category.module_name()));
    }
    out
}

/// `README.md` manifest of the generated directory.
pub fn render_manifest(units: &[RenderedUnit]) -> String {
    let written: Vec<&RenderedUnit> = units.iter().filter(|u| !u.is_empty()).collect();
    let mut out = String::new();
    out.push_str("# Generated libvips bindings\n\n");
    out.push_str("Every `.rs` file in this directory is generated by vips-codegen from the\n");
    out.push_str("libvips operation registry. Do not edit them by hand.\n\n");
    out.push_str("Regenerate with:\n\n");
    out.push_str("```sh\nvips-codegen generate\n```\n\n");
    out.push_str("Verify the checked-in files are current with:\n\n");
    out.push_str("```sh\nvips-codegen check\n```\n\n");
    out.push_str(&format!(
        "{} of {} categories produced output.\n\n",
        written.len(),
        units.len()
    ));
    if written.is_empty() {
        return out;
    }
    out.push_str("| Unit | Category | Operations | SHA-256 |\n");
    out.push_str("|---|---|---|---|\n");
    for unit in written {
        out.push_str(&format!(
            "| `{}` | {} | {} | `{}` |\n",
            unit.file_name(),
            unit.category,
            unit.operations.len(),
            unit.digest()
        ));
    }
    out
}

/// Every file the output directory should contain, with its contents.
fn expected_files(units: &[RenderedUnit]) -> Vec<(String, String)> {
    let mut files: Vec<(String, String)> = units
        .iter()
        .filter(|u| !u.is_empty())
        .map(|u| (u.file_name(), u.contents.clone()))
        .collect();
    files.push((MOD_FILE.to_string(), render_mod(units)));
    files.push((MANIFEST_FILE.to_string(), render_manifest(units)));
    files
}

// ============================================================================
// Writing
// ============================================================================

/// Write `contents` unless the file already holds exactly that.
///
/// Returns `true` when the file was left untouched.
fn write_if_changed(path: &Path, contents: &str) -> io::Result<bool> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == contents) {
        return Ok(true);
    }
    fs::write(path, contents)?;
    Ok(false)
}

fn is_generated(path: &Path) -> bool {
    fs::read_to_string(path).is_ok_and(|text| text.starts_with(GENERATED_HEADER))
}

/// Generated unit files currently in `dir`, excluding `mod.rs`.
fn generated_units_on_disk(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "rs"))
        .filter(|p| p.file_name().is_some_and(|n| n != MOD_FILE))
        .filter(|p| is_generated(p))
        .collect()
}

/// Render and write every configured category into `output_dir`.
pub fn generate_all<R: TypeRegistry + ?Sized>(
    registry: &R,
    config: &CodegenConfig,
    output_dir: &Path,
    progress: Option<&Sender<GenerateEvent>>,
) -> Result<GenerateSummary, GenerateError> {
    fs::create_dir_all(output_dir)?;
    let operations = describe_all(registry, config, progress);

    let mut summary = GenerateSummary {
        categories: config.categories.len(),
        ..GenerateSummary::default()
    };
    let mut units = Vec::with_capacity(config.categories.len());
    for &category in &config.categories {
        let unit = render_category(&operations, category, config, progress);
        let path = output_dir.join(unit.file_name());

        if unit.is_empty() {
            let removed = path.exists() && is_generated(&path);
            if removed {
                fs::remove_file(&path)?;
                log::info!("removed stale {}", path.display());
            }
            send(progress, GenerateEvent::CategoryEmpty { category, removed });
            summary.empty.push(category);
        } else {
            let unchanged = write_if_changed(&path, &unit.contents)?;
            let count = unit.operations.len();
            send(
                progress,
                GenerateEvent::CategoryWritten {
                    category,
                    count,
                    path: path.clone(),
                    unchanged,
                },
            );
            summary.written.push(WrittenUnit {
                category,
                count,
                path,
                unchanged,
            });
        }
        units.push(unit);
    }

    let keep: BTreeSet<String> = units
        .iter()
        .filter(|u| !u.is_empty())
        .map(|u| u.file_name())
        .collect();
    for path in generated_units_on_disk(output_dir) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !keep.contains(&name) {
            fs::remove_file(&path)?;
            log::info!("pruned {}", path.display());
            summary.pruned.push(path);
        }
    }

    write_if_changed(&output_dir.join(MOD_FILE), &render_mod(&units))?;
    write_if_changed(&output_dir.join(MANIFEST_FILE), &render_manifest(&units))?;
    Ok(summary)
}

/// Compare what would be generated with what is in `output_dir`.
pub fn check<R: TypeRegistry + ?Sized>(
    registry: &R,
    config: &CodegenConfig,
    output_dir: &Path,
) -> Result<CheckReport, GenerateError> {
    let units = render_all(registry, config, None);
    let expected = expected_files(&units);
    let mut report = CheckReport::default();

    for (name, contents) in &expected {
        let path = output_dir.join(name);
        match fs::read_to_string(&path) {
            Ok(existing) if existing == *contents => {}
            Ok(_) => report.stale.push(name.clone()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => report.missing.push(name.clone()),
            Err(e) => return Err(e.into()),
        }
    }

    if output_dir.is_dir() {
        for path in generated_units_on_disk(output_dir) {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !expected.iter().any(|(n, _)| *n == name) {
                report.extraneous.push(name);
            }
        }
    }
    Ok(report)
}
