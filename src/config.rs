//! Generator configuration module.
//!
//! Handles loading, validating, and merging `codegen.toml`. Stock defaults
//! are the base layer; a user file overrides only the keys it names.
//!
//! ## Config File Location
//!
//! `codegen.toml` in the working directory is picked up automatically when
//! present. `--config <path>` points at any other file, which must exist.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output_dir = "src/generated"      # Where generated units are written
//! categories = ["Arithmetic", ...]  # Which units to generate, in order
//!
//! [operations]
//! skip_deprecated = false           # Drop deprecated operations entirely
//!
//! [operations.version_requirements] # Library version → operations it added
//! "8.13" = ["premultiply", "unpremultiply"]
//! "8.16" = ["addalpha"]
//! "8.17" = ["sdf", "sdf_shape"]
//!
//! [arguments]
//! order = "declaration"             # or "priority"
//!
//! [runtime]
//! module = "crate::runtime"         # Path glob-imported by every unit
//! image_type = "VipsImage"
//! options_type = "VOption"
//! call_fn = "call"
//! value_type = "GValue"
//! version_cfg = 'feature = "vips_{version}"'  # Guard for versioned operations
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::category::Category;
use crate::introspect::ArgumentOrder;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File picked up from the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "codegen.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Generator configuration loaded from `codegen.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodegenConfig {
    /// Directory generated units, `mod.rs` and `README.md` are written to.
    pub output_dir: String,
    /// Categories to generate, in generation order.
    pub categories: Vec<Category>,
    pub operations: OperationsConfig,
    pub arguments: ArgumentsConfig,
    /// Names the generated code expects from the hand-written runtime.
    pub runtime: RuntimeConfig,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            output_dir: "src/generated".to_string(),
            categories: Category::ALL.to_vec(),
            operations: OperationsConfig::default(),
            arguments: ArgumentsConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl CodegenConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output_dir must not be empty".into(),
            ));
        }
        if self.categories.is_empty() {
            return Err(ConfigError::Validation(
                "categories must not be empty".into(),
            ));
        }
        let mut seen = HashSet::new();
        for category in &self.categories {
            if !seen.insert(category) {
                return Err(ConfigError::Validation(format!(
                    "category '{category}' is listed twice"
                )));
            }
        }
        self.operations.validate()?;
        self.runtime.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperationsConfig {
    /// Leave operations flagged deprecated out of the generated units.
    pub skip_deprecated: bool,
    /// Library version (`"8.16"`) → nicknames of the operations it added.
    /// Wrappers for these are guarded with `runtime.version_cfg`.
    pub version_requirements: BTreeMap<String, Vec<String>>,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        let requirements = [
            ("8.13", &["premultiply", "unpremultiply"][..]),
            ("8.16", &["addalpha"][..]),
            ("8.17", &["sdf", "sdf_shape"][..]),
        ];
        Self {
            skip_deprecated: false,
            version_requirements: requirements
                .into_iter()
                .map(|(version, ops)| {
                    (
                        version.to_string(),
                        ops.iter().map(|op| op.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

fn is_version(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    (2..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

impl OperationsConfig {
    /// Library version an operation needs, if it is listed.
    pub fn required_version(&self, nickname: &str) -> Option<&str> {
        self.version_requirements
            .iter()
            .find(|(_, ops)| ops.iter().any(|op| op == nickname))
            .map(|(version, _)| version.as_str())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for (version, ops) in &self.version_requirements {
            if !is_version(version) {
                return Err(ConfigError::Validation(format!(
                    "operations.version_requirements key '{version}' is not a version like \"8.16\""
                )));
            }
            for op in ops {
                if !seen.insert(op.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "operation '{op}' is listed under more than one version"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArgumentsConfig {
    /// Parameter order of generated methods.
    pub order: ArgumentOrder,
}

/// Runtime names referenced by generated code.
///
/// The module must export the image, options and value types, the call
/// function, a `Result<T>` alias, and every enum/flags type the generated
/// signatures mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub module: String,
    pub image_type: String,
    pub options_type: String,
    pub call_fn: String,
    /// Fallback parameter type for values with no known mapping.
    pub value_type: String,
    /// `#[cfg(..)]` predicate for version-guarded wrappers. `{version}` is
    /// replaced with the version, dots turned into underscores (`8_16`).
    pub version_cfg: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            module: "crate::runtime".to_string(),
            image_type: "VipsImage".to_string(),
            options_type: "VOption".to_string(),
            call_fn: "call".to_string(),
            value_type: "GValue".to_string(),
            version_cfg: "feature = \"vips_{version}\"".to_string(),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl RuntimeConfig {
    /// The `cfg` predicate guarding operations added in `version`.
    pub fn cfg_for_version(&self, version: &str) -> String {
        self.version_cfg
            .replace("{version}", &version.replace('.', "_"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.version_cfg.contains("{version}") {
            return Err(ConfigError::Validation(format!(
                "runtime.version_cfg '{}' must contain {{version}}",
                self.version_cfg
            )));
        }
        if !self.module.split("::").all(is_identifier) {
            return Err(ConfigError::Validation(format!(
                "runtime.module '{}' is not a Rust path",
                self.module
            )));
        }
        let names = [
            ("runtime.image_type", &self.image_type),
            ("runtime.options_type", &self.options_type),
            ("runtime.call_fn", &self.call_fn),
            ("runtime.value_type", &self.value_type),
        ];
        for (key, value) in names {
            if !is_identifier(value) {
                return Err(ConfigError::Validation(format!(
                    "{key} '{value}' is not a Rust identifier"
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(CodegenConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config does not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<CodegenConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CodegenConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config.
///
/// An explicit path must exist. Without one, `codegen.toml` in the working
/// directory is used when present, and stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<CodegenConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str(&content)?)
        }
        None => load_raw_config(Path::new(CONFIG_FILE_NAME))?,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock `codegen.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# vips-codegen Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# Directory the generated units, mod.rs and README.md are written to.
output_dir = "src/generated"

# Categories to generate, in order. One file per non-empty category.
categories = [
    "Arithmetic",
    "Colour",
    "Conversion",
    "Convolution",
    "Create",
    "Draw",
    "Foreign",
    "Foreign_JPEG",
    "Foreign_PNG",
    "Foreign_WebP",
    "Foreign_TIFF",
    "Foreign_PDF",
    "Foreign_SVG",
    "Foreign_HEIF",
    "Histogram",
    "Morphology",
    "Misc",
]

# ---------------------------------------------------------------------------
# Operation selection
# ---------------------------------------------------------------------------
[operations]
# Leave deprecated operations out instead of marking them #[deprecated].
skip_deprecated = false

# Operations added after the oldest supported libvips, keyed by the version
# that introduced them. Their wrappers are compiled only when the guard in
# runtime.version_cfg holds. Entries here are merged with these defaults;
# set a version to [] to drop its guard.
[operations.version_requirements]
"8.13" = ["premultiply", "unpremultiply"]
"8.16" = ["addalpha"]
"8.17" = ["sdf", "sdf_shape"]

# ---------------------------------------------------------------------------
# Generated signatures
# ---------------------------------------------------------------------------
[arguments]
# "declaration" keeps the library's declaration order.
# "priority" sorts by (priority, name), stable across library versions.
order = "declaration"

# ---------------------------------------------------------------------------
# Runtime the generated code calls into
# ---------------------------------------------------------------------------
[runtime]
# Module glob-imported by every generated unit. It must export the types
# below, a Result<T> alias, and every enum/flags type used in signatures.
module = "crate::runtime"
image_type = "VipsImage"
options_type = "VOption"
call_fn = "call"
# Parameter type for values with no known mapping.
value_type = "GValue"
# cfg predicate for version-guarded wrappers; {version} becomes e.g. 8_16.
version_cfg = 'feature = "vips_{version}"'
"##
}
