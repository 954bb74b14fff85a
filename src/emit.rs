//! Wrapper emission.
//!
//! [`plan`] decides, for one operation and one target category, whether a
//! wrapper is generated and what shape it takes. [`render`] turns a plan
//! into method text. Planning never fails: an operation that cannot be
//! wrapped yields [`Emission::Skip`] with the reason.
//!
//! ## Decision sequence
//!
//! 1. Wrong category → skip.
//! 2. No arguments, or no consumable input → skip.
//! 3. No pure output and no `save` in the name → skip.
//! 4. Deprecated while deprecated operations are excluded → skip.
//! 5. Call style: instance method when a consumable `in` exists and the
//!    name has no `load`; associated function otherwise.
//! 6. Result shape from the number of image outputs.
//!
//! ## Rendered shape
//!
//! ```text
//! /// invert an image
//! pub fn invert(&self) -> Result<VipsImage> {
//!     let mut out = VipsImage::new();
//!     let mut opt = VOption::new();
//!     opt.set("in", self);
//!     opt.set_out("out", &mut out);
//!     call("invert", opt)?;
//!     Ok(out)
//! }
//! ```
//!
//! A wrapper with a `min_version` gets a `#[cfg(..)]` line, built from
//! `runtime.version_cfg`, between its docs and its signature.

use crate::category::{Category, classify};
use crate::config::RuntimeConfig;
use crate::introspect::Operation;
use crate::naming::{OPTIONS_LOCAL, enum_type_name, method_name, param_name, pascal_case};
use crate::types::{ArgumentDescriptor, SemanticType};
use std::fmt;

/// First line of every generated unit.
pub const GENERATED_HEADER: &str = "// Generated by vips-codegen. DO NOT EDIT.";

/// Name of the primary subject argument.
const SUBJECT: &str = "in";

const INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    OtherCategory,
    NoArguments,
    NoUsableArguments,
    NoOutputs,
    Deprecated,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::OtherCategory => "belongs to another category",
            SkipReason::NoArguments => "has no arguments",
            SkipReason::NoUsableArguments => "has no usable input arguments",
            SkipReason::NoOutputs => "has no outputs and does not save",
            SkipReason::Deprecated => "is deprecated",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStyle {
    /// `&self` binds the `in` argument.
    Instance,
    /// Associated function; every input is a parameter.
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// Exactly one image output, returned directly.
    Single,
    /// Save operation with no image output.
    Unit,
    /// Several image outputs, returned in a generated struct.
    Multi,
    /// Anything else: call for effect and return unit.
    Fallback,
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Registry name, used as the options key.
    pub name: String,
    /// Rust identifier.
    pub ident: String,
    pub semantic_type: SemanticType,
    pub required: bool,
    pub description: String,
}

/// An output bound into a local before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub name: String,
    pub ident: String,
    pub description: String,
}

/// Everything needed to render one wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapper {
    pub nickname: String,
    pub method: String,
    pub description: String,
    pub deprecated: bool,
    pub style: CallStyle,
    pub shape: ResultShape,
    pub params: Vec<Param>,
    /// Image outputs that are bound; empty for `Unit` and `Fallback`.
    pub outputs: Vec<Output>,
    /// Oldest library version providing the operation, when it is newer
    /// than the baseline. Rendered as a `#[cfg(..)]` guard.
    pub min_version: Option<String>,
}

impl Wrapper {
    /// Name of the generated output struct, for `Multi` wrappers.
    pub fn outputs_struct(&self) -> Option<String> {
        (self.shape == ResultShape::Multi).then(|| format!("{}Outputs", pascal_case(&self.nickname)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    Wrapper(Wrapper),
    Skip(SkipReason),
}

/// Plan the wrapper for `op` within `target`.
pub fn plan(op: &Operation, target: Category, skip_deprecated: bool) -> Emission {
    let nickname = &op.descriptor.nickname;
    if classify(nickname) != target {
        return Emission::Skip(SkipReason::OtherCategory);
    }
    if op.arguments.is_empty() {
        return Emission::Skip(SkipReason::NoArguments);
    }

    let inputs: Vec<&ArgumentDescriptor> =
        op.arguments.iter().filter(|a| a.is_consumable()).collect();
    let outputs: Vec<&ArgumentDescriptor> =
        op.arguments.iter().filter(|a| a.is_pure_output()).collect();
    if inputs.is_empty() {
        return Emission::Skip(SkipReason::NoUsableArguments);
    }

    let saves = nickname.contains("save");
    if outputs.is_empty() && !saves {
        return Emission::Skip(SkipReason::NoOutputs);
    }
    if skip_deprecated && op.descriptor.is_deprecated() {
        return Emission::Skip(SkipReason::Deprecated);
    }

    let has_subject = inputs.iter().any(|a| a.name == SUBJECT && a.is_input());
    let style = if has_subject && !nickname.contains("load") {
        CallStyle::Instance
    } else {
        CallStyle::Static
    };

    let params: Vec<Param> = inputs
        .iter()
        .filter(|a| !(style == CallStyle::Instance && a.name == SUBJECT))
        .map(|a| Param {
            name: a.name.clone(),
            ident: param_name(&a.name),
            semantic_type: a.semantic_type.clone(),
            required: a.is_required(),
            description: a.description.clone(),
        })
        .collect();

    let image_outputs: Vec<&ArgumentDescriptor> =
        outputs.iter().copied().filter(|a| a.is_image()).collect();
    let shape = match image_outputs.len() {
        1 => ResultShape::Single,
        0 if saves => ResultShape::Unit,
        n if n > 1 => ResultShape::Multi,
        _ => ResultShape::Fallback,
    };

    let bound = match shape {
        ResultShape::Single | ResultShape::Multi => image_outputs
            .iter()
            .map(|a| {
                let mut ident = param_name(&a.name);
                if params.iter().any(|p| p.ident == ident) {
                    ident.push_str("_out");
                }
                Output {
                    name: a.name.clone(),
                    ident,
                    description: a.description.clone(),
                }
            })
            .collect(),
        ResultShape::Unit | ResultShape::Fallback => Vec::new(),
    };

    Emission::Wrapper(Wrapper {
        nickname: nickname.clone(),
        method: method_name(nickname),
        description: op.descriptor.description.clone(),
        deprecated: op.descriptor.is_deprecated(),
        style,
        shape,
        params,
        outputs: bound,
        min_version: None,
    })
}

/// Rust type of a parameter.
pub fn rust_type(semantic_type: &SemanticType, runtime: &RuntimeConfig) -> String {
    match semantic_type {
        SemanticType::Image => format!("&{}", runtime.image_type),
        SemanticType::ArrayDouble => "&[f64]".to_string(),
        SemanticType::ArrayInt => "&[i32]".to_string(),
        SemanticType::ArrayImage => format!("&[{}]", runtime.image_type),
        SemanticType::Blob => "&[u8]".to_string(),
        SemanticType::Double => "f64".to_string(),
        SemanticType::Int => "i32".to_string(),
        SemanticType::Boolean => "bool".to_string(),
        SemanticType::String => "&str".to_string(),
        SemanticType::Enum(name) | SemanticType::Flags(name) => enum_type_name(name),
        SemanticType::Unknown => format!("&{}", runtime.value_type),
    }
}

fn return_type(wrapper: &Wrapper, runtime: &RuntimeConfig) -> String {
    match (wrapper.shape, wrapper.outputs_struct()) {
        (ResultShape::Single, _) => runtime.image_type.clone(),
        (ResultShape::Multi, Some(name)) => name,
        _ => "()".to_string(),
    }
}

/// Append `text` as doc comment lines, one `///` per line of text.
fn push_doc(out: &mut String, indent: &str, text: &str) {
    for line in text.trim().lines().map(str::trim) {
        if line.is_empty() {
            out.push_str(&format!("{indent}///\n"));
        } else {
            out.push_str(&format!("{indent}/// {line}\n"));
        }
    }
}

fn push_version_guard(out: &mut String, indent: &str, wrapper: &Wrapper, runtime: &RuntimeConfig) {
    if let Some(version) = &wrapper.min_version {
        out.push_str(&format!("{indent}#[cfg({})]\n", runtime.cfg_for_version(version)));
    }
}

fn push_method_docs(out: &mut String, wrapper: &Wrapper, indent: &str) {
    let description = wrapper.description.trim();
    push_doc(out, indent, description);
    if wrapper.params.is_empty() {
        return;
    }
    if !description.is_empty() {
        out.push_str(&format!("{indent}///\n"));
    }
    out.push_str(&format!("{indent}/// # Arguments\n{indent}///\n"));
    for param in &wrapper.params {
        let ident = param.ident.trim_start_matches("r#");
        let mut lines = param.description.trim().lines().map(str::trim);
        match lines.next() {
            Some(first) => out.push_str(&format!("{indent}/// * `{ident}` - {first}\n")),
            None => out.push_str(&format!("{indent}/// * `{ident}`\n")),
        }
        // Continuation lines stay inside the bullet.
        for line in lines {
            if line.is_empty() {
                out.push_str(&format!("{indent}///\n"));
            } else {
                out.push_str(&format!("{indent}///   {line}\n"));
            }
        }
    }
}

/// Render one wrapper method, indented for an `impl` block.
pub fn render(wrapper: &Wrapper, runtime: &RuntimeConfig) -> String {
    let i1 = INDENT;
    let i2 = INDENT.repeat(2);
    let i3 = INDENT.repeat(3);
    let mut out = String::new();

    push_method_docs(&mut out, wrapper, i1);
    push_version_guard(&mut out, i1, wrapper, runtime);
    if wrapper.deprecated {
        out.push_str(&format!("{i1}#[deprecated]\n"));
    }

    let mut signature: Vec<String> = Vec::new();
    if wrapper.style == CallStyle::Instance {
        signature.push("&self".to_string());
    }
    for param in &wrapper.params {
        let ty = rust_type(&param.semantic_type, runtime);
        if param.required {
            signature.push(format!("{}: {ty}", param.ident));
        } else {
            signature.push(format!("{}: Option<{ty}>", param.ident));
        }
    }
    out.push_str(&format!(
        "{i1}pub fn {}({}) -> Result<{}> {{\n",
        wrapper.method,
        signature.join(", "),
        return_type(wrapper, runtime)
    ));

    for output in &wrapper.outputs {
        out.push_str(&format!(
            "{i2}let mut {} = {}::new();\n",
            output.ident, runtime.image_type
        ));
    }
    out.push_str(&format!(
        "{i2}let mut {OPTIONS_LOCAL} = {}::new();\n",
        runtime.options_type
    ));
    if wrapper.style == CallStyle::Instance {
        out.push_str(&format!("{i2}{OPTIONS_LOCAL}.set(\"{SUBJECT}\", self);\n"));
    }
    for param in &wrapper.params {
        if param.required {
            out.push_str(&format!(
                "{i2}{OPTIONS_LOCAL}.set(\"{}\", {});\n",
                param.name, param.ident
            ));
        } else {
            out.push_str(&format!("{i2}if let Some({0}) = {0} {{\n", param.ident));
            out.push_str(&format!(
                "{i3}{OPTIONS_LOCAL}.set(\"{}\", {});\n",
                param.name, param.ident
            ));
            out.push_str(&format!("{i2}}}\n"));
        }
    }
    for output in &wrapper.outputs {
        out.push_str(&format!(
            "{i2}{OPTIONS_LOCAL}.set_out(\"{}\", &mut {});\n",
            output.name, output.ident
        ));
    }
    out.push_str(&format!(
        "{i2}{}(\"{}\", {OPTIONS_LOCAL})?;\n",
        runtime.call_fn, wrapper.nickname
    ));

    match (wrapper.shape, wrapper.outputs_struct()) {
        (ResultShape::Single, _) => {
            let ident = wrapper.outputs.first().map_or("out", |o| o.ident.as_str());
            out.push_str(&format!("{i2}Ok({ident})\n"));
        }
        (ResultShape::Multi, Some(name)) => {
            let fields: Vec<String> = wrapper
                .outputs
                .iter()
                .map(|o| {
                    let field = param_name(&o.name);
                    if field == o.ident {
                        field
                    } else {
                        format!("{field}: {}", o.ident)
                    }
                })
                .collect();
            out.push_str(&format!("{i2}Ok({name} {{ {} }})\n", fields.join(", ")));
        }
        _ => out.push_str(&format!("{i2}Ok(())\n")),
    }
    out.push_str(&format!("{i1}}}\n"));
    out
}

/// Render the output struct of a `Multi` wrapper.
pub fn render_outputs_struct(wrapper: &Wrapper, runtime: &RuntimeConfig) -> Option<String> {
    let name = wrapper.outputs_struct()?;
    let mut out = format!(
        "/// Outputs of [`{}::{}`].\n",
        runtime.image_type, wrapper.method
    );
    push_version_guard(&mut out, "", wrapper, runtime);
    out.push_str(&format!("pub struct {name} {{\n"));
    for output in &wrapper.outputs {
        push_doc(&mut out, INDENT, &output.description);
        out.push_str(&format!(
            "{INDENT}pub {}: {},\n",
            param_name(&output.name),
            runtime.image_type
        ));
    }
    out.push_str("}\n");
    Some(out)
}

/// Render a complete generated unit for one category.
pub fn render_unit(category: Category, wrappers: &[Wrapper], runtime: &RuntimeConfig) -> String {
    let mut out = format!("{GENERATED_HEADER}\n// Category: {}\n\n", category.label());
    out.push_str("#![allow(clippy::too_many_arguments)]\n\n");
    out.push_str(&format!("use {}::*;\n\n", runtime.module));
    out.push_str(&format!("impl {} {{\n", runtime.image_type));
    let methods: Vec<String> = wrappers.iter().map(|w| render(w, runtime)).collect();
    out.push_str(&methods.join("\n"));
    out.push_str("}\n");
    for wrapper in wrappers {
        if let Some(text) = render_outputs_struct(wrapper, runtime) {
            out.push('\n');
            out.push_str(&text);
        }
    }
    out
}
