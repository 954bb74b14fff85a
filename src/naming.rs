//! Identifier conversion for generated code.
//!
//! Registry names are not always valid Rust. Property names use dashes
//! (`page-height`), some are single upper-case letters (`Q`), and a few
//! collide with keywords (`in`, `ref`, `match`).
//!
//! ## Parameter names
//!
//! - `page-height` → `page_height`
//! - `Q` → `quality`
//! - `in` → `r#in`
//! - `self` → `self_` (cannot be a raw identifier)
//! - `opt` → `opt_` (reserved for the generated options local)

/// Local the generated body builds its options into.
pub const OPTIONS_LOCAL: &str = "opt";

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do", "dyn",
    "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in", "let",
    "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return",
    "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized", "use",
    "virtual", "where", "while", "yield",
];

/// Keywords that `r#` cannot escape.
const NON_RAW: &[&str] = &["self", "Self", "super", "crate"];

/// Snake-case form of a registry name, before keyword escaping.
pub fn snake_name(name: &str) -> String {
    if name == "Q" {
        return "quality".to_string();
    }
    name.replace('-', "_").to_lowercase()
}

/// Escape a snake-case name that would otherwise not be a usable identifier.
pub fn escape_identifier(name: &str) -> String {
    if NON_RAW.contains(&name) || name == OPTIONS_LOCAL {
        format!("{name}_")
    } else if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name.to_string()
    }
}

/// Rust parameter name for a registry argument name.
pub fn param_name(name: &str) -> String {
    escape_identifier(&snake_name(name))
}

/// Method name for an operation nickname.
pub fn method_name(nickname: &str) -> String {
    escape_identifier(&nickname.replace('-', "_").to_lowercase())
}

/// PascalCase form of a snake-case nickname: `hough_circle` → `HoughCircle`.
pub fn pascal_case(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Rust type name of a registry enum or flags type.
///
/// `VipsForeignKeep` → `ForeignKeep`; names without the prefix are kept.
pub fn enum_type_name(type_name: &str) -> String {
    match type_name.strip_prefix("Vips") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => type_name.to_string(),
    }
}
