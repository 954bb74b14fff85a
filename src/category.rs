//! Operation categories and the name-based classifier.
//!
//! Every operation lands in exactly one [`Category`], decided by
//! [`classify`] from its nickname alone. The decision is an ordered
//! [`RULES`] table of case-sensitive substring tests; the first rule that
//! matches wins and [`Category::Misc`] catches the rest.
//!
//! | Label | File |
//! |---|---|
//! | `Arithmetic` | `arithmetic.rs` |
//! | `Foreign` | `foreign.rs` |
//! | `Foreign_JPEG` | `foreign_jpeg.rs` |
//! | ... | lower-cased label + `.rs` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Image file format a load/save operation handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignFormat {
    /// Any format without a dedicated unit.
    Other,
    Jpeg,
    Png,
    WebP,
    Tiff,
    Pdf,
    Svg,
    Heif,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Arithmetic,
    Colour,
    Conversion,
    Convolution,
    Create,
    Draw,
    Foreign(ForeignFormat),
    Histogram,
    Morphology,
    Misc,
}

impl Category {
    /// Every category, in default generation order.
    pub const ALL: [Category; 17] = [
        Category::Arithmetic,
        Category::Colour,
        Category::Conversion,
        Category::Convolution,
        Category::Create,
        Category::Draw,
        Category::Foreign(ForeignFormat::Other),
        Category::Foreign(ForeignFormat::Jpeg),
        Category::Foreign(ForeignFormat::Png),
        Category::Foreign(ForeignFormat::WebP),
        Category::Foreign(ForeignFormat::Tiff),
        Category::Foreign(ForeignFormat::Pdf),
        Category::Foreign(ForeignFormat::Svg),
        Category::Foreign(ForeignFormat::Heif),
        Category::Histogram,
        Category::Morphology,
        Category::Misc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Arithmetic => "Arithmetic",
            Category::Colour => "Colour",
            Category::Conversion => "Conversion",
            Category::Convolution => "Convolution",
            Category::Create => "Create",
            Category::Draw => "Draw",
            Category::Foreign(ForeignFormat::Other) => "Foreign",
            Category::Foreign(ForeignFormat::Jpeg) => "Foreign_JPEG",
            Category::Foreign(ForeignFormat::Png) => "Foreign_PNG",
            Category::Foreign(ForeignFormat::WebP) => "Foreign_WebP",
            Category::Foreign(ForeignFormat::Tiff) => "Foreign_TIFF",
            Category::Foreign(ForeignFormat::Pdf) => "Foreign_PDF",
            Category::Foreign(ForeignFormat::Svg) => "Foreign_SVG",
            Category::Foreign(ForeignFormat::Heif) => "Foreign_HEIF",
            Category::Histogram => "Histogram",
            Category::Morphology => "Morphology",
            Category::Misc => "Misc",
        }
    }

    /// Module name of the generated unit, e.g. `foreign_jpeg`.
    pub fn module_name(self) -> String {
        self.label().to_lowercase()
    }

    /// Generated unit file name, e.g. `foreign_jpeg.rs`.
    pub fn file_name(self) -> String {
        format!("{}.rs", self.module_name())
    }

    pub fn from_label(label: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown category '{s}'"))
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.label().to_string()
    }
}

/// One classifier rule.
///
/// Matches when the name contains any of `any` and, if `also` is
/// non-empty, any of `also` as well.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub category: Category,
    pub any: &'static [&'static str],
    pub also: &'static [&'static str],
}

impl Rule {
    pub fn matches(&self, name: &str) -> bool {
        let contains_any = |needles: &[&str]| needles.iter().any(|n| name.contains(n));
        contains_any(self.any) && (self.also.is_empty() || contains_any(self.also))
    }
}

const LOAD_SAVE: &[&str] = &["load", "save"];

const fn foreign(format: ForeignFormat, any: &'static [&'static str]) -> Rule {
    Rule {
        category: Category::Foreign(format),
        any,
        also: LOAD_SAVE,
    }
}

const fn rule(category: Category, any: &'static [&'static str]) -> Rule {
    Rule {
        category,
        any,
        also: &[],
    }
}

/// Classifier rules, first match wins.
pub const RULES: &[Rule] = &[
    foreign(ForeignFormat::Jpeg, &["jpeg", "jpg"]),
    foreign(ForeignFormat::Png, &["png"]),
    foreign(ForeignFormat::WebP, &["webp"]),
    foreign(ForeignFormat::Tiff, &["tiff", "tif"]),
    foreign(ForeignFormat::Pdf, &["pdf"]),
    foreign(ForeignFormat::Svg, &["svg"]),
    foreign(ForeignFormat::Heif, &["heif", "heic"]),
    rule(Category::Foreign(ForeignFormat::Other), LOAD_SAVE),
    rule(
        Category::Arithmetic,
        &[
            "add",
            "subtract",
            "multiply",
            "divide",
            "abs",
            "linear",
            "math",
            "complex",
            "remainder",
            "boolean",
            "relational",
        ],
    ),
    rule(Category::Convolution, &["conv", "sharpen", "blur", "sobel"]),
    rule(Category::Colour, &["colour", "color", "Lab", "XYZ", "sRGB", "RGB"]),
    rule(
        Category::Conversion,
        &[
            "resize", "rotate", "flip", "crop", "embed", "extract", "shrink", "reduce", "affine",
            "scale",
        ],
    ),
    rule(
        Category::Create,
        &["black", "xyz", "grey", "mask", "gaussmat", "text", "gaussnoise", "eye"],
    ),
    rule(Category::Draw, &["draw"]),
    rule(Category::Histogram, &["hist", "heq"]),
    rule(Category::Morphology, &["morph", "erode", "dilate", "median"]),
];

/// Category of an operation, from its nickname.
pub fn classify(name: &str) -> Category {
    RULES
        .iter()
        .find(|r| r.matches(name))
        .map_or(Category::Misc, |r| r.category)
}
