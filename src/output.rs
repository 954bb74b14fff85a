//! CLI output formatting for every subcommand.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! Arithmetic
//!     1 operation → src/generated/arithmetic.rs
//! Colour
//!     no operations
//! Convolution
//!     skipped sobel_legacy: has no usable input arguments
//!     no operations
//! ...
//! Generated 11 operations in 6 of 17 categories
//! Generation complete!
//! ```
//!
//! ## List
//!
//! ```text
//! 001 add [Arithmetic]
//! 002 avg [Misc]
//! ...
//! Discovered 14 operations: 14 by subtype walk, 0 by class list
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::category::classify;
use crate::generate::{CheckReport, GenerateEvent, GenerateSummary};
use crate::walker::{DiscoverySource, OperationType};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Generate
// ============================================================================

/// Format a single generation progress event as display lines.
pub fn format_generate_event(event: &GenerateEvent) -> Vec<String> {
    match event {
        GenerateEvent::CategoryStarted { category } => vec![category.label().to_string()],
        GenerateEvent::OperationSkipped { nickname, cause } => {
            vec![format!("    skipped {}: {}", nickname, cause)]
        }
        GenerateEvent::CategoryWritten {
            count,
            path,
            unchanged,
            ..
        } => {
            let mut line = format!(
                "    {} \u{2192} {}",
                plural(*count, "operation"),
                path.display()
            );
            if *unchanged {
                line.push_str(" (unchanged)");
            }
            vec![line]
        }
        GenerateEvent::CategoryEmpty { category, removed } => {
            let mut lines = vec!["    no operations".to_string()];
            if *removed {
                lines.push(format!("    removed stale {}", category.file_name()));
            }
            lines
        }
    }
}

/// Format the end-of-run summary.
pub fn format_generate_summary(summary: &GenerateSummary) -> Vec<String> {
    let mut lines = Vec::new();
    for path in &summary.pruned {
        lines.push(format!("Pruned {}", path.display()));
    }
    lines.push(format!(
        "Generated {} in {} of {} categories",
        plural(summary.operation_count(), "operation"),
        summary.written.len(),
        summary.categories
    ));
    lines.push("Generation complete!".to_string());
    lines
}

pub fn print_generate_summary(summary: &GenerateSummary) {
    for line in format_generate_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_report(report: &CheckReport, output_dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    let sections = [
        ("Missing", &report.missing),
        ("Stale", &report.stale),
        ("Extraneous", &report.extraneous),
    ];
    for (label, files) in sections {
        for file in files {
            lines.push(format!("{}: {}", label, output_dir.join(file).display()));
        }
    }
    if report.is_clean() {
        lines.push(format!("{} is up to date", output_dir.display()));
    } else {
        lines.push(format!(
            "{} is out of date; run `vips-codegen generate`",
            output_dir.display()
        ));
    }
    lines
}

pub fn print_check_report(report: &CheckReport, output_dir: &Path) {
    for line in format_check_report(report, output_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// List
// ============================================================================

/// Format discovered operations with their category.
///
/// Operations only the class listing found are marked.
pub fn format_operation_list(types: &[OperationType]) -> Vec<String> {
    let mut lines = Vec::with_capacity(types.len() + 1);
    let mut from_classes = 0;
    for (i, ty) in types.iter().enumerate() {
        let mut line = format!(
            "{} {} [{}]",
            format_index(i + 1),
            ty.nickname,
            classify(&ty.nickname)
        );
        if ty.source == DiscoverySource::ClassList {
            from_classes += 1;
            line.push_str(" (class list)");
        }
        lines.push(line);
    }
    lines.push(format!(
        "Discovered {}: {} by subtype walk, {} by class list",
        plural(types.len(), "operation"),
        types.len() - from_classes,
        from_classes
    ));
    lines
}

pub fn print_operation_list(types: &[OperationType]) {
    for line in format_operation_list(types) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{Category, ForeignFormat};
    use crate::emit::SkipReason;
    use crate::generate::{SkipCause, WrittenUnit};
    use crate::registry::TypeHandle;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "operation"), "1 operation");
        assert_eq!(plural(0, "operation"), "0 operations");
        assert_eq!(plural(3, "operation"), "3 operations");
    }

    // =========================================================================
    // Generate events
    // =========================================================================

    #[test]
    fn format_category_started() {
        let event = GenerateEvent::CategoryStarted {
            category: Category::Foreign(ForeignFormat::Jpeg),
        };
        assert_eq!(format_generate_event(&event), vec!["Foreign_JPEG"]);
    }

    #[test]
    fn format_category_written() {
        let event = GenerateEvent::CategoryWritten {
            category: Category::Misc,
            count: 3,
            path: PathBuf::from("gen/misc.rs"),
            unchanged: false,
        };
        assert_eq!(
            format_generate_event(&event),
            vec!["    3 operations \u{2192} gen/misc.rs"]
        );
    }

    #[test]
    fn format_category_unchanged() {
        let event = GenerateEvent::CategoryWritten {
            category: Category::Create,
            count: 1,
            path: PathBuf::from("gen/create.rs"),
            unchanged: true,
        };
        assert_eq!(
            format_generate_event(&event),
            vec!["    1 operation \u{2192} gen/create.rs (unchanged)"]
        );
    }

    #[test]
    fn format_category_empty_with_removal() {
        let event = GenerateEvent::CategoryEmpty {
            category: Category::Draw,
            removed: true,
        };
        assert_eq!(
            format_generate_event(&event),
            vec!["    no operations", "    removed stale draw.rs"]
        );
    }

    #[test]
    fn format_operation_skipped() {
        let event = GenerateEvent::OperationSkipped {
            nickname: "draw_rect".to_string(),
            cause: SkipCause::Emit(SkipReason::NoOutputs),
        };
        assert_eq!(
            format_generate_event(&event),
            vec!["    skipped draw_rect: has no outputs and does not save"]
        );
    }

    #[test]
    fn summary_ends_with_banner() {
        let summary = GenerateSummary {
            written: vec![
                WrittenUnit {
                    category: Category::Misc,
                    count: 3,
                    path: PathBuf::from("gen/misc.rs"),
                    unchanged: false,
                },
                WrittenUnit {
                    category: Category::Create,
                    count: 1,
                    path: PathBuf::from("gen/create.rs"),
                    unchanged: true,
                },
            ],
            empty: vec![Category::Draw],
            pruned: vec![PathBuf::from("gen/colour.rs")],
            categories: 3,
        };
        assert_eq!(
            format_generate_summary(&summary),
            vec![
                "Pruned gen/colour.rs",
                "Generated 4 operations in 2 of 3 categories",
                "Generation complete!",
            ]
        );
    }

    #[test]
    fn summary_of_empty_run() {
        let lines = format_generate_summary(&GenerateSummary::default());
        assert_eq!(lines[0], "Generated 0 operations in 0 of 0 categories");
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn check_report_clean() {
        let lines = format_check_report(&CheckReport::default(), Path::new("gen"));
        assert_eq!(lines, vec!["gen is up to date"]);
    }

    #[test]
    fn check_report_lists_drift() {
        let report = CheckReport {
            missing: vec!["create.rs".to_string()],
            stale: vec!["misc.rs".to_string()],
            extraneous: vec!["colour.rs".to_string()],
        };
        assert_eq!(
            format_check_report(&report, Path::new("gen")),
            vec![
                "Missing: gen/create.rs",
                "Stale: gen/misc.rs",
                "Extraneous: gen/colour.rs",
                "gen is out of date; run `vips-codegen generate`",
            ]
        );
    }

    // =========================================================================
    // List
    // =========================================================================

    #[test]
    fn operation_list_marks_class_list_finds() {
        let types = vec![
            OperationType {
                handle: TypeHandle(3),
                nickname: "jpegload".to_string(),
                source: DiscoverySource::SubtypeWalk,
            },
            OperationType {
                handle: TypeHandle(9),
                nickname: "invert".to_string(),
                source: DiscoverySource::ClassList,
            },
        ];
        assert_eq!(
            format_operation_list(&types),
            vec![
                "001 jpegload [Foreign_JPEG]",
                "002 invert [Misc] (class list)",
                "Discovered 2 operations: 1 by subtype walk, 1 by class list",
            ]
        );
    }
}
