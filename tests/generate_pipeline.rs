//! End-to-end generation from the checked-in registry fixture.
//!
//! Run with: cargo test --test generate_pipeline

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use vips_codegen::category::Category;
use vips_codegen::config::CodegenConfig;
use vips_codegen::generate::{self, GenerateEvent, SkipCause};
use vips_codegen::registry::SnapshotRegistry;
use vips_codegen::walker::{self, DiscoverySource};

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/registry.json")
}

fn fixture() -> SnapshotRegistry {
    SnapshotRegistry::load(&fixture_path()).expect("fixture registry should load")
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

#[test]
fn fixture_discovers_every_concrete_operation() {
    let types = walker::list_operation_types(&fixture());
    let nicknames: Vec<&str> = types.iter().map(|t| t.nickname.as_str()).collect();
    assert_eq!(
        nicknames,
        vec![
            "add",
            "invert",
            "avg",
            "flip",
            "embed",
            "copy",
            "colourspace",
            "gaussblur",
            "black",
            "hist_find",
            "morph",
            "draw_rect",
            "jpegload",
            "matrixload",
            "jpegsave",
            "pngsave",
            "webpsave",
        ]
    );
    // The class list only names operations the walk already found.
    assert!(types.iter().all(|t| t.source == DiscoverySource::SubtypeWalk));
}

#[test]
fn generates_expected_file_set() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("generated");
    let summary =
        generate::generate_all(&fixture(), &CodegenConfig::default(), &out, None).unwrap();

    assert_eq!(
        file_names(&out),
        vec![
            "README.md",
            "arithmetic.rs",
            "colour.rs",
            "conversion.rs",
            "convolution.rs",
            "create.rs",
            "foreign.rs",
            "foreign_jpeg.rs",
            "foreign_png.rs",
            "foreign_webp.rs",
            "histogram.rs",
            "misc.rs",
            "mod.rs",
            "morphology.rs",
        ]
    );
    assert_eq!(summary.categories, Category::ALL.len());
    assert_eq!(summary.written.len(), 12);
    assert_eq!(summary.operation_count(), 16);
    assert!(summary.empty.contains(&Category::Draw));
    assert!(summary.pruned.is_empty());
}

#[test]
fn generated_units_carry_expected_wrappers() {
    let tmp = TempDir::new().unwrap();
    generate::generate_all(&fixture(), &CodegenConfig::default(), tmp.path(), None).unwrap();

    let misc = read(tmp.path(), "misc.rs");
    assert!(misc.starts_with("// Generated by vips-codegen. DO NOT EDIT.\n// Category: Misc\n"));
    assert!(misc.contains(
        "    /// invert an image
    pub fn invert(&self) -> Result<VipsImage> {
        let mut out = VipsImage::new();
        let mut opt = VOption::new();
        opt.set(\"in\", self);
        opt.set_out(\"out\", &mut out);
        call(\"invert\", opt)?;
        Ok(out)
    }
"
    ));
    // Scalar-only outputs still produce a callable wrapper.
    assert!(misc.contains("pub fn avg(&self) -> Result<()> {"));
    assert!(misc.contains(
        "pub fn copy(&self, width: Option<i32>, height: Option<i32>, interpretation: Option<Interpretation>) -> Result<VipsImage> {"
    ));

    let jpeg = read(tmp.path(), "foreign_jpeg.rs");
    assert!(jpeg.contains(
        "pub fn jpegsave(&self, filename: &str, quality: Option<i32>, keep: Option<ForeignKeep>, page_height: Option<i32>) -> Result<()> {"
    ));
    assert!(jpeg.contains("opt.set(\"page-height\", page_height);"));
    assert!(!jpeg.contains("strip"));
    assert!(jpeg.contains("pub fn jpegload(filename: &str, memory: Option<bool>, access: Option<Access>, shrink: Option<i32>, autorotate: Option<bool>) -> Result<VipsImage> {"));

    let create = read(tmp.path(), "create.rs");
    assert!(create.contains(
        "pub fn black(width: i32, height: i32, bands: Option<i32>) -> Result<VipsImage> {"
    ));

    let foreign = read(tmp.path(), "foreign.rs");
    assert!(foreign.contains("pub fn matrixload(filename: &str) -> Result<VipsImage> {"));
    assert!(!foreign.contains("jpegload"));

    let colour = read(tmp.path(), "colour.rs");
    assert!(colour.contains(
        "pub fn colourspace(&self, space: Interpretation, source_space: Option<Interpretation>) -> Result<VipsImage> {"
    ));

    let morphology = read(tmp.path(), "morphology.rs");
    assert!(morphology.contains(
        "pub fn morph(&self, mask: &VipsImage, morph: OperationMorphology) -> Result<VipsImage> {"
    ));
}

#[test]
fn mod_and_manifest_list_written_units() {
    let tmp = TempDir::new().unwrap();
    generate::generate_all(&fixture(), &CodegenConfig::default(), tmp.path(), None).unwrap();

    let module = read(tmp.path(), "mod.rs");
    assert!(module.contains("pub mod foreign_jpeg;\n"));
    assert!(module.contains("pub mod misc;\n"));
    assert!(!module.contains("pub mod draw;"));

    let manifest = read(tmp.path(), "README.md");
    assert!(manifest.contains("12 of 17 categories produced output."));
    let misc_digest = generate::sha256_hex(&read(tmp.path(), "misc.rs"));
    assert!(manifest.contains(&format!("| `misc.rs` | Misc | 3 | `{misc_digest}` |")));
}

#[test]
fn regeneration_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    let registry = fixture();
    let config = CodegenConfig::default();

    generate::generate_all(&registry, &config, tmp.path(), None).unwrap();
    let first: Vec<(String, String)> = file_names(tmp.path())
        .into_iter()
        .map(|n| {
            let contents = read(tmp.path(), &n);
            (n, contents)
        })
        .collect();

    let summary = generate::generate_all(&registry, &config, tmp.path(), None).unwrap();
    assert!(summary.written.iter().all(|u| u.unchanged));
    let second: Vec<(String, String)> = file_names(tmp.path())
        .into_iter()
        .map(|n| {
            let contents = read(tmp.path(), &n);
            (n, contents)
        })
        .collect();
    assert_eq!(first, second);
}

#[test]
fn check_tracks_drift() {
    let tmp = TempDir::new().unwrap();
    let registry = fixture();
    let config = CodegenConfig::default();

    let before = generate::check(&registry, &config, tmp.path()).unwrap();
    assert!(!before.is_clean());
    assert!(before.missing.contains(&"misc.rs".to_string()));

    generate::generate_all(&registry, &config, tmp.path(), None).unwrap();
    assert!(generate::check(&registry, &config, tmp.path()).unwrap().is_clean());

    fs::write(tmp.path().join("misc.rs"), "// Generated by vips-codegen. DO NOT EDIT.\n").unwrap();
    fs::write(
        tmp.path().join("tiff_legacy.rs"),
        "// Generated by vips-codegen. DO NOT EDIT.\n",
    )
    .unwrap();
    let report = generate::check(&registry, &config, tmp.path()).unwrap();
    assert_eq!(report.stale, vec!["misc.rs".to_string()]);
    assert_eq!(report.extraneous, vec!["tiff_legacy.rs".to_string()]);
}

#[test]
fn narrowing_categories_prunes_old_units() {
    let tmp = TempDir::new().unwrap();
    let registry = fixture();
    generate::generate_all(&registry, &CodegenConfig::default(), tmp.path(), None).unwrap();

    let config = CodegenConfig {
        categories: vec![Category::Arithmetic, Category::Misc],
        ..CodegenConfig::default()
    };
    let summary = generate::generate_all(&registry, &config, tmp.path(), None).unwrap();
    assert_eq!(summary.pruned.len(), 10);
    assert_eq!(
        file_names(tmp.path()),
        vec!["README.md", "arithmetic.rs", "misc.rs", "mod.rs"]
    );
}

#[test]
fn progress_reports_skipped_draw_operation() {
    let tmp = TempDir::new().unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    generate::generate_all(&fixture(), &CodegenConfig::default(), tmp.path(), Some(&tx)).unwrap();
    drop(tx);

    let skipped: Vec<(String, SkipCause)> = rx
        .into_iter()
        .filter_map(|e| match e {
            GenerateEvent::OperationSkipped { nickname, cause } => Some((nickname, cause)),
            _ => None,
        })
        .collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].0, "draw_rect");
    assert_eq!(
        skipped[0].1.to_string(),
        "has no outputs and does not save"
    );
}

// =========================================================================
// Binary
// =========================================================================

fn cli(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vips-codegen"));
    cmd.current_dir(cwd).arg("--registry").arg(fixture_path());
    cmd
}

#[test]
fn cli_generate_then_check() {
    let tmp = TempDir::new().unwrap();

    let generate = cli(tmp.path()).arg("generate").output().unwrap();
    assert!(generate.status.success());
    let stdout = String::from_utf8_lossy(&generate.stdout);
    assert!(stdout.contains("Generated 16 operations in 12 of 17 categories"));
    assert!(tmp.path().join("src/generated/misc.rs").is_file());

    let check = cli(tmp.path()).arg("check").output().unwrap();
    assert!(check.status.success());

    fs::remove_file(tmp.path().join("src/generated/misc.rs")).unwrap();
    let check = cli(tmp.path()).arg("check").output().unwrap();
    assert_eq!(check.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&check.stdout).contains("Missing: "));
}

#[cfg(not(feature = "libvips"))]
#[test]
fn cli_without_registry_points_at_libvips_feature() {
    let tmp = TempDir::new().unwrap();
    let result = Command::new(env!("CARGO_BIN_EXE_vips-codegen"))
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("--features libvips"));
    assert!(!tmp.path().join("src/generated").exists());
}

#[test]
fn cli_rejects_unknown_config_keys() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("codegen.toml"), "outptu_dir = \"gen\"\n").unwrap();
    let result = cli(tmp.path()).arg("generate").output().unwrap();
    assert!(!result.status.success());
}

#[test]
fn cli_snapshot_round_trips_fixture() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("captured/registry.json");
    let result = cli(tmp.path())
        .arg("snapshot")
        .arg("--out")
        .arg(&out)
        .output()
        .unwrap();
    assert!(result.status.success());

    let captured = SnapshotRegistry::load(&out).unwrap();
    let original = fixture();
    assert_eq!(
        walker::list_operation_types(&captured)
            .into_iter()
            .map(|t| t.nickname)
            .collect::<Vec<_>>(),
        walker::list_operation_types(&original)
            .into_iter()
            .map(|t| t.nickname)
            .collect::<Vec<_>>()
    );
}
