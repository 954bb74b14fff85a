use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use vips_codegen::config::{self, CodegenConfig};
use vips_codegen::registry::{self, Snapshot};
use vips_codegen::{generate, output, walker};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "vips-codegen")]
#[command(about = "Generate typed Rust wrappers for libvips operations")]
#[command(long_about = "\
Generate typed Rust wrappers for libvips operations

Reads the libvips operation registry, describes every operation and its
arguments, and writes one `impl VipsImage { .. }` unit per category:

  src/generated/
  ├── README.md          # Manifest with counts and SHA-256 digests
  ├── mod.rs
  ├── arithmetic.rs
  ├── foreign_jpeg.rs
  └── ...

The live registry needs a build with `--features libvips`. Without it,
every command needs `--registry` and reads a snapshot instead:

  vips-codegen snapshot --out registry.json    # libvips build, on a machine with libvips
  vips-codegen --registry registry.json        # default build, anywhere else

Run 'vips-codegen gen-config' to generate a documented codegen.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./codegen.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Registry snapshot to read instead of the live library
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Output directory (overrides `output_dir`)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate every configured category (default)
    Generate,
    /// Exit non-zero when the generated files are out of date
    Check,
    /// List discovered operations with their category
    List,
    /// Capture the registry as a JSON snapshot
    Snapshot {
        /// Snapshot file to write
        #[arg(long)]
        out: PathBuf,
    },
    /// Print a stock codegen.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .format_timestamp(None)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cli.command.as_ref().unwrap_or(&Command::Generate) {
        Command::Generate => {
            let config = config::load_config(cli.config.as_deref())?;
            let output_dir = resolve_output_dir(cli, &config);
            let registry = registry::open(cli.registry.as_deref())?;

            println!("==> Generating into {}", output_dir.display());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_generate_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = generate::generate_all(registry.as_ref(), &config, &output_dir, Some(&tx));
            drop(tx);
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            output::print_generate_summary(&result?);
        }
        Command::Check => {
            let config = config::load_config(cli.config.as_deref())?;
            let output_dir = resolve_output_dir(cli, &config);
            let registry = registry::open(cli.registry.as_deref())?;

            let report = generate::check(registry.as_ref(), &config, &output_dir)?;
            output::print_check_report(&report, &output_dir);
            if !report.is_clean() {
                return Ok(ExitCode::from(1));
            }
        }
        Command::List => {
            let registry = registry::open(cli.registry.as_deref())?;
            let types = walker::list_operation_types(registry.as_ref());
            output::print_operation_list(&types);
        }
        Command::Snapshot { out } => {
            let registry = registry::open(cli.registry.as_deref())?;
            let snapshot = Snapshot::capture(registry.as_ref());
            write_snapshot(&snapshot, out)?;
            println!(
                "Captured {} types and {} value types \u{2192} {}",
                snapshot.types.len(),
                snapshot.value_types.len(),
                out.display()
            );
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// `--output` wins over the configured `output_dir`.
fn resolve_output_dir(cli: &Cli, config: &CodegenConfig) -> PathBuf {
    cli.output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output_dir))
}

fn write_snapshot(snapshot: &Snapshot, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, snapshot.to_json()? + "\n")?;
    Ok(())
}
