//! docstub CLI: write a `.pyi` stub for a reflected module.
//!
//! Reads `<schema-dir>/<module>.json`, a reflection dump produced on the host side, and calls
//! `docstub-core` directly.

use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use docstub_core::{
    generate_for, load_config, load_config_file, write_stub_file, JsonDirLoader, Result, StubConfig,
    StubError,
};

/// docstub: extract a Python type stub from a reflected module.
#[derive(Parser)]
#[command(name = "docstub", version, about)]
struct Cli {
    /// Name of the module to generate a stub for
    module_name: String,

    /// Stub file to write to (`-` for stdout)
    out: PathBuf,

    /// Format the stub with the configured formatter (black by default)
    #[arg(long)]
    black: bool,

    /// Directory holding `<module>.json` reflection dumps
    #[arg(long, default_value = ".")]
    schema_dir: PathBuf,

    /// Config file (default: `.docstub.toml` in the current directory, if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn run(cli: &Cli) -> Result<()> {
    let config: StubConfig = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => load_config(Path::new(".")),
    };

    debug!(module = %cli.module_name, schema_dir = %cli.schema_dir.display(), "Generating stub");
    let loader = JsonDirLoader::new(&cli.schema_dir);
    let out_name = cli.out.to_string_lossy();
    let format_as = cli.black.then_some(&*out_name);
    let output = generate_for(&loader, &cli.module_name, &config, format_as)?;

    if !output.warnings.is_empty() {
        eprintln!("{} member(s) skipped, see warnings above", output.warnings.len());
    }

    if cli.out.as_os_str() == "-" {
        std::io::stdout()
            .write_all(output.text.as_bytes())
            .map_err(|source| StubError::Io { path: cli.out.clone(), source })?;
        return Ok(());
    }
    write_stub_file(&cli.out, &output.text)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("docstub=warn".parse().unwrap()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
