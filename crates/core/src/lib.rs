//! docstub: declaration-only `.pyi` stubs from a reflected extension module.
//!
//! Types come from the runtime signature when it has them and otherwise from `:type`/`:rtype:`
//! directive lines in the documentation of callables and data accessors.
//!
//! # Modules
//!
//! - [`typeexpr`]: Documentation type-expression parser
//! - [`docstring`]: Splits descriptions from directive lines
//! - [`signature`]: Runtime parameters plus documentation to callable declarations
//! - [`classify`]: Member classification at class and module scope
//! - [`assemble`]: Class and module declaration assembly
//! - [`stubs`]: Stub source emission
//! - [`format`]: Optional external formatter pass
//! - [`reflect`]: Reflection schema and module loaders
//! - [`config`]: `.docstub.toml` and the host profile
//! - [`types`]: Declaration tree shared across the crate
//! - [`error`]: Error taxonomy

pub mod assemble;
pub mod classify;
pub mod config;
pub mod docstring;
pub mod error;
pub mod format;
pub mod reflect;
pub mod signature;
pub mod stubs;
pub mod typeexpr;
pub mod types;

use std::path::Path;
use std::time::Instant;

use tracing::info;

pub use config::{load_config, load_config_file, HostProfile, StubConfig};
pub use error::{Result, StubError};
pub use reflect::{JsonDirLoader, ModuleLoader, ModuleObject};

/// Generated stub text plus the non-fatal problems met while building it.
#[derive(Debug)]
pub struct StubOutput {
    pub text: String,
    pub warnings: Vec<StubError>,
}

/// Build the stub for a reflected module.
pub fn generate_stub(module: &ModuleObject, profile: &HostProfile) -> Result<StubOutput> {
    let start = Instant::now();
    let assembled = assemble::assemble_module(module, profile)?;
    let text = stubs::render_module(&assembled.module);
    info!(
        module = %module.name,
        classes = assembled.module.classes.len(),
        functions = assembled.module.functions.len(),
        warnings = assembled.warnings.len(),
        "Generated stub in {:.1}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(StubOutput { text, warnings: assembled.warnings })
}

/// Load `name` through `loader` and build its stub, running the formatter when `format_as` names
/// the output file.
pub fn generate_for(
    loader: &dyn ModuleLoader,
    name: &str,
    config: &StubConfig,
    format_as: Option<&str>,
) -> Result<StubOutput> {
    let module = loader.load(name)?;
    let mut output = generate_stub(&module, &config.profile)?;
    if let Some(filename) = format_as {
        output.text = format::format_stub(&output.text, filename, &config.formatter)?;
    }
    Ok(output)
}

/// Write a finished stub, creating parent directories as needed.
pub fn write_stub_file(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|source| StubError::Io { path: parent.to_path_buf(), source })?;
    }
    std::fs::write(path, text).map_err(|source| StubError::Io { path: path.to_path_buf(), source })
}
