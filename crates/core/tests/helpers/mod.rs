//! Test harness for stub generation integration tests.
//!
//! Copies a fixture directory of reflection dumps into a temp dir, loads `.docstub.toml` from it
//! the way the CLI does, and runs generation through `JsonDirLoader`.

#![allow(dead_code)]

pub mod fixtures;

use docstub_core::{
    generate_for, generate_stub, load_config, JsonDirLoader, ModuleLoader, ModuleObject, StubConfig,
    StubOutput,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct StubHarness {
    pub config: StubConfig,
    /// Module names of the dumps in the fixture.
    pub modules: Vec<String>,
    temp_dir: TempDir,
}

impl StubHarness {
    /// Create a harness from a named fixture directory under `tests/fixtures`.
    pub fn from_fixture(name: &str) -> Self {
        let fixture_src = fixtures::fixture_dir(name);
        assert!(fixture_src.exists(), "Fixture '{name}' not found at {}", fixture_src.display());

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let modules = fixtures::copy_fixture(&fixture_src, temp_dir.path());
        let config = load_config(temp_dir.path());

        StubHarness { config, modules, temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `.docstub.toml` into the fixture copy and reload the config.
    pub fn with_config(mut self, content: &str) -> Self {
        std::fs::write(self.root().join(docstub_core::config::CONFIG_FILE), content)
            .expect("Failed to write config");
        self.config = load_config(self.root());
        self
    }

    pub fn loader(&self) -> JsonDirLoader {
        JsonDirLoader::new(self.root())
    }

    pub fn load(&self, module: &str) -> ModuleObject {
        self.loader().load(module).unwrap_or_else(|e| panic!("Failed to load {module}: {e}"))
    }

    pub fn generate(&self, module: &str) -> docstub_core::Result<StubOutput> {
        generate_stub(&self.load(module), &self.config.profile)
    }

    pub fn generate_formatted(&self, module: &str, filename: &str) -> docstub_core::Result<StubOutput> {
        generate_for(&self.loader(), module, &self.config, Some(filename))
    }

    /// Path inside the temp dir for writing outputs.
    pub fn out_path(&self, name: &str) -> PathBuf {
        self.root().join("out").join(name)
    }
}
