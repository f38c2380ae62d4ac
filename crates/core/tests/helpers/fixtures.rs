//! Fixture directory utilities for integration tests.

use std::path::{Path, PathBuf};

/// `tests/fixtures/<name>` inside this crate.
pub fn fixture_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Copy a fixture tree into `dst` and return the module names of the `.json` dumps found at its
/// top level, sorted.
pub fn copy_fixture(src: &Path, dst: &Path) -> Vec<String> {
    std::fs::create_dir_all(dst).expect("Failed to create dir");
    let mut modules = Vec::new();
    for entry in std::fs::read_dir(src).expect("Failed to read fixture dir") {
        let path = entry.expect("Failed to read entry").path();
        let target = dst.join(path.file_name().expect("entry without a name"));
        if path.is_dir() {
            copy_fixture(&path, &target);
            continue;
        }
        std::fs::copy(&path, &target).expect("Failed to copy fixture file");
        if path.extension().is_some_and(|e| e == "json") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                modules.push(stem.to_string());
            }
        }
    }
    modules.sort();
    modules
}
