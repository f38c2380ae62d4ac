//! `.docstub.toml` loading and the host profile.
//!
//! The host profile is the table of base-object members the classifier consults: names that are
//! never emitted, members of the universal base type, and the members every enumeration class
//! gets for free.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, StubError};
use crate::reflect::{Member, Object};

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".docstub.toml";

/// Version tag of the built-in profile.
pub const CPYTHON_PROFILE: &str = "cpython-3";

/// Placeholder replaced by the output file name in formatter arguments.
pub const FILENAME_PLACEHOLDER: &str = "{filename}";

const DEFAULT_BLACKLIST: &[&str] = &[
    "__class__",
    "__dir__",
    "__doc__",
    "__init_subclass__",
    "__module__",
    "__new__",
    "__subclasshook__",
    "__hash__",
    "__lt__",
    "__le__",
    "__gt__",
    "__ge__",
    "__eq__",
    "__ne__",
    "__int__",
    "__repr__",
];

const ENUM_SYNTHETIC_MEMBERS: &[&str] = &["__getitem__", "__members__", "__qualname__", "__name__"];

// ---------------------------------------------------------------------------
// Host profile
// ---------------------------------------------------------------------------

/// Versioned table of well-known base-object members for one host runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct HostProfile {
    pub version: String,
    /// Names never emitted at class scope.
    pub blacklist: BTreeSet<String>,
    /// Names treated as inherited on enumeration classes.
    pub enum_synthetic_members: BTreeSet<String>,
    /// Members of the universal base type, by name.
    pub object_members: BTreeMap<String, Object>,
}

impl HostProfile {
    pub fn cpython() -> Self {
        Self {
            version: CPYTHON_PROFILE.to_string(),
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            enum_synthetic_members: ENUM_SYNTHETIC_MEMBERS.iter().map(|s| s.to_string()).collect(),
            object_members: BTreeMap::new(),
        }
    }

    /// Add base-object members captured alongside a module dump. Entries already present win.
    pub fn with_object_members(mut self, members: &[Member]) -> Self {
        for m in members {
            self.object_members.entry(m.name.clone()).or_insert_with(|| m.value.clone());
        }
        self
    }

    pub fn is_blacklisted(&self, name: &str) -> bool {
        self.blacklist.contains(name)
    }

    /// The member is the base object's own member of the same name.
    pub fn is_object_member(&self, name: &str, value: &Object) -> bool {
        self.object_members.get(name) == Some(value)
    }
}

impl Default for HostProfile {
    fn default() -> Self {
        Self::cpython()
    }
}

// ---------------------------------------------------------------------------
// Formatter and full config
// ---------------------------------------------------------------------------

/// External formatter command: program followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterConfig {
    pub command: Vec<String>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            command: ["python3", "-m", "black", "-t", "py311", "--pyi", "--stdin-filename"]
                .iter()
                .map(|s| s.to_string())
                .chain([FILENAME_PLACEHOLDER.to_string(), "-".to_string()])
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StubConfig {
    pub profile: HostProfile,
    pub formatter: FormatterConfig,
}

/// Known keys in `.docstub.toml` for config validation.
const KNOWN_CONFIG_KEYS: &[&str] =
    &["formatter", "blacklist", "enum_synthetic_members", "profile_version"];

/// Simple Levenshtein edit distance for typo suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn string_array(table: &toml::Table, key: &str, path: &Path) -> Result<Option<Vec<String>>> {
    let Some(value) = table.get(key) else {
        return Ok(None);
    };
    let items = value.as_array().ok_or_else(|| StubError::Config {
        path: path.to_path_buf(),
        reason: format!("'{key}' must be an array of strings"),
    })?;
    items
        .iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| StubError::Config {
                path: path.to_path_buf(),
                reason: format!("'{key}' must be an array of strings"),
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn apply_table(config: &mut StubConfig, table: &toml::Table, path: &Path) -> Result<()> {
    // Validate keys, warn on unknown
    for key in table.keys() {
        if KNOWN_CONFIG_KEYS.contains(&key.as_str()) {
            continue;
        }
        let suggestion = KNOWN_CONFIG_KEYS
            .iter()
            .min_by_key(|k| edit_distance(key, k))
            .copied()
            .unwrap_or_default();
        if edit_distance(key, suggestion) <= 3 {
            warn!(key = key.as_str(), suggestion, "Unknown key in {CONFIG_FILE}, did you mean '{suggestion}'?");
        } else {
            warn!(
                key = key.as_str(),
                "Unknown key in {CONFIG_FILE} (known keys: {})",
                KNOWN_CONFIG_KEYS.join(", ")
            );
        }
    }

    if let Some(command) = string_array(table, "formatter", path)? {
        if command.is_empty() {
            return Err(StubError::Config {
                path: path.to_path_buf(),
                reason: "'formatter' needs at least a program name".to_string(),
            });
        }
        config.formatter.command = command;
    }

    // blacklist / enum_synthetic_members merge with defaults
    if let Some(names) = string_array(table, "blacklist", path)? {
        config.profile.blacklist.extend(names);
    }
    if let Some(names) = string_array(table, "enum_synthetic_members", path)? {
        config.profile.enum_synthetic_members.extend(names);
    }

    if let Some(value) = table.get("profile_version") {
        let version = value.as_str().ok_or_else(|| StubError::Config {
            path: path.to_path_buf(),
            reason: "'profile_version' must be a string".to_string(),
        })?;
        config.profile.version = version.to_string();
    }
    Ok(())
}

/// Load an explicitly requested config file. Any problem is an error.
pub fn load_config_file(path: &Path) -> Result<StubConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| StubError::Io { path: path.to_path_buf(), source })?;
    let table: toml::Table = content.parse().map_err(|e: toml::de::Error| StubError::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut config = StubConfig::default();
    apply_table(&mut config, &table, path)?;
    Ok(config)
}

/// Load `.docstub.toml` from `dir` if there is one.
///
/// A missing file gives the defaults. An unreadable or invalid file is logged and also gives the
/// defaults, since nobody asked for it explicitly.
pub fn load_config(dir: &Path) -> StubConfig {
    let path: PathBuf = dir.join(CONFIG_FILE);
    if !path.exists() {
        return StubConfig::default();
    }
    debug!(path = %path.display(), "Loading {CONFIG_FILE}");
    match load_config_file(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Ignoring {CONFIG_FILE}");
            StubConfig::default()
        }
    }
}
