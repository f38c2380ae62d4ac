//! Reflection schema and module loading.
//!
//! The core never inspects live objects. A host-side dumper describes a module as a tree of
//! [`Member`]s whose values are already classified into a closed set of [`Object`] variants, and
//! a [`ModuleLoader`] hands that description to the stub builder.
//!
//! Member lists follow `dir()` semantics: a class lists every member visible on it, inherited
//! ones included, so that inherited members can be recognized by comparing against the bases.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, StubError};
use crate::types::ParameterKind;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// One parameter of a runtime signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeParameter {
    pub name: String,
    pub kind: ParameterKind,
    /// Representation of the default value, absent when the parameter has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl RuntimeParameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self { name: name.into(), kind, default: None }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A named member of a module or class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub value: Object,
}

/// What a member value is, decided once by the dumper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Object {
    Routine(Routine),
    DataDescriptor(DataDescriptor),
    Class(ClassObject),
    #[serde(rename = "value")]
    Plain(PlainValue),
}

/// A function or method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    /// Implemented natively (`builtin_function_or_method`, method descriptors).
    #[serde(default)]
    pub builtin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// `None` when the host could not introspect a signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<RuntimeParameter>>,
}

/// An attribute implemented with get/set hooks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// Any other value. The representation is informational only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlainValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassObject {
    pub name: String,
    pub module: String,
    #[serde(default)]
    pub qualname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Declared bases, in order.
    #[serde(default)]
    pub bases: Vec<ClassObject>,
    #[serde(default)]
    pub members: Vec<Member>,
    /// The class derives from the host's enumeration base.
    #[serde(default)]
    pub is_enum: bool,
    /// Constructor signature as seen by calling the class, when introspectable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<RuntimeParameter>>,
}

impl ClassObject {
    /// Qualified name, defaulting to the plain name when the dump omits it.
    pub fn qualname(&self) -> &str {
        if self.qualname.is_empty() {
            &self.name
        } else {
            &self.qualname
        }
    }

    /// The universal base type.
    pub fn is_object(&self) -> bool {
        self.module == "builtins" && self.qualname() == "object"
    }

    /// `module.QualName` as referenced from a stub.
    pub fn reference(&self) -> String {
        format!("{}.{}", self.module, self.qualname())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleObject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
    /// Members of the universal base type on the host that produced the dump.
    #[serde(default)]
    pub object_members: Vec<Member>,
}

impl ModuleObject {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Members ordered by name, the order the stub is emitted in.
pub fn sorted_members(members: &[Member]) -> Vec<&Member> {
    let mut sorted: Vec<&Member> = members.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Produces the reflection description of a module by name.
pub trait ModuleLoader {
    fn load(&self, name: &str) -> Result<ModuleObject>;
}

/// Loads `<dir>/<module>.json` dumps.
#[derive(Debug, Clone)]
pub struct JsonDirLoader {
    dir: PathBuf,
}

impl JsonDirLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl ModuleLoader for JsonDirLoader {
    fn load(&self, name: &str) -> Result<ModuleObject> {
        let path = self.path_for(name);
        debug!(module = name, path = %path.display(), "Loading reflection dump");
        let content = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StubError::ModuleNotFound { name: name.to_string(), path: path.clone() }
            } else {
                StubError::Io { path: path.clone(), source: e }
            }
        })?;
        ModuleObject::from_json(&content).map_err(|source| StubError::Schema { path, source })
    }
}

/// Read a dump from an explicit file path.
pub fn load_module_file(path: &Path) -> Result<ModuleObject> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| StubError::Io { path: path.to_path_buf(), source })?;
    ModuleObject::from_json(&content)
        .map_err(|source| StubError::Schema { path: path.to_path_buf(), source })
}
