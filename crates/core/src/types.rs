//! Core types shared across docstub: type expressions, parameter and callable declarations,
//! class and module declarations, and the namespace set that travels with them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Namespaces (return-value accumulation of required imports)
// ---------------------------------------------------------------------------

/// Namespaces that must be imported for the dotted references used in a declaration.
///
/// Kept sorted so the emitted import block is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespaces(BTreeSet<String>);

impl Namespaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, namespace: impl Into<String>) {
        self.0.insert(namespace.into());
    }

    pub fn merge(&mut self, other: Namespaces) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.0.contains(namespace)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Namespaces {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Namespaces(iter.into_iter().map(Into::into).collect())
    }
}

/// A value together with the namespaces it requires.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub namespaces: Namespaces,
}

impl<T> Resolved<T> {
    pub fn new(value: T, namespaces: Namespaces) -> Self {
        Self { value, namespaces }
    }

    /// Wrap a value that needs no imports.
    pub fn bare(value: T) -> Self {
        Self { value, namespaces: Namespaces::new() }
    }

    /// Move the value out, merging its namespaces into `into`.
    pub fn collect_into(self, into: &mut Namespaces) -> T {
        into.merge(self.namespaces);
        self.value
    }
}

// ---------------------------------------------------------------------------
// Type expressions
// ---------------------------------------------------------------------------

/// The closed set of generic constructors accepted in documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generic {
    Iter,
    List,
    Tuple,
}

impl Generic {
    pub fn from_doc_name(name: &str) -> Option<Self> {
        match name {
            "iter" | "typing.Iterator" => Some(Generic::Iter),
            "list" => Some(Generic::List),
            "tuple" => Some(Generic::Tuple),
            _ => None,
        }
    }

    /// Constructor keyword as written in documentation.
    pub fn doc_name(&self) -> &'static str {
        match self {
            Generic::Iter => "iter",
            Generic::List => "list",
            Generic::Tuple => "tuple",
        }
    }

    /// Constructor as written in stub source.
    pub fn stub_name(&self) -> &'static str {
        match self {
            Generic::Iter => "typing.Iterator",
            Generic::List => "list",
            Generic::Tuple => "tuple",
        }
    }
}

/// Parsed type annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// Dotted reference such as `int` or `typing.Iterator`. Segments are never empty.
    Name(String),
    /// One of the recognized generic constructors applied to its arguments.
    Generic { ctor: Generic, args: Vec<TypeExpr> },
    /// Two or more alternatives.
    Union(Vec<TypeExpr>),
    /// `Base[A, B]` recovered by the fallback expression parser.
    Subscript { base: Box<TypeExpr>, args: Vec<TypeExpr> },
    /// Number, string or `...` recovered by the fallback expression parser.
    Literal(String),
}

impl TypeExpr {
    pub fn name(path: impl Into<String>) -> Self {
        TypeExpr::Name(path.into())
    }

    /// `typing.Any`, the annotation used when nothing can be inferred.
    pub fn any() -> Self {
        TypeExpr::Name("typing.Any".to_string())
    }
}

// ---------------------------------------------------------------------------
// Parameters and callables
// ---------------------------------------------------------------------------

/// Positional kind of a parameter. The declaration order is the order required in a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDecl {
    pub name: String,
    pub kind: ParameterKind,
    /// Runtime representation of the default. Only its presence reaches the stub.
    pub default: Option<String>,
    pub annotation: Option<TypeExpr>,
}

impl ParameterDecl {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallableDecl {
    pub name: String,
    pub parameters: Vec<ParameterDecl>,
    pub returns: Option<TypeExpr>,
    /// Docstring emitted as the body, already stripped of directive lines.
    pub doc: Option<String>,
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// A data accessor (get/set descriptor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorDecl {
    pub name: String,
    /// `None` is emitted as `typing.Any`.
    pub annotation: Option<TypeExpr>,
    /// The single `:return:` line of the accessor documentation.
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeDecl {
    Accessor(AccessorDecl),
    /// Plain class attribute, emitted as `NAME = ...`.
    Placeholder { name: String },
}

impl AttributeDecl {
    pub fn name(&self) -> &str {
        match self {
            AttributeDecl::Accessor(a) => &a.name,
            AttributeDecl::Placeholder { name } => name,
        }
    }
}

// ---------------------------------------------------------------------------
// Classes and modules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: String,
    /// Qualified `module.QualName` references, `object` excluded.
    pub bases: Vec<String>,
    pub constructor: Option<CallableDecl>,
    pub attributes: Vec<AttributeDecl>,
    pub methods: Vec<CallableDecl>,
    pub magic_methods: Vec<CallableDecl>,
    pub doc: Option<String>,
}

impl ClassDecl {
    pub fn member_count(&self) -> usize {
        self.constructor.iter().count()
            + self.attributes.len()
            + self.methods.len()
            + self.magic_methods.len()
    }

    /// True when the body has to be the `...` placeholder.
    pub fn is_empty_body(&self) -> bool {
        self.doc.is_none() && self.member_count() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDecl {
    pub name: String,
    pub classes: Vec<ClassDecl>,
    pub functions: Vec<CallableDecl>,
    pub namespaces: Namespaces,
}
