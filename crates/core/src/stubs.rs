// ---------------------------------------------------------------------------
// Stub emission: declaration tree to `.pyi` source
// ---------------------------------------------------------------------------

use std::fmt::Write;

use crate::types::{
    AccessorDecl, AttributeDecl, CallableDecl, ClassDecl, ModuleDecl, ParameterDecl, ParameterKind,
};

const INDENT: &str = "    ";

/// Serialize a module declaration. The same tree always gives the same bytes.
pub fn render_module(module: &ModuleDecl) -> String {
    let mut blocks: Vec<String> = Vec::with_capacity(1 + module.classes.len() + module.functions.len());

    let mut header = String::from("from __future__ import annotations");
    for namespace in module.namespaces.iter() {
        let _ = write!(header, "\nimport {namespace}");
    }
    blocks.push(header);

    blocks.extend(module.classes.iter().map(render_class));
    blocks.extend(module.functions.iter().map(|f| render_callable(f, "")));

    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

pub fn render_class(class: &ClassDecl) -> String {
    let mut out = String::from("@typing.final\n");
    if class.bases.is_empty() {
        let _ = write!(out, "class {}:", class.name);
    } else {
        let _ = write!(out, "class {}({}):", class.name, class.bases.join(", "));
    }

    if class.is_empty_body() {
        let _ = write!(out, "\n{INDENT}...");
        return out;
    }

    let mut body: Vec<String> = Vec::new();
    if let Some(doc) = &class.doc {
        body.push(render_docstring(doc, INDENT));
    }
    if let Some(ctor) = &class.constructor {
        body.push(render_callable(ctor, INDENT));
    }
    for attribute in &class.attributes {
        body.push(render_attribute(attribute, INDENT));
    }
    for method in class.methods.iter().chain(&class.magic_methods) {
        body.push(render_callable(method, INDENT));
    }

    for line in body {
        out.push('\n');
        out.push_str(&line);
    }
    out
}

fn render_attribute(attribute: &AttributeDecl, indent: &str) -> String {
    match attribute {
        AttributeDecl::Placeholder { name } => format!("{indent}{name} = ..."),
        AttributeDecl::Accessor(accessor) => render_accessor(accessor, indent),
    }
}

fn render_accessor(accessor: &AccessorDecl, indent: &str) -> String {
    let annotation = match &accessor.annotation {
        Some(t) => t.to_string(),
        None => "typing.Any".to_string(),
    };
    let mut out = format!("{indent}{}: {annotation}", accessor.name);
    if let Some(doc) = &accessor.doc {
        out.push('\n');
        out.push_str(&render_docstring(doc, indent));
    }
    out
}

// ---------------------------------------------------------------------------
// Callables
// ---------------------------------------------------------------------------

/// `def name(params) -> ret: ...`, or a docstring body when the callable has a description.
pub fn render_callable(callable: &CallableDecl, indent: &str) -> String {
    let mut out = format!("{indent}def {}({})", callable.name, render_parameters(&callable.parameters));
    if let Some(returns) = &callable.returns {
        let _ = write!(out, " -> {returns}");
    }
    match &callable.doc {
        Some(doc) => {
            out.push_str(":\n");
            out.push_str(&render_docstring(doc, &format!("{indent}{INDENT}")));
        }
        None => out.push_str(": ..."),
    }
    out
}

/// Parameter list with the `/` and `*` markers the kinds require. Defaults become `...`.
pub fn render_parameters(params: &[ParameterDecl]) -> String {
    let has_var_positional = params.iter().any(|p| p.kind == ParameterKind::VarPositional);
    let mut parts: Vec<String> = Vec::with_capacity(params.len() + 2);
    let mut previous: Option<ParameterKind> = None;

    for p in params {
        if previous == Some(ParameterKind::PositionalOnly) && p.kind != ParameterKind::PositionalOnly {
            parts.push("/".to_string());
        }
        if p.kind == ParameterKind::KeywordOnly
            && !has_var_positional
            && previous != Some(ParameterKind::KeywordOnly)
        {
            parts.push("*".to_string());
        }
        parts.push(render_parameter(p));
        previous = Some(p.kind);
    }
    if previous == Some(ParameterKind::PositionalOnly) {
        parts.push("/".to_string());
    }
    parts.join(", ")
}

fn render_parameter(p: &ParameterDecl) -> String {
    let prefix = match p.kind {
        ParameterKind::VarPositional => "*",
        ParameterKind::VarKeyword => "**",
        _ => "",
    };
    match (&p.annotation, p.has_default()) {
        (Some(t), true) => format!("{prefix}{}: {t} = ...", p.name),
        (Some(t), false) => format!("{prefix}{}: {t}", p.name),
        (None, true) => format!("{prefix}{}=...", p.name),
        (None, false) => format!("{prefix}{}", p.name),
    }
}

// ---------------------------------------------------------------------------
// Docstrings
// ---------------------------------------------------------------------------

/// Triple-quoted docstring at `indent`. Continuation lines are indented too, blank lines stay
/// empty.
pub fn render_docstring(doc: &str, indent: &str) -> String {
    let mut body = doc.replace('\\', "\\\\");
    let trailing_quote = body.ends_with('"');
    if trailing_quote {
        body.pop();
    }
    let mut escaped = body.replace("\"\"\"", "\\\"\\\"\\\"");
    if trailing_quote {
        escaped.push_str("\\\"");
    }

    let mut out = String::with_capacity(escaped.len() + indent.len() + 6);
    out.push_str(indent);
    out.push_str("\"\"\"");
    for (i, line) in escaped.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(indent);
            }
        }
        out.push_str(line);
    }
    out.push_str("\"\"\"");
    out
}
