//! Signature builder: runtime parameter metadata plus documentation directives become callable
//! and accessor declarations.

use std::collections::{BTreeMap, HashSet};

use crate::docstring::{self, clean_doc};
use crate::error::{Result, StubError};
use crate::reflect::RuntimeParameter;
use crate::typeexpr::parse_type;
use crate::types::{
    AccessorDecl, CallableDecl, Namespaces, ParameterDecl, ParameterKind, Resolved, TypeExpr,
};

/// Where a callable ends up in the stub. Decides docstring emission and the synthetic `self`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    Function,
    Method,
    MagicMethod,
    Constructor,
}

impl CallableKind {
    fn keeps_docstring(&self) -> bool {
        matches!(self, CallableKind::Function | CallableKind::Method)
    }
}

/// Check kind ordering, single variadics and unique names.
pub fn validate_parameters(callable: &str, params: &[RuntimeParameter]) -> Result<()> {
    let invalid = |reason: String| StubError::InvalidSignature {
        callable: callable.to_string(),
        reason,
    };

    let mut seen = HashSet::new();
    let mut last: Option<ParameterKind> = None;
    for p in params {
        if !seen.insert(p.name.as_str()) {
            return Err(invalid(format!("duplicate parameter {}", p.name)));
        }
        if let Some(prev) = last {
            if p.kind < prev {
                return Err(invalid(format!("parameter {} ({:?}) follows a {:?} parameter", p.name, p.kind, prev)));
            }
            if p.kind == prev && matches!(p.kind, ParameterKind::VarPositional | ParameterKind::VarKeyword) {
                return Err(invalid(format!("more than one {:?} parameter", p.kind)));
            }
        }
        last = Some(p.kind);
    }
    Ok(())
}

/// Build a callable declaration from its runtime parameters and raw documentation.
///
/// Every `:type` directive must name a real parameter. For constructors the documentation is
/// the class documentation, and a positional-only `self` is put in front unless the runtime
/// signature already starts with it.
pub fn build_callable(
    name: &str,
    params: &[RuntimeParameter],
    doc: Option<&str>,
    kind: CallableKind,
) -> Result<Resolved<CallableDecl>> {
    let mut real: Vec<RuntimeParameter> = Vec::with_capacity(params.len() + 1);
    if kind == CallableKind::Constructor && params.first().map(|p| p.name.as_str()) != Some("self") {
        real.push(RuntimeParameter::new("self", ParameterKind::PositionalOnly));
    }
    real.extend(params.iter().cloned());
    validate_parameters(name, &real)?;

    let doc = doc.map(clean_doc);
    let mut namespaces = Namespaces::new();
    let mut annotations: BTreeMap<String, TypeExpr> = BTreeMap::new();
    let mut returns = None;
    let mut description = None;

    if let Some(doc) = doc.as_deref() {
        let split = docstring::split_doc(doc)?;
        for directive in split.param_types {
            if !real.iter().any(|p| p.name == directive.name) {
                return Err(StubError::UnknownParameterInDoc {
                    callable: name.to_string(),
                    parameter: directive.name,
                });
            }
            let parsed = parse_type(&directive.expr)?;
            annotations.insert(directive.name, parsed.collect_into(&mut namespaces));
        }
        if let Some(rtype) = split.rtype {
            returns = Some(parse_type(&rtype)?.collect_into(&mut namespaces));
        }
        if kind.keeps_docstring() && !split.description.is_empty() {
            description = Some(split.description);
        }
    }

    let parameters = real
        .into_iter()
        .map(|p| ParameterDecl {
            annotation: annotations.remove(&p.name),
            name: p.name,
            kind: p.kind,
            default: p.default,
        })
        .collect();

    Ok(Resolved::new(
        CallableDecl { name: name.to_string(), parameters, returns, doc: description },
        namespaces,
    ))
}

/// Parameter list used when the host could not introspect a signature.
pub fn generic_parameters(kind: CallableKind) -> Vec<RuntimeParameter> {
    let mut params = Vec::with_capacity(3);
    if matches!(kind, CallableKind::Method | CallableKind::MagicMethod) {
        params.push(RuntimeParameter::new("self", ParameterKind::PositionalOnly));
    }
    params.push(RuntimeParameter::new("args", ParameterKind::VarPositional));
    params.push(RuntimeParameter::new("kwargs", ParameterKind::VarKeyword));
    params
}

/// Build an accessor declaration: the type comes from `:rtype:`, the description from the
/// single `:return:` line.
pub fn build_accessor(name: &str, doc: Option<&str>) -> Result<Resolved<AccessorDecl>> {
    let Some(doc) = doc.map(clean_doc) else {
        return Ok(Resolved::bare(AccessorDecl { name: name.to_string(), annotation: None, doc: None }));
    };

    let mut namespaces = Namespaces::new();
    let annotation = match docstring::rtype(&doc)? {
        Some(expr) => Some(parse_type(&expr)?.collect_into(&mut namespaces)),
        None => None,
    };
    let description = docstring::return_doc(&doc)?.filter(|d| !d.is_empty());

    Ok(Resolved::new(
        AccessorDecl { name: name.to_string(), annotation, doc: description },
        namespaces,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Generic;

    fn params(spec: &[(&str, ParameterKind)]) -> Vec<RuntimeParameter> {
        spec.iter().map(|(n, k)| RuntimeParameter::new(*n, *k)).collect()
    }

    #[test]
    fn test_unknown_parameter_in_doc() {
        let p = params(&[("a", ParameterKind::PositionalOrKeyword), ("b", ParameterKind::PositionalOrKeyword)]);
        let err = build_callable("f", &p, Some("Does f.\n\n:type c: int"), CallableKind::Function)
            .unwrap_err();
        match err {
            StubError::UnknownParameterInDoc { callable, parameter } => {
                assert_eq!(callable, "f");
                assert_eq!(parameter, "c");
            }
            other => panic!("expected UnknownParameterInDoc, got {other:?}"),
        }
    }

    #[test]
    fn test_annotations_and_return_type() {
        let p = vec![
            RuntimeParameter::new("input", ParameterKind::PositionalOnly),
            RuntimeParameter::new("format", ParameterKind::KeywordOnly).with_default("None"),
        ];
        let doc = "Parse it.\n\n:type input: str\n:type format: mime.Format or None\n:rtype: iter(Triple)";
        let built = build_callable("parse", &p, Some(doc), CallableKind::Function).unwrap();
        let decl = built.value;
        assert_eq!(decl.parameters[0].annotation, Some(TypeExpr::name("str")));
        assert_eq!(
            decl.parameters[1].annotation,
            Some(TypeExpr::Union(vec![TypeExpr::name("mime.Format"), TypeExpr::name("None")]))
        );
        assert!(decl.parameters[1].has_default());
        assert_eq!(
            decl.returns,
            Some(TypeExpr::Generic { ctor: Generic::Iter, args: vec![TypeExpr::name("Triple")] })
        );
        assert_eq!(decl.doc.as_deref(), Some("Parse it."));
        assert!(built.namespaces.contains("mime"));
        assert!(built.namespaces.contains("typing"));
    }

    #[test]
    fn test_missing_doc_leaves_return_unset() {
        let p = params(&[("x", ParameterKind::PositionalOrKeyword)]);
        let decl = build_callable("f", &p, None, CallableKind::Function).unwrap().value;
        assert_eq!(decl.returns, None);
        assert_eq!(decl.doc, None);
        assert_eq!(decl.parameters[0].annotation, None);
    }

    #[test]
    fn test_constructor_gets_self() {
        let p = params(&[("value", ParameterKind::PositionalOrKeyword)]);
        let decl = build_callable("__init__", &p, Some("A term.\n:type value: str"), CallableKind::Constructor)
            .unwrap()
            .value;
        assert_eq!(decl.parameters.len(), 2);
        assert_eq!(decl.parameters[0].name, "self");
        assert_eq!(decl.parameters[0].kind, ParameterKind::PositionalOnly);
        assert_eq!(decl.doc, None, "constructors carry no docstring");

        // not duplicated when already reported
        let p = params(&[("self", ParameterKind::PositionalOnly), ("value", ParameterKind::PositionalOrKeyword)]);
        let decl = build_callable("__init__", &p, None, CallableKind::Constructor).unwrap().value;
        assert_eq!(decl.parameters.len(), 2);
    }

    #[test]
    fn test_self_may_be_documented_on_constructor() {
        let p = params(&[("value", ParameterKind::PositionalOrKeyword)]);
        assert!(build_callable("__init__", &p, Some(":type self: T"), CallableKind::Constructor).is_ok());
    }

    #[test]
    fn test_magic_methods_drop_docstring() {
        let p = params(&[("self", ParameterKind::PositionalOnly)]);
        let decl = build_callable("__len__", &p, Some("Length.\n:rtype: int"), CallableKind::MagicMethod)
            .unwrap()
            .value;
        assert_eq!(decl.doc, None);
        assert_eq!(decl.returns, Some(TypeExpr::name("int")));
    }

    #[test]
    fn test_directive_only_doc_has_no_description() {
        let p = params(&[("x", ParameterKind::PositionalOrKeyword)]);
        let decl = build_callable("f", &p, Some(":type x: int"), CallableKind::Function).unwrap().value;
        assert_eq!(decl.doc, None);
    }

    #[test]
    fn test_malformed_type_propagates() {
        let p = params(&[("x", ParameterKind::PositionalOrKeyword)]);
        let err = build_callable("f", &p, Some(":type x: list()"), CallableKind::Function).unwrap_err();
        assert!(matches!(err, StubError::MalformedTypeExpression { .. }), "got {err:?}");
    }

    #[test]
    fn test_validate_parameters() {
        use ParameterKind::*;
        assert!(validate_parameters("f", &params(&[("a", PositionalOnly), ("b", PositionalOrKeyword), ("c", VarPositional), ("d", KeywordOnly), ("e", VarKeyword)])).is_ok());
        assert!(validate_parameters("f", &params(&[("a", KeywordOnly), ("b", PositionalOrKeyword)])).is_err());
        assert!(validate_parameters("f", &params(&[("a", VarPositional), ("b", VarPositional)])).is_err());
        assert!(validate_parameters("f", &params(&[("a", PositionalOnly), ("a", KeywordOnly)])).is_err());
    }

    #[test]
    fn test_accessor_type_and_description() {
        let built = build_accessor("value", Some("The value.\n\n:rtype: xsd.String\n:return: the lexical form")).unwrap();
        assert_eq!(built.value.annotation, Some(TypeExpr::name("xsd.String")));
        assert_eq!(built.value.doc.as_deref(), Some("the lexical form"));
        assert!(built.namespaces.contains("xsd"));

        let bare = build_accessor("x", None).unwrap().value;
        assert_eq!(bare.annotation, None);
        assert_eq!(bare.doc, None);
    }

    #[test]
    fn test_accessor_with_two_return_lines_fails() {
        let err = build_accessor("x", Some(":return: a\n:return: b")).unwrap_err();
        assert!(matches!(err, StubError::AmbiguousReturnDoc { count: 2, .. }));
    }

    #[test]
    fn test_generic_parameters() {
        let p = generic_parameters(CallableKind::Method);
        let names: Vec<&str> = p.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["self", "args", "kwargs"]);
        assert_eq!(generic_parameters(CallableKind::Function).len(), 2);
    }
}
