//! Declaration assembly: classified members become class and module declarations.

use tracing::{debug, warn};

use crate::classify::{classify_class_member, classify_module_member, ClassMember, Inherited, ModuleMember};
use crate::config::HostProfile;
use crate::docstring::{clean_doc, description};
use crate::error::{Result, StubError};
use crate::reflect::{sorted_members, ClassObject, ModuleObject, Routine};
use crate::signature::{build_accessor, build_callable, generic_parameters, CallableKind};
use crate::types::{AttributeDecl, CallableDecl, ClassDecl, ModuleDecl, Namespaces, Resolved};

/// Namespace every stub imports.
pub const TYPING: &str = "typing";

/// A module declaration plus the non-fatal problems met while building it.
#[derive(Debug)]
pub struct Assembled {
    pub module: ModuleDecl,
    pub warnings: Vec<StubError>,
}

/// Build the declaration of a whole module.
///
/// Fatal errors from any member abort the run. Unsupported top-level members are logged,
/// collected as warnings and left out.
pub fn assemble_module(module: &ModuleObject, profile: &HostProfile) -> Result<Assembled> {
    let profile = profile.clone().with_object_members(&module.object_members);
    let mut namespaces: Namespaces = [TYPING].into_iter().collect();
    let mut classes = Vec::new();
    let mut functions = Vec::new();
    let mut warnings = Vec::new();

    for member in sorted_members(&module.members) {
        match classify_module_member(member) {
            ModuleMember::Class(class) => {
                classes.push(assemble_class(&member.name, class, &profile)?.collect_into(&mut namespaces));
            }
            ModuleMember::Function(routine) => {
                functions.push(
                    build_routine(&member.name, routine, CallableKind::Function)?
                        .collect_into(&mut namespaces),
                );
            }
            ModuleMember::Unsupported => {
                warn!(module = %module.name, member = %member.name, "Unsupported root construct, skipping");
                warnings.push(StubError::UnsupportedRootConstruct { name: member.name.clone() });
            }
            ModuleMember::Skipped => {}
        }
    }

    debug!(
        module = %module.name,
        classes = classes.len(),
        functions = functions.len(),
        warnings = warnings.len(),
        "Assembled module"
    );

    Ok(Assembled {
        module: ModuleDecl { name: module.name.clone(), classes, functions, namespaces },
        warnings,
    })
}

/// Build one class declaration, suppressing what the bases already provide.
pub fn assemble_class(name: &str, class: &ClassObject, profile: &HostProfile) -> Result<Resolved<ClassDecl>> {
    let mut namespaces = Namespaces::new();

    let mut bases = Vec::new();
    for base in class.bases.iter().filter(|b| !b.is_object()) {
        namespaces.insert(base.module.clone());
        bases.push(base.reference());
    }

    let inherited = Inherited::for_class(class, profile);
    let mut constructor: Option<CallableDecl> = None;
    let mut attributes = Vec::new();
    let mut methods = Vec::new();
    let mut magic_methods = Vec::new();

    for member in sorted_members(&class.members) {
        let member_name = member.name.as_str();
        match classify_class_member(member, class, &inherited, profile) {
            ClassMember::Constructor(signature) => {
                if constructor.is_some() {
                    debug!(class = name, member = member_name, "Constructor already built, skipping");
                    continue;
                }
                let built = build_callable("__init__", signature, class.doc.as_deref(), CallableKind::Constructor)?;
                constructor = Some(built.collect_into(&mut namespaces));
            }
            ClassMember::Method(routine) => {
                methods.push(build_routine(member_name, routine, CallableKind::Method)?.collect_into(&mut namespaces));
            }
            ClassMember::MagicMethod(routine) => {
                magic_methods.push(
                    build_routine(member_name, routine, CallableKind::MagicMethod)?.collect_into(&mut namespaces),
                );
            }
            ClassMember::Accessor(descriptor) => {
                let accessor = build_accessor(member_name, descriptor.doc.as_deref())?;
                attributes.push(AttributeDecl::Accessor(accessor.collect_into(&mut namespaces)));
            }
            ClassMember::Placeholder => {
                attributes.push(AttributeDecl::Placeholder { name: member_name.to_string() });
            }
            ClassMember::Skipped(reason) => {
                debug!(class = name, member = member_name, ?reason, "Skipping member");
            }
        }
    }

    let doc = class
        .doc
        .as_deref()
        .map(|d| description(&clean_doc(d)))
        .filter(|d| !d.is_empty());

    Ok(Resolved::new(
        ClassDecl {
            name: name.to_string(),
            bases,
            constructor,
            attributes,
            methods,
            magic_methods,
            doc,
        },
        namespaces,
    ))
}

/// Build a routine's declaration, falling back to a catch-all signature when none was
/// introspectable.
fn build_routine(name: &str, routine: &Routine, kind: CallableKind) -> Result<Resolved<CallableDecl>> {
    match routine.signature.as_deref() {
        Some(signature) => build_callable(name, signature, routine.doc.as_deref(), kind),
        None => {
            warn!(callable = name, "No signature available, using (*args, **kwargs)");
            build_callable(name, &generic_parameters(kind), routine.doc.as_deref(), kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{DataDescriptor, Member, Object, PlainValue, RuntimeParameter};
    use crate::types::{ParameterKind, TypeExpr};

    fn routine(doc: &str, signature: Vec<RuntimeParameter>) -> Object {
        Object::Routine(Routine { builtin: true, doc: Some(doc.to_string()), signature: Some(signature) })
    }

    fn member(name: &str, value: Object) -> Member {
        Member { name: name.to_string(), value }
    }

    fn self_param() -> RuntimeParameter {
        RuntimeParameter::new("self", ParameterKind::PositionalOnly)
    }

    fn class(name: &str, module: &str, members: Vec<Member>) -> ClassObject {
        ClassObject {
            name: name.to_string(),
            module: module.to_string(),
            qualname: String::new(),
            doc: None,
            bases: vec![],
            members,
            is_enum: false,
            signature: None,
        }
    }

    #[test]
    fn test_fully_inherited_class_has_empty_body() {
        let shared = vec![
            member("size", routine("Size.\n:rtype: int", vec![self_param()])),
            member("NAME", Object::Plain(PlainValue::default())),
        ];
        let mut child = class("Child", "m", shared.clone());
        child.bases.push(class("Base", "m", shared));

        let decl = assemble_class("Child", &child, &HostProfile::cpython()).unwrap();
        assert_eq!(decl.value.member_count(), 0);
        assert!(decl.value.is_empty_body());
        assert_eq!(decl.value.bases, vec!["m.Base".to_string()]);
        assert!(decl.namespaces.contains("m"));
    }

    #[test]
    fn test_object_base_is_dropped() {
        let mut c = class("C", "m", vec![]);
        c.bases.push(class("object", "builtins", vec![]));
        let decl = assemble_class("C", &c, &HostProfile::cpython()).unwrap();
        assert!(decl.value.bases.is_empty());
        assert!(!decl.namespaces.contains("builtins"));
    }

    #[test]
    fn test_class_members_are_sorted_into_sections() {
        let mut c = class(
            "Term",
            "m",
            vec![
                member("__init__", routine("", vec![])),
                member("__len__", routine("Length.\n:rtype: int", vec![self_param()])),
                member("value", Object::DataDescriptor(DataDescriptor { doc: Some(":rtype: str\n:return: the value".into()) })),
                member("ZERO", Object::Plain(PlainValue::default())),
                member("to_rdf", routine("Serialize.\n\n:rtype: rdf.Term", vec![self_param()])),
            ],
        );
        c.doc = Some("A term.\n\n:type value: str".to_string());
        c.signature = Some(vec![RuntimeParameter::new("value", ParameterKind::PositionalOrKeyword)]);

        let decl = assemble_class("Term", &c, &HostProfile::cpython()).unwrap();
        let class = decl.value;
        let ctor = class.constructor.as_ref().unwrap();
        assert_eq!(ctor.name, "__init__");
        assert_eq!(ctor.parameters[1].annotation, Some(TypeExpr::name("str")));
        let names: Vec<&str> = class.attributes.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["ZERO", "value"]);
        assert_eq!(class.methods[0].name, "to_rdf");
        assert_eq!(class.magic_methods[0].name, "__len__");
        assert_eq!(class.doc.as_deref(), Some("A term."));
        assert!(decl.namespaces.contains("rdf"));
    }

    #[test]
    fn test_unsupported_root_construct_warns_once() {
        let module = ModuleObject {
            name: "m".into(),
            doc: None,
            members: vec![
                member("ANSWER", Object::Plain(PlainValue { repr: Some("42".into()) })),
                member("parse", routine("Parse.\n:rtype: int", vec![])),
                member("__doc__", Object::Plain(PlainValue::default())),
            ],
            object_members: vec![],
        };
        let assembled = assemble_module(&module, &HostProfile::cpython()).unwrap();
        assert_eq!(assembled.warnings.len(), 1);
        match &assembled.warnings[0] {
            StubError::UnsupportedRootConstruct { name } => assert_eq!(name, "ANSWER"),
            other => panic!("expected UnsupportedRootConstruct, got {other:?}"),
        }
        assert_eq!(assembled.module.functions.len(), 1);
        assert!(assembled.module.namespaces.contains(TYPING));
    }

    #[test]
    fn test_member_error_aborts_module() {
        let module = ModuleObject {
            name: "m".into(),
            doc: None,
            members: vec![member(
                "f",
                routine(":type c: int", vec![RuntimeParameter::new("a", ParameterKind::PositionalOrKeyword)]),
            )],
            object_members: vec![],
        };
        let err = assemble_module(&module, &HostProfile::cpython()).unwrap_err();
        assert!(matches!(err, StubError::UnknownParameterInDoc { .. }), "got {err:?}");
    }

    #[test]
    fn test_missing_signature_falls_back() {
        let r = Routine { builtin: true, doc: None, signature: None };
        let decl = build_routine("run", &r, CallableKind::Method).unwrap().value;
        let names: Vec<&str> = decl.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["self", "args", "kwargs"]);
    }
}
