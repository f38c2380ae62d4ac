//! Member classification for class and module scope.
//!
//! Every member lands in exactly one outcome. Rules are applied in priority order; the first one
//! that matches wins.

use std::collections::BTreeSet;

use crate::config::HostProfile;
use crate::reflect::{ClassObject, DataDescriptor, Member, Object, Routine, RuntimeParameter};

/// `__name`-style members.
pub fn is_dunder(name: &str) -> bool {
    name.starts_with("__")
}

/// Why a member is left out of the stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Same name and value as a base member, or an enumeration synthetic member.
    Inherited,
    /// `__init__`/`__new__` on a class whose constructor signature is not introspectable.
    NoConstructorSignature,
    Blacklisted,
    /// Identical to the universal base object's member.
    ObjectMember,
    /// Dunder-named non-routine.
    DunderValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassMember<'a> {
    /// Carries the class's call signature.
    Constructor(&'a [RuntimeParameter]),
    Method(&'a Routine),
    MagicMethod(&'a Routine),
    Accessor(&'a DataDescriptor),
    /// Plain value, emitted as `NAME = ...`.
    Placeholder,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModuleMember<'a> {
    Class(&'a ClassObject),
    Function(&'a Routine),
    /// Neither a class nor a builtin routine. Reported as a warning.
    Unsupported,
    /// Dunder-named.
    Skipped,
}

/// Members a class already gets from its bases.
#[derive(Debug, Default)]
pub struct Inherited<'a> {
    members: Vec<&'a Member>,
    synthetic: BTreeSet<&'a str>,
}

impl<'a> Inherited<'a> {
    /// Union of every declared base's members, plus the profile's synthetic names for
    /// enumerations.
    pub fn for_class(class: &'a ClassObject, profile: &'a HostProfile) -> Self {
        let members = class.bases.iter().flat_map(|base| base.members.iter()).collect();
        let synthetic = if class.is_enum {
            profile.enum_synthetic_members.iter().map(String::as_str).collect()
        } else {
            BTreeSet::new()
        };
        Self { members, synthetic }
    }

    pub fn contains(&self, member: &Member) -> bool {
        self.synthetic.contains(member.name.as_str())
            || self.members.iter().any(|m| m.name == member.name && m.value == member.value)
    }
}

pub fn classify_class_member<'a>(
    member: &'a Member,
    class: &'a ClassObject,
    inherited: &Inherited<'_>,
    profile: &HostProfile,
) -> ClassMember<'a> {
    let name = member.name.as_str();

    if inherited.contains(member) {
        return ClassMember::Skipped(SkipReason::Inherited);
    }

    if name == "__init__" || name == "__new__" {
        return match class.signature.as_deref() {
            Some(signature) => ClassMember::Constructor(signature),
            None => ClassMember::Skipped(SkipReason::NoConstructorSignature),
        };
    }

    if profile.is_blacklisted(name) {
        return ClassMember::Skipped(SkipReason::Blacklisted);
    }
    if profile.is_object_member(name, &member.value) {
        return ClassMember::Skipped(SkipReason::ObjectMember);
    }

    match &member.value {
        Object::Routine(routine) if is_dunder(name) => ClassMember::MagicMethod(routine),
        Object::Routine(routine) => ClassMember::Method(routine),
        _ if is_dunder(name) => ClassMember::Skipped(SkipReason::DunderValue),
        Object::DataDescriptor(descriptor) => ClassMember::Accessor(descriptor),
        Object::Class(_) | Object::Plain(_) => ClassMember::Placeholder,
    }
}

pub fn classify_module_member(member: &Member) -> ModuleMember<'_> {
    if is_dunder(&member.name) {
        return ModuleMember::Skipped;
    }
    match &member.value {
        Object::Class(class) => ModuleMember::Class(class),
        Object::Routine(routine) if routine.builtin => ModuleMember::Function(routine),
        Object::Routine(_) | Object::DataDescriptor(_) | Object::Plain(_) => {
            ModuleMember::Unsupported
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::PlainValue;
    use crate::types::ParameterKind;

    fn routine(doc: &str) -> Object {
        Object::Routine(Routine { builtin: true, doc: Some(doc.to_string()), signature: Some(vec![]) })
    }

    fn member(name: &str, value: Object) -> Member {
        Member { name: name.to_string(), value }
    }

    fn class(name: &str, members: Vec<Member>) -> ClassObject {
        ClassObject {
            name: name.to_string(),
            module: "m".to_string(),
            qualname: String::new(),
            doc: None,
            bases: vec![],
            members,
            is_enum: false,
            signature: None,
        }
    }

    fn classify<'a>(m: &'a Member, c: &'a ClassObject, profile: &'a HostProfile) -> ClassMember<'a> {
        let inherited = Inherited::for_class(c, profile);
        classify_class_member(m, c, &inherited, profile)
    }

    #[test]
    fn test_identical_base_member_is_inherited() {
        let profile = HostProfile::cpython();
        let shared = member("size", routine("Size."));
        let mut c = class("Child", vec![shared.clone()]);
        c.bases.push(class("Base", vec![shared.clone()]));
        assert_eq!(classify(&shared, &c, &profile), ClassMember::Skipped(SkipReason::Inherited));

        // same name, different value: overridden, so it is kept
        let overridden = member("size", routine("Other size."));
        assert!(matches!(classify(&overridden, &c, &profile), ClassMember::Method(_)));
    }

    #[test]
    fn test_enum_synthetic_members_count_as_inherited() {
        let profile = HostProfile::cpython();
        let getitem = member("__getitem__", routine("Look up."));
        let mut c = class("Color", vec![getitem.clone()]);
        assert!(matches!(classify(&getitem, &c, &profile), ClassMember::MagicMethod(_)));
        c.is_enum = true;
        assert_eq!(classify(&getitem, &c, &profile), ClassMember::Skipped(SkipReason::Inherited));
    }

    #[test]
    fn test_constructor_needs_signature() {
        let profile = HostProfile::cpython();
        let init = member("__init__", routine("Init."));
        let mut c = class("C", vec![init.clone()]);
        assert_eq!(
            classify(&init, &c, &profile),
            ClassMember::Skipped(SkipReason::NoConstructorSignature)
        );

        c.signature = Some(vec![RuntimeParameter::new("value", ParameterKind::PositionalOrKeyword)]);
        match classify(&init, &c, &profile) {
            ClassMember::Constructor(sig) => assert_eq!(sig[0].name, "value"),
            other => panic!("expected constructor, got {other:?}"),
        }
    }

    #[test]
    fn test_blacklist_and_object_members() {
        let repr = member("__repr__", routine("Return repr(self)."));
        let str_ = member("__str__", routine("Return str(self)."));
        let profile = HostProfile::cpython().with_object_members(&[str_.clone()]);
        let c = class("C", vec![]);
        assert_eq!(classify(&repr, &c, &profile), ClassMember::Skipped(SkipReason::Blacklisted));
        assert_eq!(classify(&str_, &c, &profile), ClassMember::Skipped(SkipReason::ObjectMember));
    }

    #[test]
    fn test_routines_descriptors_and_values() {
        let profile = HostProfile::cpython();
        let c = class("C", vec![]);
        let len = member("__len__", routine("Length."));
        let get = member("get", routine("Get."));
        let prop = member("value", Object::DataDescriptor(DataDescriptor::default()));
        let konst = member("ZERO", Object::Plain(PlainValue::default()));
        let dunder_value = member("__slots__", Object::Plain(PlainValue::default()));

        assert!(matches!(classify(&len, &c, &profile), ClassMember::MagicMethod(_)));
        assert!(matches!(classify(&get, &c, &profile), ClassMember::Method(_)));
        assert!(matches!(classify(&prop, &c, &profile), ClassMember::Accessor(_)));
        assert_eq!(classify(&konst, &c, &profile), ClassMember::Placeholder);
        assert_eq!(
            classify(&dunder_value, &c, &profile),
            ClassMember::Skipped(SkipReason::DunderValue)
        );
    }

    #[test]
    fn test_module_scope() {
        let builtin = member("parse", routine("Parse."));
        let python = member(
            "helper",
            Object::Routine(Routine { builtin: false, ..Default::default() }),
        );
        let konst = member("VERSION", Object::Plain(PlainValue { repr: Some("'1.0'".into()) }));
        let dunder = member("__version__", Object::Plain(PlainValue::default()));
        let cls = member("Term", Object::Class(class("Term", vec![])));

        assert!(matches!(classify_module_member(&builtin), ModuleMember::Function(_)));
        assert_eq!(classify_module_member(&python), ModuleMember::Unsupported);
        assert_eq!(classify_module_member(&konst), ModuleMember::Unsupported);
        assert_eq!(classify_module_member(&dunder), ModuleMember::Skipped);
        assert!(matches!(classify_module_member(&cls), ModuleMember::Class(c) if c.name == "Term"));
    }
}
