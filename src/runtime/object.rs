//! Runtime objects with string-keyed reflective attributes.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::types::{Capability, TypeSpec};

/// Shared handle to a runtime-owned object.
pub type ObjectHandle = Rc<SimObject>;

/// An object living in the runtime's ownership domain. Attributes are
/// reflective: accessed by name, carried as text, checked against the
/// object's type on every set.
#[derive(Debug)]
pub struct SimObject {
    spec: Rc<TypeSpec>,
    attributes: RefCell<BTreeMap<String, String>>,
}

impl SimObject {
    pub(crate) fn new(spec: Rc<TypeSpec>) -> ObjectHandle {
        let attributes = spec.defaults();
        Rc::new(Self {
            spec,
            attributes: RefCell::new(attributes),
        })
    }

    pub fn type_name(&self) -> &str {
        self.spec.name()
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.spec.capability() == capability
    }

    /// Fail-safe setter: returns `false` when the attribute is unknown to
    /// the object's type or the value fails the attribute's checker.
    pub fn set_attribute(&self, name: &str, value: &str) -> bool {
        match self.spec.attribute(name) {
            Some(attr) if attr.kind().validate(value) => {
                self.attributes
                    .borrow_mut()
                    .insert(name.to_string(), value.to_string());
                true
            }
            _ => false,
        }
    }

    /// Fail-safe getter: the current value, or `None` when the attribute
    /// was never set and has no default.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::types::{AttrKind, Capability};

    fn widget_spec() -> Rc<TypeSpec> {
        Rc::new(
            TypeSpec::new("Widget", Capability::Application)
                .with_defaulted_attribute("Mtu", AttrKind::Unsigned, "1500")
                .with_attribute("Label", AttrKind::Text),
        )
    }

    #[test]
    fn test_defaults_are_preloaded() {
        let object = SimObject::new(widget_spec());
        assert_eq!(object.attribute("Mtu"), Some("1500".to_string()));
        assert_eq!(object.attribute("Label"), None);
    }

    #[test]
    fn test_set_attribute_fail_safe() {
        let object = SimObject::new(widget_spec());

        assert!(object.set_attribute("Mtu", "442"));
        assert_eq!(object.attribute("Mtu"), Some("442".to_string()));

        // unknown attribute
        assert!(!object.set_attribute("Bogus", "1"));
        // value fails the checker
        assert!(!object.set_attribute("Mtu", "not a number"));
        assert_eq!(object.attribute("Mtu"), Some("442".to_string()));
    }

    #[test]
    fn test_capability_query() {
        let object = SimObject::new(widget_spec());
        assert!(object.has_capability(Capability::Application));
        assert!(!object.has_capability(Capability::Device));
    }
}
