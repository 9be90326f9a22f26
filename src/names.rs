//! Entity name registry.
//!
//! Maps hierarchical names to constructed runtime objects and enforces
//! uniqueness within a scope: model-global for nodes and channels,
//! node-scoped for devices and applications. The registry is a plain value
//! owned by the model, so independent builds own independent registries;
//! `reset` clears registrations between builds sharing one registry.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::runtime::ObjectHandle;

/// Name collision inside one scope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub struct DuplicateError {
    pub name: String,
    pub context: Option<String>,
}

impl fmt::Display for DuplicateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(
                f,
                "duplication of name \"{}\" in \"{}\"",
                self.name, context
            ),
            None => write!(f, "duplication of name \"{}\"", self.name),
        }
    }
}

/// Uniqueness-enforcing mapping from formatted paths (`/{name}`,
/// `/{context}/{name}`) to runtime objects.
#[derive(Debug, Default)]
pub struct NameRegistry {
    entries: HashMap<String, ObjectHandle>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a top-level name.
    pub fn register(&mut self, name: &str, object: ObjectHandle) -> Result<(), DuplicateError> {
        let path = format!("/{name}");
        if self.entries.contains_key(&path) {
            return Err(DuplicateError {
                name: name.to_string(),
                context: None,
            });
        }
        self.entries.insert(path, object);
        Ok(())
    }

    /// Register a name scoped under a context name.
    pub fn register_scoped(
        &mut self,
        context: &str,
        name: &str,
        object: ObjectHandle,
    ) -> Result<(), DuplicateError> {
        let path = format!("/{context}/{name}");
        if self.entries.contains_key(&path) {
            return Err(DuplicateError {
                name: name.to_string(),
                context: Some(context.to_string()),
            });
        }
        self.entries.insert(path, object);
        Ok(())
    }

    /// Resolve a formatted path such as `/node_a` or `/node_a/eth0`.
    pub fn find(&self, path: &str) -> Option<&ObjectHandle> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all registrations. Must run between independent builds that
    /// share this registry, or stale names leak into the next build.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Attributes, ObjectHandle, Runtime};

    fn object(runtime: &Runtime) -> ObjectHandle {
        runtime.create_object("Node", &Attributes::new()).unwrap()
    }

    #[test]
    fn test_register_and_find() {
        let runtime = Runtime::new();
        let mut names = NameRegistry::new();

        let node = object(&runtime);
        names.register("node_name", node.clone()).unwrap();

        assert!(std::rc::Rc::ptr_eq(names.find("/node_name").unwrap(), &node));
        assert!(names.find("/other").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let runtime = Runtime::new();
        let mut names = NameRegistry::new();

        names.register("node_name", object(&runtime)).unwrap();
        let error = names.register("node_name", object(&runtime)).unwrap_err();
        assert_eq!(
            error,
            DuplicateError {
                name: "node_name".to_string(),
                context: None,
            }
        );
    }

    #[test]
    fn test_scoped_registration() {
        let runtime = Runtime::new();
        let mut names = NameRegistry::new();

        names.register("node_name", object(&runtime)).unwrap();
        let sub = object(&runtime);
        names
            .register_scoped("node_name", "sub_name", sub.clone())
            .unwrap();

        assert!(std::rc::Rc::ptr_eq(
            names.find("/node_name/sub_name").unwrap(),
            &sub
        ));
    }

    #[test]
    fn test_scoped_duplicate_rejected() {
        let runtime = Runtime::new();
        let mut names = NameRegistry::new();

        names
            .register_scoped("node_name", "sub_name", object(&runtime))
            .unwrap();
        let error = names
            .register_scoped("node_name", "sub_name", object(&runtime))
            .unwrap_err();
        assert_eq!(error.context.as_deref(), Some("node_name"));

        // the same leaf name under another context is fine
        names
            .register_scoped("other_node", "sub_name", object(&runtime))
            .unwrap();
    }

    #[test]
    fn test_reset_allows_reuse() {
        let runtime = Runtime::new();
        let mut names = NameRegistry::new();

        names.register("node_name", object(&runtime)).unwrap();
        names.reset();
        assert!(names.is_empty());
        names.register("node_name", object(&runtime)).unwrap();
    }
}
