//! Simulated shared media.

use std::fmt;
use std::rc::Rc;

use crate::names::NameRegistry;
use crate::parser::ConnectionDescription;
use crate::runtime::{Capability, ObjectHandle, Runtime};

use super::error::ModelBuildError;

/// Link-layer flavour of a channel; constrains which devices may attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Csma,
    Ppp,
}

impl ChannelKind {
    /// Case-normalized tag lookup: "Csma", "csma" and "CSMA" are the same.
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("csma") {
            Some(ChannelKind::Csma)
        } else if tag.eq_ignore_ascii_case("ppp") {
            Some(ChannelKind::Ppp)
        } else {
            None
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            ChannelKind::Csma => "CsmaChannel",
            ChannelKind::Ppp => "PointToPointChannel",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Csma => write!(f, "csma"),
            ChannelKind::Ppp => write!(f, "ppp"),
        }
    }
}

/// A shared medium, `Rc`-shared by every device attached to it. The
/// channel's lifetime is independent of any one device.
#[derive(Debug)]
pub struct Channel {
    name: String,
    kind: ChannelKind,
    object: ObjectHandle,
}

impl Channel {
    /// Create the runtime channel object and register its model-global
    /// name.
    pub fn create(
        runtime: &Runtime,
        names: &mut NameRegistry,
        description: &ConnectionDescription,
    ) -> Result<Rc<Channel>, ModelBuildError> {
        let object = runtime
            .create_with_capability(
                description.kind.type_name(),
                &description.attributes,
                Capability::Channel,
            )
            .map_err(|error| ModelBuildError::from_factory(&description.name, error))?;

        names.register(&description.name, Rc::clone(&object))?;

        Ok(Rc::new(Channel {
            name: description.name.clone(),
            kind: description.kind,
            object,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn object(&self) -> &ObjectHandle {
        &self.object
    }
}
