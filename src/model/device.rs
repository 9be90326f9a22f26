//! Simulated network interfaces.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::address::{NetworkV4, NetworkV6};
use crate::parser::DeviceDescription;
use crate::runtime::{Capability, ObjectHandle, Runtime};

use super::channel::{Channel, ChannelKind};
use super::error::ModelBuildError;

/// Link-layer flavour of a device; must match the attached channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Csma,
    Ppp,
}

impl DeviceKind {
    /// Case-normalized tag lookup, same rule as channels.
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("csma") {
            Some(DeviceKind::Csma)
        } else if tag.eq_ignore_ascii_case("ppp") {
            Some(DeviceKind::Ppp)
        } else {
            None
        }
    }

    fn matches(&self, channel: ChannelKind) -> bool {
        matches!(
            (self, channel),
            (DeviceKind::Csma, ChannelKind::Csma) | (DeviceKind::Ppp, ChannelKind::Ppp)
        )
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            DeviceKind::Csma => "CsmaNetDevice",
            DeviceKind::Ppp => "PointToPointNetDevice",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Csma => write!(f, "csma"),
            DeviceKind::Ppp => write!(f, "ppp"),
        }
    }
}

/// A network interface owned by one node, attached to at most one channel.
#[derive(Debug)]
pub struct Device {
    name: String,
    kind: DeviceKind,
    object: ObjectHandle,
    attached: RefCell<Option<Rc<Channel>>>,
    ipv4_addresses: Vec<NetworkV4>,
    ipv6_addresses: Vec<NetworkV6>,
}

impl Device {
    /// Instantiate the runtime object for a device description. A
    /// link-layer address is allocated unless the description sets one.
    pub fn create(runtime: &Runtime, description: &DeviceDescription) -> Result<Self, ModelBuildError> {
        let mut attributes = description.attributes.clone();
        attributes
            .entry("Address".to_string())
            .or_insert_with(|| runtime.allocate_mac());

        let object = runtime
            .create_with_capability(
                description.kind.type_name(),
                &attributes,
                Capability::Device,
            )
            .map_err(|error| ModelBuildError::from_factory(&description.name, error))?;

        Ok(Self {
            name: description.name.clone(),
            kind: description.kind,
            object,
            attached: RefCell::new(None),
            ipv4_addresses: description.ipv4_addresses.clone(),
            ipv6_addresses: description.ipv6_addresses.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn object(&self) -> &ObjectHandle {
        &self.object
    }

    pub fn ipv4_addresses(&self) -> &[NetworkV4] {
        &self.ipv4_addresses
    }

    pub fn ipv6_addresses(&self) -> &[NetworkV6] {
        &self.ipv6_addresses
    }

    /// Attach the device to a channel. Kinds must match and a device
    /// already holding a channel rejects a second attach.
    pub fn attach(&self, channel: &Rc<Channel>) -> Result<(), ModelBuildError> {
        if !self.kind.matches(channel.kind()) {
            return Err(ModelBuildError::ChannelKindMismatch {
                device: self.name.clone(),
                device_kind: self.kind.to_string(),
                channel: channel.name().to_string(),
                channel_kind: channel.kind().to_string(),
            });
        }

        let mut attached = self.attached.borrow_mut();
        if let Some(existing) = attached.as_ref() {
            return Err(ModelBuildError::AlreadyAttached {
                device: self.name.clone(),
                channel: existing.name().to_string(),
            });
        }

        *attached = Some(Rc::clone(channel));
        Ok(())
    }

    /// The attached channel, if any.
    pub fn channel(&self) -> Option<Rc<Channel>> {
        self.attached.borrow().clone()
    }
}
