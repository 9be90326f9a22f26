//! Simulated network endpoints.

use std::rc::Rc;

use crate::names::NameRegistry;
use crate::parser::{Ipv4Route, Ipv6Route, NodeDescription};
use crate::runtime::{Attributes, Capability, Ipv4Stack, Ipv6Stack, ObjectHandle, Runtime};

use super::application::Application;
use super::device::Device;
use super::error::ModelBuildError;

/// A network endpoint owning its devices and applications, with IPv4/IPv6
/// protocol-stack handles obtained from the runtime at creation.
#[derive(Debug)]
pub struct Node {
    name: String,
    object: ObjectHandle,
    ipv4: Ipv4Stack,
    ipv6: Ipv6Stack,
    devices: Vec<Device>,
    applications: Vec<Application>,
}

impl Node {
    /// Create the node with its devices, applications and static routes.
    /// Registers the node's model-global name and each child's node-scoped
    /// name.
    pub fn create(
        runtime: &Runtime,
        names: &mut NameRegistry,
        description: &NodeDescription,
    ) -> Result<Self, ModelBuildError> {
        let object = runtime
            .create_with_capability("Node", &Attributes::new(), Capability::Node)
            .map_err(|error| ModelBuildError::from_factory(&description.name, error))?;
        names.register(&description.name, Rc::clone(&object))?;

        let (ipv4, ipv6) = runtime.install_internet_stack();

        let mut node = Self {
            name: description.name.clone(),
            object,
            ipv4,
            ipv6,
            devices: Vec::new(),
            applications: Vec::new(),
        };

        for device_description in &description.devices {
            let device = Device::create(runtime, device_description)?;
            node.attach_device(names, device)?;
        }

        for application_description in &description.applications {
            let application = Application::create(runtime, application_description)?;
            node.attach_application(names, application)?;
        }

        node.add_ipv4_routes(&description.routing.ipv4)?;
        node.add_ipv6_routes(&description.routing.ipv6)?;

        Ok(node)
    }

    /// Bring the device up on both stacks and assign its addresses.
    fn attach_device(
        &mut self,
        names: &mut NameRegistry,
        device: Device,
    ) -> Result<(), ModelBuildError> {
        {
            let interface = self.ipv4.add_interface(device.object());
            self.ipv4.set_up(interface);
            self.ipv4.set_metric(interface, 1);

            for address in device.ipv4_addresses() {
                if !self.ipv4.add_address(interface, *address) {
                    return Err(ModelBuildError::AddressAssignment {
                        device: device.name().to_string(),
                        address: address.to_string(),
                    });
                }
            }
        }

        {
            let interface = self.ipv6.add_interface(device.object());
            self.ipv6.set_up(interface);
            self.ipv6.set_metric(interface, 1);

            for address in device.ipv6_addresses() {
                if !self.ipv6.add_address(interface, *address) {
                    return Err(ModelBuildError::AddressAssignment {
                        device: device.name().to_string(),
                        address: address.to_string(),
                    });
                }
            }
        }

        names.register_scoped(&self.name, device.name(), Rc::clone(device.object()))?;
        self.devices.push(device);
        Ok(())
    }

    fn attach_application(
        &mut self,
        names: &mut NameRegistry,
        application: Application,
    ) -> Result<(), ModelBuildError> {
        names.register_scoped(&self.name, application.name(), Rc::clone(application.object()))?;
        self.applications.push(application);
        Ok(())
    }

    fn add_ipv4_routes(&self, routes: &[Ipv4Route]) -> Result<(), ModelBuildError> {
        for route in routes {
            let device = self.route_target(&route.device)?;
            let interface = self
                .ipv4
                .interface_for_device(device.object())
                .ok_or_else(|| self.unknown_route_target(&route.device))?;
            self.ipv4
                .add_network_route(route.network, interface, route.metric);
        }
        Ok(())
    }

    fn add_ipv6_routes(&self, routes: &[Ipv6Route]) -> Result<(), ModelBuildError> {
        for route in routes {
            let device = self.route_target(&route.device)?;
            let interface = self
                .ipv6
                .interface_for_device(device.object())
                .ok_or_else(|| self.unknown_route_target(&route.device))?;
            self.ipv6
                .add_network_route(route.network, interface, route.metric);
        }
        Ok(())
    }

    fn route_target(&self, device: &str) -> Result<&Device, ModelBuildError> {
        self.device_by_name(device)
            .ok_or_else(|| self.unknown_route_target(device))
    }

    fn unknown_route_target(&self, device: &str) -> ModelBuildError {
        ModelBuildError::UnknownRouteTarget {
            node: self.name.clone(),
            device: device.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object(&self) -> &ObjectHandle {
        &self.object
    }

    pub fn ipv4(&self) -> &Ipv4Stack {
        &self.ipv4
    }

    pub fn ipv6(&self) -> &Ipv6Stack {
        &self.ipv6
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn device_by_name(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|device| device.name() == name)
    }
}
