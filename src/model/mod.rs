//! Built model entities and the three-phase builder.
//!
//! The builder consumes a parsed description and constructs the live
//! object graph in three ordered phases: nodes (with their devices,
//! applications and routes), then connections, then registrators. Each
//! phase fully completes or fails; any failure aborts the build.

mod application;
mod channel;
mod device;
mod error;
mod node;
mod registrator;

pub use application::Application;
pub use channel::{Channel, ChannelKind};
pub use device::{Device, DeviceKind};
pub use error::ModelBuildError;
pub use node::Node;
pub use registrator::{OutputBinding, Registrator};

use std::collections::HashMap;

use crate::names::NameRegistry;
use crate::parser::{ConnectionDescription, ModelDescription, NodeDescription, RegistratorDescription};
use crate::runtime::{Runtime, SimTime};

/// The live object graph: nodes, their shared channels (held through the
/// devices), and the model-owned registrators.
#[derive(Debug)]
pub struct Model {
    runtime: Runtime,
    names: NameRegistry,
    nodes: Vec<Node>,
    node_per_name: HashMap<String, usize>,
    registrators: Vec<Registrator>,
    end_time: Option<SimTime>,
}

impl Model {
    pub fn new(runtime: Runtime) -> Self {
        Self {
            runtime,
            names: NameRegistry::new(),
            nodes: Vec::new(),
            node_per_name: HashMap::new(),
            registrators: Vec::new(),
            end_time: None,
        }
    }

    /// Build the whole object graph from a parsed description.
    ///
    /// A failed build leaves no guarantee about which entities were
    /// registered; call [`Model::reset`] before retrying.
    pub fn build_from_description(
        &mut self,
        description: &ModelDescription,
    ) -> Result<(), ModelBuildError> {
        // resolution must precede any scheduling
        if let Some(precision) = description.precision {
            self.runtime.set_resolution(precision);
        }

        self.end_time = match &description.end_time {
            Some(text) => Some(SimTime::parse(text).map_err(|_| ModelBuildError::BadTime {
                entity: description.name.clone(),
                value: text.clone(),
            })?),
            None => None,
        };

        self.build_nodes(&description.nodes)?;
        self.build_connections(&description.connections)?;

        if description.populate_routing_tables {
            self.runtime.populate_routing_tables();
        }

        self.build_registrators(&description.registrators)?;

        log::info!(
            "built model \"{}\": {} nodes, {} connections, {} registrators",
            description.name,
            description.nodes.len(),
            description.connections.len(),
            description.registrators.len()
        );
        Ok(())
    }

    fn build_nodes(&mut self, descriptions: &[NodeDescription]) -> Result<(), ModelBuildError> {
        for description in descriptions {
            let node = Node::create(&self.runtime, &mut self.names, description)?;
            log::debug!(
                "created node \"{}\" with {} devices and {} applications",
                node.name(),
                node.devices().len(),
                node.applications().len()
            );
            self.node_per_name
                .insert(node.name().to_string(), self.nodes.len());
            self.nodes.push(node);
        }
        Ok(())
    }

    fn build_connections(
        &mut self,
        descriptions: &[ConnectionDescription],
    ) -> Result<(), ModelBuildError> {
        for description in descriptions {
            let channel = Channel::create(&self.runtime, &mut self.names, description)?;

            for reference in &description.interfaces {
                // interface references are "{node_name}/{device_name}"
                let (node_name, device_name) = reference.split_once('/').ok_or_else(|| {
                    ModelBuildError::BadInterfaceReference {
                        reference: reference.clone(),
                    }
                })?;

                let node = self
                    .node_per_name
                    .get(node_name)
                    .map(|&index| &self.nodes[index])
                    .ok_or_else(|| ModelBuildError::UnknownNode {
                        name: node_name.to_string(),
                    })?;

                let device = node.device_by_name(device_name).ok_or_else(|| {
                    ModelBuildError::UnknownInterface {
                        node: node_name.to_string(),
                        device: device_name.to_string(),
                    }
                })?;

                device.attach(&channel)?;
            }
            log::debug!(
                "created channel \"{}\" joining {} interfaces",
                channel.name(),
                description.interfaces.len()
            );
        }
        Ok(())
    }

    fn build_registrators(
        &mut self,
        descriptions: &[RegistratorDescription],
    ) -> Result<(), ModelBuildError> {
        for description in descriptions {
            let registrator = Registrator::create(&self.runtime, description)?;
            registrator.schedule_init();
            self.registrators.push(registrator);
        }
        Ok(())
    }

    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.node_per_name
            .get(name)
            .map(|&index| &self.nodes[index])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn registrators(&self) -> &[Registrator] {
        &self.registrators
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    pub fn end_time(&self) -> Option<SimTime> {
        self.end_time
    }

    /// Hand control to the runtime's scheduler, stopping at the model's
    /// end time when one was configured.
    pub fn run(&self) {
        match self.end_time {
            Some(end_time) => self.runtime.run_until(end_time),
            None => self.runtime.run(),
        }
    }

    /// Halt a running event loop.
    pub fn stop(&self) {
        self.runtime.stop();
    }

    /// Discard all built entities and clear the name registry, preparing
    /// this model for an independent rebuild.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.node_per_name.clear();
        self.registrators.clear();
        self.end_time = None;
        self.names.reset();
    }
}
