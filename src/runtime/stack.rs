//! Per-node protocol-stack bookkeeping.
//!
//! Tracks interfaces, their administrative state, metrics and assigned
//! addresses, plus a static routing table. Address assignment and
//! interface lookup report success or failure; the packet-level behaviour
//! behind these records belongs to the simulation engine.

use std::cell::RefCell;
use std::rc::Rc;

use crate::address::{NetworkV4, NetworkV6};

use super::object::ObjectHandle;

/// IPv4 protocol-stack handle of one node.
pub type Ipv4Stack = ProtocolStack<NetworkV4>;

/// IPv6 protocol-stack handle of one node.
pub type Ipv6Stack = ProtocolStack<NetworkV6>;

#[derive(Debug)]
struct Interface<N> {
    device: ObjectHandle,
    up: bool,
    metric: u32,
    addresses: Vec<N>,
}

/// A static route bound to an interface index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRoute<N> {
    pub network: N,
    pub interface: usize,
    pub metric: u32,
}

#[derive(Debug)]
struct StackInner<N> {
    interfaces: Vec<Interface<N>>,
    routes: Vec<StaticRoute<N>>,
}

/// Shared handle to one protocol family's state on a node.
#[derive(Debug)]
pub struct ProtocolStack<N> {
    inner: Rc<RefCell<StackInner<N>>>,
}

impl<N> Clone for ProtocolStack<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<N: Clone + PartialEq> ProtocolStack<N> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StackInner {
                interfaces: Vec::new(),
                routes: Vec::new(),
            })),
        }
    }

    /// Add an interface for a device; returns its index.
    pub fn add_interface(&self, device: &ObjectHandle) -> usize {
        let mut inner = self.inner.borrow_mut();
        inner.interfaces.push(Interface {
            device: Rc::clone(device),
            up: false,
            metric: 0,
            addresses: Vec::new(),
        });
        inner.interfaces.len() - 1
    }

    pub fn set_up(&self, interface: usize) {
        self.inner.borrow_mut().interfaces[interface].up = true;
    }

    pub fn set_metric(&self, interface: usize, metric: u32) {
        self.inner.borrow_mut().interfaces[interface].metric = metric;
    }

    /// Assign an address to an interface; `false` when the address is
    /// already present there.
    pub fn add_address(&self, interface: usize, address: N) -> bool {
        let mut inner = self.inner.borrow_mut();
        let addresses = &mut inner.interfaces[interface].addresses;
        if addresses.contains(&address) {
            return false;
        }
        addresses.push(address);
        true
    }

    /// Find the interface an earlier `add_interface` created for `device`.
    pub fn interface_for_device(&self, device: &ObjectHandle) -> Option<usize> {
        self.inner
            .borrow()
            .interfaces
            .iter()
            .position(|interface| Rc::ptr_eq(&interface.device, device))
    }

    pub fn add_network_route(&self, network: N, interface: usize, metric: u32) {
        self.inner.borrow_mut().routes.push(StaticRoute {
            network,
            interface,
            metric,
        });
    }

    pub fn interface_count(&self) -> usize {
        self.inner.borrow().interfaces.len()
    }

    pub fn is_up(&self, interface: usize) -> bool {
        self.inner.borrow().interfaces[interface].up
    }

    pub fn metric(&self, interface: usize) -> u32 {
        self.inner.borrow().interfaces[interface].metric
    }

    pub fn addresses(&self, interface: usize) -> Vec<N> {
        self.inner.borrow().interfaces[interface].addresses.clone()
    }

    pub fn routes(&self) -> Vec<StaticRoute<N>> {
        self.inner.borrow().routes.clone()
    }
}

impl<N: Clone + PartialEq> Default for ProtocolStack<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address;
    use crate::runtime::{Attributes, Runtime};

    fn device(runtime: &Runtime) -> ObjectHandle {
        runtime
            .create_object("CsmaNetDevice", &Attributes::new())
            .unwrap()
    }

    #[test]
    fn test_interface_lifecycle() {
        let runtime = Runtime::new();
        let stack = Ipv4Stack::new();

        let eth0 = device(&runtime);
        let index = stack.add_interface(&eth0);
        assert_eq!(index, 0);
        assert!(!stack.is_up(index));

        stack.set_up(index);
        stack.set_metric(index, 1);
        assert!(stack.is_up(index));
        assert_eq!(stack.metric(index), 1);

        assert_eq!(stack.interface_for_device(&eth0), Some(index));
        let other = device(&runtime);
        assert_eq!(stack.interface_for_device(&other), None);
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let runtime = Runtime::new();
        let stack = Ipv4Stack::new();
        let index = stack.add_interface(&device(&runtime));

        let net = address::from_string_v4("10.10.10.2", "255.255.255.0").unwrap();
        assert!(stack.add_address(index, net));
        assert!(!stack.add_address(index, net));
        assert_eq!(stack.addresses(index), vec![net]);
    }

    #[test]
    fn test_static_routes_record_interface_and_metric() {
        let runtime = Runtime::new();
        let stack = Ipv4Stack::new();
        let index = stack.add_interface(&device(&runtime));

        let net = address::from_string_v4("10.101.0.0", "255.255.0.0").unwrap();
        stack.add_network_route(net, index, 10);

        let routes = stack.routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].network, net);
        assert_eq!(routes[0].interface, index);
        assert_eq!(routes[0].metric, 10);
    }
}
