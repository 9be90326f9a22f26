//! Boundary to the discrete-event simulation runtime.
//!
//! This module is the crate's rendering of the external runtime the model
//! builder drives: a dynamic type registry with reflective string
//! attributes, a virtual-time one-shot scheduler, per-node protocol-stack
//! bookkeeping, hierarchical MAC allocation and the run/stop event loop.
//! The simulation engine proper (packet delivery, transmission
//! electronics, routing computation) lives behind this boundary and has no
//! design content here.

pub mod factory;

mod object;
mod scheduler;
mod stack;
mod time;
mod types;

pub use factory::FactoryError;
pub use object::{ObjectHandle, SimObject};
pub use scheduler::{EventId, EventStatus, Scheduler};
pub use stack::{Ipv4Stack, Ipv6Stack, ProtocolStack, StaticRoute};
pub use time::{SimTime, TimeParseError, TimeUnit};
pub use types::{AttrKind, AttrSpec, Capability, TypeRegistry, TypeSpec};

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// String-keyed attribute values handed to the object factory.
pub type Attributes = BTreeMap<String, String>;

#[derive(Debug)]
struct RuntimeInner {
    types: RefCell<TypeRegistry>,
    scheduler: RefCell<Scheduler>,
    resolution: Cell<TimeUnit>,
    next_mac: Cell<u64>,
    routing_tables_populated: Cell<bool>,
    stopped: Cell<bool>,
}

/// Shared handle to the runtime. Cloning is cheap and every clone drives
/// the same clock, registry and event queue. Single-threaded by design.
#[derive(Debug, Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    /// A runtime with the default type catalogue.
    pub fn new() -> Self {
        Self::with_registry(TypeRegistry::with_defaults())
    }

    pub fn with_registry(registry: TypeRegistry) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                types: RefCell::new(registry),
                scheduler: RefCell::new(Scheduler::new()),
                resolution: Cell::new(TimeUnit::default()),
                next_mac: Cell::new(1),
                routing_tables_populated: Cell::new(false),
                stopped: Cell::new(false),
            }),
        }
    }

    /// Register an additional type; a later registration under the same
    /// name wins.
    pub fn register_type(&self, spec: TypeSpec) {
        self.inner.types.borrow_mut().register(spec);
    }

    /// Instantiate a type by name and apply its attributes.
    pub fn create_object(
        &self,
        type_name: &str,
        attributes: &Attributes,
    ) -> Result<ObjectHandle, FactoryError> {
        factory::create(&self.inner.types.borrow(), type_name, attributes)
    }

    /// Instantiate a type by name, requiring a capability from it.
    pub fn create_with_capability(
        &self,
        type_name: &str,
        attributes: &Attributes,
        capability: Capability,
    ) -> Result<ObjectHandle, FactoryError> {
        factory::create_with_capability(&self.inner.types.borrow(), type_name, attributes, capability)
    }

    /// Check that a type resolves and carries a capability, constructing
    /// nothing.
    pub fn validate_type(
        &self,
        type_name: &str,
        capability: Capability,
    ) -> Result<(), FactoryError> {
        factory::resolve_with_capability(&self.inner.types.borrow(), type_name, capability)
    }

    /// Fresh IPv4/IPv6 protocol-stack handles for a node.
    pub fn install_internet_stack(&self) -> (Ipv4Stack, Ipv6Stack) {
        (Ipv4Stack::new(), Ipv6Stack::new())
    }

    /// Allocate the next link-layer address.
    pub fn allocate_mac(&self) -> String {
        let serial = self.inner.next_mac.get();
        self.inner.next_mac.set(serial + 1);
        format!(
            "00:00:00:00:{:02x}:{:02x}",
            (serial >> 8) & 0xff,
            serial & 0xff
        )
    }

    /// Set the global clock resolution. Applies to subsequently scheduled
    /// events; must be called before any scheduling.
    pub fn set_resolution(&self, unit: TimeUnit) {
        self.inner.resolution.set(unit);
    }

    pub fn resolution(&self) -> TimeUnit {
        self.inner.resolution.get()
    }

    /// Register a one-shot callback at `at`, truncated to the clock
    /// resolution. Non-blocking; the callback runs from the event loop.
    pub fn schedule(&self, at: SimTime, callback: impl FnOnce() + 'static) -> EventId {
        let at = at.truncate(self.resolution());
        self.inner.scheduler.borrow_mut().schedule(at, callback)
    }

    pub fn now(&self) -> SimTime {
        self.inner.scheduler.borrow().now()
    }

    /// Record the request for global routing-table computation. The
    /// computation itself belongs to the simulation engine.
    pub fn populate_routing_tables(&self) {
        log::debug!("global routing-table population requested");
        self.inner.routing_tables_populated.set(true);
    }

    pub fn routing_tables_populated(&self) -> bool {
        self.inner.routing_tables_populated.get()
    }

    /// Run the event loop until the queue drains or `stop` is called.
    pub fn run(&self) {
        self.run_inner(None);
    }

    /// Run the event loop up to and including `stop_time`, leaving later
    /// events queued and the clock parked at the stop time.
    pub fn run_until(&self, stop_time: SimTime) {
        self.run_inner(Some(stop_time));
    }

    fn run_inner(&self, stop_time: Option<SimTime>) {
        self.inner.stopped.set(false);
        loop {
            if self.inner.stopped.get() {
                break;
            }
            // the queue borrow ends before the callback runs, so callbacks
            // may schedule further events
            let next = self.inner.scheduler.borrow_mut().pop_next(stop_time);
            match next {
                Some(callback) => callback(),
                None => break,
            }
        }
    }

    /// Halt the event loop after the current callback returns.
    pub fn stop(&self) {
        self.inner.stopped.set(true);
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_allocation_is_sequential() {
        let runtime = Runtime::new();
        assert_eq!(runtime.allocate_mac(), "00:00:00:00:00:01");
        assert_eq!(runtime.allocate_mac(), "00:00:00:00:00:02");
    }

    #[test]
    fn test_resolution_truncates_scheduled_times() {
        let runtime = Runtime::new();
        runtime.set_resolution(TimeUnit::Millisecond);

        let event = runtime.schedule(SimTime::parse("1500us").unwrap(), || {});
        assert_eq!(event.time(), SimTime::parse("1ms").unwrap());
    }

    #[test]
    fn test_run_until_parks_clock() {
        let runtime = Runtime::new();
        runtime.schedule(SimTime::parse("10s").unwrap(), || {});

        runtime.run_until(SimTime::parse("3s").unwrap());
        assert_eq!(runtime.now(), SimTime::parse("3s").unwrap());
    }

    #[test]
    fn test_stop_halts_the_loop() {
        let runtime = Runtime::new();

        let handle = runtime.clone();
        runtime.schedule(SimTime::parse("1s").unwrap(), move || {
            handle.stop();
        });
        let late = runtime.schedule(SimTime::parse("2s").unwrap(), || {});

        runtime.run();
        assert_eq!(runtime.now(), SimTime::parse("1s").unwrap());
        assert!(late.is_pending());
    }

    #[test]
    fn test_callback_can_schedule_followup() {
        let runtime = Runtime::new();
        let handle = runtime.clone();
        runtime.schedule(SimTime::parse("1s").unwrap(), move || {
            handle.schedule(SimTime::parse("2s").unwrap(), || {});
        });

        runtime.run();
        assert_eq!(runtime.now(), SimTime::parse("2s").unwrap());
    }

    #[test]
    fn test_routing_table_population_flag() {
        let runtime = Runtime::new();
        assert!(!runtime.routing_tables_populated());
        runtime.populate_routing_tables();
        assert!(runtime.routing_tables_populated());
    }
}
