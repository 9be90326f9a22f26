//! Deferred measurement-probe installers.
//!
//! A registrator schedules a one-shot initialization callback at its
//! configured start time. The callback holds only a weak reference back to
//! the registrator's state: dropping the registrator before the callback
//! fires makes it a no-op, and `Drop` additionally cancels the still
//! pending event through its id.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::parser::RegistratorDescription;
use crate::runtime::{
    Attributes, Capability, EventId, EventStatus, ObjectHandle, Runtime, SimTime,
};

use super::error::ModelBuildError;

/// Output configuration installed when the registrator fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBinding {
    pub file: String,
    pub heading: String,
    pub source: String,
    pub sink: String,
}

#[derive(Debug)]
struct RegistratorInner {
    probe_type: String,
    file: String,
    source: String,
    sink: String,
    value_name: String,
    start_time: SimTime,
    end_time: SimTime,
    runtime: Runtime,
    probe: RefCell<Option<ObjectHandle>>,
    binding: RefCell<Option<OutputBinding>>,
}

impl RegistratorInner {
    /// Configure the output file, create the probe and install the
    /// source-to-sink binding. Runs from the event loop at start time.
    fn initialize(&self) {
        let binding = OutputBinding {
            file: self.file.clone(),
            heading: format!("Time,{}", self.value_name),
            source: self.source.clone(),
            sink: self.sink.clone(),
        };

        match self
            .runtime
            .create_with_capability(&self.probe_type, &Attributes::new(), Capability::Probe)
        {
            Ok(probe) => {
                if !probe.set_attribute("Stop", &self.end_time.to_string()) {
                    log::warn!(
                        "probe \"{}\" rejected stop time {}",
                        self.probe_type,
                        self.end_time
                    );
                }
                log::debug!(
                    "installed probe \"{}\" for \"{}\" into \"{}\"",
                    self.probe_type,
                    self.source,
                    self.file
                );
                *self.probe.borrow_mut() = Some(probe);
                *self.binding.borrow_mut() = Some(binding);
            }
            // the type was validated at build time; a failure here means
            // the registry changed under us, so report and skip
            Err(error) => log::error!("failed to install probe \"{}\": {}", self.probe_type, error),
        }
    }
}

/// A deferred, time-scheduled measurement probe installer, owned by the
/// model.
#[derive(Debug)]
pub struct Registrator {
    inner: Rc<RegistratorInner>,
    event: RefCell<EventId>,
}

impl Registrator {
    /// Validate the probe type and parse the start/end times. Nothing is
    /// scheduled until `schedule_init`.
    pub fn create(
        runtime: &Runtime,
        description: &RegistratorDescription,
    ) -> Result<Self, ModelBuildError> {
        runtime
            .validate_type(&description.probe_type, Capability::Probe)
            .map_err(|error| ModelBuildError::from_factory(&description.source, error))?;

        let start_time =
            SimTime::parse(&description.start_time).map_err(|_| ModelBuildError::BadTime {
                entity: description.source.clone(),
                value: description.start_time.clone(),
            })?;
        let end_time = match &description.end_time {
            Some(text) => SimTime::parse(text).map_err(|_| ModelBuildError::BadTime {
                entity: description.source.clone(),
                value: text.clone(),
            })?,
            None => SimTime::ZERO,
        };

        Ok(Self {
            inner: Rc::new(RegistratorInner {
                probe_type: description.probe_type.clone(),
                file: description.file.clone(),
                source: description.source.clone(),
                sink: description.sink.clone(),
                value_name: description.value_name.clone(),
                start_time,
                end_time,
                runtime: runtime.clone(),
                probe: RefCell::new(None),
                binding: RefCell::new(None),
            }),
            event: RefCell::new(EventId::default()),
        })
    }

    /// Register the one-shot initialization callback at the start time.
    /// Non-blocking; the callback runs from the event loop.
    pub fn schedule_init(&self) {
        let weak: Weak<RegistratorInner> = Rc::downgrade(&self.inner);
        let event = self.inner.runtime.schedule(self.inner.start_time, move || {
            if let Some(inner) = weak.upgrade() {
                inner.initialize();
            }
        });
        *self.event.borrow_mut() = event;
    }

    /// Status of the scheduled initialization event.
    pub fn event_status(&self) -> EventStatus {
        self.event.borrow().status()
    }

    /// Handle to the scheduled initialization event.
    pub fn event_id(&self) -> EventId {
        self.event.borrow().clone()
    }

    pub fn start_time(&self) -> SimTime {
        self.inner.start_time
    }

    pub fn end_time(&self) -> SimTime {
        self.inner.end_time
    }

    pub fn sink(&self) -> &str {
        &self.inner.sink
    }

    pub fn value_name(&self) -> &str {
        &self.inner.value_name
    }

    /// The probe created when the registrator fired, if it has.
    pub fn probe(&self) -> Option<ObjectHandle> {
        self.inner.probe.borrow().clone()
    }

    /// The output binding installed when the registrator fired, if it has.
    pub fn output_binding(&self) -> Option<OutputBinding> {
        self.inner.binding.borrow().clone()
    }
}

impl Drop for Registrator {
    fn drop(&mut self) {
        // a still-pending init event must not outlive its registrator
        self.event.borrow().cancel();
    }
}
