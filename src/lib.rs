//! # Netmodel - declarative topology compiler for discrete-event network simulations
//!
//! This library compiles a declarative XML description of a network
//! topology (nodes, devices, channels, applications, routing entries and
//! measurement probes) into a live object graph inside a discrete-event
//! simulation runtime, then hands control to that runtime's scheduler.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `parser`: topology document parsing into plain description records
//! - `model`: the three-phase builder and the built entities
//! - `names`: the uniqueness-enforcing entity name registry
//! - `runtime`: the boundary to the simulation runtime (dynamic type
//!   registry, reflective attributes, virtual-time scheduler, protocol
//!   stacks, run/stop)
//! - `address`: IPv4/IPv6 network-address value parsing
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use netmodel::{model::Model, parser, runtime::Runtime};
//!
//! let document = std::fs::read_to_string("topology.xml")?;
//! let description = parser::parse_model(&document)?;
//!
//! let mut model = Model::new(Runtime::new());
//! model.build_from_description(&description)?;
//! model.run();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Parsing fails with `parser::ParseError`, building with
//! `model::ModelBuildError`; both are fatal to the attempt, with no
//! partial success or retry. The binary reports errors through
//! `color_eyre`.

pub mod address;
pub mod model;
pub mod names;
pub mod parser;
pub mod runtime;
