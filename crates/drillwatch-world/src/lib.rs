//! Host world interface and in-memory simulation for Drillwatch.
//!
//! The controller never owns the world it watches. Everything it needs from
//! the host (entity validity, resource reads, wiring, emitter output slots)
//! goes through the [`HostWorld`] trait.
//!
//! # Modules
//!
//! - [`error`] -- Error types for host-world operations.
//! - [`host`] -- The [`HostWorld`] trait: the collaborator boundary.
//! - [`bus`] -- [`BusGraph`], the two-channel undirected wire graph.
//! - [`sim`] -- [`SimWorld`], an in-memory host with drills, resources,
//!   poles and emitters, used by tests and the demo engine.

pub mod bus;
pub mod error;
pub mod host;
pub mod sim;

// Re-export primary types at crate root.
pub use bus::BusGraph;
pub use error::WorldError;
pub use host::HostWorld;
pub use sim::SimWorld;
