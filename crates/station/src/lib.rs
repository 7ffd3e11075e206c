//! # Station
//!
//! Dataflow graph node.
//!
//! Responsibilities:
//! - Source/destination bookkeeping with a dedicated delivery channel per edge
//! - Routing each message to the handler registered for its type tag
//! - Forwarding handler results to every destination (depth-first)
//! - Assembling config-driven graphs from a `GraphBlueprint`

mod builtin;
mod channel;
mod depth;
pub mod graph;
pub mod metrics;
mod station;

pub use builtin::BuiltinHandlers;
pub use contracts::{FluxError, Handler, HandlerResult, Message, TypeTag, DEFAULT_TYPE};
pub use graph::{HandlerFactory, StationGraph};
pub use metrics::{MetricsSnapshot, StationMetrics};
pub use station::{Station, StationBuilder, StationId};
