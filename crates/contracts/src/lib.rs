//! # Contracts
//!
//! Frozen interface contracts shared by every PipeFlux crate: the message
//! model, handler and listener signatures, errors and the graph blueprint.
//! Business crates depend on this crate only; reverse dependencies are
//! prohibited.
//!
//! ## Message Model
//! - A message is an open JSON record with one reserved `type` discriminant
//! - Untyped messages are stamped with [`DEFAULT_TYPE`] on dispatch

mod blueprint;
mod error;
mod handler;
mod listener;
mod message;
mod type_tag;

pub use blueprint::*;
pub use error::*;
pub use handler::{handler_fn, Handler, HandlerResult};
pub use listener::{Listener, ListenerResult, LocalListener};
pub use message::{Message, TYPE_FIELD};
pub use type_tag::{TypeTag, DEFAULT_TYPE};
