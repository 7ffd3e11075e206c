//! Listener trait - PriorityDispatcher subscriber interface

use crate::{BoxError, Message};

/// Result of a listener invocation
pub type ListenerResult = Result<(), BoxError>;

/// Priority dispatcher subscriber.
///
/// Listeners in the same tier run concurrently; an `Err` is recorded in the
/// dispatch report and never stops later tiers.
#[trait_variant::make(Listener: Send)]
pub trait LocalListener {
    /// Handle one broadcast message
    ///
    /// # Errors
    /// Returns the listener failure (should include context)
    async fn on_message(&self, message: &Message) -> ListenerResult;
}
