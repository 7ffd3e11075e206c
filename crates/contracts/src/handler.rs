//! Handler contract - station processing interface
//!
//! Handlers are plain closures supplied by the embedding application. Any
//! state they need is captured explicitly; the runtime never binds a receiver.

use std::sync::Arc;

use crate::{BoxError, Message};

/// Result of a handler invocation.
///
/// `Ok(Some(_))` is forwarded downstream, `Ok(None)` ends propagation.
pub type HandlerResult = Result<Option<Message>, BoxError>;

/// Shared handler function
pub type Handler = Arc<dyn Fn(Message) -> HandlerResult + Send + Sync>;

/// Wrap a closure into a [`Handler`]
pub fn handler_fn<F>(f: F) -> Handler
where
    F: Fn(Message) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}
