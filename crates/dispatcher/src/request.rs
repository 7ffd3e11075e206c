//! Listener registration
//!
//! A [`RegisterRequest`] pairs a listener with its priority and name.
//! Listeners are stored type-erased so one tier can mix closures and
//! structured listeners.

use std::future::Future;
use std::sync::Arc;

use contracts::{Listener, ListenerResult, Message};
use futures::future::BoxFuture;

/// Object-safe view of [`Listener`]
pub(crate) trait ErasedListener: Send + Sync {
    fn call<'a>(&'a self, message: &'a Message) -> BoxFuture<'a, ListenerResult>;
}

impl<L> ErasedListener for L
where
    L: Listener + Send + Sync,
{
    fn call<'a>(&'a self, message: &'a Message) -> BoxFuture<'a, ListenerResult> {
        Box::pin(self.on_message(message))
    }
}

/// Async closure listener. Receives its own copy of the message.
pub struct FnListener<F>(F);

impl<F, Fut> Listener for FnListener<F>
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = ListenerResult> + Send,
{
    async fn on_message(&self, message: &Message) -> ListenerResult {
        (self.0)(message.clone()).await
    }
}

/// Synchronous closure listener
pub struct SyncFnListener<F>(F);

impl<F> Listener for SyncFnListener<F>
where
    F: Fn(&Message) -> ListenerResult + Send + Sync,
{
    async fn on_message(&self, message: &Message) -> ListenerResult {
        (self.0)(message)
    }
}

/// Wrap an async closure as a listener
pub fn listener_fn<F, Fut>(f: F) -> FnListener<F>
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = ListenerResult> + Send,
{
    FnListener(f)
}

/// Wrap a synchronous closure as a listener
pub fn sync_listener_fn<F>(f: F) -> SyncFnListener<F>
where
    F: Fn(&Message) -> ListenerResult + Send + Sync,
{
    SyncFnListener(f)
}

/// A listener waiting to be registered with a `PriorityDispatcher`.
///
/// Priority defaults to 0. Lower values run first.
#[derive(Clone)]
pub struct RegisterRequest {
    pub(crate) priority: u32,
    pub(crate) name: Option<String>,
    pub(crate) listener: Arc<dyn ErasedListener>,
}

impl RegisterRequest {
    /// Request for a structured listener
    pub fn new<L>(listener: L) -> Self
    where
        L: Listener + Send + Sync + 'static,
    {
        Self {
            priority: 0,
            name: None,
            listener: Arc::new(listener),
        }
    }

    /// Request for an async closure
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ListenerResult> + Send + 'static,
    {
        Self::new(listener_fn(f))
    }

    /// Request for a synchronous closure
    pub fn from_sync_fn<F>(f: F) -> Self
    where
        F: Fn(&Message) -> ListenerResult + Send + Sync + 'static,
    {
        Self::new(sync_listener_fn(f))
    }

    /// Set the priority tier
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the name used in reports and logs
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("priority", &self.priority)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
