//! Station - graph node with typed handlers and fan-out dispatch
//!
//! A station receives messages from its sources, routes each one to the
//! handler registered for its type tag and forwards the handler's result to
//! every destination. Propagation is synchronous and depth-first.
//!
//! Edges are kept symmetric: `a.add_source(&b)` records `b` in `a`'s sources
//! and `a` in `b`'s destinations in the same call. Destinations are only ever
//! changed through the upstream/downstream pairing inside this module. Both
//! halves of an edge change together: edge updates lock the upstream's
//! destinations before the downstream's sources, and never hold more than
//! that pair.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, trace};

use contracts::{
    FluxError, Handler, HandlerResult, Message, TypeTag, DEFAULT_MAX_DEPTH, DEFAULT_TYPE,
};

use crate::channel::DeliveryChannel;
use crate::depth::DepthGuard;
use crate::metrics::{MetricsSnapshot, StationMetrics};

static NEXT_STATION_ID: AtomicU64 = AtomicU64::new(1);

/// Metric label for messages dropped before routing because they carry no type
const UNTYPED_LABEL: &str = "untyped";

/// Process-unique station identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(u64);

impl StationId {
    fn next() -> Self {
        Self(NEXT_STATION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct SourceEdge {
    upstream: Weak<StationInner>,
    channel: Arc<DeliveryChannel>,
}

pub(crate) struct StationInner {
    id: StationId,
    name: String,
    max_depth: usize,
    sources: RwLock<IndexMap<StationId, SourceEdge>>,
    /// Upstream stations keep their destinations alive
    destinations: RwLock<IndexMap<StationId, Arc<StationInner>>>,
    handlers: RwLock<HashMap<TypeTag, Handler>>,
    metrics: StationMetrics,
}

impl StationInner {
    /// Drop the source edge from `upstream`; used by an upstream that is
    /// being torn down and can no longer be reached by anyone else.
    fn forget_source(&self, upstream: StationId) {
        let removed = self.sources.write().shift_remove(&upstream);
        drop(removed);
    }

    fn channel_for(&self, upstream: StationId) -> Option<Arc<DeliveryChannel>> {
        self.sources
            .read()
            .get(&upstream)
            .map(|edge| Arc::clone(&edge.channel))
    }
}

/// Move every destination of a dying station onto `pending`, unlinking the
/// matching source edges on the way.
fn release_destinations(
    id: StationId,
    destinations: &mut IndexMap<StationId, Arc<StationInner>>,
    pending: &mut Vec<Arc<StationInner>>,
) {
    for (_, downstream) in destinations.drain(..) {
        downstream.forget_source(id);
        pending.push(downstream);
    }
}

impl Drop for StationInner {
    fn drop(&mut self) {
        // Upstream stations hold us strongly, so only downstream bookkeeping
        // can still point back here. Teardown walks the chain with a worklist:
        // a downstream whose last owner was this station is unlinked here and
        // dropped with no destinations left.
        let mut pending = Vec::new();
        release_destinations(self.id, self.destinations.get_mut(), &mut pending);
        while let Some(downstream) = pending.pop() {
            if let Some(mut inner) = Arc::into_inner(downstream) {
                let id = inner.id;
                release_destinations(id, inner.destinations.get_mut(), &mut pending);
            }
        }
    }
}

/// Handle to a graph node.
///
/// Cloning is cheap and yields another handle to the same station. Stations
/// are `Send + Sync`; no internal lock is held while a handler runs, so
/// handlers may change the graph they are part of.
///
/// Handler errors are not isolated: they abort the rest of the fan-out and
/// surface from the outermost `dispatch`/`process` call.
///
/// Cycles (including self-loops) are allowed. Their members keep each other
/// alive until an edge is removed or [`Station::isolate`] is called. Runaway
/// propagation around them fails with [`FluxError::DepthExceeded`] once more
/// than `max_depth` nested re-entries are active; acyclic chains are not
/// limited.
#[derive(Clone)]
pub struct Station {
    inner: Arc<StationInner>,
}

impl Station {
    /// Create an anonymous station with default settings
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a named station with default settings
    pub fn named(name: impl Into<String>) -> Self {
        Self::builder().name(name).build()
    }

    /// Start building a station
    pub fn builder() -> StationBuilder {
        StationBuilder::default()
    }

    pub(crate) fn from_inner(inner: Arc<StationInner>) -> Self {
        Self { inner }
    }

    /// Station identity
    pub fn id(&self) -> StationId {
        self.inner.id
    }

    /// Station name (used for logging/metrics)
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Maximum nested re-entries through a cycle before propagation is aborted
    pub fn max_depth(&self) -> usize {
        self.inner.max_depth
    }

    // ===== Edges =====

    /// Make `other` a source of this station.
    ///
    /// Registers this station as a destination of `other` and allocates a
    /// fresh delivery channel for the edge. Re-adding an existing source
    /// replaces its channel.
    pub fn add_source(&self, other: &Station) {
        let edge = SourceEdge {
            upstream: Arc::downgrade(&other.inner),
            channel: Arc::new(DeliveryChannel::new(&self.inner)),
        };
        // Both halves change under both locks; replaced values drop after
        let (replaced, _previous) = {
            let mut destinations = other.inner.destinations.write();
            let mut sources = self.inner.sources.write();
            (
                sources.insert(other.id(), edge),
                destinations.insert(self.id(), Arc::clone(&self.inner)),
            )
        };

        debug!(
            station = %self.name(),
            source = %other.name(),
            replaced = replaced.is_some(),
            "Source added"
        );
    }

    /// Remove the edge from `other`, in both directions.
    ///
    /// Does nothing if `other` is not a source.
    pub fn remove_source(&self, other: &Station) {
        let (removed, _detached) = {
            let mut destinations = other.inner.destinations.write();
            let mut sources = self.inner.sources.write();
            (
                sources.shift_remove(&other.id()),
                destinations.shift_remove(&self.id()),
            )
        };
        if removed.is_none() {
            return;
        }

        debug!(station = %self.name(), source = %other.name(), "Source removed");
    }

    /// Whether `other` is a source of this station
    pub fn has_source(&self, other: &Station) -> bool {
        self.inner.sources.read().contains_key(&other.id())
    }

    /// Number of sources
    pub fn source_count(&self) -> usize {
        self.inner.sources.read().len()
    }

    /// Whether `other` is a destination of this station
    pub fn has_destination(&self, other: &Station) -> bool {
        self.inner.destinations.read().contains_key(&other.id())
    }

    /// Number of destinations
    pub fn destination_count(&self) -> usize {
        self.inner.destinations.read().len()
    }

    /// Names of live sources, in the order they were added
    pub fn source_names(&self) -> Vec<String> {
        self.inner
            .sources
            .read()
            .values()
            .filter_map(|edge| edge.upstream.upgrade())
            .map(|upstream| upstream.name.clone())
            .collect()
    }

    /// Names of destinations, in fan-out order
    pub fn destination_names(&self) -> Vec<String> {
        self.inner
            .destinations
            .read()
            .values()
            .map(|downstream| downstream.name.clone())
            .collect()
    }

    /// Remove every incoming and outgoing edge of this station
    pub fn isolate(&self) {
        let upstreams: Vec<Arc<StationInner>> = self
            .inner
            .sources
            .read()
            .values()
            .filter_map(|edge| edge.upstream.upgrade())
            .collect();
        let downstreams: Vec<Arc<StationInner>> =
            self.inner.destinations.read().values().cloned().collect();

        let mut removed_edges = Vec::with_capacity(upstreams.len() + downstreams.len());
        let mut detached = Vec::with_capacity(upstreams.len() + downstreams.len());
        for upstream in &upstreams {
            let mut destinations = upstream.destinations.write();
            let mut sources = self.inner.sources.write();
            removed_edges.extend(sources.shift_remove(&upstream.id));
            detached.extend(destinations.shift_remove(&self.id()));
        }
        for downstream in &downstreams {
            let mut destinations = self.inner.destinations.write();
            let mut sources = downstream.sources.write();
            removed_edges.extend(sources.shift_remove(&self.id()));
            detached.extend(destinations.shift_remove(&downstream.id));
        }
        // Edges from upstreams that are already gone
        let stale: Vec<SourceEdge> = {
            let mut sources = self.inner.sources.write();
            let dead: Vec<StationId> = sources
                .iter()
                .filter(|(_, edge)| edge.upstream.strong_count() == 0)
                .map(|(id, _)| *id)
                .collect();
            dead.iter().filter_map(|id| sources.shift_remove(id)).collect()
        };

        debug!(
            station = %self.name(),
            sources = upstreams.len() + stale.len(),
            destinations = downstreams.len(),
            "Station isolated"
        );
    }

    // ===== Handlers =====

    /// Register `handler` for `tag`, replacing any previous one
    pub fn add_handler<F>(&self, tag: impl Into<TypeTag>, handler: F)
    where
        F: Fn(Message) -> HandlerResult + Send + Sync + 'static,
    {
        self.insert_handler(tag.into(), Arc::new(handler));
    }

    /// Register the fallback handler for untyped and default-tagged messages
    pub fn add_default_handler<F>(&self, handler: F)
    where
        F: Fn(Message) -> HandlerResult + Send + Sync + 'static,
    {
        self.insert_handler(TypeTag::default(), Arc::new(handler));
    }

    /// Register an already shared handler, replacing any previous one
    pub fn insert_handler(&self, tag: TypeTag, handler: Handler) {
        // Dropped outside the lock: handlers may own stations
        let replaced = self.inner.handlers.write().insert(tag, handler);
        drop(replaced);
    }

    /// Remove the handler for `tag`; no-op if absent
    pub fn remove_handler(&self, tag: &str) {
        let removed = self.inner.handlers.write().remove(tag);
        drop(removed);
    }

    /// Remove the fallback handler
    pub fn remove_default_handler(&self) {
        self.remove_handler(DEFAULT_TYPE);
    }

    /// Whether a handler is registered for `tag`
    pub fn has_handler(&self, tag: &str) -> bool {
        self.inner.handlers.read().contains_key(tag)
    }

    /// Whether a fallback handler is registered
    pub fn has_default_handler(&self) -> bool {
        self.has_handler(DEFAULT_TYPE)
    }

    /// Registered tags, sorted
    pub fn handler_tags(&self) -> Vec<TypeTag> {
        let mut tags: Vec<TypeTag> = self.inner.handlers.read().keys().cloned().collect();
        tags.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        tags
    }

    // ===== Pipeline =====

    /// Send `message` through the channel `destination` allocated for the
    /// edge from this station.
    ///
    /// No-op for `None` or when `destination` never added this station as a
    /// source.
    pub fn deliver(
        &self,
        message: impl Into<Option<Message>>,
        destination: &Station,
    ) -> Result<(), FluxError> {
        let Some(message) = message.into() else {
            return Ok(());
        };
        let Some(channel) = destination.inner.channel_for(self.id()) else {
            return Ok(());
        };

        self.inner.metrics.inc_delivered();
        observability::record_message_delivered(self.name(), destination.name());
        channel.emit(message)
    }

    /// Run the handler for `message` and dispatch its result downstream
    pub fn process(&self, message: Message) -> Result<(), FluxError> {
        self.process_with(message, |result| self.dispatch(result))?
            .unwrap_or(Ok(()))
    }

    /// Run the handler for `message` and hand its result to `callback`.
    ///
    /// Returns `Ok(None)` when no handler is registered for the message's
    /// type (the message is dropped), otherwise the callback's value. A
    /// result without a type inherits the input's type.
    pub fn process_with<F, R>(&self, message: Message, callback: F) -> Result<Option<R>, FluxError>
    where
        F: FnOnce(Option<Message>) -> R,
    {
        let Some(tag) = message.kind().cloned() else {
            self.inner.metrics.inc_unhandled();
            observability::record_message_unhandled(self.name(), UNTYPED_LABEL);
            return Ok(None);
        };
        let handler = self.inner.handlers.read().get(&tag).cloned();
        let Some(handler) = handler else {
            self.inner.metrics.inc_unhandled();
            observability::record_message_unhandled(self.name(), &tag);
            return Ok(None);
        };

        let _depth = DepthGuard::enter(self.id(), self.inner.max_depth).ok_or_else(|| {
            FluxError::DepthExceeded {
                station: self.name().to_string(),
                depth: self.inner.max_depth,
            }
        })?;

        self.inner.metrics.inc_processed();
        observability::record_message_processed(self.name(), &tag);

        let mut result =
            handler(message).map_err(|source| FluxError::handler(self.name(), tag.clone(), source))?;
        if let Some(processed) = result.as_mut() {
            processed.stamp_kind(&tag);
        }

        Ok(Some(callback(result)))
    }

    /// Deliver `message` to every destination, in the order they were added.
    ///
    /// No-op for `None`. Untyped messages are stamped with the default tag.
    pub fn dispatch(&self, message: impl Into<Option<Message>>) -> Result<(), FluxError> {
        let Some(mut message) = message.into() else {
            return Ok(());
        };
        message.stamp_kind(&TypeTag::default());

        let destinations: Vec<Station> = self
            .inner
            .destinations
            .read()
            .values()
            .map(|downstream| Station::from_inner(Arc::clone(downstream)))
            .collect();

        self.inner.metrics.inc_dispatched();
        trace!(
            station = %self.name(),
            type_tag = ?message.kind(),
            destinations = destinations.len(),
            "Dispatching"
        );

        for destination in &destinations {
            self.deliver(message.clone(), destination)?;
        }
        Ok(())
    }

    // ===== Diagnostics =====

    /// Snapshot of this station's counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }
}

impl Default for Station {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Station {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Station {}

impl Hash for Station {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state)
    }
}

impl fmt::Debug for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Station")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("sources", &self.source_count())
            .field("destinations", &self.destination_count())
            .field("handlers", &self.inner.handlers.read().len())
            .finish()
    }
}

/// Builder for [`Station`]
#[derive(Debug, Clone)]
pub struct StationBuilder {
    name: Option<String>,
    max_depth: usize,
}

impl Default for StationBuilder {
    fn default() -> Self {
        Self {
            name: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl StationBuilder {
    /// Set the station name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the cycle re-entry limit (at least 1)
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Build the station
    pub fn build(self) -> Station {
        let id = StationId::next();
        let name = self.name.unwrap_or_else(|| format!("station-{}", id.as_u64()));
        Station {
            inner: Arc::new(StationInner {
                id,
                name,
                max_depth: self.max_depth,
                sources: RwLock::new(IndexMap::new()),
                destinations: RwLock::new(IndexMap::new()),
                handlers: RwLock::new(HashMap::new()),
                metrics: StationMetrics::new(),
            }),
        }
    }
}
