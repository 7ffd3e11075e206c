//! DeliveryChannel - per-edge conduit into a station
//!
//! Each `add_source` call allocates one channel owned by the downstream
//! station. Upstream stations only reach it through `deliver`. The channel
//! has exactly one consumer, the owner's `process`, and hands messages over
//! synchronously.

use std::sync::{Arc, Weak};

use contracts::{FluxError, Message};

use crate::station::{Station, StationInner};

pub(crate) struct DeliveryChannel {
    /// Weak so that a station owning its channels does not own itself
    owner: Weak<StationInner>,
}

impl DeliveryChannel {
    pub(crate) fn new(owner: &Arc<StationInner>) -> Self {
        Self {
            owner: Arc::downgrade(owner),
        }
    }

    /// Push one message into the owning station
    pub(crate) fn emit(&self, message: Message) -> Result<(), FluxError> {
        match self.owner.upgrade() {
            Some(inner) => Station::from_inner(inner).process(message),
            None => Ok(()),
        }
    }
}
