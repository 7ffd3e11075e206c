//! Cycle re-entry guard
//!
//! Processing is synchronous and depth-first, so a cycle in the graph shows
//! up as a station being entered again while an earlier `process` frame for
//! it is still active on the same thread. The guard tracks active stations
//! per thread and counts only those re-entries: acyclic chains of any length
//! never trip it, while runaway propagation around a cycle becomes an error
//! before the stack overflows.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::station::StationId;

#[derive(Default)]
struct ActiveFrames {
    /// Active `process` frames per station
    stations: HashMap<StationId, usize>,
    /// Active frames that re-entered an already active station
    reentries: usize,
}

thread_local! {
    static ACTIVE: RefCell<ActiveFrames> = RefCell::new(ActiveFrames::default());
}

/// RAII marker for one active `process` frame of `station` on this thread
pub(crate) struct DepthGuard {
    station: StationId,
    reentry: bool,
}

impl DepthGuard {
    /// Enter `station`, or `None` if this is a re-entry and `limit`
    /// re-entries are already active on the current thread
    pub(crate) fn enter(station: StationId, limit: usize) -> Option<Self> {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            let frames = active.stations.get(&station).copied().unwrap_or(0);
            let reentry = frames > 0;
            if reentry {
                if active.reentries >= limit {
                    return None;
                }
                active.reentries += 1;
            }
            active.stations.insert(station, frames + 1);
            Some(Self { station, reentry })
        })
    }

    /// Active re-entries on the current thread
    #[cfg(test)]
    pub(crate) fn reentries() -> usize {
        ACTIVE.with(|active| active.borrow().reentries)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if self.reentry {
                active.reentries = active.reentries.saturating_sub(1);
            }
            match active.stations.get(&self.station).copied() {
                Some(frames) if frames > 1 => {
                    active.stations.insert(self.station, frames - 1);
                }
                _ => {
                    active.stations.remove(&self.station);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Station;

    #[test]
    fn test_distinct_stations_are_not_reentries() {
        let ids: Vec<StationId> = (0..300).map(|_| Station::new().id()).collect();
        let guards: Vec<DepthGuard> = ids
            .iter()
            .map(|id| DepthGuard::enter(*id, 1).unwrap())
            .collect();
        assert_eq!(DepthGuard::reentries(), 0);
        drop(guards);
    }

    #[test]
    fn test_reentry_limit_and_release() {
        let id = Station::new().id();
        {
            let _first = DepthGuard::enter(id, 2).unwrap();
            let _second = DepthGuard::enter(id, 2).unwrap();
            let _third = DepthGuard::enter(id, 2).unwrap();
            assert_eq!(DepthGuard::reentries(), 2);
            assert!(DepthGuard::enter(id, 2).is_none());
        }
        assert_eq!(DepthGuard::reentries(), 0);

        // Fully released: the station counts as fresh again
        let _fresh = DepthGuard::enter(id, 0).unwrap();
        assert_eq!(DepthGuard::reentries(), 0);
    }
}
