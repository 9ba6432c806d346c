use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc,Mutex,MutexGuard};
use std::sync::atomic::{AtomicUsize,Ordering};

use log::debug;

use super::error::Result;
use super::metrics::RegionMetrics;
use super::table::{RegionId,RegionKey};


type Slot = Arc<Mutex<Option<Arc<RegionMetrics>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}


/// Write-once store of built metrics, one map per aggregation level.
///
/// The first request for a key builds while holding that key's slot, so
/// concurrent first requests wait for the one build instead of repeating
/// it. A failed build removes its slot again, so lookups of unknown keys
/// leave no trace.
#[derive(Debug,Default)]
pub struct MetricsCache {
    districts: Mutex<HashMap<RegionId,Slot>>,
    federal_states: Mutex<HashMap<String,Slot>>,
    builds: AtomicUsize,
}

impl MetricsCache {

    pub fn new() -> Self {
	Self::default()
    }

    pub fn get_or_build<F>(&self, key: &RegionKey, build: F) -> Result<Arc<RegionMetrics>>
    where F: FnOnce() -> Result<RegionMetrics> {

	let slot = match key {
	    RegionKey::District(id) => slot(&self.districts, *id),
	    RegionKey::FederalState(name) => slot(&self.federal_states, name.clone()),
	};

	let mut entry = lock(&slot);
	if let Some(metrics) = entry.as_ref() {
	    return Ok(Arc::clone(metrics));
	}

	debug!("building metrics for {}", key);
	self.builds.fetch_add(1, Ordering::SeqCst);
	let metrics = match build() {
	    Ok(metrics) => Arc::new(metrics),
	    Err(err) => {
		drop(entry);
		match key {
		    RegionKey::District(id) => forget(&self.districts, id, &slot),
		    RegionKey::FederalState(name) => forget(&self.federal_states, name, &slot),
		}
		return Err(err);
	    },
	};
	*entry = Some(Arc::clone(&metrics));
	Ok(metrics)

    }

    pub fn get(&self, key: &RegionKey) -> Option<Arc<RegionMetrics>> {
	let slot = match key {
	    RegionKey::District(id) => lock(&self.districts).get(id).cloned(),
	    RegionKey::FederalState(name) => lock(&self.federal_states).get(name).cloned(),
	}?;
	let entry = lock(&slot);
	entry.clone()
    }

    /// Number of builds started since creation or the last reset.
    pub fn builds(&self) -> usize {
	self.builds.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
	filled(&lock(&self.districts)) + filled(&lock(&self.federal_states))
    }

    pub fn is_empty(&self) -> bool {
	self.len() == 0
    }

    /// Forgets every built entry; the next request builds afresh.
    pub fn reset(&self) {
	lock(&self.districts).clear();
	lock(&self.federal_states).clear();
	self.builds.store(0, Ordering::SeqCst);
    }

}


fn slot<K: Eq + Hash>(slots: &Mutex<HashMap<K,Slot>>, key: K) -> Slot {
    Arc::clone(lock(slots).entry(key).or_default())
}

/// Removes the slot of `key` if it is still `slot` and empty. A waiter
/// holding a clone may still fill it; it is then just not shared.
fn forget<K: Eq + Hash>(slots: &Mutex<HashMap<K,Slot>>, key: &K, slot: &Slot) {
    let mut slots = lock(slots);
    let stale = slots.get(key)
	.is_some_and(|current| Arc::ptr_eq(current, slot) && lock(current).is_none());
    if stale {
	slots.remove(key);
    }
}

fn filled<K>(slots: &HashMap<K,Slot>) -> usize {
    slots.values().filter(|s| lock(s).is_some()).count()
}
