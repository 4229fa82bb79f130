//! Sharing of equal one-dimensional gridded sets.

use super::{gridded_1d::Gridded1DSet, SampledSet};
use crate::num::{to_f64, BFloat};
use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    hash::{Hash, Hasher},
    sync::{Arc, Mutex, PoisonError, Weak},
};

/// Registry handing out a single shared instance for every group of equal
/// one-dimensional gridded sets that are alive at the same time.
///
/// The registry only holds weak references, so interned sets are dropped
/// as soon as no caller uses them any more.
#[derive(Debug, Default)]
pub struct SetInterner<F: BFloat> {
    entries: Mutex<HashMap<u64, Vec<Weak<Gridded1DSet<F>>>>>,
}

impl<F: BFloat> SetInterner<F> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the live interned set equal to the given one, or interns and
    /// returns the given set if there is none.
    ///
    /// Entries of sets that are no longer alive are dropped on the way.
    pub fn intern(&self, set: Gridded1DSet<F>) -> Arc<Gridded1DSet<F>> {
        let key = Self::key(&set);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        prune(&mut entries);
        let bucket = entries.entry(key).or_default();
        if let Some(existing) = bucket
            .iter()
            .filter_map(Weak::upgrade)
            .find(|existing| **existing == set)
        {
            log::debug!("Reusing interned set of {} samples", set.len());
            return existing;
        }
        log::debug!("Interning new set of {} samples", set.len());
        let set = Arc::new(set);
        bucket.push(Arc::downgrade(&set));
        set
    }

    /// Drops the entries of sets that are no longer alive.
    pub fn purge(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        prune(&mut entries);
    }

    /// Returns the number of interned sets that are still alive.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .values()
            .flatten()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(set: &Gridded1DSet<F>) -> u64 {
        let mut hasher = DefaultHasher::new();
        set.len().hash(&mut hasher);
        for &value in set.sample_values() {
            let value = to_f64(value);
            // Equal sets must hash equally, and -0.0 == 0.0.
            let value = if value == 0.0 { 0.0 } else { value };
            value.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

fn prune<T>(entries: &mut HashMap<u64, Vec<Weak<T>>>) {
    entries.retain(|_, bucket| {
        bucket.retain(|entry| entry.strong_count() > 0);
        !bucket.is_empty()
    });
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::set::SetFrame;

    fn set(values: Vec<f64>) -> Gridded1DSet<f64> {
        Gridded1DSet::from_values(SetFrame::generic(1), values).unwrap()
    }

    #[test]
    fn equal_sets_share_instance() {
        let interner = SetInterner::new();
        let first = interner.intern(set(vec![0.0, 1.0, 2.0]));
        let second = interner.intern(set(vec![0.0, 1.0, 2.0]));
        let other = interner.intern(set(vec![0.0, 1.0, 3.0]));
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn dropped_sets_are_not_reused() {
        let interner = SetInterner::new();
        let first = interner.intern(set(vec![0.0, 1.0]));
        drop(first);
        assert_eq!(interner.len(), 0);
        interner.purge();
        assert!(interner.is_empty());
        let again = interner.intern(set(vec![0.0, 1.0]));
        assert_eq!(Arc::strong_count(&again), 1);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn signed_zeros_share_instance() {
        let interner = SetInterner::new();
        let positive = interner.intern(set(vec![0.0, 1.0]));
        let negative = interner.intern(set(vec![-0.0, 1.0]));
        assert!(Arc::ptr_eq(&positive, &negative));
    }

    #[test]
    fn dead_buckets_are_dropped_when_interning() {
        let interner = SetInterner::new();
        for end in 1..10 {
            drop(interner.intern(set(vec![0.0, end as f64])));
        }
        let kept = interner.intern(set(vec![0.0, 20.0]));
        let entries = interner.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.values().next().unwrap().len(), 1);
        drop(entries);
        assert_eq!(interner.len(), 1);
        drop(kept);
    }
}
