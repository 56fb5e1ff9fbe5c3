//! Free lists for animated value records
//!
//! Value records churn every time a property is animated, so detached records
//! are reset and parked here, one list per concrete record type, until the
//! next attachment of the same kind.

use std::any::TypeId;

use rustc_hash::FxHashMap;

use crate::track::Track;

/// Per-kind free lists owned by the scheduler
pub(crate) struct ValuePool {
    free: FxHashMap<TypeId, Vec<Box<dyn Track>>>,
    capacity: usize,
}

impl ValuePool {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            free: FxHashMap::default(),
            capacity,
        }
    }

    /// Take a recycled record of kind `V`, or allocate a fresh one
    pub(crate) fn acquire<V: Track + Default>(&mut self) -> Box<V> {
        self.free
            .get_mut(&TypeId::of::<V>())
            .and_then(|list| list.pop())
            .and_then(|track| track.into_any().downcast::<V>().ok())
            .unwrap_or_default()
    }

    /// Park a detached record; records beyond capacity are dropped
    pub(crate) fn release(&mut self, mut track: Box<dyn Track>) {
        track.reset();
        let list = self.free.entry(track.kind()).or_default();
        if list.len() < self.capacity {
            list.push(track);
        }
    }

    pub(crate) fn len_of<V: Track>(&self) -> usize {
        self.free.get(&TypeId::of::<V>()).map_or(0, Vec::len)
    }

    pub(crate) fn clear(&mut self) {
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{AnimatedValue, CustomTrack};

    #[test]
    fn test_release_then_acquire_reuses() {
        let mut pool = ValuePool::new(4);
        let record: Box<AnimatedValue<f32>> = pool.acquire();
        pool.release(record);
        assert_eq!(pool.len_of::<AnimatedValue<f32>>(), 1);
        assert_eq!(pool.len_of::<CustomTrack>(), 0);

        let again: Box<AnimatedValue<f32>> = pool.acquire();
        assert!(again.start().is_none());
        assert_eq!(pool.len_of::<AnimatedValue<f32>>(), 0);
    }

    #[test]
    fn test_kinds_are_separate() {
        let mut pool = ValuePool::new(4);
        pool.release(Box::<AnimatedValue<f32>>::default());
        pool.release(Box::<CustomTrack>::default());

        let _colors: Box<AnimatedValue<glide_core::Color>> = pool.acquire();
        assert_eq!(pool.len_of::<AnimatedValue<f32>>(), 1);
        assert_eq!(pool.len_of::<CustomTrack>(), 1);
    }

    #[test]
    fn test_capacity_is_respected() {
        let mut pool = ValuePool::new(2);
        for _ in 0..5 {
            pool.release(Box::<CustomTrack>::default());
        }
        assert_eq!(pool.len_of::<CustomTrack>(), 2);
    }
}
