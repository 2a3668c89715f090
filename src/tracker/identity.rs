//! Identity allocation for tracked objects.
//!
//! Each tracker owns an [`IdentityFactory`] handing out per-tracker
//! initializing ids and permanent ids. Permanent ids are paired with a
//! global id drawn from a process-wide sequence shared by every tracker,
//! so objects can be told apart across tracker instances.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter backing the `global_id` sequence.
static GLOBAL_OBJECT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Reset the process-wide global id counter.
///
/// Only meant for tests that assert exact global id values; calling this
/// while any tracker is live breaks global id uniqueness.
pub fn reset_global_object_counter() {
    GLOBAL_OBJECT_COUNTER.store(0, Ordering::SeqCst);
}

/// Mints initializing and permanent ids for one tracker instance.
///
/// All counters start at 1 and are atomic, so id allocation never produces
/// duplicates even when trackers run on separate threads. The counters are
/// 64-bit; wrap-around is unreachable over any practical tracker lifetime.
#[derive(Debug, Default)]
pub struct IdentityFactory {
    initializing_count: AtomicU64,
    object_count: AtomicU64,
}

impl IdentityFactory {
    /// Next id for an object entering its initializing phase.
    pub fn next_initializing_id(&self) -> u64 {
        self.initializing_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Next `(id, global_id)` pair for a promoted object.
    ///
    /// The first value is per-factory monotonic, the second is drawn from
    /// the process-wide sequence.
    pub fn next_ids(&self) -> (u64, u64) {
        let instance_id = self.object_count.fetch_add(1, Ordering::SeqCst) + 1;
        let global_id = GLOBAL_OBJECT_COUNTER.fetch_add(1, Ordering::SeqCst) + 1;
        (instance_id, global_id)
    }

    /// Number of permanent ids issued by this factory so far.
    pub fn object_count(&self) -> u64 {
        self.object_count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn initializing_ids_count_up_from_one() {
        let factory = IdentityFactory::default();
        assert_eq!(factory.next_initializing_id(), 1);
        assert_eq!(factory.next_initializing_id(), 2);
        assert_eq!(factory.next_initializing_id(), 3);
    }

    #[test]
    fn permanent_ids_are_per_factory() {
        let a = IdentityFactory::default();
        let b = IdentityFactory::default();
        let (id_a, _) = a.next_ids();
        let (id_b, _) = b.next_ids();
        assert_eq!(id_a, 1);
        assert_eq!(id_b, 1);
        assert_eq!(a.object_count(), 1);
    }

    #[test]
    fn global_ids_are_unique_across_concurrent_factories() {
        const IDS_PER_FACTORY: usize = 10_000;

        let factories = [
            Arc::new(IdentityFactory::default()),
            Arc::new(IdentityFactory::default()),
        ];
        let handles: Vec<_> = factories
            .iter()
            .map(|factory| {
                let factory = Arc::clone(factory);
                std::thread::spawn(move || {
                    (0..IDS_PER_FACTORY)
                        .map(|_| factory.next_ids().1)
                        .collect::<Vec<u64>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let globals = handle.join().unwrap();
            // strictly increasing within each factory's own sequence of draws
            assert!(globals.windows(2).all(|w| w[0] < w[1]));
            seen.extend(globals);
        }
        assert_eq!(seen.len(), 2 * IDS_PER_FACTORY);
    }
}
