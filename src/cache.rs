// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Capacity-bounded record storage shared across queries

use std::collections::HashSet;
use std::sync::Arc;

use lru_cache::LruCache;
use parking_lot::Mutex;

use crate::proto::rr::Name;
use crate::record::RecordEntry;

/// A least-recently-used map from a canonical name to every record known
/// for it.
///
/// An entry holding an empty set means the name is known but yielded no
/// records — the tombstone shape used for NXDOMAIN — which is distinct
/// from the name being absent altogether. Both reads and writes promote
/// the touched entry; once the capacity is exceeded the least recently
/// used entry is dropped.
#[derive(Clone)]
pub(crate) struct RecordCache {
    inner: Arc<Mutex<LruCache<Name, HashSet<RecordEntry>>>>,
}

impl RecordCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Returns a snapshot of the records stored for `name`, or `None` if
    /// the name has never been seen. The snapshot is detached from any
    /// later mutation.
    pub(crate) fn get(&self, name: &Name) -> Option<Vec<RecordEntry>> {
        let mut cache = self.inner.lock();
        cache.get_mut(name).map(|rrs| rrs.iter().cloned().collect())
    }

    /// Inserts `records` under `name`, creating the entry if needed.
    ///
    /// Called with no records to materialize an empty entry, e.g. after a
    /// server answered NXDOMAIN.
    pub(crate) fn add(&self, name: &Name, records: impl IntoIterator<Item = RecordEntry>) {
        let mut cache = self.inner.lock();
        if let Some(rrs) = cache.get_mut(name) {
            rrs.extend(records);
            return;
        }
        cache.insert(name.clone(), records.into_iter().collect());
    }

    /// Number of live entries.
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use crate::proto::rr::RecordType;

    use super::*;

    fn name(name: &str) -> Name {
        Name::from_ascii(name).unwrap()
    }

    fn a_record(name: &Name) -> RecordEntry {
        RecordEntry::new(name.clone(), RecordType::A, "192.0.2.1")
    }

    #[test]
    fn absent_and_empty_are_distinct() {
        let cache = RecordCache::new(4);
        let qname = name("a.example.");

        assert!(cache.get(&qname).is_none());

        cache.add(&qname, []);
        assert_eq!(cache.get(&qname).unwrap(), vec![]);
    }

    #[test]
    fn identical_records_collapse() {
        let cache = RecordCache::new(4);
        let qname = name("a.example.");

        cache.add(&qname, [a_record(&qname), a_record(&qname)]);
        cache.add(&qname, [a_record(&qname)]);

        assert_eq!(cache.get(&qname).unwrap().len(), 1);
    }

    #[test]
    fn capacity_bounds_the_entry_count() {
        let cache = RecordCache::new(2);
        for host in ["a.example.", "b.example.", "c.example."] {
            let qname = name(host);
            cache.add(&qname, [a_record(&qname)]);
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&name("a.example.")).is_none());
        assert!(cache.get(&name("c.example.")).is_some());
    }

    #[test]
    fn get_promotes_against_eviction() {
        let cache = RecordCache::new(2);
        let (a, b, c) = (name("a.example."), name("b.example."), name("c.example."));

        cache.add(&a, [a_record(&a)]);
        cache.add(&b, [a_record(&b)]);
        let _ = cache.get(&a);
        cache.add(&c, [a_record(&c)]);

        assert!(cache.get(&b).is_none());
        assert!(cache.get(&a).is_some());
    }

    #[test]
    fn add_promotes_existing_entries() {
        let cache = RecordCache::new(2);
        let (a, b, c) = (name("a.example."), name("b.example."), name("c.example."));

        cache.add(&a, [a_record(&a)]);
        cache.add(&b, [a_record(&b)]);
        cache.add(&a, []);
        cache.add(&c, [a_record(&c)]);

        assert!(cache.get(&b).is_none());
        assert!(cache.get(&a).is_some());
    }

    #[test]
    fn snapshots_are_detached_from_later_writes() {
        let cache = RecordCache::new(4);
        let qname = name("a.example.");

        cache.add(&qname, [a_record(&qname)]);
        let snapshot = cache.get(&qname).unwrap();
        cache.add(
            &qname,
            [RecordEntry::new(qname.clone(), RecordType::TXT, "texture")],
        );

        assert_eq!(snapshot.len(), 1);
        assert_eq!(cache.get(&qname).unwrap().len(), 2);
    }
}
