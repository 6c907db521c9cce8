// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The root zone hints, parsed once at resolver construction

use std::collections::HashMap;

use crate::error::Error;
use crate::proto::rr::Name;
use crate::proto::serialize::txt::Parser;
use crate::record::RecordEntry;

/// The bundled root hints, in master-file form.
pub(crate) const ROOT_ZONE: &str = include_str!("../root.zone");

/// Immutable record set for the root zone.
///
/// Seeds the cache at construction and backstops cache misses afterwards,
/// so a delegation walk can always restart from the root even after the
/// seeded entries have been evicted under capacity pressure.
pub(crate) struct RootHints {
    records: HashMap<Name, Vec<RecordEntry>>,
}

impl RootHints {
    /// Parses zone text into a hint store, dropping unsupported record
    /// types.
    pub(crate) fn from_zone(zone: &str) -> Result<Self, Error> {
        let (_origin, rrsets) = Parser::new(zone, None, Some(Name::root())).parse()?;

        let mut records: HashMap<Name, Vec<RecordEntry>> = HashMap::new();
        for rrset in rrsets.values() {
            for record in rrset.records_without_rrsigs() {
                if let Some(rr) = RecordEntry::from_record(record) {
                    records.entry(rr.name.clone()).or_default().push(rr);
                }
            }
        }

        Ok(Self { records })
    }

    /// Returns the hint records owned by `name`, if any.
    pub(crate) fn get(&self, name: &Name) -> Option<Vec<RecordEntry>> {
        self.records.get(name).cloned()
    }

    /// Iterates every hinted name with its records.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&Name, &Vec<RecordEntry>)> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::proto::rr::RecordType;

    use super::*;

    #[test]
    fn bundled_zone_lists_thirteen_root_servers() {
        let hints = RootHints::from_zone(ROOT_ZONE).unwrap();
        let roots = hints.get(&Name::root()).unwrap();

        let ns = roots
            .iter()
            .filter(|rr| rr.record_type == RecordType::NS)
            .count();
        assert_eq!(ns, 13);
    }

    #[test]
    fn glue_is_indexed_by_server_name() {
        let hints = RootHints::from_zone(ROOT_ZONE).unwrap();
        let a_root = hints
            .get(&Name::from_ascii("a.root-servers.net.").unwrap())
            .unwrap();

        assert!(a_root
            .iter()
            .any(|rr| rr.record_type == RecordType::A && rr.value == "198.41.0.4"));
        assert!(a_root
            .iter()
            .any(|rr| rr.record_type == RecordType::AAAA));
    }

    #[test]
    fn every_hint_is_stored_under_its_owner_name() {
        let hints = RootHints::from_zone(ROOT_ZONE).unwrap();
        for (name, records) in hints.entries() {
            assert!(records.iter().all(|rr| rr.name == *name));
        }
    }

    #[test]
    fn unknown_names_are_absent() {
        let hints = RootHints::from_zone(ROOT_ZONE).unwrap();
        assert!(hints
            .get(&Name::from_ascii("example.com.").unwrap())
            .is_none());
    }

    #[test]
    fn unparseable_zone_text_is_an_error() {
        assert!(RootHints::from_zone("definitely not a zone file").is_err());
    }
}
