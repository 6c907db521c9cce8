// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Projection of wire records into cacheable name/type/value triples

use std::fmt;

use crate::proto::rr::{rdata, Name, RData, Record, RecordType};

/// A single resolved DNS record in rendered form.
///
/// Only the record types the resolver tracks (`A`, `AAAA`, `NS`, `CNAME`,
/// and `TXT`) are ever represented; everything else is dropped during
/// conversion. Equality is structural over all three fields, so identical
/// records collapse to one inside the cache.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordEntry {
    /// Owner name in canonical form (lowercase, fully qualified)
    pub name: Name,
    /// Type of the rendered value
    pub record_type: RecordType,
    /// Rendered right-hand side: dotted-quad for `A`, textual IPv6 for
    /// `AAAA`, the target name for `NS` and `CNAME`, tab-joined character
    /// strings for `TXT`
    pub value: String,
}

impl RecordEntry {
    /// Constructs an entry from its parts.
    pub fn new(name: Name, record_type: RecordType, value: impl Into<String>) -> Self {
        Self {
            name,
            record_type,
            value: value.into(),
        }
    }

    /// Projects a wire record into a cacheable triple, lowercasing the
    /// owner name.
    ///
    /// Returns `None` for record types the resolver does not track.
    pub fn from_record(record: &Record) -> Option<Self> {
        let value = match record.data()? {
            RData::A(rdata::A(addr)) => addr.to_string(),
            RData::AAAA(rdata::AAAA(addr)) => addr.to_string(),
            RData::NS(rdata::NS(target)) => target.to_string(),
            RData::CNAME(rdata::CNAME(target)) => target.to_string(),
            RData::TXT(txt) => txt
                .iter()
                .map(|chars| String::from_utf8_lossy(chars))
                .collect::<Vec<_>>()
                .join("\t"),
            _ => return None,
        };

        Some(Self {
            name: crate::canonicalize(record.name()),
            record_type: record.record_type(),
            value,
        })
    }
}

impl fmt::Display for RecordEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t      3600\tIN\t{}\t{}",
            self.name, self.record_type, self.value
        )
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use super::*;

    fn name(name: &str) -> Name {
        Name::from_ascii(name).unwrap()
    }

    #[test]
    fn converts_and_lowercases_a_records() {
        let record = Record::from_rdata(
            name("WWW.Example.COM."),
            3600,
            RData::A(rdata::A(Ipv4Addr::new(192, 0, 2, 1))),
        );

        let rr = RecordEntry::from_record(&record).unwrap();
        assert_eq!(rr.name.to_string(), "www.example.com.");
        assert_eq!(rr.record_type, RecordType::A);
        assert_eq!(rr.value, "192.0.2.1");
    }

    #[test]
    fn renders_aaaa_records_as_textual_ipv6() {
        let record = Record::from_rdata(
            name("example.com."),
            3600,
            RData::AAAA(rdata::AAAA(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1))),
        );

        let rr = RecordEntry::from_record(&record).unwrap();
        assert_eq!(rr.record_type, RecordType::AAAA);
        assert_eq!(rr.value, "2001:db8::1");
    }

    #[test]
    fn renders_ns_targets_with_a_trailing_dot() {
        let record = Record::from_rdata(
            name("example.com."),
            3600,
            RData::NS(rdata::NS(name("ns1.example.com."))),
        );

        let rr = RecordEntry::from_record(&record).unwrap();
        assert_eq!(rr.record_type, RecordType::NS);
        assert_eq!(rr.value, "ns1.example.com.");
    }

    #[test]
    fn joins_txt_character_strings_with_tabs() {
        let record = Record::from_rdata(
            name("example.com."),
            3600,
            RData::TXT(rdata::TXT::new(vec![
                "v=spf1".to_string(),
                "-all".to_string(),
            ])),
        );

        assert_eq!(RecordEntry::from_record(&record).unwrap().value, "v=spf1\t-all");
    }

    #[test]
    fn unsupported_types_are_dropped() {
        let record = Record::from_rdata(
            name("example.com."),
            3600,
            RData::MX(rdata::MX::new(10, name("mail.example.com."))),
        );

        assert!(RecordEntry::from_record(&record).is_none());
    }

    #[test]
    fn display_matches_the_dig_like_form() {
        let rr = RecordEntry::new(name("example.com."), RecordType::A, "192.0.2.1");
        assert_eq!(rr.to_string(), "example.com.\t      3600\tIN\tA\t192.0.2.1");
    }

    #[test]
    fn conversion_round_trips_through_equality() {
        let record = Record::from_rdata(
            name("example.com."),
            3600,
            RData::A(rdata::A(Ipv4Addr::new(192, 0, 2, 1))),
        );

        assert_eq!(
            RecordEntry::from_record(&record),
            RecordEntry::from_record(&record)
        );
    }
}
