//! The iterative resolution engine: parent walk, concurrent probes, and
//! the CNAME chase

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;

use async_recursion::async_recursion;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cache::RecordCache;
use crate::error::Error;
use crate::exchange::exchange;
use crate::proto::op::{Message, ResponseCode};
use crate::proto::rr::{Name, RecordType};
use crate::record::RecordEntry;
use crate::resolver::{ResolverOpts, DEFAULT_CACHE_CAPACITY};
use crate::root_hints::{RootHints, ROOT_ZONE};
use crate::{canonicalize, parent_name};

/// Engine state shared by every in-flight query and probe.
///
/// Cloning is cheap; all mutable state lives behind the cache lock, so a
/// probe that outlives its parent iteration still writes into the same
/// cache.
#[derive(Clone)]
pub(crate) struct ResolverDnsHandle {
    cache: RecordCache,
    roots: Arc<RootHints>,
    opts: Arc<ResolverOpts>,
}

impl ResolverDnsHandle {
    pub(crate) fn new(opts: ResolverOpts) -> Result<Self, Error> {
        let roots = RootHints::from_zone(opts.root_hints.as_deref().unwrap_or(ROOT_ZONE))?;

        let capacity = match opts.cache_capacity {
            0 => DEFAULT_CACHE_CAPACITY,
            capacity => capacity,
        };

        // Seed through the normal insertion path. The seeds occupy the
        // oldest LRU slots and may be evicted under pressure; the hint
        // store above keeps answering for them regardless.
        let cache = RecordCache::new(capacity);
        for (name, records) in roots.entries() {
            cache.add(name, records.iter().cloned());
        }

        Ok(Self {
            cache,
            roots: Arc::new(roots),
            opts: Arc::new(opts),
        })
    }

    pub(crate) fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// Resolves `(qname, qtype)` iteratively, consulting and feeding the
    /// shared cache.
    ///
    /// `Ok` with records is a completed resolution. `Ok` with an empty
    /// vec means the name is known — NXDOMAIN, or live with nothing of
    /// the requested type. `Err` means the resolver gave up.
    #[async_recursion]
    pub(crate) async fn resolve(
        &self,
        qname: Name,
        qtype: RecordType,
        mut depth: u8,
    ) -> Result<Vec<RecordEntry>, Error> {
        depth += 1;
        Error::recursion_exceeded(self.opts.max_recursion, depth, &qname)?;

        let qname = canonicalize(&qname);
        if let Some(records) = self.cache_get(&qname, qtype) {
            return Ok(records);
        }

        debug!("resolving {qname} {qtype} at depth {depth}");
        let start = Instant::now();
        let result = self.iterate_parents(&qname, qtype, depth).await;
        debug!("resolved {qname} {qtype} in {:?}", start.elapsed());
        result
    }

    /// Walks parent-ward from `qname`, probing each ancestor's delegation
    /// until a name server answers or the hierarchy is exhausted.
    async fn iterate_parents(
        &self,
        qname: &Name,
        qtype: RecordType,
        depth: u8,
    ) -> Result<Vec<RecordEntry>, Error> {
        // Probes signal the first success here. The buffered slot keeps a
        // late signal visible to the next iteration of the walk.
        let (success, mut first_success) = mpsc::channel::<()>(1);

        let mut pname = qname.clone();
        loop {
            // NS records for a name live in its parent zone; skip straight
            // to the parent when asked for them.
            let skip = qtype == RecordType::NS && pname == *qname;
            if !skip {
                if qname.num_labels() >= 2 && pname.is_root() {
                    warn!("non-TLD query at root: dig +norecurse {qname} {qtype}");
                    return Err(Error::from(format!(
                        "no delegation found between {qname} and the root"
                    )));
                }

                let nrrs = self.resolve(pname.clone(), RecordType::NS, depth).await?;

                let mut launched = 0;
                for nrr in &nrrs {
                    // A probe from an earlier iteration may already have
                    // filled the cache.
                    if qtype != RecordType::ANY {
                        if let Some(records) = self.cache_get(qname, qtype) {
                            return Ok(records);
                        }
                    }
                    if nrr.record_type != RecordType::NS {
                        continue;
                    }
                    let Ok(ns_name) = Name::from_ascii(&nrr.value) else {
                        continue;
                    };
                    launched += 1;
                    if launched > self.opts.max_nameservers {
                        break;
                    }

                    let handle = self.clone();
                    let success = success.clone();
                    let (probe_qname, probe_qtype) = (qname.clone(), qtype);
                    tokio::spawn(async move {
                        handle
                            .probe(success, ns_name, probe_qname, probe_qtype, depth)
                            .await;
                    });
                }

                if launched > 0 {
                    if tokio::time::timeout(self.opts.timeout, first_success.recv())
                        .await
                        .is_ok()
                    {
                        return Ok(self.resolve_cnames(qname, qtype, depth).await);
                    }
                    // No probe answered within the budget; try the parent.
                } else if qtype == RecordType::NS {
                    // NS queries recurse through the walk itself; no
                    // delegation here means there is nothing further down.
                    return Ok(Vec::new());
                }
            }

            pname = match parent_name(&pname) {
                Some(parent) => parent,
                None => break,
            };
        }

        Err(Error::from(format!(
            "no authoritative answer for {qname} {qtype}"
        )))
    }

    /// One name-server attempt: discover the server's addresses, then try
    /// them in turn until an exchange completes.
    async fn probe(
        &self,
        success: mpsc::Sender<()>,
        ns_name: Name,
        qname: Name,
        qtype: RecordType,
        depth: u8,
    ) {
        // ANY is never sent on the wire; an address query stands in.
        let wire_type = match qtype {
            RecordType::ANY => RecordType::A,
            qtype => qtype,
        };

        // IPv4 contact only; AAAA records are cached but never dialed.
        let Ok(addresses) = self.resolve(ns_name, RecordType::A, depth).await else {
            return;
        };

        let mut attempts = 0;
        for address in addresses
            .iter()
            .filter(|rr| rr.record_type == RecordType::A)
        {
            attempts += 1;
            if attempts > self.opts.max_ips {
                return;
            }
            let Ok(server) = address.value.parse::<Ipv4Addr>() else {
                continue;
            };

            let start = Instant::now();
            match exchange(server, &qname, wire_type, self.opts.timeout).await {
                Ok(response) => {
                    debug!(
                        "exchange in {:?}: dig +norecurse @{server} {qname} {wire_type}",
                        start.elapsed()
                    );

                    if response.response_code() == ResponseCode::NXDomain {
                        // Tombstone: the name is now known not to exist.
                        self.cache.add(&qname, []);
                    }
                    self.save_records(server, &qname, qtype, &response);

                    // First success wins; a full buffer means another
                    // probe already signalled.
                    let _ = success.try_send(());
                    return;
                }
                Err(e) => {
                    debug!(
                        "exchange failed in {:?}: dig +norecurse @{server} {qname} {wire_type}: {e}",
                        start.elapsed()
                    );
                }
            }
        }
    }

    /// Drains the cache entry for `qname`, following any CNAMEs by
    /// re-resolving their targets for the original type and folding the
    /// results back under `qname`.
    async fn resolve_cnames(
        &self,
        qname: &Name,
        qtype: RecordType,
        depth: u8,
    ) -> Vec<RecordEntry> {
        let mut records = Vec::new();

        let snapshot = self
            .cache_get(qname, RecordType::ANY)
            .unwrap_or_default();
        for crr in &snapshot {
            records.push(crr.clone());
            if crr.record_type != RecordType::CNAME {
                continue;
            }
            debug!("following CNAME at depth {depth}: {crr}");
            let Ok(target) = Name::from_ascii(&crr.value) else {
                continue;
            };
            // A failed chase only ends the chase; everything gathered so
            // far still stands.
            let Ok(chased) = self.resolve(target, qtype, depth).await else {
                continue;
            };
            for rr in chased {
                self.cache.add(qname, [rr.clone()]);
                records.push(rr);
            }
        }

        records
    }

    /// Cache lookup with the resolver's read-side semantics.
    ///
    /// `None` is a miss. An empty snapshot — known NXDOMAIN, or an
    /// iteration that completed without answers — comes back as-is. A
    /// populated entry is filtered by `qtype`, except that ANY and NS
    /// lookups fall back to the whole entry when nothing matches: the
    /// walk only needs to learn that the name is live to keep moving.
    fn cache_get(&self, qname: &Name, qtype: RecordType) -> Option<Vec<RecordEntry>> {
        let any = match self.cache.get(qname) {
            Some(records) => records,
            None => self.roots.get(qname)?,
        };
        if any.is_empty() {
            return Some(any);
        }

        let records: Vec<RecordEntry> = any
            .iter()
            .filter(|rr| qtype == RecordType::ANY || rr.record_type == qtype)
            .cloned()
            .collect();
        if !records.is_empty() {
            return Some(records);
        }
        if matches!(qtype, RecordType::ANY | RecordType::NS) {
            return Some(any);
        }
        None
    }

    /// Filters a response through the poisoning rule and writes the
    /// survivors into the cache grouped by owner name.
    ///
    /// A server answering for `qname` must not delegate names above its
    /// own cut, so NS records owning fewer labels than the query are
    /// dropped; the rest of the response is retained.
    fn save_records(
        &self,
        server: Ipv4Addr,
        qname: &Name,
        qtype: RecordType,
        response: &Message,
    ) {
        let qname_labels = qname.num_labels();
        let mut by_name: HashMap<Name, Vec<RecordEntry>> = HashMap::new();

        let sections = response
            .answers()
            .iter()
            .chain(response.name_servers())
            .chain(response.additionals());
        for record in sections {
            if record.record_type() == RecordType::NS
                && record.name().num_labels() < qname_labels
            {
                warn!("potential poisoning: dig +norecurse @{server} {qname} {qtype} -> {record}");
                continue;
            }
            let Some(rr) = RecordEntry::from_record(record) else {
                continue;
            };
            by_name.entry(rr.name.clone()).or_default().push(rr);
        }

        for (name, records) in by_name {
            self.cache.add(&name, records);
        }
    }
}
