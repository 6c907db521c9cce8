//! Public query surface and configuration

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;

use crate::error::Error;
use crate::proto::rr::{IntoName, RecordType};
use crate::record::RecordEntry;
use crate::resolver_dns_handle::ResolverDnsHandle;

/// Cache capacity used when none (or zero) is requested.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Default deadline for a single exchange and for each probe rendezvous.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default bound on resolution depth.
pub const DEFAULT_MAX_RECURSION: u8 = 10;

/// Default number of name servers probed concurrently per delegation.
pub const DEFAULT_MAX_NAMESERVERS: usize = 2;

/// Default number of addresses tried per name server.
pub const DEFAULT_MAX_IPS: usize = 2;

/// Buffer size of the channel returned by [`Resolver::resolve_stream`].
const STREAM_BUFFER: usize = 20;

/// Configuration for a [`Resolver`].
///
/// ```
/// use std::time::Duration;
/// use rootwalk::ResolverOpts;
///
/// let opts = ResolverOpts {
///     timeout: Duration::from_millis(250),
///     ..ResolverOpts::default()
/// };
/// # let _ = opts;
/// ```
#[derive(Clone, Debug)]
pub struct ResolverOpts {
    /// Deadline for each exchange and for each parent iteration's wait on
    /// its probes
    pub timeout: Duration,
    /// Cap on resolution depth; exceeding it abandons the query
    pub max_recursion: u8,
    /// How many name servers to probe concurrently per parent iteration
    pub max_nameservers: usize,
    /// How many addresses to try for any single name server
    pub max_ips: usize,
    /// Cache capacity in names; `0` selects [`DEFAULT_CACHE_CAPACITY`]
    pub cache_capacity: usize,
    /// Replacement for the bundled root hints, in zone-file text form
    pub root_hints: Option<String>,
}

impl Default for ResolverOpts {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_recursion: DEFAULT_MAX_RECURSION,
            max_nameservers: DEFAULT_MAX_NAMESERVERS,
            max_ips: DEFAULT_MAX_IPS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            root_hints: None,
        }
    }
}

/// An iterative, caching DNS resolver.
///
/// The resolver walks the hierarchy down from the root hints, queries
/// authoritative name servers directly, and memoizes everything it learns
/// in a capacity-bounded cache shared across queries. Cloning hands out
/// another handle to the same cache.
#[derive(Clone)]
pub struct Resolver {
    handle: ResolverDnsHandle,
}

impl Resolver {
    /// Creates a resolver whose cache holds up to `cache_capacity` names;
    /// `0` selects the default of 10,000.
    pub fn new(cache_capacity: usize) -> Result<Self, Error> {
        Self::with_opts(ResolverOpts {
            cache_capacity,
            ..ResolverOpts::default()
        })
    }

    /// Creates a resolver from explicit options.
    pub fn with_opts(opts: ResolverOpts) -> Result<Self, Error> {
        Ok(Self {
            handle: ResolverDnsHandle::new(opts)?,
        })
    }

    /// Finds records of `qtype` for `qname`, walking the hierarchy from
    /// the closest cached delegation.
    ///
    /// Pass [`RecordType::ANY`] to accept any record type the resolver
    /// tracks (A, AAAA, NS, CNAME, TXT). A name a server reported as
    /// nonexistent resolves to `Ok` and empty; an error means the
    /// resolver gave up before the walk completed.
    pub async fn resolve<N: IntoName>(
        &self,
        qname: N,
        qtype: RecordType,
    ) -> Result<Vec<RecordEntry>, Error> {
        let qname = qname.into_name()?;
        self.handle.resolve(qname, qtype, 0).await
    }

    /// Streaming form of [`resolve`](Self::resolve).
    ///
    /// Records arrive through a bounded channel that is closed on every
    /// exit path — success, NXDOMAIN, timeout, recursion limit, even a
    /// panic in the resolving task — so draining it never deadlocks.
    /// Must be called from within a tokio runtime.
    pub fn resolve_stream<N: IntoName>(
        &self,
        qname: N,
        qtype: RecordType,
    ) -> mpsc::Receiver<RecordEntry> {
        let (records, stream) = mpsc::channel(STREAM_BUFFER);

        let qname = match qname.into_name() {
            Ok(qname) => qname,
            Err(e) => {
                // Dropping the sender closes the stream immediately.
                warn!("not resolving unparseable name: {e}");
                return stream;
            }
        };

        let handle = self.handle.clone();
        tokio::spawn(async move {
            if let Ok(rrs) = handle.resolve(qname, qtype, 0).await {
                for rr in rrs {
                    if records.send(rr).await.is_err() {
                        break;
                    }
                }
            }
        });

        stream
    }

    /// Number of names currently held in the cache.
    pub fn cache_len(&self) -> usize {
        self.handle.cache().len()
    }
}
