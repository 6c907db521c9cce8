//! An iterative, caching DNS resolver.
//!
//! `rootwalk` discovers DNS records without delegating to a recursive
//! resolver: starting from the bundled root hints it walks the hierarchy
//! parent-ward, queries authoritative name servers directly, and caches
//! every record it learns along the way. It trades strict correctness
//! guarantees for liveness — whatever records it can obtain within its
//! time budget are surfaced to the caller rather than waiting on slow or
//! broken name servers.
//!
//! ```no_run
//! use rootwalk::{proto::rr::RecordType, Resolver};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), rootwalk::Error> {
//! let resolver = Resolver::new(0)?;
//! for record in resolver.resolve("example.com", RecordType::A).await? {
//!     println!("{record}");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(
    clippy::default_trait_access,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::unimplemented,
    missing_copy_implementations,
    missing_docs,
    non_snake_case,
    non_upper_case_globals,
    rust_2018_idioms,
    unreachable_pub
)]
#![allow(clippy::single_component_path_imports)]

pub mod error;

mod cache;
mod exchange;
mod record;
mod resolver;
mod resolver_dns_handle;
mod root_hints;

pub use error::{Error, ErrorKind};
pub use hickory_proto as proto;
pub use record::RecordEntry;
pub use resolver::{
    Resolver, ResolverOpts, DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_IPS, DEFAULT_MAX_NAMESERVERS,
    DEFAULT_MAX_RECURSION, DEFAULT_TIMEOUT,
};

use hickory_proto::rr::Name;

/// Returns the canonical form of `name`: lowercase and fully qualified.
pub(crate) fn canonicalize(name: &Name) -> Name {
    let mut name = name.to_lowercase();
    name.set_fqdn(true);
    name
}

/// Returns `name` with its leftmost label removed, or `None` for the root.
pub(crate) fn parent_name(name: &Name) -> Option<Name> {
    if name.is_root() {
        None
    } else {
        Some(name.base_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_lowercases_and_qualifies() {
        let name = Name::from_ascii("WWW.Example.COM").unwrap();
        let canonical = canonicalize(&name);
        assert!(canonical.is_fqdn());
        assert_eq!(canonical.to_string(), "www.example.com.");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let name = canonicalize(&Name::from_ascii("example.com.").unwrap());
        assert_eq!(canonicalize(&name), name);
    }

    #[test]
    fn parent_walk_terminates_at_the_root() {
        let mut name = Name::from_ascii("www.example.com.").unwrap();
        let mut seen = Vec::new();
        while let Some(parent) = parent_name(&name) {
            seen.push(parent.to_string());
            name = parent;
        }
        assert_eq!(seen, ["example.com.", "com.", "."]);
    }

    #[test]
    fn the_root_has_no_parent() {
        assert!(parent_name(&Name::root()).is_none());
    }
}
