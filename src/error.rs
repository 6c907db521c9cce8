// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Error types for the crate

#![deny(missing_docs)]

use std::{fmt, io};

use enum_as_inner::EnumAsInner;
use thiserror::Error;
use tracing::warn;

use crate::proto::error::ProtoError;
use crate::proto::rr::Name;
use crate::proto::serialize::txt::ParseError;

/// The error kind for errors that get returned in the crate
#[derive(Debug, EnumAsInner, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An error with an arbitrary message, referenced as &'static str
    #[error("{0}")]
    Message(&'static str),

    /// An error with an arbitrary message, stored as String
    #[error("{0}")]
    Msg(String),

    /// An error got returned from IO
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// An error got returned by the hickory-proto crate
    #[error("proto error: {0}")]
    Proto(#[from] ProtoError),

    /// The bundled or supplied root hints failed to parse
    #[error("root hints error: {0}")]
    RootHints(#[from] ParseError),

    /// The resolution depth budget ran out before the query completed
    #[error("recursion limit exceeded resolving {name} at depth {depth}")]
    RecursionLimitExceeded {
        /// Name being resolved when the budget ran out
        name: Name,
        /// Depth at which the query was abandoned
        depth: u8,
    },

    /// A request timed out
    #[error("request timed out")]
    Timeout,
}

/// The error type for errors that get returned in the crate
#[derive(Debug, Error)]
#[non_exhaustive]
pub struct Error {
    /// Kind of error that occurred
    pub kind: Box<ErrorKind>,
}

impl Error {
    /// Get the kind of the error
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns true if the query was abandoned because the recursion
    /// budget ran out
    pub fn is_recursion_limit_exceeded(&self) -> bool {
        matches!(*self.kind, ErrorKind::RecursionLimitExceeded { .. })
    }

    /// Checks `depth` against `limit`, logging and erroring when the
    /// budget is exhausted.
    pub(crate) fn recursion_exceeded(limit: u8, depth: u8, name: &Name) -> Result<(), Self> {
        if depth <= limit {
            return Ok(());
        }

        warn!("recursion limit exceeded for {name} at depth {depth}");
        Err(ErrorKind::RecursionLimitExceeded {
            name: name.clone(),
            depth,
        }
        .into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl<E> From<E> for Error
where
    E: Into<ErrorKind>,
{
    fn from(error: E) -> Self {
        Self {
            kind: Box::new(error.into()),
        }
    }
}

impl From<&'static str> for Error {
    fn from(msg: &'static str) -> Self {
        ErrorKind::Message(msg).into()
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        ErrorKind::Msg(msg).into()
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match *e.kind() {
            ErrorKind::Timeout => Self::new(io::ErrorKind::TimedOut, e),
            _ => Self::new(io::ErrorKind::Other, e),
        }
    }
}
