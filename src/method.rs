//! HTTP method as a typed enum.
//!
//! Covers the RFC 9110 standard methods by name. Anything else a client
//! sends (`PURGE`, WebDAV verbs, ...) is carried as [`Method::Extension`] so
//! it still runs through the middleware chain; the router answers it with
//! `405` unless a method-less pattern matches.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// An HTTP method.
///
/// The declaration order doubles as the sort order used when the router
/// reports the methods allowed for a path.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Connect,
    Trace,
    /// A method token outside RFC 9110, as received on the wire.
    Extension(Box<str>),
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connect      => "CONNECT",
            Self::Delete       => "DELETE",
            Self::Get          => "GET",
            Self::Head         => "HEAD",
            Self::Options      => "OPTIONS",
            Self::Patch        => "PATCH",
            Self::Post         => "POST",
            Self::Put          => "PUT",
            Self::Trace        => "TRACE",
            Self::Extension(m) => m,
        }
    }

    /// Maps hyper's method type onto ours. Never fails: hyper has already
    /// validated the token.
    pub fn from_http(method: &http::Method) -> Self {
        method.as_str().parse()
            .unwrap_or_else(|_| Self::Extension(method.as_str().into()))
    }
}

/// Parses a standard method name (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
///
/// Only the RFC 9110 names parse; route patterns use this to catch typos.
impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" => Ok(Self::Connect),
            "DELETE"  => Ok(Self::Delete),
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            "TRACE"   => Ok(Self::Trace),
            other     => Err(Error::UnknownMethod(other.to_owned())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
