//! Unified error type.

use thiserror::Error;

/// The error type returned by tollgate's fallible operations.
///
/// Application-level outcomes (401, 404, 405) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// startup failures: malformed or conflicting routes and binding to a port.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid listen address `{addr}`: {reason}")]
    InvalidAddr { addr: String, reason: String },

    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("route `{pattern}` conflicts with already registered `{existing}`")]
    RouteConflict { pattern: String, existing: String },

    #[error("unknown http method `{0}`")]
    UnknownMethod(String),
}
