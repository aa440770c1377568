//! Middleware layer.
//!
//! Middleware intercepts requests (and optionally responses) and is the
//! right place for cross-cutting concerns: request logging, credential
//! checks, request-id injection.
//!
//! # The contract
//!
//! A [`Middleware`] receives the handler that comes after it and returns a
//! new handler that wraps it. For every request the wrapper decides to
//! either delegate to `next` or short-circuit with a response of its own.
//! It must do one or the other: see [`Handler`].
//!
//! # Order
//!
//! A [`Chain`] of `[m0, m1, m2]` around `h` behaves exactly like
//! `m0(m1(m2(h)))`. The first middleware declared runs first on the way in
//! and last on the way out. To get there the builder wraps innermost-first,
//! walking the list back to front:
//!
//! ```text
//! next = h
//! next = m2.wrap(next)
//! next = m1.wrap(next)
//! next = m0.wrap(next)   ← the handler the server calls
//! ```
//!
//! Order is observable. `[RequestLogger, AuthGate]` logs every attempt,
//! rejected or not; `[AuthGate, RequestLogger]` logs only the requests that
//! got through.
//!
//! ```rust
//! use tollgate::middleware::{AuthGate, Chain, RequestLogger};
//! use tollgate::{handler_fn, Request};
//!
//! let app = Chain::new()
//!     .with(RequestLogger)
//!     .with(AuthGate::bearer("token"))
//!     .then(handler_fn(|_req: Request| async { "hello" }));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::handler::{BoxedHandler, Handler};

mod auth;
mod logger;

pub use auth::AuthGate;
pub use logger::RequestLogger;

/// A composable request-handling wrapper.
///
/// Any `Fn(BoxedHandler) -> BoxedHandler` closure is a middleware too, so
/// one-off wrappers do not need a named type.
pub trait Middleware: Send + Sync + 'static {
    /// Wrap `next`, returning the handler that runs this middleware's logic.
    ///
    /// Called once per chain construction, never per request.
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;

    /// Name reported by [`Chain::names`].
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> Middleware for F
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        self(next)
    }

    fn name(&self) -> &'static str {
        "fn"
    }
}

/// An ordered list of middlewares, applied around a terminal handler.
///
/// Build it once at startup. The chain only holds shared references to its
/// middlewares, so cloning it is cheap and the built handler can be called
/// from any number of connection tasks without locking.
#[derive(Clone, Default)]
pub struct Chain {
    layers: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware. Later middlewares sit closer to the terminal
    /// handler.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Middleware names in declared order.
    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|m| m.name()).collect()
    }

    /// Compose every middleware around `terminal`.
    ///
    /// An empty chain returns `terminal` itself.
    pub fn around(&self, terminal: BoxedHandler) -> BoxedHandler {
        let mut next = terminal;
        for layer in self.layers.iter().rev() {
            next = layer.wrap(next);
        }
        next
    }

    /// Like [`around`](Chain::around) for a handler that is not boxed yet.
    pub fn then(&self, terminal: impl Handler) -> BoxedHandler {
        self.around(Arc::new(terminal))
    }
}

/// A chain is a middleware itself, so chains nest: the inner chain runs, in
/// its own order, at the position it was declared in the outer one.
impl Middleware for Chain {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        self.around(next)
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
