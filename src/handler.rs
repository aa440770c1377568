//! Handler trait and type erasure.
//!
//! # One shape for every stage
//!
//! A terminal route handler, the router, and whatever a middleware returns
//! from [`wrap`](crate::middleware::Middleware::wrap) all share a single
//! object-safe interface: [`Handler`]. That is what lets a chain nest an
//! arbitrary number of stages without knowing their concrete types.
//!
//! The path from user code to a vtable call is:
//!
//! ```text
//! async fn get_user(req: Request) -> Response { … }   ← user writes this
//!        ↓ handler_fn(get_user)
//! FnHandler(get_user)                                  ← implements Handler
//!        ↓ Arc::new(..) inside Router / Chain
//! BoxedHandler = Arc<dyn Handler>                      ← shared, type-erased
//!        ↓
//! handler.call(req)  at request time                   ← one vtable dispatch
//!        ↓
//! Box::pin(async { get_user(req).await.into_response() })  ← BoxFuture
//! ```
//!
//! The runtime cost per stage is one `Arc` clone and one virtual call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Send + 'static` lets tokio move the future across worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn Handler>;

/// Processes one request and produces one response.
///
/// Implementations must be stateless or synchronise their own state: the
/// same handler is called concurrently from every connection task.
///
/// The returned future must resolve. A handler (or middleware) that neither
/// delegates to its `next` stage nor builds a response of its own leaves the
/// connection hanging; nothing in the chain times it out.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call(&self, req: Request) -> BoxFuture {
        (**self).call(req)
    }
}

/// Turns an `async fn(Request) -> impl IntoResponse` into a [`Handler`].
///
/// ```rust
/// use tollgate::{handler_fn, Request, Response, Router};
///
/// async fn hello(_req: Request) -> Response {
///     Response::text("hello")
/// }
///
/// let router = Router::new().route("GET /", handler_fn(hello)).unwrap();
/// ```
pub fn handler_fn<F, Fut, R>(f: F) -> FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    FnHandler(f)
}

/// Newtype wrapper that holds a concrete function `F` and implements
/// [`Handler`], bridging the typed world to the trait-object world.
///
/// Obtain via [`handler_fn`].
#[derive(Clone, Copy)]
pub struct FnHandler<F>(F);

impl<F, Fut, R> Handler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        // Call the wrapped function to get the concrete `Fut`, then map it
        // to `Response` and box it so the signature matches the trait.
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
