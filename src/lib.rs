//! # tollgate
//!
//! A minimal HTTP server whose only moving part is an ordered middleware
//! chain around a router.
//!
//! ## The pieces
//!
//! - [`Handler`] — one request in, one response out. Route handlers, the
//!   router and every middleware wrapper share this shape.
//! - [`Router`] — `"[METHOD ]PATH"` patterns on a radix tree via
//!   [`matchit`]. Duplicate patterns fail at registration.
//! - [`Chain`] — `[m0, m1, …, mk]` around `h` behaves as `m0(m1(…mk(h)))`.
//!   Declared order is execution order.
//! - [`Server`] — hyper on tokio, HTTP/1.1 and HTTP/2, graceful shutdown.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tollgate::middleware::{AuthGate, Chain, RequestLogger};
//! use tollgate::{handler_fn, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tollgate::Error> {
//!     let router = Router::new()
//!         .route("GET /users/{id}", handler_fn(get_user))?;
//!
//!     let app = Chain::new()
//!         .with(RequestLogger)
//!         .with(AuthGate::bearer("token"))
//!         .then(router);
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::text(format!("User ID: {id}"))
//! }
//! ```

mod app;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use app::{ApiServer, API_PREFIX, SHARED_TOKEN};
pub use error::Error;
pub use handler::{handler_fn, BoxFuture, BoxedHandler, FnHandler, Handler};
pub use method::Method;
pub use middleware::{Chain, Middleware};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::{Dispatch, Router};
pub use server::Server;
