//! The user-lookup API served by the `tollgate` binary.
//!
//! ```text
//! GET /api/v1/users/{userID}     Authorization: Bearer token
//!   → 200 "User ID: {userID}"
//! ```
//!
//! Every path sits behind `[RequestLogger, AuthGate]`, in that order, so
//! rejected attempts are logged too.

use crate::error::Error;
use crate::handler::{handler_fn, BoxedHandler};
use crate::middleware::{AuthGate, Chain, RequestLogger};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::server::Server;

/// Prefix every API route is mounted under.
pub const API_PREFIX: &str = "/api/v1";

/// Token the auth gate accepts, sent as `Authorization: Bearer token`.
pub const SHARED_TOKEN: &str = "token";

/// Everything the API server needs, fixed at construction.
///
/// Holds no global state: several instances can coexist in one process,
/// each listening on its own address.
#[derive(Clone, Debug)]
pub struct ApiServer {
    addr: String,
}

impl ApiServer {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// The versioned routes, mounted under [`API_PREFIX`].
    pub fn router() -> Result<Router, Error> {
        let v1 = Router::new().route("GET /users/{userID}", handler_fn(get_user))?;
        Router::new().nest(API_PREFIX, v1)
    }

    /// The middleware wrapped around every route.
    ///
    /// Swapping the two entries changes what gets logged: with the gate
    /// first, unauthorized attempts never reach the logger.
    pub fn middleware() -> Chain {
        Chain::new()
            .with(RequestLogger)
            .with(AuthGate::bearer(SHARED_TOKEN))
    }

    /// The complete request pipeline. Route errors surface here, before
    /// anything is bound.
    pub fn handler(&self) -> Result<BoxedHandler, Error> {
        Ok(Self::middleware().then(Self::router()?))
    }

    /// Builds the pipeline, binds, and serves until shutdown.
    ///
    /// A bind failure (address in use, bad address) is returned to the
    /// caller; there is no retry.
    pub async fn run(self) -> Result<(), Error> {
        let app = self.handler()?;
        Server::bind(&self.addr)?.serve(app).await
    }
}

async fn get_user(req: Request) -> Response {
    let user_id = req.param("userID").unwrap_or_default();
    Response::text(format!("User ID: {user_id}"))
}
