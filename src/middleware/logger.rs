//! Request logging middleware.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::middleware::Middleware;
use crate::request::Request;

/// Logs the method and path of every request it sees, then always calls
/// `next`. The response passes through untouched.
///
/// Emits an `info` event before delegating and a `debug` event with the
/// status and latency once `next` has answered.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestLogger;

impl Middleware for RequestLogger {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(Logged { next })
    }

    fn name(&self) -> &'static str {
        "request-logger"
    }
}

struct Logged {
    next: BoxedHandler,
}

impl Handler for Logged {
    fn call(&self, req: Request) -> BoxFuture {
        let method = req.method().clone();
        let path = req.path().to_owned();
        info!(method = %method, path = %path, "request");

        let fut = self.next.call(req);
        Box::pin(async move {
            let started = Instant::now();
            let res = fut.await;
            debug!(
                method = %method,
                path = %path,
                status = res.status().as_u16(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "response",
            );
            res
        })
    }
}
