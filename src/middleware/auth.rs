//! Shared-secret authentication gate.
//!
//! This is a placeholder policy: the credential is one fixed string
//! compared for equality. Anything facing real users needs a verifiable
//! token scheme (signed claims) in its place.

use std::sync::Arc;

use http::StatusCode;
use tracing::debug;

use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::Response;

/// Rejects every request whose `Authorization` header is not exactly the
/// expected value with `401 Unauthorized`; lets the rest through unchanged.
#[derive(Clone, Debug)]
pub struct AuthGate {
    expected: Arc<str>,
}

impl AuthGate {
    /// Gate on an exact `Authorization` header value.
    pub fn new(expected: impl Into<String>) -> Self {
        Self { expected: Arc::from(expected.into()) }
    }

    /// Gate on `Authorization: Bearer <token>`.
    pub fn bearer(token: &str) -> Self {
        Self::new(format!("Bearer {token}"))
    }
}

impl Middleware for AuthGate {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(Gated { expected: Arc::clone(&self.expected), next })
    }

    fn name(&self) -> &'static str {
        "auth-gate"
    }
}

struct Gated {
    expected: Arc<str>,
    next: BoxedHandler,
}

impl Handler for Gated {
    fn call(&self, req: Request) -> BoxFuture {
        if req.header("authorization") == Some(&*self.expected) {
            return self.next.call(req);
        }

        debug!(
            method = %req.method(),
            path = %req.path(),
            credential = if req.header("authorization").is_some() { "invalid" } else { "missing" },
            "rejecting unauthenticated request",
        );
        Box::pin(std::future::ready(Response::error(StatusCode::UNAUTHORIZED, "Unauthorized")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::handler::handler_fn;
    use crate::Method;

    fn counted() -> (Arc<AtomicUsize>, BoxedHandler) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let handler: BoxedHandler = Arc::new(handler_fn(move |_req: Request| {
            seen.fetch_add(1, Ordering::SeqCst);
            async { "inside" }
        }));
        (calls, handler)
    }

    async fn send(authorization: Option<&str>) -> (Response, usize) {
        let (calls, inner) = counted();
        let gate = AuthGate::bearer("token").wrap(inner);
        let mut req = Request::new(Method::Get, "/api/v1/users/42");
        if let Some(value) = authorization {
            req = req.with_header("Authorization", value);
        }
        let res = gate.call(req).await;
        (res, calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn exact_credential_reaches_next() {
        let (res, calls) = send(Some("Bearer token")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body(), b"inside");
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn missing_credential_is_rejected() {
        let (res, calls) = send(None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.body(), b"Unauthorized");
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn near_misses_are_rejected() {
        for value in ["Bearer wrong", "bearer token", "Bearer token ", "token", ""] {
            let (res, calls) = send(Some(value)).await;
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{value:?}");
            assert_eq!(calls, 0, "{value:?}");
        }
    }

    #[tokio::test]
    async fn header_name_is_case_insensitive() {
        let (_, inner) = counted();
        let gate = AuthGate::new("secret").wrap(inner);
        let req = Request::new(Method::Get, "/").with_header("AUTHORIZATION", "secret");
        assert_eq!(gate.call(req).await.status(), StatusCode::OK);
    }
}
