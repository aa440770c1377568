//! Radix-tree request router.
//!
//! One tree per HTTP method plus one tree for method-less patterns.
//! O(path-length) lookup. You register a pattern, you get a handler.
//!
//! # Patterns
//!
//! A pattern is `"[METHOD ]PATH"`:
//!
//! | Pattern | Matches |
//! |---|---|
//! | `/health` | every method |
//! | `GET /users/{id}` | `GET` and `HEAD` |
//! | `POST /users` | `POST` only |
//! | `/static/{*file}` | every method, any depth below `/static/` |
//!
//! When several patterns match a path the most specific path wins, segment by
//! segment: a literal beats `{param}`, which beats `{*catch_all}`. Only when
//! two paths are equally specific does the one naming the method win.
//!
//! Registration is fail-fast: a malformed pattern or one that collides with
//! an already registered route returns an [`Error`] while the router is being
//! built, long before a listener opens.

use std::collections::HashMap;
use std::sync::Arc;

use http::StatusCode;
use matchit::{InsertError, Router as MatchitRouter};

use crate::error::Error;
use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;

/// Outcome of [`Router::dispatch`].
pub enum Dispatch {
    /// A route matched. `params` holds the `{name}` segments it bound,
    /// percent-decoded.
    Matched {
        handler: BoxedHandler,
        params: HashMap<String, String>,
    },
    /// The path exists, but not for this method.
    MethodNotAllowed { allowed: Vec<Method> },
    NotFound,
}

/// A registered handler plus the specificity of its path.
struct Route {
    handler: BoxedHandler,
    rank: Vec<u8>,
}

/// The application router.
///
/// Build it once at startup, then hand it to a [`Chain`](crate::Chain) or
/// straight to the [`Server`](crate::Server). The router is itself a
/// [`Handler`]: unmatched paths answer `404`, paths registered only for
/// other methods answer `405`.
#[derive(Default)]
pub struct Router {
    by_method: HashMap<Method, MatchitRouter<Route>>,
    any: MatchitRouter<Route>,
    // Registration log, replayed by `nest`.
    routes: Vec<(Option<Method>, String, BoxedHandler)>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a `"[METHOD ]PATH"` pattern. Returns `self`
    /// for chaining with `?`.
    ///
    /// ```rust
    /// # use tollgate::{handler_fn, Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// # fn main() -> Result<(), tollgate::Error> {
    /// let router = Router::new()
    ///     .route("GET /users/{id}", handler_fn(get_user))?
    ///     .route("POST /users",     handler_fn(create_user))?;
    /// # Ok(()) }
    /// ```
    pub fn route(self, pattern: &str, handler: impl Handler) -> Result<Self, Error> {
        let (method, path) = parse_pattern(pattern)?;
        self.add(method, path, Arc::new(handler))
    }

    /// Register a handler for a typed method + path pair.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Result<Self, Error> {
        check_path(path, path)?;
        self.add(Some(method), path, Arc::new(handler))
    }

    /// Mount every route of `other` below `prefix`.
    ///
    /// `GET /users/{id}` nested under `/api/v1` answers
    /// `GET /api/v1/users/{id}`; requests outside the prefix do not reach it.
    pub fn nest(mut self, prefix: &str, other: Router) -> Result<Self, Error> {
        if !prefix.starts_with('/') || prefix.ends_with('/') {
            return Err(Error::InvalidPattern {
                pattern: prefix.to_owned(),
                reason: "prefix must start with `/` and must not end with `/`".to_owned(),
            });
        }
        for (method, path, handler) in other.routes {
            self = self.add(method, &format!("{prefix}{path}"), handler)?;
        }
        Ok(self)
    }

    fn add(mut self, method: Option<Method>, path: &str, handler: BoxedHandler) -> Result<Self, Error> {
        let tree = match &method {
            Some(m) => self.by_method.entry(m.clone()).or_default(),
            None => &mut self.any,
        };
        let route = Route { handler: Arc::clone(&handler), rank: specificity(path) };
        tree.insert(path, route)
            .map_err(|e| insert_error(method.as_ref(), path, e))?;
        self.routes.push((method, path.to_owned(), handler));
        Ok(self)
    }

    /// Find the handler for `method` + `path`.
    ///
    /// The most specific matching path wins. Ties go to the route registered
    /// for `method`, then to a `GET` route when `method` is `HEAD`, then to
    /// the method-less route.
    pub fn dispatch(&self, method: &Method, path: &str) -> Dispatch {
        let get = Method::Get;
        let head_as_get = (*method == Method::Head).then_some(&get);
        let trees = [Some(method), head_as_get].into_iter()
            .flatten()
            .filter_map(|m| self.by_method.get(m))
            .chain(std::iter::once(&self.any));

        let mut best = None;
        for tree in trees {
            if let Ok(matched) = tree.at(path) {
                if best.as_ref().is_none_or(|b: &matchit::Match<'_, '_, &Route>| matched.value.rank > b.value.rank) {
                    best = Some(matched);
                }
            }
        }

        if let Some(matched) = best {
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), decode_segment(v)))
                .collect();
            return Dispatch::Matched { handler: Arc::clone(&matched.value.handler), params };
        }

        let mut allowed: Vec<Method> = self.by_method.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(m, _)| m.clone())
            .collect();
        if allowed.is_empty() {
            return Dispatch::NotFound;
        }
        if allowed.contains(&Method::Get) && !allowed.contains(&Method::Head) {
            allowed.push(Method::Head);
        }
        allowed.sort();
        Dispatch::MethodNotAllowed { allowed }
    }
}

impl Handler for Router {
    fn call(&self, mut req: Request) -> BoxFuture {
        match self.dispatch(req.method(), req.path()) {
            Dispatch::Matched { handler, params } => {
                req.params = params;
                handler.call(req)
            }
            Dispatch::MethodNotAllowed { allowed } => {
                let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
                let res = Response::builder()
                    .status(StatusCode::METHOD_NOT_ALLOWED)
                    .header("allow", &allow)
                    .text("Method Not Allowed");
                Box::pin(std::future::ready(res))
            }
            Dispatch::NotFound => {
                Box::pin(std::future::ready(Response::error(StatusCode::NOT_FOUND, "404 page not found")))
            }
        }
    }
}

// ── Pattern parsing ───────────────────────────────────────────────────────────

/// Splits `"GET /users/{id}"` into `(Some(Get), "/users/{id}")` and
/// `"/users"` into `(None, "/users")`.
fn parse_pattern(pattern: &str) -> Result<(Option<Method>, &str), Error> {
    let (method, path) = match pattern.split_once(' ') {
        Some((token, path)) if !pattern.starts_with('/') => {
            let method = token.parse::<Method>().map_err(|e| Error::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: e.to_string(),
            })?;
            (Some(method), path.trim_start_matches(' '))
        }
        _ => (None, pattern),
    };
    check_path(pattern, path)?;
    Ok((method, path))
}

fn check_path(pattern: &str, path: &str) -> Result<(), Error> {
    if path.starts_with('/') && !path.contains(char::is_whitespace) {
        return Ok(());
    }
    Err(Error::InvalidPattern {
        pattern: pattern.to_owned(),
        reason: "path must start with `/` and contain no whitespace".to_owned(),
    })
}

/// One entry per segment: 2 literal, 1 `{param}`, 0 `{*catch_all}`.
/// Compared lexicographically, so the first segment that differs decides.
fn specificity(path: &str) -> Vec<u8> {
    path.split('/')
        .skip(1)
        .map(|segment| {
            if segment.starts_with("{*") {
                0
            } else if segment.contains('{') {
                1
            } else {
                2
            }
        })
        .collect()
}

/// Percent-decodes a captured segment. Invalid UTF-8 after decoding is
/// replaced rather than rejected.
fn decode_segment(raw: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned()
}

fn insert_error(method: Option<&Method>, path: &str, e: InsertError) -> Error {
    let pattern = match method {
        Some(m) => format!("{m} {path}"),
        None => path.to_owned(),
    };
    match e {
        InsertError::Conflict { with } => {
            let existing = match method {
                Some(m) => format!("{m} {with}"),
                None => with,
            };
            Error::RouteConflict { pattern, existing }
        }
        other => Error::InvalidPattern { pattern, reason: other.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler_fn;

    fn named(name: &'static str) -> impl Handler {
        handler_fn(move |_req: Request| async move { name })
    }

    async fn body_of(router: &Router, method: Method, path: &str) -> (StatusCode, String) {
        let res = router.call(Request::new(method, path)).await;
        (res.status(), String::from_utf8_lossy(res.body()).into_owned())
    }

    #[test]
    fn parses_patterns_with_and_without_method() {
        assert_eq!(parse_pattern("GET /users/{id}").unwrap(), (Some(Method::Get), "/users/{id}"));
        assert_eq!(parse_pattern("/users").unwrap(), (None, "/users"));
        assert!(matches!(parse_pattern("FETCH /users"), Err(Error::InvalidPattern { .. })));
        assert!(matches!(parse_pattern("users"), Err(Error::InvalidPattern { .. })));
        assert!(matches!(parse_pattern("GET users"), Err(Error::InvalidPattern { .. })));
    }

    #[tokio::test]
    async fn binds_path_parameters() {
        let router = Router::new()
            .route("GET /users/{userID}", handler_fn(|req: Request| async move {
                format!("user {}", req.param("userID").unwrap_or_default())
            }))
            .unwrap();

        assert_eq!(body_of(&router, Method::Get, "/users/42").await, (StatusCode::OK, "user 42".into()));
    }

    #[tokio::test]
    async fn get_route_also_answers_head() {
        let router = Router::new().route("GET /users", named("list")).unwrap();
        assert_eq!(body_of(&router, Method::Head, "/users").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn methodless_pattern_matches_every_method() {
        let router = Router::new().route("/ping", named("pong")).unwrap();
        for method in [Method::Get, Method::Post, Method::Delete] {
            assert_eq!(body_of(&router, method, "/ping").await.1, "pong");
        }
    }

    #[tokio::test]
    async fn method_specific_route_wins_over_methodless() {
        let router = Router::new()
            .route("/items", named("any"))
            .unwrap()
            .route("POST /items", named("post"))
            .unwrap();

        assert_eq!(body_of(&router, Method::Post, "/items").await.1, "post");
        assert_eq!(body_of(&router, Method::Put, "/items").await.1, "any");
    }

    #[tokio::test]
    async fn static_segment_beats_parameter() {
        let router = Router::new()
            .route("GET /users/{id}", named("param"))
            .unwrap()
            .route("GET /users/me", named("static"))
            .unwrap();

        assert_eq!(body_of(&router, Method::Get, "/users/me").await.1, "static");
        assert_eq!(body_of(&router, Method::Get, "/users/7").await.1, "param");
    }

    #[tokio::test]
    async fn literal_path_beats_method_specific_catch_all() {
        let router = Router::new()
            .route("GET /{*rest}", named("catchall"))
            .unwrap()
            .route("/users/me", named("me"))
            .unwrap();

        assert_eq!(body_of(&router, Method::Get, "/users/me").await.1, "me");
        assert_eq!(body_of(&router, Method::Get, "/users/you").await.1, "catchall");
        assert_eq!(body_of(&router, Method::Post, "/users/me").await.1, "me");
    }

    #[tokio::test]
    async fn equally_specific_paths_prefer_the_named_method() {
        let router = Router::new()
            .route("/users/{id}", named("any"))
            .unwrap()
            .route("GET /users/{userID}", named("get"))
            .unwrap();

        assert_eq!(body_of(&router, Method::Get, "/users/1").await.1, "get");
        assert_eq!(body_of(&router, Method::Head, "/users/1").await.1, "get");
        assert_eq!(body_of(&router, Method::Delete, "/users/1").await.1, "any");
    }

    #[tokio::test]
    async fn path_parameters_are_percent_decoded() {
        let router = Router::new()
            .route("GET /users/{userID}", handler_fn(|req: Request| async move {
                req.param("userID").unwrap_or_default().to_owned()
            }))
            .unwrap();

        assert_eq!(body_of(&router, Method::Get, "/users/a%20b").await.1, "a b");
        assert_eq!(body_of(&router, Method::Get, "/users/caf%C3%A9").await.1, "café");
    }

    #[tokio::test]
    async fn extension_method_gets_405_on_a_known_path() {
        let router = Router::new().route("GET /users", named("list")).unwrap();
        let purge = Method::Extension("PURGE".into());
        assert_eq!(body_of(&router, purge, "/users").await.0, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn methodless_route_accepts_extension_methods() {
        let router = Router::new().route("/cache", named("cache")).unwrap();
        let purge = Method::Extension("PURGE".into());
        assert_eq!(body_of(&router, purge, "/cache").await.1, "cache");
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let router = Router::new().route("GET /users", named("list")).unwrap();
        let (status, body) = body_of(&router, Method::Get, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "404 page not found");
    }

    #[tokio::test]
    async fn wrong_method_lists_allowed_methods() {
        let router = Router::new()
            .route("GET /users", named("list"))
            .unwrap()
            .route("POST /users", named("create"))
            .unwrap();

        let res = router.call(Request::new(Method::Delete, "/users")).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.header("allow"), Some("GET, HEAD, POST"));
    }

    #[test]
    fn duplicate_pattern_is_rejected() {
        let err = Router::new()
            .route("GET /users/{id}", named("a"))
            .unwrap()
            .route("GET /users/{id}", named("b"))
            .err()
            .expect("duplicate must fail");

        match err {
            Error::RouteConflict { pattern, existing } => {
                assert_eq!(pattern, "GET /users/{id}");
                assert!(existing.starts_with("GET /users/"), "{existing}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn same_path_for_different_methods_is_not_a_conflict() {
        assert!(Router::new()
            .route("GET /users", named("a"))
            .unwrap()
            .route("POST /users", named("b"))
            .unwrap()
            .route("/users", named("c"))
            .is_ok());
    }

    #[tokio::test]
    async fn nest_mounts_routes_below_prefix() {
        let users = Router::new().route("GET /users/{userID}", named("user")).unwrap();
        let router = Router::new().nest("/api/v1", users).unwrap();

        assert_eq!(body_of(&router, Method::Get, "/api/v1/users/42").await.1, "user");
        assert_eq!(body_of(&router, Method::Get, "/users/42").await.0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn nest_rejects_malformed_prefix_and_conflicts() {
        let inner = || Router::new().route("GET /users", named("a")).unwrap();

        assert!(matches!(
            Router::new().nest("/api/", inner()),
            Err(Error::InvalidPattern { .. })
        ));
        assert!(matches!(
            Router::new()
                .route("GET /api/users", named("b"))
                .unwrap()
                .nest("/api", inner()),
            Err(Error::RouteConflict { .. })
        ));
    }
}
