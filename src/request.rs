//! Incoming HTTP request type.

use std::collections::HashMap;

use crate::method::Method;

/// An incoming HTTP request: method, path, headers and the path parameters
/// the router bound.
///
/// The request body is never read. The server drops it unbuffered, so a
/// client cannot make the pipeline hold an arbitrary amount of memory
/// before the auth gate has even looked at the request.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    /// A request with no headers and no path parameters.
    ///
    /// ```rust
    /// use tollgate::{Method, Request};
    ///
    /// let req = Request::new(Method::Get, "/api/v1/users/42")
    ///     .with_header("authorization", "Bearer token");
    /// assert_eq!(req.header("Authorization"), Some("Bearer token"));
    /// ```
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            params: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Builds a [`Request`] from the head of a hyper request.
    ///
    /// Header values that are not visible ASCII are dropped; nothing
    /// downstream can compare them as strings anyway.
    pub(crate) fn from_parts(parts: &http::request::Parts) -> Self {
        let headers = parts.headers.iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();

        Self {
            method: Method::from_http(&parts.method),
            path: parts.uri.path().to_owned(),
            headers,
            params: HashMap::new(),
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }

    /// Case-insensitive header lookup. Returns the first value when the
    /// header is repeated.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named, percent-decoded path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/a%20b` returns `Some("a b")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_keeps_extension_methods_and_ascii_headers() {
        let (parts, ()) = http::Request::builder()
            .method("PURGE")
            .uri("/api/v1/users/42?x=1")
            .header("authorization", "Bearer wrong")
            .header("x-binary", http::HeaderValue::from_bytes(b"\xff").unwrap())
            .body(())
            .unwrap()
            .into_parts();

        let req = Request::from_parts(&parts);

        assert_eq!(req.method(), &Method::Extension("PURGE".into()));
        assert_eq!(req.path(), "/api/v1/users/42");
        assert_eq!(req.header("Authorization"), Some("Bearer wrong"));
        assert_eq!(req.header("x-binary"), None);
    }
}
