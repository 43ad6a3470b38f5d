//! Incoming HTTP request type.
//!
//! A [`Request`] is the normalized view of one inbound request: method,
//! decoded path, query parameters, headers and the fully read body. The
//! transport builds it once, the dispatcher lends it by reference to every
//! middleware and handler, and it is dropped when the response is sent.

use std::borrow::Cow;

use http::Method;
use url::form_urlencoded;

/// An incoming HTTP request.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: QueryParams,
    headers: Headers,
    body: Vec<u8>,
}

impl Request {
    /// Builds a request from a method and a request target.
    ///
    /// The target may carry a query string (`/search?q=rust&page=2`); it is
    /// split off and parsed. The path is percent-decoded.
    ///
    /// ```rust
    /// use easyapi::Request;
    /// use http::Method;
    ///
    /// let req = Request::new(Method::GET, "/search?tag=a&tag=b");
    /// assert_eq!(req.path(), "/search");
    /// assert_eq!(req.query().get_all("tag"), ["a", "b"]);
    /// ```
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, QueryParams::parse(query)),
            None => (target, QueryParams::default()),
        };
        Self {
            method,
            path: decode_path(path),
            query,
            headers: Headers::default(),
            body: Vec::new(),
        }
    }

    /// Builds a request from the head of an `http` request and its collected body.
    pub fn from_parts(parts: &http::request::Parts, body: Vec<u8>) -> Self {
        let headers = parts.headers.iter()
            .map(|(name, value)| {
                (name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned())
            })
            .fold(Headers::default(), |mut acc, (name, value)| {
                acc.insert(name, value);
                acc
            });

        Self {
            method: parts.method.clone(),
            path: decode_path(parts.uri.path()),
            query: parts.uri.query().map(QueryParams::parse).unwrap_or_default(),
            headers,
            body,
        }
    }

    /// Adds a header. Returns `self` for chaining.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value.into());
        self
    }

    /// Replaces the body. Returns `self` for chaining.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> &QueryParams { &self.query }
    pub fn headers(&self) -> &Headers { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. `Content_Type`, `content-type` and
    /// `CONTENT-TYPE` all name the same header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The body as UTF-8, or `None` if it is not valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// The body parsed as `application/x-www-form-urlencoded`.
    pub fn form(&self) -> QueryParams {
        QueryParams::parse_bytes(&self.body)
    }
}

fn decode_path(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        // Not valid UTF-8 once decoded; keep the raw form so routing still sees something.
        Err(_) => raw.to_owned(),
    }
}

// ── QueryParams ──────────────────────────────────────────────────────────────

/// Ordered multimap of query parameters.
///
/// Repeated keys keep every value in arrival order; keys keep the order of
/// their first appearance. Pairs with an empty value are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    /// Parses a query string (without the leading `?`).
    pub fn parse(query: &str) -> Self {
        Self::parse_bytes(query.as_bytes())
    }

    fn parse_bytes(input: &[u8]) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(input) {
            if value.is_empty() {
                continue;
            }
            params.append(key, value);
        }
        params
    }

    fn append(&mut self, key: Cow<'_, str>, value: Cow<'_, str>) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value.into_owned()),
            None => self.entries.push((key.into_owned(), vec![value.into_owned()])),
        }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    /// Every value for `key`, in arrival order. Empty if the key is absent.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries.iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keys with all their values, in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

// ── Headers ──────────────────────────────────────────────────────────────────

/// Request headers with normalized names.
///
/// Names are stored lowercase with `_` turned into `-`, and lookups normalize
/// the probe the same way.
#[derive(Clone, Debug, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn insert(&mut self, name: &str, value: String) {
        self.entries.push((normalize_name(name), value));
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = normalize_name(name);
        self.entries.iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `name`, in arrival order.
    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let name = normalize_name(name);
        self.entries.iter()
            .filter(move |(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == '_' { '-' } else { c.to_ascii_lowercase() })
        .collect()
}
