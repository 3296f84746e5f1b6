//! Request filters scoping a bound application.
//!
//! # Design Decisions
//! - Host matching is case-insensitive and ignores the port
//! - Path matching is case-sensitive
//! - A filter that fails passes the request on to the next application

use std::fmt;

use axum::body::Body;
use axum::http::{header, Request};
use regex::Regex;

/// Decides whether a request belongs to an application.
pub trait Matcher: Send + Sync + fmt::Debug {
    fn matches(&self, req: &Request<Body>) -> bool;
}

/// The request's host without port, lowercased. Falls back to the URI
/// authority when no Host header is present.
fn request_host(req: &Request<Body>) -> Option<String> {
    let raw = req
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().host())?;
    let host = match raw.strip_prefix('[') {
        Some(v6) => v6.split(']').next().unwrap_or(v6),
        None => raw.split(':').next().unwrap_or(raw),
    };
    Some(host.to_ascii_lowercase())
}

/// Matches one exact host name.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_ascii_lowercase(),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        request_host(req).is_some_and(|host| host == self.expected_host)
    }
}

/// Matches host names against a regular expression.
#[derive(Debug, Clone)]
pub struct HostPatternMatcher {
    pattern: Regex,
}

impl HostPatternMatcher {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl Matcher for HostPatternMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        request_host(req).is_some_and(|host| self.pattern.is_match(&host))
    }
}

/// Matches a request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        req.uri().path().starts_with(&self.prefix)
    }
}

/// All inner matchers must match.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.matchers.iter().all(|m| m.matches(req))
    }
}

/// An arbitrary predicate.
pub struct FnMatcher<F> {
    predicate: F,
}

impl<F> FnMatcher<F>
where
    F: Fn(&Request<Body>) -> bool + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> fmt::Debug for FnMatcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnMatcher")
    }
}

impl<F> Matcher for FnMatcher<F>
where
    F: Fn(&Request<Body>) -> bool + Send + Sync,
{
    fn matches(&self, req: &Request<Body>) -> bool {
        (self.predicate)(req)
    }
}
