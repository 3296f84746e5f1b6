//! Request dispatch: hooks, argument extraction and the verb state machine.
//!
//! # Data Flow
//! ```text
//! Exchange
//!     → is_request_ok ──false──▶ request_not_ok (400)
//!     → request_ok
//!     → auth ──false──▶ logged_in ? 403 : 401
//!     → auth_<verb> ──false──▶ 403
//!     → args::extract
//!     → do_<verb>(args) ──Err / panic──▶ 500
//!                       ──Some(value)──▶ decorated JSON 200
//! ```

pub mod args;
pub mod dispatcher;
pub mod handler;

use axum::http::Method;

pub use args::{Args, POSITIONAL_KEYS};
pub use dispatcher::{dispatch, Endpoint};
pub use handler::{middleware_fn, HandlerError, HandlerResult, Middleware, RequestHandler, RouteOptions};

/// The HTTP verbs a handler can implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Verb {
    /// Methods outside the seven known verbs dispatch as GET.
    pub fn from_method(method: &Method) -> Self {
        match *method {
            Method::POST => Verb::Post,
            Method::PUT => Verb::Put,
            Method::PATCH => Verb::Patch,
            Method::DELETE => Verb::Delete,
            Method::HEAD => Verb::Head,
            Method::OPTIONS => Verb::Options,
            _ => Verb::Get,
        }
    }

    /// Whether request bodies are read for this verb.
    pub fn carries_body(self) -> bool {
        matches!(self, Verb::Post | Verb::Put | Verb::Patch | Verb::Delete)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Head => "HEAD",
            Verb::Options => "OPTIONS",
        }
    }
}
