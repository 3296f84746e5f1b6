//! Convention-based MVC layer over axum.
//!
//! A project directory is scanned for handler files named by convention
//! (`<Stem>Controller`, `<Stem>Ctrl`, `<Stem>Api`). Each one is bound
//! under the URL context of its directory and dispatched through a fixed
//! hook pipeline: precheck, auth, per-verb auth, argument extraction and
//! the verb method. Controllers render a view through a minijinja layout
//! chain; APIs answer JSON.
//!
//! ```text
//!  project root ──▶ routing ──▶ dispatch ──▶ mvc ──▶ view
//!                      │            │          │
//!                      │            └──▶ errors (catalog, pages)
//!                      └──▶ http (exchange, server)
//! ```

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod http;
pub mod lifecycle;
pub mod mvc;
pub mod observability;
pub mod routing;
pub mod view;

pub use config::MvcConfig;
pub use dispatch::{middleware_fn, Args, HandlerError, HandlerResult, RequestHandler, RouteOptions};
pub use errors::ErrorKind;
pub use http::{Exchange, HttpServer, Locals};
pub use lifecycle::Shutdown;
pub use mvc::{model_factory, Controller, Model, ResourceApi, View};
pub use routing::{Application, Manifest};
