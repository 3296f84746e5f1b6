//! Routing subsystem: convention discovery and route binding.
//!
//! # Data Flow
//! ```text
//! project root
//!     → discovery.rs (file name → Descriptor: kind, context, companions)
//!     → manifest.rs  (Descriptor source → registered handler / model)
//!     → binder.rs    (paths, params, body, dispatch, asset routes)
//!     → application.rs (mount per root, filters, catch-all 404)
//! ```
//!
//! # Design Decisions
//! - Discovery is a pure function of file paths; handlers are registered
//!   explicitly instead of being loaded from the files themselves
//! - Routes are fixed once an application is turned into a router
//! - Mounts are tried in bind order; the first response without the
//!   unmatched marker wins

pub mod application;
pub mod binder;
pub mod discovery;
pub mod manifest;
pub mod matcher;

pub use application::{Application, BindError, BindReport, RouteEntry};
pub use discovery::{classify, Descriptor, HandlerKind};
pub use manifest::Manifest;
pub use matcher::{AndMatcher, FnMatcher, HostMatcher, HostPatternMatcher, Matcher, PathPrefixMatcher};
