//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request id, tracing, timeout, body limit)
//!     → application router (routing::Application)
//!     → exchange.rs (RequestInfo + ResponseSink handed to handlers)
//!     → Response
//! ```

pub mod exchange;
pub mod server;

pub use exchange::{unmatched_response, Exchange, Locals, RequestInfo, ResponseSink, Unmatched};
pub use server::HttpServer;
