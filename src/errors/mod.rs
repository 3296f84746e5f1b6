//! Error catalog, content negotiation and error pages.
//!
//! # Data Flow
//! ```text
//! handler ──▶ Exchange::not_found_error()
//!                 │
//!                 ├─ status + decoration headers
//!                 ├─ Accept prefers HTML and the root has a page ──▶ rendered page
//!                 └─ otherwise ──▶ {"error": reason, "status": code}
//! ```

mod catalog;
pub mod negotiation;
mod responder;
mod templates;

pub use catalog::ErrorKind;
pub use responder::{decorated_name, AppMetadata, Responder};
pub use templates::{ErrorTemplates, DEFAULT_ERROR_TEMPLATE};
