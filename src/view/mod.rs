//! Template subsystem.
//!
//! # Data Flow
//! ```text
//! startup:
//!     <root>/partials, extra dirs ──▶ registered partials
//!     <root>/layouts              ──▶ layout index (name → file)
//!
//! per render:
//!     view file ──▶ TemplateCache ──▶ CompiledView
//!                                        │
//!                        render(data) ◀──┘
//!                             │
//!                 parent layout? ──▶ render(layout, data + content) ──▶ ...
//! ```

pub mod builtins;
pub mod cache;
pub mod engine;
pub mod helpers;
pub mod source;

use std::path::PathBuf;

use thiserror::Error;

pub use cache::TemplateCache;
pub use engine::{CompiledView, EngineOptions, Layout, LoadReport, TemplateEngine};

/// Failures while loading, compiling or rendering templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template `{name}` failed: {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("unknown layout `{0}`")]
    UnknownLayout(String),

    #[error("layout cycle detected at `{0}`")]
    LayoutCycle(String),

    #[error("template loading task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
