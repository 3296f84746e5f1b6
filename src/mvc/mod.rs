//! Handler specializations: JSON resource APIs and view-rendering controllers.
//!
//! # Data Flow
//! ```text
//! ResourceApi ── ApiEndpoint ──────────────┐
//!                                          ├──▶ dispatch::Endpoint
//! Controller ─── ControllerEndpoint + View ┘
//!                      │
//!                      ├── Model (per request)
//!                      ├── settings (<Stem>Config.json)
//!                      └── assets (<Stem>Assets/)
//! ```

pub mod api;
pub mod assets;
pub mod controller;
pub mod model;
pub mod settings;
pub mod view;

use std::path::PathBuf;

use thiserror::Error;

use crate::dispatch::{HandlerError, HandlerResult};
use crate::http::Exchange;
use crate::view::TemplateError;

pub use api::{ApiEndpoint, ResourceApi};
pub use assets::{AssetList, AssetSource};
pub use controller::{Controller, ControllerEndpoint, PageController};
pub use model::{model_factory, Model, ModelFactory};
pub use view::{View, ViewParser};

/// Failures while assembling a view's data.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model `{model}` failed: {source}")]
    Model {
        model: String,
        #[source]
        source: HandlerError,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Default body of every unimplemented verb method.
pub(crate) fn method_not_allowed(ex: &mut Exchange) -> HandlerResult {
    ex.method_not_allowed_error();
    Ok(None)
}

/// Default HEAD: 200 with no body.
pub(crate) fn head_ok(ex: &mut Exchange) -> HandlerResult {
    ex.send_status_and_end(axum::http::StatusCode::OK);
    Ok(None)
}
