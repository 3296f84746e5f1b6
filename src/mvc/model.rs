//! Models supply the data a controller's view renders.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::dispatch::HandlerError;
use crate::http::Exchange;

/// Created fresh for every render by a [`ModelFactory`].
#[async_trait]
pub trait Model: Send + Sync {
    /// Template data. Non-object values are wrapped as `{"data": value}`.
    async fn data(&self, ex: &Exchange) -> Result<Value, HandlerError>;

    /// Config merged over the controller's config file.
    fn config(&self) -> Map<String, Value> {
        Map::new()
    }
}

/// Builds a model for one request.
pub type ModelFactory = Arc<dyn Fn(&Exchange) -> Box<dyn Model> + Send + Sync>;

/// Wraps a closure as a [`ModelFactory`].
pub fn model_factory<M, F>(factory: F) -> ModelFactory
where
    M: Model + 'static,
    F: Fn(&Exchange) -> M + Send + Sync + 'static,
{
    Arc::new(move |ex| Box::new(factory(ex)) as Box<dyn Model>)
}
