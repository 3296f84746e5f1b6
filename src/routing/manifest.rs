//! Explicit handler registrations keyed by logical source path.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::Endpoint;
use crate::mvc::{ApiEndpoint, Controller, ControllerEndpoint, ModelFactory, ResourceApi, View};

/// Builds a controller endpoint once its view is resolved.
pub type ControllerBuilder = Box<dyn Fn(View) -> Arc<dyn Endpoint> + Send + Sync>;

/// Handlers and models for one project root.
///
/// Keys are source paths relative to the root without extension, e.g.
/// `apis/ExpressApi`, `MyController` or `MyModel`.
#[derive(Default)]
pub struct Manifest {
    pub(crate) apis: HashMap<String, Arc<dyn Endpoint>>,
    pub(crate) controllers: HashMap<String, ControllerBuilder>,
    pub(crate) models: HashMap<String, ModelFactory>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api<A: ResourceApi>(mut self, source: impl Into<String>, api: A) -> Self {
        let endpoint: Arc<dyn Endpoint> = Arc::new(ApiEndpoint::new(Arc::new(api)));
        self.apis.insert(normalize(source.into()), endpoint);
        self
    }

    pub fn controller<C: Controller>(mut self, source: impl Into<String>, controller: C) -> Self {
        let controller = Arc::new(controller);
        let builder: ControllerBuilder = Box::new(move |view| {
            Arc::new(ControllerEndpoint::new(Arc::clone(&controller), view)) as Arc<dyn Endpoint>
        });
        self.controllers.insert(normalize(source.into()), builder);
        self
    }

    pub fn model(mut self, source: impl Into<String>, factory: ModelFactory) -> Self {
        self.models.insert(normalize(source.into()), factory);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.apis.is_empty() && self.controllers.is_empty()
    }
}

impl fmt::Debug for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut apis: Vec<&String> = self.apis.keys().collect();
        let mut controllers: Vec<&String> = self.controllers.keys().collect();
        let mut models: Vec<&String> = self.models.keys().collect();
        apis.sort();
        controllers.sort();
        models.sort();
        f.debug_struct("Manifest")
            .field("apis", &apis)
            .field("controllers", &controllers)
            .field("models", &models)
            .finish()
    }
}

/// Strips a leading `/` or `./` and any extension from the file name.
fn normalize(source: String) -> String {
    let trimmed = source.trim_start_matches("./").trim_start_matches('/');
    let (dir, file) = match trimmed.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, trimmed),
    };
    let file = match file.rsplit_once('.') {
        Some((name, _)) if !name.is_empty() => name,
        _ => file,
    };
    match dir {
        Some(dir) => format!("{dir}/{file}"),
        None => file.to_string(),
    }
}
