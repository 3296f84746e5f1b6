//! JSON resource handlers.

use std::sync::Arc;

use async_trait::async_trait;

use super::{head_ok, method_not_allowed};
use crate::dispatch::{Args, Endpoint, HandlerResult, RequestHandler, Verb};
use crate::http::Exchange;

/// A resource answering with JSON.
///
/// Verb methods default to 405, except `do_head` which answers 200 with no
/// body. Returning `Ok(Some(value))` sends `value` as a decorated 200.
#[async_trait]
pub trait ResourceApi: RequestHandler {
    async fn do_get(&self, ex: &mut Exchange, _args: Args) -> HandlerResult {
        method_not_allowed(ex)
    }

    async fn do_post(&self, ex: &mut Exchange, _args: Args) -> HandlerResult {
        method_not_allowed(ex)
    }

    async fn do_put(&self, ex: &mut Exchange, _args: Args) -> HandlerResult {
        method_not_allowed(ex)
    }

    async fn do_patch(&self, ex: &mut Exchange, _args: Args) -> HandlerResult {
        method_not_allowed(ex)
    }

    async fn do_delete(&self, ex: &mut Exchange, _args: Args) -> HandlerResult {
        method_not_allowed(ex)
    }

    async fn do_head(&self, ex: &mut Exchange, _args: Args) -> HandlerResult {
        head_ok(ex)
    }

    async fn do_options(&self, ex: &mut Exchange, _args: Args) -> HandlerResult {
        method_not_allowed(ex)
    }
}

/// Binds a [`ResourceApi`] to the dispatcher.
pub struct ApiEndpoint<A> {
    api: Arc<A>,
}

impl<A: ResourceApi> ApiEndpoint<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A: ResourceApi> Endpoint for ApiEndpoint<A> {
    fn handler(&self) -> &dyn RequestHandler {
        self.api.as_ref()
    }

    async fn invoke(&self, verb: Verb, ex: &mut Exchange, args: Args) -> HandlerResult {
        match verb {
            Verb::Get => self.api.do_get(ex, args).await,
            Verb::Post => self.api.do_post(ex, args).await,
            Verb::Put => self.api.do_put(ex, args).await,
            Verb::Patch => self.api.do_patch(ex, args).await,
            Verb::Delete => self.api.do_delete(ex, args).await,
            Verb::Head => self.api.do_head(ex, args).await,
            Verb::Options => self.api.do_options(ex, args).await,
        }
    }
}
