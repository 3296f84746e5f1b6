//! Page handlers rendering a view.

use std::sync::Arc;

use async_trait::async_trait;

use super::view::View;
use super::{head_ok, method_not_allowed};
use crate::dispatch::{Args, Endpoint, HandlerResult, RequestHandler, Verb};
use crate::http::Exchange;

/// A handler rendering HTML through its [`View`].
///
/// GET and POST render and send the view with status 200. HEAD answers
/// 200 with no body; every other verb is 405.
#[async_trait]
pub trait Controller: RequestHandler {
    async fn do_get(&self, ex: &mut Exchange, _args: Args, view: &View) -> HandlerResult {
        view.send(ex).await;
        Ok(None)
    }

    async fn do_post(&self, ex: &mut Exchange, _args: Args, view: &View) -> HandlerResult {
        view.send(ex).await;
        Ok(None)
    }

    async fn do_put(&self, ex: &mut Exchange, _args: Args, _view: &View) -> HandlerResult {
        method_not_allowed(ex)
    }

    async fn do_patch(&self, ex: &mut Exchange, _args: Args, _view: &View) -> HandlerResult {
        method_not_allowed(ex)
    }

    async fn do_delete(&self, ex: &mut Exchange, _args: Args, _view: &View) -> HandlerResult {
        method_not_allowed(ex)
    }

    async fn do_head(&self, ex: &mut Exchange, _args: Args, _view: &View) -> HandlerResult {
        head_ok(ex)
    }

    async fn do_options(&self, ex: &mut Exchange, _args: Args, _view: &View) -> HandlerResult {
        method_not_allowed(ex)
    }

    /// Rewrites the rendered view before layouts wrap it.
    fn view_parser(&self, _ex: &Exchange, html: String) -> String {
        html
    }
}

/// A controller with every default; bound for controller files that have
/// no registered implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct PageController;

impl RequestHandler for PageController {}

impl Controller for PageController {}

/// Binds a [`Controller`] and its [`View`] to the dispatcher.
pub struct ControllerEndpoint<C> {
    controller: Arc<C>,
    view: View,
}

impl<C: Controller> ControllerEndpoint<C> {
    /// Wires the controller's `view_parser` into `view`.
    pub fn new(controller: Arc<C>, view: View) -> Self {
        let hook = Arc::clone(&controller);
        let view = view.with_parser(Arc::new(move |ex, html| hook.view_parser(ex, html)));
        Self { controller, view }
    }

    pub fn view(&self) -> &View {
        &self.view
    }
}

#[async_trait]
impl<C: Controller> Endpoint for ControllerEndpoint<C> {
    fn handler(&self) -> &dyn RequestHandler {
        self.controller.as_ref()
    }

    async fn invoke(&self, verb: Verb, ex: &mut Exchange, args: Args) -> HandlerResult {
        let view = &self.view;
        match verb {
            Verb::Get => self.controller.do_get(ex, args, view).await,
            Verb::Post => self.controller.do_post(ex, args, view).await,
            Verb::Put => self.controller.do_put(ex, args, view).await,
            Verb::Patch => self.controller.do_patch(ex, args, view).await,
            Verb::Delete => self.controller.do_delete(ex, args, view).await,
            Verb::Head => self.controller.do_head(ex, args, view).await,
            Verb::Options => self.controller.do_options(ex, args, view).await,
        }
    }
}
