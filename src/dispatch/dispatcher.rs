//! The per-request dispatch state machine.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures_util::FutureExt;

use super::args::{self, Args};
use super::handler::{HandlerResult, RequestHandler};
use super::Verb;
use crate::http::Exchange;

/// A bound handler: its hooks plus a way to call its verb methods.
#[async_trait]
pub trait Endpoint: Send + Sync + 'static {
    fn handler(&self) -> &dyn RequestHandler;

    async fn invoke(&self, verb: Verb, ex: &mut Exchange, args: Args) -> HandlerResult;
}

/// Runs the hooks and the verb method for one request.
///
/// Errors and panics from the verb method become a 500. A returned value
/// is sent as decorated JSON unless the handler already responded.
pub async fn dispatch(endpoint: &dyn Endpoint, ex: &mut Exchange, path_config: &[String]) {
    let handler = endpoint.handler();

    if !handler.is_request_ok(ex).await {
        tracing::debug!(path = %ex.request.path, "Request rejected by precheck");
        handler.request_not_ok(ex).await;
        return;
    }
    handler.request_ok(ex).await;

    if !handler.auth(ex).await {
        if handler.logged_in(ex).await {
            ex.forbidden_error();
        } else {
            ex.unauthorized_error();
        }
        return;
    }

    let verb = Verb::from_method(&ex.request.method);
    if !authorize_verb(handler, verb, ex).await {
        tracing::debug!(verb = verb.as_str(), path = %ex.request.path, "Verb not authorized");
        ex.forbidden_error();
        return;
    }

    let args = args::extract(verb, ex, path_config);
    let outcome = AssertUnwindSafe(endpoint.invoke(verb, ex, args))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(Some(value))) => {
            if !ex.response.is_sent() && !ex.is_passed() {
                ex.send_data(value);
            }
        }
        Ok(Ok(None)) => {}
        Ok(Err(e)) => {
            tracing::error!(verb = verb.as_str(), path = %ex.request.path, error = %e, "Handler failed");
            ex.internal_server_error();
        }
        Err(panic) => {
            tracing::error!(
                verb = verb.as_str(),
                path = %ex.request.path,
                panic = panic_message(panic.as_ref()),
                "Handler panicked"
            );
            ex.internal_server_error();
        }
    }
}

async fn authorize_verb(handler: &dyn RequestHandler, verb: Verb, ex: &Exchange) -> bool {
    match verb {
        Verb::Get => handler.auth_get(ex).await,
        Verb::Post => handler.auth_post(ex).await,
        Verb::Put => handler.auth_put(ex).await,
        Verb::Patch => handler.auth_patch(ex).await,
        Verb::Delete => handler.auth_delete(ex).await,
        Verb::Head => handler.auth_head(ex).await,
        Verb::Options => handler.auth_options(ex).await,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
