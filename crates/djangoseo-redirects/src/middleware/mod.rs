//! Middleware framework.
//!
//! This module provides the [`Middleware`] trait and [`MiddlewarePipeline`].
//! It mirrors Django's middleware system: components intercept requests
//! before they reach the view, errors raised by the view, and responses on
//! their way out.
//!
//! ## Execution order
//!
//! `process_request` runs in order (first added = first to process).
//! `process_exception` and `process_response` run in reverse order (first
//! added = last to process), matching Django's "onion" model.

mod redirects;
mod subdomain;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use djangoseo_core::{SeoError, SeoResult};
use djangoseo_http::{HttpRequest, HttpResponse};

pub use redirects::{RedirectFallbackMiddleware, RedirectsMiddleware};
pub use subdomain::SubdomainMiddleware;

/// The future returned by a view.
pub type BoxFuture = Pin<Box<dyn Future<Output = SeoResult<HttpResponse>> + Send>>;

/// An async view. Returning `Err` hands the error to `process_exception`.
pub type ViewHandler = Arc<dyn Fn(HttpRequest) -> BoxFuture + Send + Sync>;

/// Wraps an async function as a [`ViewHandler`].
///
/// ```
/// use djangoseo_core::SeoError;
/// use djangoseo_redirects::middleware::view_handler;
///
/// let view = view_handler(|request| async move {
///     Err(SeoError::NotFound(request.path().to_string()))
/// });
/// ```
pub fn view_handler<F, Fut>(view: F) -> ViewHandler
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SeoResult<HttpResponse>> + Send + 'static,
{
    Arc::new(move |request| Box::pin(view(request)))
}

/// A middleware component that can process requests and responses.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use djangoseo_core::SeoError;
/// use djangoseo_http::{HttpRequest, HttpResponse};
/// use djangoseo_redirects::middleware::Middleware;
///
/// struct Passthrough;
///
/// #[async_trait]
/// impl Middleware for Passthrough {
///     async fn process_request(&self, _request: &mut HttpRequest) -> Option<HttpResponse> {
///         None
///     }
///
///     async fn process_response(&self, _request: &HttpRequest, response: HttpResponse) -> HttpResponse {
///         response
///     }
///
///     async fn process_exception(&self, _request: &HttpRequest, _error: &SeoError) -> Option<HttpResponse> {
///         None
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Process an incoming request before it reaches the view.
    ///
    /// Return `Some(HttpResponse)` to short-circuit the pipeline and skip the
    /// view.
    async fn process_request(&self, request: &mut HttpRequest) -> Option<HttpResponse>;

    /// Process the response after the view has been called.
    async fn process_response(&self, request: &HttpRequest, response: HttpResponse)
        -> HttpResponse;

    /// Handle an error returned by the view.
    ///
    /// Return `Some(HttpResponse)` to answer with that response; later
    /// middleware's `process_exception` is then skipped. Return `None` to let
    /// the default error handling proceed.
    async fn process_exception(&self, request: &HttpRequest, error: &SeoError)
        -> Option<HttpResponse>;
}

/// A pipeline of middleware components around a view.
#[derive(Default)]
pub struct MiddlewarePipeline {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewarePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a middleware to the end of the pipeline.
    pub fn add(&mut self, middleware: impl Middleware + 'static) {
        self.middlewares.push(Box::new(middleware));
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Processes a request through the middleware and the view.
    ///
    /// 1. `process_request` in order. A returned response short-circuits, and
    ///    only the middleware that already ran see it in `process_response`.
    /// 2. The view. On `Err`, `process_exception` runs in reverse until one
    ///    returns a response; otherwise the error becomes a response carrying
    ///    its status code.
    /// 3. `process_response` in reverse order.
    pub async fn process(&self, mut request: HttpRequest, view: &ViewHandler) -> HttpResponse {
        for (i, mw) in self.middlewares.iter().enumerate() {
            if let Some(response) = mw.process_request(&mut request).await {
                let mut response = response;
                for earlier in self.middlewares[..=i].iter().rev() {
                    response = earlier.process_response(&request, response).await;
                }
                return response;
            }
        }

        let mut response = match view(request.clone()).await {
            Ok(response) => response,
            Err(error) => self.handle_exception(&request, &error).await,
        };

        for mw in self.middlewares.iter().rev() {
            response = mw.process_response(&request, response).await;
        }
        response
    }

    async fn handle_exception(&self, request: &HttpRequest, error: &SeoError) -> HttpResponse {
        for mw in self.middlewares.iter().rev() {
            if let Some(response) = mw.process_exception(request, error).await {
                return response;
            }
        }
        if error.status_code() >= 500 {
            tracing::error!(path = request.path(), error = %error, "unhandled view error");
        }
        HttpResponse::from_error(error)
    }
}

impl std::fmt::Debug for MiddlewarePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewarePipeline")
            .field("middleware_count", &self.middlewares.len())
            .finish()
    }
}
