//! The two redirect middleware.
//!
//! - [`RedirectsMiddleware`] hooks view errors and materializes redirects from
//!   patterns.
//! - [`RedirectFallbackMiddleware`] hooks responses and serves stored
//!   redirects in place of 404s.

use std::sync::Arc;

use async_trait::async_trait;

use djangoseo_core::settings::SITES_APP;
use djangoseo_core::{SeoError, SeoResult, Settings};
use djangoseo_http::{HttpRequest, HttpResponse};

use super::Middleware;
use crate::resolver::RedirectResolver;

/// Materializes redirects when a GET request raises a not-found error.
///
/// Does nothing unless `seo_use_redirects` is enabled.
#[derive(Debug, Clone)]
pub struct RedirectsMiddleware {
    resolver: Arc<RedirectResolver>,
}

impl RedirectsMiddleware {
    pub const fn new(resolver: Arc<RedirectResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Middleware for RedirectsMiddleware {
    async fn process_request(&self, _request: &mut HttpRequest) -> Option<HttpResponse> {
        None
    }

    async fn process_response(&self, _request: &HttpRequest, response: HttpResponse) -> HttpResponse {
        response
    }

    async fn process_exception(&self, request: &HttpRequest, error: &SeoError) -> Option<HttpResponse> {
        self.resolver.on_not_found(request, error).await;
        None
    }
}

/// Serves a 301 or 410 in place of a 404 when a redirect is stored for the
/// requested path.
#[derive(Debug, Clone)]
pub struct RedirectFallbackMiddleware {
    resolver: Arc<RedirectResolver>,
}

impl RedirectFallbackMiddleware {
    /// Creates the middleware, refusing to start without the sites framework.
    pub fn try_new(settings: &Settings, resolver: Arc<RedirectResolver>) -> SeoResult<Self> {
        if !settings.is_installed(SITES_APP) {
            return Err(SeoError::ImproperlyConfigured(format!(
                "You cannot use RedirectFallbackMiddleware when {SITES_APP} is not installed."
            )));
        }
        Ok(Self { resolver })
    }
}

#[async_trait]
impl Middleware for RedirectFallbackMiddleware {
    async fn process_request(&self, _request: &mut HttpRequest) -> Option<HttpResponse> {
        None
    }

    async fn process_response(&self, request: &HttpRequest, response: HttpResponse) -> HttpResponse {
        self.resolver.on_response(request, response).await
    }

    async fn process_exception(&self, _request: &HttpRequest, _error: &SeoError) -> Option<HttpResponse> {
        None
    }
}
