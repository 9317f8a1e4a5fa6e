//! Subdomain detection.

use std::sync::Arc;

use async_trait::async_trait;

use djangoseo_core::SeoError;
use djangoseo_http::{HttpRequest, HttpResponse};

use super::Middleware;
use crate::sites::SiteRegistry;

/// Sets `request.subdomain` from the host, relative to the current site's
/// domain.
///
/// On a site `example.com`, `shop.example.com` yields `shop` and the bare
/// domain yields an empty subdomain. The configured default subdomain
/// (typically `www`) is treated as the bare domain. Hosts outside the site's
/// domain get an empty subdomain.
#[derive(Debug, Clone)]
pub struct SubdomainMiddleware {
    sites: Arc<SiteRegistry>,
    default_subdomain: Option<String>,
}

impl SubdomainMiddleware {
    pub const fn new(sites: Arc<SiteRegistry>) -> Self {
        Self {
            sites,
            default_subdomain: None,
        }
    }

    /// Treats `subdomain` as an alias of the bare domain.
    #[must_use]
    pub fn with_default_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.default_subdomain = Some(subdomain.into().to_ascii_lowercase());
        self
    }

    /// Returns the subdomain of `request` relative to its current site.
    pub fn detect(&self, request: &HttpRequest) -> String {
        let Some(site) = self.sites.get_current_site(request) else {
            return String::new();
        };
        let host = request.get_domain();
        let subdomain = host
            .strip_suffix(site.domain.as_str())
            .and_then(|prefix| prefix.strip_suffix('.'))
            .unwrap_or_default();

        if self.default_subdomain.as_deref() == Some(subdomain) {
            String::new()
        } else {
            subdomain.to_string()
        }
    }
}

#[async_trait]
impl Middleware for SubdomainMiddleware {
    async fn process_request(&self, request: &mut HttpRequest) -> Option<HttpResponse> {
        let subdomain = self.detect(request);
        request.set_subdomain(subdomain);
        None
    }

    async fn process_response(&self, _request: &HttpRequest, response: HttpResponse) -> HttpResponse {
        response
    }

    async fn process_exception(&self, _request: &HttpRequest, _error: &SeoError) -> Option<HttpResponse> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::Site;

    fn middleware() -> SubdomainMiddleware {
        let mut sites = SiteRegistry::new();
        sites.register(Site::new(1, "example.com", "Example"));
        SubdomainMiddleware::new(Arc::new(sites)).with_default_subdomain("www")
    }

    fn detect(host: &str) -> String {
        middleware().detect(&HttpRequest::builder().host(host).build())
    }

    #[test]
    fn test_subdomain_of_site() {
        assert_eq!(detect("shop.example.com"), "shop");
        assert_eq!(detect("Shop.Example.com:8443"), "shop");
        assert_eq!(detect("a.b.example.com"), "a.b");
    }

    #[test]
    fn test_bare_and_default_subdomain() {
        assert_eq!(detect("example.com"), "");
        assert_eq!(detect("www.example.com"), "");
    }

    #[test]
    fn test_unrelated_host() {
        assert_eq!(detect("other.net"), "");
        assert_eq!(detect("notexample.com"), "");
    }

    #[test]
    fn test_no_sites_registered() {
        let mw = SubdomainMiddleware::new(Arc::new(SiteRegistry::new()));
        let request = HttpRequest::builder().host("shop.example.com").build();
        assert_eq!(mw.detect(&request), "");
    }

    #[test]
    fn test_subdomain_of_non_default_site() {
        let mut sites = SiteRegistry::with_default_site_id(1);
        sites.register(Site::new(1, "example.com", "Example"));
        sites.register(Site::new(2, "example.org", "Mirror"));
        let mw = SubdomainMiddleware::new(Arc::new(sites)).with_default_subdomain("www");

        let detect = |host: &str| mw.detect(&HttpRequest::builder().host(host).build());
        assert_eq!(detect("shop.example.org"), "shop");
        assert_eq!(detect("www.example.org"), "");
        assert_eq!(detect("example.org"), "");
    }

    #[tokio::test]
    async fn test_process_request_sets_subdomain() {
        let mut request = HttpRequest::builder().host("shop.example.com").build();
        assert!(middleware().process_request(&mut request).await.is_none());
        assert_eq!(request.subdomain(), "shop");
        assert!(request.has_subdomain());
    }
}
