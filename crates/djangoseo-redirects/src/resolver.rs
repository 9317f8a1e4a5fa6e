//! Request-time redirect resolution.
//!
//! [`RedirectResolver`] is called from two points of the request cycle:
//!
//! 1. [`on_not_found`](RedirectResolver::on_not_found) when the view raised a
//!    not-found error for a GET request. It may materialize a redirect from
//!    the configured patterns.
//! 2. [`on_response`](RedirectResolver::on_response) for every response. A
//!    404 is replaced by a 301 or 410 when a stored redirect covers the path.
//!
//! Exception handling runs first, so with a store that commits writes
//! immediately a freshly materialized redirect is served on the same request.

use std::sync::Arc;

use http::{Method, StatusCode};

use djangoseo_core::{SeoError, Settings};
use djangoseo_http::{HttpRequest, HttpResponse, HttpResponseGone, HttpResponsePermanentRedirect};

use crate::matcher::PatternMatcher;
use crate::models::Redirect;
use crate::sites::SiteRegistry;
use crate::store::RedirectStore;

/// Resolves 404s into materialized or served redirects.
pub struct RedirectResolver {
    store: Arc<dyn RedirectStore>,
    matcher: PatternMatcher,
    sites: Arc<SiteRegistry>,
    use_redirects: bool,
    append_slash: bool,
}

impl std::fmt::Debug for RedirectResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectResolver")
            .field("use_redirects", &self.use_redirects)
            .field("append_slash", &self.append_slash)
            .finish_non_exhaustive()
    }
}

impl RedirectResolver {
    /// Creates a resolver reading `seo_use_redirects` and `append_slash`
    /// from the settings.
    pub fn new(store: Arc<dyn RedirectStore>, sites: Arc<SiteRegistry>, settings: &Settings) -> Self {
        Self {
            matcher: PatternMatcher::new(store.clone()),
            store,
            sites,
            use_redirects: settings.seo_use_redirects,
            append_slash: settings.append_slash,
        }
    }

    pub const fn use_redirects(&self) -> bool {
        self.use_redirects
    }

    pub const fn append_slash(&self) -> bool {
        self.append_slash
    }

    pub const fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    /// Handles a view error. Only a not-found miss on a GET request, with
    /// `seo_use_redirects` enabled, reaches the pattern matcher.
    pub async fn on_not_found(&self, request: &HttpRequest, error: &SeoError) {
        if !self.use_redirects || request.method() != Method::GET || !error.is_not_found() {
            return;
        }

        let site = self.sites.current_site_id(request);
        let full_path = request.get_full_path();
        self.matcher
            .materialize(site, &full_path, request.subdomain())
            .await;
    }

    /// Returns the redirect stored for this request, trying the path with a
    /// trailing slash appended when the exact path has none.
    pub async fn lookup(&self, request: &HttpRequest) -> Option<Redirect> {
        let site = self.sites.current_site_id(request);
        let subdomain = request.subdomain();

        if let Some(redirect) = self.find(site, &request.get_full_path(), subdomain).await {
            return Some(redirect);
        }
        if self.append_slash && !request.path().ends_with('/') {
            return self
                .find(site, &request.get_full_path_with_slash(), subdomain)
                .await;
        }
        None
    }

    async fn find(&self, site: u64, old_path: &str, subdomain: &str) -> Option<Redirect> {
        match self.store.find_redirect(site, old_path, subdomain).await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(site, old_path, subdomain, error = %e, "redirect lookup failed");
                None
            }
        }
    }

    /// Replaces a 404 response with a 410 or 301 if a redirect covers the
    /// request. Any other response is returned untouched without lookups.
    pub async fn on_response(&self, request: &HttpRequest, response: HttpResponse) -> HttpResponse {
        if response.status() != StatusCode::NOT_FOUND {
            return response;
        }

        match self.lookup(request).await {
            Some(redirect) if redirect.is_gone() => {
                tracing::debug!(old_path = %redirect.old_path, "serving 410 for removed path");
                HttpResponseGone::new()
            }
            Some(redirect) => {
                tracing::debug!(
                    old_path = %redirect.old_path,
                    new_path = %redirect.new_path,
                    "serving permanent redirect"
                );
                HttpResponsePermanentRedirect::new(&redirect.new_path)
            }
            None => response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewRedirect, NewRedirectPattern};
    use crate::sites::Site;
    use crate::store::MemoryRedirectStore;

    fn settings(use_redirects: bool, append_slash: bool) -> Settings {
        Settings {
            seo_use_redirects: use_redirects,
            append_slash,
            ..Settings::default()
        }
    }

    fn sites() -> Arc<SiteRegistry> {
        let mut registry = SiteRegistry::new();
        registry.register(Site::new(1, "example.com", "Example"));
        registry.register(Site::new(2, "example.org", "Mirror"));
        Arc::new(registry)
    }

    fn resolver(store: &Arc<MemoryRedirectStore>, settings: &Settings) -> RedirectResolver {
        RedirectResolver::new(store.clone(), sites(), settings)
    }

    fn get(path: &str) -> HttpRequest {
        HttpRequest::builder().host("example.com").path(path).build()
    }

    fn not_found() -> SeoError {
        SeoError::NotFound("no route".into())
    }

    async fn store_with_redirect(old: &str, new: &str) -> Arc<MemoryRedirectStore> {
        let store = Arc::new(MemoryRedirectStore::new());
        store
            .get_or_create_redirect(NewRedirect {
                site: 1,
                old_path: old.into(),
                new_path: new.into(),
                subdomain: String::new(),
                all_subdomains: false,
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_on_not_found_materializes() {
        let store = Arc::new(MemoryRedirectStore::new());
        store
            .add_pattern(NewRedirectPattern::new(1, "^/old/", "/new/"))
            .await
            .unwrap();
        let resolver = resolver(&store, &settings(true, true));

        resolver.on_not_found(&get("/old/x"), &not_found()).await;
        let redirects = store.redirects().await.unwrap();
        assert_eq!(redirects.len(), 1);
        assert_eq!(redirects[0].old_path, "/old/x");
    }

    #[tokio::test]
    async fn test_on_not_found_uses_full_path_and_site() {
        let store = Arc::new(MemoryRedirectStore::new());
        store
            .add_pattern(NewRedirectPattern::new(2, "^/old/", "/new/"))
            .await
            .unwrap();
        let resolver = resolver(&store, &settings(true, true));

        let request = HttpRequest::builder()
            .host("example.org")
            .path("/old/x")
            .query_string("a=1")
            .build();
        resolver.on_not_found(&request, &not_found()).await;

        let r = store.find_redirect(2, "/old/x?a=1", "").await.unwrap().unwrap();
        assert_eq!(r.new_path, "/new/");
    }

    #[tokio::test]
    async fn test_on_not_found_disabled_flag() {
        let store = Arc::new(MemoryRedirectStore::new());
        store
            .add_pattern(NewRedirectPattern::new(1, "^/old/", "/new/"))
            .await
            .unwrap();
        let resolver = resolver(&store, &settings(false, true));

        resolver.on_not_found(&get("/old/x"), &not_found()).await;
        assert!(store.redirects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_on_not_found_ignores_post_and_other_errors() {
        let store = Arc::new(MemoryRedirectStore::new());
        store
            .add_pattern(NewRedirectPattern::new(1, "^/old/", "/new/"))
            .await
            .unwrap();
        let resolver = resolver(&store, &settings(true, true));

        let post = HttpRequest::builder()
            .method(Method::POST)
            .host("example.com")
            .path("/old/x")
            .build();
        resolver.on_not_found(&post, &not_found()).await;
        resolver
            .on_not_found(&get("/old/y"), &SeoError::InternalServerError("boom".into()))
            .await;
        assert!(store.redirects().await.unwrap().is_empty());

        resolver
            .on_not_found(&get("/old/z"), &SeoError::DoesNotExist("gone".into()))
            .await;
        assert_eq!(store.redirects().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_on_response_redirects_404() {
        let store = store_with_redirect("/old/thing", "/new/").await;
        let resolver = resolver(&store, &settings(true, true));

        let resp = resolver
            .on_response(&get("/old/thing"), HttpResponse::not_found(""))
            .await;
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.location(), Some("/new/"));
    }

    #[tokio::test]
    async fn test_on_response_gone() {
        let store = store_with_redirect("/removed", "").await;
        let resolver = resolver(&store, &settings(true, true));

        let resp = resolver
            .on_response(&get("/removed"), HttpResponse::not_found(""))
            .await;
        assert_eq!(resp.status(), StatusCode::GONE);
    }

    #[tokio::test]
    async fn test_on_response_leaves_non_404() {
        let store = store_with_redirect("/old/thing", "/new/").await;
        let resolver = resolver(&store, &settings(true, true));

        let resp = resolver
            .on_response(&get("/old/thing"), HttpResponse::ok("fine"))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_on_response_passthrough() {
        let store = Arc::new(MemoryRedirectStore::new());
        let resolver = resolver(&store, &settings(true, true));

        let resp = resolver
            .on_response(&get("/nothing"), HttpResponse::not_found("custom body"))
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.content_bytes(), b"custom body");
    }

    #[tokio::test]
    async fn test_append_slash_retry() {
        let store = store_with_redirect("/foo/", "/bar/").await;

        let on = resolver(&store, &settings(true, true));
        let resp = on.on_response(&get("/foo"), HttpResponse::not_found("")).await;
        assert_eq!(resp.location(), Some("/bar/"));

        let off = resolver(&store, &settings(true, false));
        let resp = off.on_response(&get("/foo"), HttpResponse::not_found("")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_append_slash_keeps_query() {
        let store = store_with_redirect("/foo/?a=1", "/bar/").await;
        let resolver = resolver(&store, &settings(true, true));

        let request = HttpRequest::builder()
            .host("example.com")
            .path("/foo")
            .query_string("a=1")
            .build();
        let redirect = resolver.lookup(&request).await.unwrap();
        assert_eq!(redirect.new_path, "/bar/");
    }

    #[tokio::test]
    async fn test_exact_match_wins_over_slash_retry() {
        let store = store_with_redirect("/foo/", "/slashed/").await;
        store
            .get_or_create_redirect(NewRedirect {
                site: 1,
                old_path: "/foo".into(),
                new_path: "/exact/".into(),
                subdomain: String::new(),
                all_subdomains: false,
            })
            .await
            .unwrap();
        let resolver = resolver(&store, &settings(true, true));

        assert_eq!(resolver.lookup(&get("/foo")).await.unwrap().new_path, "/exact/");
    }

    #[tokio::test]
    async fn test_lookup_respects_subdomain() {
        let store = Arc::new(MemoryRedirectStore::new());
        store
            .get_or_create_redirect(NewRedirect {
                site: 1,
                old_path: "/p".into(),
                new_path: "/shop-only/".into(),
                subdomain: "shop".into(),
                all_subdomains: false,
            })
            .await
            .unwrap();
        let resolver = resolver(&store, &settings(true, true));

        assert!(resolver.lookup(&get("/p")).await.is_none());
        let shop = HttpRequest::builder()
            .host("example.com")
            .path("/p")
            .subdomain("shop")
            .build();
        assert!(resolver.lookup(&shop).await.is_some());
    }
}
