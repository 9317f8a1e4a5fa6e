//! Application assembly.
//!
//! [`SeoApp`] collects settings, the redirect store, sites and pattern
//! sources, and [`SeoApp::build`] turns them into a [`SeoService`]: the
//! middleware pipeline wrapped around a host-supplied view, exposed directly
//! or as an Axum router.
//!
//! ```no_run
//! use djangoseo_core::{SeoError, Settings};
//! use djangoseo_redirects::app::SeoApp;
//! use djangoseo_redirects::middleware::view_handler;
//! use djangoseo_redirects::sites::Site;
//!
//! # async fn example() -> Result<(), SeoError> {
//! let service = SeoApp::new(Settings::default())
//!     .site(Site::new(1, "example.com", "Example"))
//!     .build()
//!     .await?;
//!
//! let view = view_handler(|request| async move {
//!     Err(SeoError::NotFound(request.path().to_string()))
//! });
//! service.run("127.0.0.1:8000", view).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::response::IntoResponse;
use axum::routing::any;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use djangoseo_core::checks::CheckRegistry;
use djangoseo_core::logging::request_span;
use djangoseo_core::{SeoError, SeoResult, Settings};
use djangoseo_http::{HttpRequest, HttpResponse};

use crate::middleware::{
    MiddlewarePipeline, RedirectFallbackMiddleware, RedirectsMiddleware, SubdomainMiddleware,
    ViewHandler,
};
use crate::resolver::RedirectResolver;
use crate::sites::{Site, SiteRegistry};
use crate::sources::{install_pattern_sources, PatternSource};
use crate::store::{MemoryRedirectStore, RedirectStore};

/// Builder for a [`SeoService`].
pub struct SeoApp {
    settings: Settings,
    store: Option<Arc<dyn RedirectStore>>,
    sites: SiteRegistry,
    sources: Vec<Box<dyn PatternSource>>,
    default_subdomain: Option<String>,
    checks: CheckRegistry,
}

impl SeoApp {
    /// Starts a builder. The site registry falls back to `settings.site_id`.
    pub fn new(settings: Settings) -> Self {
        Self {
            sites: SiteRegistry::with_default_site_id(settings.site_id),
            settings,
            store: None,
            sources: Vec::new(),
            default_subdomain: None,
            checks: CheckRegistry::with_builtins(),
        }
    }

    /// Sets the redirect store. Defaults to a [`MemoryRedirectStore`].
    #[must_use]
    pub fn store(mut self, store: Arc<dyn RedirectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Registers a site.
    #[must_use]
    pub fn site(mut self, site: Site) -> Self {
        self.sites.register(site);
        self
    }

    /// Replaces the site registry.
    #[must_use]
    pub fn sites(mut self, sites: SiteRegistry) -> Self {
        self.sites = sites;
        self
    }

    /// Adds a source whose patterns are installed at build time.
    #[must_use]
    pub fn pattern_source(mut self, source: impl PatternSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Treats this subdomain (e.g. `www`) as the bare domain.
    #[must_use]
    pub fn default_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.default_subdomain = Some(subdomain.into());
        self
    }

    /// Replaces the system checks run at build time.
    #[must_use]
    pub fn checks(mut self, checks: CheckRegistry) -> Self {
        self.checks = checks;
        self
    }

    /// Runs system checks, installs pattern sources and assembles the
    /// pipeline: subdomain detection, then the fallback, then the redirects
    /// middleware.
    ///
    /// Fails with [`SeoError::ImproperlyConfigured`] on any check error or
    /// when the sites framework is not installed.
    pub async fn build(self) -> SeoResult<SeoService> {
        self.checks.run_checks_or_fail(&self.settings)?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryRedirectStore::new()));
        install_pattern_sources(store.as_ref(), &self.sources).await?;

        let sites = Arc::new(self.sites);
        let resolver = Arc::new(RedirectResolver::new(
            store.clone(),
            sites.clone(),
            &self.settings,
        ));

        let mut subdomains = SubdomainMiddleware::new(sites);
        if let Some(default) = self.default_subdomain {
            subdomains = subdomains.with_default_subdomain(default);
        }

        let mut pipeline = MiddlewarePipeline::new();
        pipeline.add(subdomains);
        pipeline.add(RedirectFallbackMiddleware::try_new(
            &self.settings,
            resolver.clone(),
        )?);
        pipeline.add(RedirectsMiddleware::new(resolver.clone()));

        tracing::info!(
            seo_use_redirects = self.settings.seo_use_redirects,
            append_slash = self.settings.append_slash,
            "redirect engine ready"
        );

        Ok(SeoService {
            pipeline: Arc::new(pipeline),
            resolver,
            store,
            settings: Arc::new(self.settings),
        })
    }
}

impl std::fmt::Debug for SeoApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeoApp")
            .field("sites", &self.sites.len())
            .field("sources", &self.sources.len())
            .field("checks", &self.checks.len())
            .finish_non_exhaustive()
    }
}

/// A built redirect engine, ready to serve requests.
#[derive(Clone)]
pub struct SeoService {
    pipeline: Arc<MiddlewarePipeline>,
    resolver: Arc<RedirectResolver>,
    store: Arc<dyn RedirectStore>,
    settings: Arc<Settings>,
}

impl SeoService {
    pub fn store(&self) -> &Arc<dyn RedirectStore> {
        &self.store
    }

    pub fn resolver(&self) -> &Arc<RedirectResolver> {
        &self.resolver
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs one request through the pipeline and `view`, inside a request
    /// span tagged with a fresh id.
    pub async fn handle(&self, request: HttpRequest, view: &ViewHandler) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = request_span(&request_id, request.method().as_str(), request.path());
        self.pipeline.process(request, view).instrument(span).await
    }

    /// Converts the service into an Axum router answering every path.
    pub fn into_axum_router(self, view: ViewHandler) -> axum::Router {
        let service = Arc::new(self);

        let handler = move |req: Request<Body>| {
            let service = service.clone();
            let view = view.clone();

            async move {
                let (parts, body) = req.into_parts();
                let body_bytes = axum::body::to_bytes(body, usize::MAX)
                    .await
                    .unwrap_or_default()
                    .to_vec();

                let request = HttpRequest::from_axum(parts, body_bytes);
                service.handle(request, &view).await.into_response()
            }
        };

        axum::Router::new()
            .route("/{*path}", any(handler.clone()))
            .route("/", any(handler))
            .layer(TraceLayer::new_for_http())
    }

    /// Serves the engine over HTTP on `addr`.
    pub async fn run(self, addr: &str, view: ViewHandler) -> SeoResult<()> {
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            SeoError::ImproperlyConfigured(format!("Failed to bind to {addr}: {e}"))
        })?;

        tracing::info!("Serving redirects at http://{addr}/");

        axum::serve(listener, self.into_axum_router(view))
            .await
            .map_err(|e| SeoError::InternalServerError(format!("Server error: {e}")))
    }
}

impl std::fmt::Debug for SeoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeoService")
            .field("pipeline", &self.pipeline)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
