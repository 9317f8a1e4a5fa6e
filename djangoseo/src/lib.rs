//! # djangoseo
//!
//! An SEO redirect engine for Rust web services.
//!
//! Administrators define regular-expression patterns. When a GET request
//! 404s, the first matching pattern is materialized into a concrete
//! redirect, and every later 404 on that path is answered with a 301 (or a
//! 410 when the pattern has no destination).
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on it for
//! everything, or on individual crates for finer-grained control.
//!
//! ```
//! # #[cfg(feature = "redirects")]
//! # async fn example() -> Result<(), djangoseo::core::SeoError> {
//! use djangoseo::prelude::*;
//!
//! let service = SeoApp::new(Settings { seo_use_redirects: true, ..Settings::default() })
//!     .site(Site::new(1, "example.com", "Example"))
//!     .pattern_source(StaticPatternSource::new(
//!         "builtin",
//!         vec![NewRedirectPattern::new(1, "^/old/", "/new/")],
//!     ))
//!     .build()
//!     .await?;
//! # let _ = service;
//! # Ok(())
//! # }
//! ```

/// Error type, settings, settings loading, logging, and system checks.
pub use djangoseo_core as core;

/// Database values, rows, and backends.
pub use djangoseo_db as db;

/// HTTP request and response types.
#[cfg(feature = "http")]
pub use djangoseo_http as http;

/// Patterns, redirect stores, the resolver, and middleware.
#[cfg(feature = "redirects")]
pub use djangoseo_redirects as redirects;

/// Management commands (CLI).
#[cfg(feature = "cli")]
pub use djangoseo_cli as cli;

// Third-party crates the public API exposes.
pub use async_trait;
pub use axum;
pub use tokio;
pub use tower_http;
pub use tracing;
pub use tracing_subscriber;

/// The types most applications need.
pub mod prelude {
    pub use djangoseo_core::{SeoError, SeoResult, Settings};

    #[cfg(feature = "http")]
    pub use djangoseo_http::{HttpRequest, HttpResponse};

    #[cfg(feature = "redirects")]
    pub use djangoseo_redirects::{
        middleware::{view_handler, ViewHandler},
        sites::Site,
        sources::{StaticPatternSource, TomlPatternSource},
        MemoryRedirectStore, NewRedirectPattern, RedirectStore, SeoApp, SeoService,
        SqlRedirectStore,
    };
}
