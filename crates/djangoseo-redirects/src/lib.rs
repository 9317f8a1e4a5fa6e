//! # djangoseo-redirects
//!
//! The redirect engine of djangoseo-rs. When a GET request 404s, configured
//! [`RedirectPattern`](models::RedirectPattern)s are matched against the
//! requested path; the first match is materialized into a concrete
//! [`Redirect`](models::Redirect). Any 404 response whose path has a stored
//! redirect is replaced by a 301, or a 410 when the redirect has no
//! destination.
//!
//! ## Modules
//!
//! - [`models`] - Patterns, redirects and their validation
//! - [`store`] - The [`RedirectStore`](store::RedirectStore) trait plus memory and SQL stores
//! - [`matcher`] - Pattern matching and materialization
//! - [`resolver`] - The request-time hooks
//! - [`middleware`] - Middleware pipeline and the redirect/subdomain middleware
//! - [`sites`] - The sites framework
//! - [`sources`] - Startup pattern sources
//! - [`app`] - Wiring it all into a service

pub mod app;
pub mod matcher;
pub mod middleware;
pub mod models;
pub mod resolver;
pub mod sites;
pub mod sources;
pub mod store;

pub use app::{SeoApp, SeoService};
pub use matcher::PatternMatcher;
pub use models::{NewRedirect, NewRedirectPattern, Redirect, RedirectPattern};
pub use resolver::RedirectResolver;
pub use store::{MemoryRedirectStore, RedirectStore, SqlRedirectStore};
