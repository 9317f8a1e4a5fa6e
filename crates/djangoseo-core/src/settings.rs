//! Settings for djangoseo-rs.
//!
//! This module provides the [`Settings`] struct, which holds all configuration
//! the redirect engine reads, and [`LazySettings`], a globally-accessible,
//! lazily-initialized settings instance. The design mirrors Django's
//! `django.conf.settings` with sensible defaults.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// App label that marks the sites framework as installed.
pub const SITES_APP: &str = "djangoseo.sites";

/// App label that marks the redirects app as installed.
pub const REDIRECTS_APP: &str = "djangoseo.redirects";

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// The database engine (e.g. `djangoseo.db.backends.sqlite3`).
    pub engine: String,
    /// The database name (or file path for `SQLite`).
    pub name: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: "djangoseo.db.backends.sqlite3".to_string(),
            name: "djangoseo.sqlite3".to_string(),
        }
    }
}

/// The complete set of settings.
///
/// Use [`SETTINGS`] to access the global instance.
///
/// # Examples
///
/// ```
/// use djangoseo_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(!settings.seo_use_redirects);
/// assert!(settings.append_slash);
/// assert_eq!(settings.site_id, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,
    /// List of installed application labels.
    pub installed_apps: Vec<String>,
    /// The fallback site used when the request host matches no registered site.
    pub site_id: u64,

    // ── Redirects ────────────────────────────────────────────────────

    /// Whether 404s on GET requests may materialize redirects from patterns.
    pub seo_use_redirects: bool,
    /// Whether paths lacking a trailing slash are retried with one appended.
    pub append_slash: bool,

    // ── Database ─────────────────────────────────────────────────────

    /// The database holding redirect patterns and redirects.
    pub database: DatabaseSettings,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Core
            debug: true,
            installed_apps: vec![SITES_APP.to_string(), REDIRECTS_APP.to_string()],
            site_id: 1,

            // Redirects
            seo_use_redirects: false,
            append_slash: true,

            // Database
            database: DatabaseSettings::default(),

            // Logging
            log_level: "info".to_string(),

            // Extra
            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Returns `true` if the given app label is listed in `installed_apps`.
    pub fn is_installed(&self, app: &str) -> bool {
        self.installed_apps.iter().any(|a| a == app)
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup to set the
/// settings, then use [`get`](LazySettings::get) to access them.
///
/// # Panics
///
/// [`get`](LazySettings::get) panics if settings have not been configured.
/// [`configure`](LazySettings::configure) panics if called more than once.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called exactly once.
    ///
    /// # Panics
    ///
    /// Panics if settings have already been configured.
    pub fn configure(&self, settings: Settings) {
        self.inner
            .set(settings)
            .expect("Settings have already been configured");
    }

    /// Returns a reference to the configured settings.
    ///
    /// # Panics
    ///
    /// Panics if settings have not been configured.
    pub fn get(&self) -> &Settings {
        self.inner
            .get()
            .expect("Settings have not been configured. Call SETTINGS.configure() first.")
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
///
/// Call `SETTINGS.configure(settings)` once at application startup, then
/// access settings via `SETTINGS.get()` anywhere.
pub static SETTINGS: LazySettings = LazySettings::new();
