//! System check framework for djangoseo-rs.
//!
//! Checks inspect the configuration before any traffic is served, so that a
//! misconfigured deployment fails at startup instead of degrading on every
//! request. It mirrors Django's `django.core.checks` module.
//!
//! ## Overview
//!
//! - [`CheckMessage`]: A diagnostic message from a check (with level, message, hint, etc.).
//! - [`CheckLevel`]: Severity level (Debug, Info, Warning, Error, Critical).
//! - [`CheckRegistry`]: Registry for check functions with tag-based filtering.
//! - Built-in checks: the sites framework is installed alongside redirects,
//!   auto-registration is not enabled without the redirects app, and
//!   `site_id` is a usable id.
//!
//! ## Examples
//!
//! ```
//! use djangoseo_core::checks::{CheckMessage, CheckRegistry};
//!
//! let mut registry = CheckRegistry::new();
//! registry.register(
//!     |_settings| {
//!         vec![CheckMessage::warning(
//!             "Custom check warning",
//!             Some("Consider fixing this."),
//!             None,
//!             Some("myapp.W001"),
//!         )]
//!     },
//!     &["myapp"],
//! );
//!
//! let settings = djangoseo_core::settings::Settings::default();
//! let messages = registry.run_checks(None, &settings);
//! assert!(!messages.is_empty());
//! ```

use crate::error::SeoError;
use crate::settings::{Settings, REDIRECTS_APP, SITES_APP};

/// Severity level for a check message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckLevel {
    /// Debugging information.
    Debug = 0,
    /// Informational message.
    Info = 1,
    /// A potential problem.
    Warning = 2,
    /// A definite problem that should be fixed.
    Error = 3,
    /// A critical error that prevents the application from running.
    Critical = 4,
}

impl std::fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A diagnostic message produced by a system check.
#[derive(Debug, Clone)]
pub struct CheckMessage {
    /// The severity level.
    pub level: CheckLevel,
    /// The human-readable message describing the issue.
    pub msg: String,
    /// An optional hint on how to fix the issue.
    pub hint: Option<String>,
    /// The object (setting, model, etc.) that has the issue.
    pub obj: Option<String>,
    /// A unique identifier for this check message (e.g. "redirects.E001").
    pub id: Option<String>,
}

impl CheckMessage {
    /// Creates a new `CheckMessage` with the given level and details.
    pub fn new(
        level: CheckLevel,
        msg: impl Into<String>,
        hint: Option<&str>,
        obj: Option<&str>,
        id: Option<&str>,
    ) -> Self {
        Self {
            level,
            msg: msg.into(),
            hint: hint.map(String::from),
            obj: obj.map(String::from),
            id: id.map(String::from),
        }
    }

    /// Creates an info-level message.
    pub fn info(msg: impl Into<String>, hint: Option<&str>, obj: Option<&str>, id: Option<&str>) -> Self {
        Self::new(CheckLevel::Info, msg, hint, obj, id)
    }

    /// Creates a warning-level message.
    pub fn warning(msg: impl Into<String>, hint: Option<&str>, obj: Option<&str>, id: Option<&str>) -> Self {
        Self::new(CheckLevel::Warning, msg, hint, obj, id)
    }

    /// Creates an error-level message.
    pub fn error(msg: impl Into<String>, hint: Option<&str>, obj: Option<&str>, id: Option<&str>) -> Self {
        Self::new(CheckLevel::Error, msg, hint, obj, id)
    }

    /// Creates a critical-level message.
    pub fn critical(msg: impl Into<String>, hint: Option<&str>, obj: Option<&str>, id: Option<&str>) -> Self {
        Self::new(CheckLevel::Critical, msg, hint, obj, id)
    }

    /// Returns `true` if this is a warning or higher severity.
    pub fn is_serious(&self) -> bool {
        self.level >= CheckLevel::Warning
    }
}

impl std::fmt::Display for CheckMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.id {
            write!(f, "({id}) ")?;
        }
        write!(f, "{}: {}", self.level, self.msg)?;
        if let Some(ref hint) = self.hint {
            write!(f, "\n\tHINT: {hint}")?;
        }
        if let Some(ref obj) = self.obj {
            write!(f, "\n\tObject: {obj}")?;
        }
        Ok(())
    }
}

/// A check function that receives settings and returns diagnostic messages.
pub type CheckFn = fn(&Settings) -> Vec<CheckMessage>;

/// A registered check with associated tags.
struct RegisteredCheck {
    func: CheckFn,
    tags: Vec<String>,
}

/// Registry for system check functions.
///
/// Check functions can be registered with tags, and then run all at once
/// or filtered by tag.
pub struct CheckRegistry {
    checks: Vec<RegisteredCheck>,
}

impl CheckRegistry {
    /// Creates a new empty check registry.
    pub const fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Creates a new check registry pre-loaded with built-in checks.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(check_sites_installed, &["redirects", "sites"]);
        registry.register(check_redirects_flag, &["redirects"]);
        registry.register(check_site_id, &["sites"]);
        registry
    }

    /// Registers a check function with the given tags.
    pub fn register(&mut self, func: CheckFn, tags: &[&str]) {
        self.checks.push(RegisteredCheck {
            func,
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
        });
    }

    /// Runs all registered checks (or only those matching the given tags)
    /// and collects all resulting messages.
    pub fn run_checks(
        &self,
        tags: Option<&[&str]>,
        settings: &Settings,
    ) -> Vec<CheckMessage> {
        let mut messages = Vec::new();

        for check in &self.checks {
            let should_run = tags.map_or(true, |filter_tags| {
                filter_tags.iter().any(|t| check.tags.contains(&(*t).to_string()))
            });

            if should_run {
                messages.extend((check.func)(settings));
            }
        }

        messages
    }

    /// Runs all checks and fails if any reports an error or worse.
    ///
    /// Warnings are logged and do not stop startup.
    pub fn run_checks_or_fail(&self, settings: &Settings) -> Result<Vec<CheckMessage>, SeoError> {
        let messages = self.run_checks(None, settings);

        for message in messages.iter().filter(|m| m.level == CheckLevel::Warning) {
            tracing::warn!("System check: {message}");
        }

        let errors: Vec<String> = messages
            .iter()
            .filter(|m| m.level >= CheckLevel::Error)
            .map(ToString::to_string)
            .collect();

        if errors.is_empty() {
            Ok(messages)
        } else {
            Err(SeoError::ImproperlyConfigured(format!(
                "System check identified {} issue(s):\n{}",
                errors.len(),
                errors.join("\n")
            )))
        }
    }

    /// Returns the number of registered checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns `true` if no checks are registered.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Built-in checks
// ============================================================

/// The redirect fallback resolves the current site, so redirects need the sites framework.
fn check_sites_installed(settings: &Settings) -> Vec<CheckMessage> {
    let mut messages = Vec::new();

    if settings.is_installed(REDIRECTS_APP) && !settings.is_installed(SITES_APP) {
        messages.push(CheckMessage::error(
            format!("{REDIRECTS_APP} is installed but {SITES_APP} is not."),
            Some("Add \"djangoseo.sites\" to installed_apps."),
            Some("settings.installed_apps"),
            Some("redirects.E001"),
        ));
    }

    messages
}

/// Checks that auto-registration is only enabled when the redirects app is installed.
fn check_redirects_flag(settings: &Settings) -> Vec<CheckMessage> {
    let mut messages = Vec::new();

    if settings.seo_use_redirects && !settings.is_installed(REDIRECTS_APP) {
        messages.push(CheckMessage::warning(
            "seo_use_redirects is enabled but the redirects app is not installed.",
            Some("Add \"djangoseo.redirects\" to installed_apps or disable seo_use_redirects."),
            Some("settings.seo_use_redirects"),
            Some("redirects.W001"),
        ));
    }

    messages
}

/// Checks that the fallback site id is usable.
fn check_site_id(settings: &Settings) -> Vec<CheckMessage> {
    let mut messages = Vec::new();

    if settings.site_id == 0 {
        messages.push(CheckMessage::warning(
            "site_id is 0; requests from unknown hosts will not resolve to a site.",
            Some("Set site_id to the id of a registered site."),
            Some("settings.site_id"),
            Some("redirects.W002"),
        ));
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── CheckLevel ──────────────────────────────────────────────────

    #[test]
    fn test_check_level_ordering() {
        assert!(CheckLevel::Debug < CheckLevel::Info);
        assert!(CheckLevel::Info < CheckLevel::Warning);
        assert!(CheckLevel::Warning < CheckLevel::Error);
        assert!(CheckLevel::Error < CheckLevel::Critical);
    }

    #[test]
    fn test_check_level_display() {
        assert_eq!(CheckLevel::Warning.to_string(), "WARNING");
        assert_eq!(CheckLevel::Critical.to_string(), "CRITICAL");
    }

    // ── CheckMessage ────────────────────────────────────────────────

    #[test]
    fn test_check_message_is_serious() {
        assert!(!CheckMessage::info("", None, None, None).is_serious());
        assert!(CheckMessage::warning("", None, None, None).is_serious());
        assert!(CheckMessage::error("", None, None, None).is_serious());
        assert!(CheckMessage::critical("", None, None, None).is_serious());
    }

    #[test]
    fn test_check_message_display() {
        let m = CheckMessage::warning(
            "Bad config",
            Some("Fix it"),
            Some("settings.foo"),
            Some("myapp.W001"),
        );
        let s = m.to_string();
        assert!(s.contains("(myapp.W001)"));
        assert!(s.contains("WARNING: Bad config"));
        assert!(s.contains("HINT: Fix it"));
        assert!(s.contains("Object: settings.foo"));
    }

    #[test]
    fn test_check_message_display_minimal() {
        let m = CheckMessage::info("Just info", None, None, None);
        assert_eq!(m.to_string(), "INFO: Just info");
    }

    // ── CheckRegistry ───────────────────────────────────────────────

    #[test]
    fn test_registry_tag_filtering() {
        let mut registry = CheckRegistry::new();
        registry.register(
            |_| vec![CheckMessage::warning("redirect issue", None, None, None)],
            &["redirects"],
        );
        registry.register(
            |_| vec![CheckMessage::info("site info", None, None, None)],
            &["sites"],
        );

        let settings = Settings::default();
        assert_eq!(registry.run_checks(None, &settings).len(), 2);

        let redirects_only = registry.run_checks(Some(&["redirects"]), &settings);
        assert_eq!(redirects_only.len(), 1);
        assert!(redirects_only[0].msg.contains("redirect"));

        assert!(registry.run_checks(Some(&["templates"]), &settings).is_empty());
    }

    // ── Built-in checks ─────────────────────────────────────────────

    #[test]
    fn test_builtins_pass_on_defaults() {
        let registry = CheckRegistry::with_builtins();
        assert_eq!(registry.len(), 3);
        let messages = registry.run_checks(None, &Settings::default());
        assert!(messages.is_empty());
    }

    #[test]
    fn test_check_sites_missing_is_error() {
        let settings = Settings {
            installed_apps: vec![REDIRECTS_APP.to_string()],
            ..Settings::default()
        };
        let messages = check_sites_installed(&settings);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].level, CheckLevel::Error);
        assert_eq!(messages[0].id.as_deref(), Some("redirects.E001"));
    }

    #[test]
    fn test_check_redirects_flag_without_app() {
        let settings = Settings {
            seo_use_redirects: true,
            installed_apps: vec![SITES_APP.to_string()],
            ..Settings::default()
        };
        let messages = check_redirects_flag(&settings);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id.as_deref(), Some("redirects.W001"));
    }

    #[test]
    fn test_check_site_id_zero() {
        let settings = Settings {
            site_id: 0,
            ..Settings::default()
        };
        let messages = check_site_id(&settings);
        assert_eq!(messages[0].id.as_deref(), Some("redirects.W002"));
    }

    #[test]
    fn test_run_checks_or_fail_rejects_errors() {
        let registry = CheckRegistry::with_builtins();
        let settings = Settings {
            installed_apps: vec![REDIRECTS_APP.to_string()],
            ..Settings::default()
        };
        let err = registry.run_checks_or_fail(&settings).unwrap_err();
        assert!(matches!(err, SeoError::ImproperlyConfigured(_)));
        assert!(err.to_string().contains("redirects.E001"));
    }

    #[test]
    fn test_run_checks_or_fail_allows_warnings() {
        let registry = CheckRegistry::with_builtins();
        let settings = Settings {
            site_id: 0,
            ..Settings::default()
        };
        let messages = registry.run_checks_or_fail(&settings).unwrap();
        assert_eq!(messages.len(), 1);
    }
}
