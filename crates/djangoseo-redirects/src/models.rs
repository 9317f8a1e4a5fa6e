//! Redirect patterns and concrete redirects.
//!
//! A [`RedirectPattern`] is an administrator-authored rule: a regular
//! expression plus a site/subdomain scope and a destination. When a GET
//! request 404s and a pattern matches its full path, the pattern is
//! materialized into a [`Redirect`], an exact `old_path -> new_path` mapping
//! that the fallback middleware serves from then on.
//!
//! `New*` types carry the fields of a record before the store assigns an id.

use std::fmt;

use djangoseo_core::ValidationError;
use regex::Regex;
use serde::Serialize;

/// Maximum length of every path-like field on both records.
pub const MAX_PATH_LENGTH: usize = 250;

/// Compiles a pattern with *match* semantics: anchored at the start of the
/// path, but free to stop before its end.
///
/// # Examples
///
/// ```
/// use djangoseo_redirects::models::compile_pattern;
///
/// let re = compile_pattern("/old/").unwrap();
/// assert!(re.is_match("/old/thing"));
/// assert!(!re.is_match("/x/old/"));
/// ```
pub fn compile_pattern(url_pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{url_pattern})"))
}

/// A stored redirect pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectPattern {
    /// Store-assigned id; also the tie-break between equally specific patterns.
    pub id: i64,
    /// Regular expression applied to the request's full path.
    pub url_pattern: String,
    /// The site this pattern belongs to.
    pub site: u64,
    /// Destination for matching paths. Empty means the content is gone.
    pub redirect_path: String,
    /// The subdomain this pattern is scoped to. Empty is the bare domain.
    pub subdomain: String,
    /// When set, the pattern applies on every subdomain.
    pub all_subdomains: bool,
}

impl RedirectPattern {
    /// Builds a stored pattern from its fields and an assigned id.
    pub fn from_new(id: i64, new: NewRedirectPattern) -> Self {
        Self {
            id,
            url_pattern: new.url_pattern,
            site: new.site,
            redirect_path: new.redirect_path,
            subdomain: new.subdomain,
            all_subdomains: new.all_subdomains,
        }
    }

    /// Returns `true` if this pattern is a candidate for a request on the
    /// given site and subdomain.
    pub fn applies_to(&self, site: u64, subdomain: &str) -> bool {
        self.site == site && (self.all_subdomains || self.subdomain == subdomain)
    }

    /// Returns `true` if both patterns share the same rule, ignoring ids and
    /// destination.
    pub fn same_rule(&self, other: &NewRedirectPattern) -> bool {
        self.site == other.site
            && self.url_pattern == other.url_pattern
            && self.subdomain == other.subdomain
            && self.all_subdomains == other.all_subdomains
    }
}

impl fmt::Display for RedirectPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redirect_path)
    }
}

/// The fields of a pattern that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRedirectPattern {
    pub url_pattern: String,
    pub site: u64,
    pub redirect_path: String,
    pub subdomain: String,
    pub all_subdomains: bool,
}

impl NewRedirectPattern {
    /// Creates a pattern scoped to the bare domain of `site`.
    pub fn new(site: u64, url_pattern: impl Into<String>, redirect_path: impl Into<String>) -> Self {
        Self {
            url_pattern: url_pattern.into(),
            site,
            redirect_path: redirect_path.into(),
            subdomain: String::new(),
            all_subdomains: false,
        }
    }

    /// Scopes the pattern to one subdomain.
    #[must_use]
    pub fn subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = subdomain.into();
        self
    }

    /// Makes the pattern apply on every subdomain.
    #[must_use]
    pub const fn all_subdomains(mut self) -> Self {
        self.all_subdomains = true;
        self
    }

    /// Checks field lengths and that the pattern compiles.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_length("url_pattern", &self.url_pattern)?;
        check_length("redirect_path", &self.redirect_path)?;
        check_length("subdomain", &self.subdomain)?;
        if self.url_pattern.is_empty() {
            return Err(required("url_pattern"));
        }
        compile_pattern(&self.url_pattern).map_err(|e| {
            ValidationError::new(format!("Invalid regular expression: {e}"), "invalid")
                .with_param("field", "url_pattern")
        })?;
        Ok(())
    }
}

/// A materialized, exact redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub id: i64,
    pub site: u64,
    /// The full path (with query string) this redirect answers for.
    pub old_path: String,
    /// Where to send the client. Empty means the content is gone.
    pub new_path: String,
    pub subdomain: String,
    pub all_subdomains: bool,
}

impl Redirect {
    /// Builds a stored redirect from its fields and an assigned id.
    pub fn from_new(id: i64, new: NewRedirect) -> Self {
        Self {
            id,
            site: new.site,
            old_path: new.old_path,
            new_path: new.new_path,
            subdomain: new.subdomain,
            all_subdomains: new.all_subdomains,
        }
    }

    /// Returns `true` if requests for this path should get a 410.
    pub fn is_gone(&self) -> bool {
        self.new_path.is_empty()
    }

    /// Returns `true` if this redirect is visible from the given subdomain.
    pub fn applies_to(&self, site: u64, subdomain: &str) -> bool {
        self.site == site && (self.all_subdomains || self.subdomain == subdomain)
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_gone() {
            write!(f, "{} ---> (gone)", self.old_path)
        } else {
            write!(f, "{} ---> {}", self.old_path, self.new_path)
        }
    }
}

/// The fields of a redirect that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRedirect {
    pub site: u64,
    pub old_path: String,
    pub new_path: String,
    pub subdomain: String,
    pub all_subdomains: bool,
}

impl NewRedirect {
    /// The redirect a pattern produces for `path`: destination and scope
    /// are carried over from the pattern.
    pub fn from_pattern(pattern: &RedirectPattern, path: &str) -> Self {
        Self {
            site: pattern.site,
            old_path: path.to_string(),
            new_path: pattern.redirect_path.clone(),
            subdomain: pattern.subdomain.clone(),
            all_subdomains: pattern.all_subdomains,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.old_path.is_empty() {
            return Err(required("old_path"));
        }
        check_length("old_path", &self.old_path)?;
        check_length("new_path", &self.new_path)?;
        check_length("subdomain", &self.subdomain)?;
        Ok(())
    }
}

fn check_length(field: &str, value: &str) -> Result<(), ValidationError> {
    let length = value.chars().count();
    if length > MAX_PATH_LENGTH {
        return Err(ValidationError::new(
            format!(
                "Ensure this value has at most {MAX_PATH_LENGTH} characters (it has {length})."
            ),
            "max_length",
        )
        .with_param("field", field)
        .with_param("limit_value", MAX_PATH_LENGTH.to_string()));
    }
    Ok(())
}

fn required(field: &str) -> ValidationError {
    ValidationError::new("This field cannot be blank.", "blank").with_param("field", field)
}
