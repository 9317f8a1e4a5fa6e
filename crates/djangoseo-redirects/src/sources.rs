//! Pattern sources.
//!
//! A [`PatternSource`] supplies redirect patterns at startup. The host hands
//! its sources to [`SeoApp`](crate::app::SeoApp), which installs them into
//! the store with [`install_pattern_sources`].
//!
//! TOML sources use one `[[pattern]]` table per rule:
//!
//! ```toml
//! [[pattern]]
//! url_pattern = "^/old/.*"
//! redirect_path = "/new/"
//!
//! [[pattern]]
//! url_pattern = "^/retired/"
//! subdomain = "shop"
//! all_subdomains = true
//! ```
//!
//! `site` may be given per table; otherwise the source's default site is used.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use djangoseo_core::{SeoError, SeoResult};

use crate::models::NewRedirectPattern;
use crate::store::RedirectStore;

/// Something that can produce redirect patterns.
#[async_trait]
pub trait PatternSource: Send + Sync {
    /// A name for log messages.
    fn name(&self) -> &str;

    async fn load(&self) -> SeoResult<Vec<NewRedirectPattern>>;
}

/// Patterns declared in code.
#[derive(Debug, Clone)]
pub struct StaticPatternSource {
    name: String,
    patterns: Vec<NewRedirectPattern>,
}

impl StaticPatternSource {
    pub fn new(name: impl Into<String>, patterns: Vec<NewRedirectPattern>) -> Self {
        Self {
            name: name.into(),
            patterns,
        }
    }
}

#[async_trait]
impl PatternSource for StaticPatternSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> SeoResult<Vec<NewRedirectPattern>> {
        Ok(self.patterns.clone())
    }
}

#[derive(Debug, Clone)]
enum TomlInput {
    Inline(String),
    File(PathBuf),
}

#[derive(Debug, Deserialize)]
struct PatternFile {
    #[serde(default)]
    pattern: Vec<PatternEntry>,
}

#[derive(Debug, Deserialize)]
struct PatternEntry {
    url_pattern: String,
    site: Option<u64>,
    #[serde(default)]
    redirect_path: String,
    #[serde(default)]
    subdomain: String,
    #[serde(default)]
    all_subdomains: bool,
}

/// Patterns read from `[[pattern]]` tables in TOML.
#[derive(Debug, Clone)]
pub struct TomlPatternSource {
    name: String,
    input: TomlInput,
    default_site: u64,
}

impl TomlPatternSource {
    /// A source reading the file at `path` each time it is loaded.
    pub fn from_file(path: impl Into<PathBuf>, default_site: u64) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            input: TomlInput::File(path),
            default_site,
        }
    }

    /// A source over TOML text held in memory.
    pub fn from_toml_str(name: impl Into<String>, contents: impl Into<String>, default_site: u64) -> Self {
        Self {
            name: name.into(),
            input: TomlInput::Inline(contents.into()),
            default_site,
        }
    }

    fn parse(&self, contents: &str) -> SeoResult<Vec<NewRedirectPattern>> {
        let file: PatternFile = toml::from_str(contents).map_err(|e| {
            SeoError::ConfigurationError(format!("Invalid pattern file {}: {e}", self.name))
        })?;
        Ok(file
            .pattern
            .into_iter()
            .map(|entry| NewRedirectPattern {
                url_pattern: entry.url_pattern,
                site: entry.site.unwrap_or(self.default_site),
                redirect_path: entry.redirect_path,
                subdomain: entry.subdomain,
                all_subdomains: entry.all_subdomains,
            })
            .collect())
    }
}

#[async_trait]
impl PatternSource for TomlPatternSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> SeoResult<Vec<NewRedirectPattern>> {
        match &self.input {
            TomlInput::Inline(contents) => self.parse(contents),
            TomlInput::File(path) => {
                let contents = tokio::fs::read_to_string(path).await?;
                self.parse(&contents)
            }
        }
    }
}

/// Adds every pattern from `sources` that the store does not hold yet.
///
/// A pattern counts as present when one with the same site, regex, subdomain
/// and `all_subdomains` flag exists, so installing at every startup is safe.
/// A source that fails to load, or a pattern that fails validation, is
/// logged and skipped. Returns the number of patterns added.
pub async fn install_pattern_sources(
    store: &dyn RedirectStore,
    sources: &[Box<dyn PatternSource>],
) -> SeoResult<usize> {
    let mut existing = store.patterns().await?;
    let mut added = 0;

    for source in sources {
        let patterns = match source.load().await {
            Ok(patterns) => patterns,
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "could not load redirect patterns");
                continue;
            }
        };

        for pattern in patterns {
            if existing.iter().any(|p| p.same_rule(&pattern)) {
                continue;
            }
            match store.add_pattern(pattern).await {
                Ok(stored) => {
                    existing.push(stored);
                    added += 1;
                }
                Err(SeoError::ValidationError(e)) => {
                    tracing::warn!(source = source.name(), error = %e, "skipping invalid redirect pattern");
                }
                Err(e) => return Err(e),
            }
        }
    }

    if added > 0 {
        tracing::info!(added, "installed redirect patterns");
    }
    Ok(added)
}
