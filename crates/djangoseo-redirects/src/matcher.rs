//! Turning pattern matches into concrete redirects.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use regex::Regex;

use crate::models::{compile_pattern, NewRedirect, Redirect, RedirectPattern};
use crate::store::RedirectStore;

/// Finds the pattern that applies to a missing path and materializes it.
///
/// Candidates come from [`RedirectStore::candidate_patterns`], so patterns
/// scoped to the request's subdomain are tried before `all_subdomains` ones.
/// Only the first matching pattern is used.
///
/// Compiled regexes are cached by pattern text and shared between clones.
#[derive(Clone)]
pub struct PatternMatcher {
    store: Arc<dyn RedirectStore>,
    compiled: Arc<RwLock<HashMap<String, Regex>>>,
}

impl std::fmt::Debug for PatternMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternMatcher").finish_non_exhaustive()
    }
}

impl PatternMatcher {
    pub fn new(store: Arc<dyn RedirectStore>) -> Self {
        Self {
            store,
            compiled: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the first candidate pattern matching `path`, without creating
    /// anything. Patterns that fail to compile are logged and skipped.
    pub async fn find_match(&self, site: u64, path: &str, subdomain: &str) -> Option<RedirectPattern> {
        let candidates = match self.store.candidate_patterns(site, subdomain).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!(site, path, subdomain, error = %e, "failed to load redirect patterns");
                return None;
            }
        };
        candidates.into_iter().find(|pattern| self.matches(pattern, path))
    }

    /// Materializes a redirect for `path` from the first matching pattern.
    ///
    /// Returns the redirect stored for the path (newly created or already
    /// present), or `None` when nothing matched or the store failed. Store
    /// failures are logged, never returned.
    pub async fn materialize(&self, site: u64, path: &str, subdomain: &str) -> Option<Redirect> {
        let pattern = self.find_match(site, path, subdomain).await?;
        let new_redirect = NewRedirect::from_pattern(&pattern, path);
        let new_path = new_redirect.new_path.clone();

        match self.store.get_or_create_redirect(new_redirect).await {
            Ok((redirect, true)) => {
                tracing::info!(
                    site,
                    old_path = path,
                    new_path = %redirect.new_path,
                    pattern_id = pattern.id,
                    "materialized redirect"
                );
                Some(redirect)
            }
            Ok((redirect, false)) => {
                tracing::debug!(site, old_path = path, "redirect already exists");
                Some(redirect)
            }
            Err(e) if e.is_integrity_error() => {
                tracing::warn!(site, old_path = path, new_path = %new_path, error = %e, "duplicate redirect");
                None
            }
            Err(e) => {
                tracing::error!(site, old_path = path, new_path = %new_path, error = %e, "failed to create redirect");
                None
            }
        }
    }

    fn matches(&self, pattern: &RedirectPattern, path: &str) -> bool {
        self.compiled(pattern).is_some_and(|re| re.is_match(path))
    }

    /// Returns the compiled regex for `pattern`, compiling and caching it on
    /// first use. Patterns that do not compile are logged and not cached.
    fn compiled(&self, pattern: &RedirectPattern) -> Option<Regex> {
        let cached = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pattern.url_pattern)
            .cloned();
        if cached.is_some() {
            return cached;
        }

        match compile_pattern(&pattern.url_pattern) {
            Ok(re) => {
                self.compiled
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(pattern.url_pattern.clone(), re.clone());
                Some(re)
            }
            Err(e) => {
                tracing::warn!(
                    pattern_id = pattern.id,
                    url_pattern = %pattern.url_pattern,
                    error = %e,
                    "skipping redirect pattern that does not compile"
                );
                None
            }
        }
    }

    /// Number of compiled patterns held in the cache.
    pub fn cached_patterns(&self) -> usize {
        self.compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use djangoseo_core::{SeoError, SeoResult};

    use super::*;
    use crate::models::NewRedirectPattern;
    use crate::store::MemoryRedirectStore;

    async fn matcher_with(patterns: Vec<NewRedirectPattern>) -> (PatternMatcher, Arc<MemoryRedirectStore>) {
        let store = Arc::new(MemoryRedirectStore::new());
        for p in patterns {
            store.add_pattern(p).await.unwrap();
        }
        (PatternMatcher::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_materialize_creates_redirect() {
        let (matcher, store) =
            matcher_with(vec![NewRedirectPattern::new(1, "^/old/.*", "/new/")]).await;

        let r = matcher.materialize(1, "/old/thing", "").await.unwrap();
        assert_eq!(r.old_path, "/old/thing");
        assert_eq!(r.new_path, "/new/");
        assert_eq!(store.redirects().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_materialize_no_match_creates_nothing() {
        let (matcher, store) =
            matcher_with(vec![NewRedirectPattern::new(1, "^/old/", "/new/")]).await;

        assert!(matcher.materialize(1, "/other/old/", "").await.is_none());
        assert!(matcher.materialize(2, "/old/x", "").await.is_none());
        assert!(store.redirects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_match_is_prefix_anchored() {
        let (matcher, _) = matcher_with(vec![NewRedirectPattern::new(1, "/old", "/new/")]).await;
        assert!(matcher.find_match(1, "/old/deep/path?q=1", "").await.is_some());
        assert!(matcher.find_match(1, "/x/old", "").await.is_none());
    }

    #[tokio::test]
    async fn test_specific_beats_wildcard() {
        let (matcher, _) = matcher_with(vec![
            NewRedirectPattern::new(1, "^/p/", "/wild/").all_subdomains(),
            NewRedirectPattern::new(1, "^/p/", "/specific/").subdomain("shop"),
        ])
        .await;

        let r = matcher.materialize(1, "/p/x", "shop").await.unwrap();
        assert_eq!(r.new_path, "/specific/");
        assert_eq!(r.subdomain, "shop");
        assert!(!r.all_subdomains);
    }

    #[tokio::test]
    async fn test_wildcard_used_from_other_subdomain() {
        let (matcher, _) = matcher_with(vec![
            NewRedirectPattern::new(1, "^/p/", "").subdomain("shop").all_subdomains(),
            NewRedirectPattern::new(1, "^/p/", "/bare/"),
        ])
        .await;

        let r = matcher.materialize(1, "/p/x", "blog").await.unwrap();
        assert!(r.is_gone());
        assert!(r.all_subdomains);
    }

    #[tokio::test]
    async fn test_equal_specificity_uses_lowest_id() {
        let (matcher, _) = matcher_with(vec![
            NewRedirectPattern::new(1, "^/a", "/first/"),
            NewRedirectPattern::new(1, "^/a/b", "/second/"),
        ])
        .await;

        let r = matcher.materialize(1, "/a/b/c", "").await.unwrap();
        assert_eq!(r.new_path, "/first/");
    }

    #[tokio::test]
    async fn test_materialize_twice_is_idempotent() {
        let (matcher, store) =
            matcher_with(vec![NewRedirectPattern::new(1, "^/old/", "/new/")]).await;

        let first = matcher.materialize(1, "/old/a", "").await.unwrap();
        let second = matcher.materialize(1, "/old/a", "").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.redirects().await.unwrap().len(), 1);
    }

    /// A store whose patterns are fixed and whose writes always fail.
    struct BrokenStore {
        patterns: Vec<RedirectPattern>,
        error: fn() -> SeoError,
        create_calls: AtomicUsize,
    }

    impl BrokenStore {
        fn new(patterns: Vec<RedirectPattern>, error: fn() -> SeoError) -> Self {
            Self {
                patterns,
                error,
                create_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RedirectStore for BrokenStore {
        async fn add_pattern(&self, _pattern: NewRedirectPattern) -> SeoResult<RedirectPattern> {
            Err((self.error)())
        }
        async fn remove_pattern(&self, _id: i64) -> SeoResult<bool> {
            Ok(false)
        }
        async fn patterns(&self) -> SeoResult<Vec<RedirectPattern>> {
            Ok(self.patterns.clone())
        }
        async fn candidate_patterns(&self, _site: u64, _subdomain: &str) -> SeoResult<Vec<RedirectPattern>> {
            Ok(self.patterns.clone())
        }
        async fn get_or_create_redirect(&self, _redirect: NewRedirect) -> SeoResult<(Redirect, bool)> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            Err((self.error)())
        }
        async fn find_redirect(&self, _site: u64, _old_path: &str, _subdomain: &str) -> SeoResult<Option<Redirect>> {
            Ok(None)
        }
        async fn redirects(&self) -> SeoResult<Vec<Redirect>> {
            Ok(Vec::new())
        }
        async fn remove_redirect(&self, _id: i64) -> SeoResult<bool> {
            Ok(false)
        }
    }

    fn two_matching_patterns() -> Vec<RedirectPattern> {
        vec![
            RedirectPattern::from_new(1, NewRedirectPattern::new(1, "^/", "/one/")),
            RedirectPattern::from_new(2, NewRedirectPattern::new(1, "^/", "/two/")),
        ]
    }

    #[tokio::test]
    async fn test_integrity_error_is_swallowed_and_stops() {
        let store = Arc::new(BrokenStore::new(two_matching_patterns(), || {
            SeoError::IntegrityError("UNIQUE constraint failed".into())
        }));
        let matcher = PatternMatcher::new(store.clone());

        assert!(matcher.materialize(1, "/x", "").await.is_none());
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_database_error_is_swallowed_and_stops() {
        let store = Arc::new(BrokenStore::new(two_matching_patterns(), || {
            SeoError::DatabaseError("disk full".into())
        }));
        let matcher = PatternMatcher::new(store.clone());

        assert!(matcher.materialize(1, "/x", "").await.is_none());
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_compiled_patterns_are_cached() {
        let (matcher, _) = matcher_with(vec![
            NewRedirectPattern::new(1, "^/a/", "/x/"),
            NewRedirectPattern::new(1, "^/b/", "/y/"),
        ])
        .await;
        assert_eq!(matcher.cached_patterns(), 0);

        assert!(matcher.find_match(1, "/b/1", "").await.is_some());
        assert_eq!(matcher.cached_patterns(), 2);

        let clone = matcher.clone();
        assert!(clone.find_match(1, "/a/1", "").await.is_some());
        assert!(clone.find_match(1, "/c/1", "").await.is_none());
        assert_eq!(matcher.cached_patterns(), 2);
    }

    #[tokio::test]
    async fn test_invalid_regex_is_skipped() {
        let patterns = vec![
            RedirectPattern::from_new(1, NewRedirectPattern::new(1, "([", "/broken/")),
            RedirectPattern::from_new(2, NewRedirectPattern::new(1, "^/x", "/ok/")),
        ];
        let store = Arc::new(BrokenStore::new(patterns, || SeoError::DatabaseError("x".into())));
        let matcher = PatternMatcher::new(store);

        let found = matcher.find_match(1, "/x", "").await.unwrap();
        assert_eq!(found.id, 2);
        assert_eq!(matcher.cached_patterns(), 1);
    }
}
