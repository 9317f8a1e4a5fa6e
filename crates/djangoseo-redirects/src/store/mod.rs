//! Persistence for redirect patterns and redirects.
//!
//! [`RedirectStore`] is the seam between the redirect engine and whatever
//! holds its data. Two implementations ship with the crate:
//!
//! - [`MemoryRedirectStore`] keeps everything in process memory
//! - [`SqlRedirectStore`] persists to any [`DatabaseBackend`](djangoseo_db::DatabaseBackend)
//!
//! Both make a created redirect visible to the very next read.

mod memory;
mod sql;

use async_trait::async_trait;

use djangoseo_core::SeoResult;

use crate::models::{NewRedirect, NewRedirectPattern, Redirect, RedirectPattern};

pub use memory::MemoryRedirectStore;
pub use sql::SqlRedirectStore;

/// CRUD over the two record types the redirect engine works with.
///
/// Implementations must enforce that `(site, old_path)` is unique among
/// redirects. A concurrent insert that loses the race reports
/// [`SeoError::IntegrityError`](djangoseo_core::SeoError::IntegrityError).
#[async_trait]
pub trait RedirectStore: Send + Sync {
    /// Validates and stores a new pattern.
    async fn add_pattern(&self, pattern: NewRedirectPattern) -> SeoResult<RedirectPattern>;

    /// Deletes a pattern. Returns `false` if no pattern had that id.
    async fn remove_pattern(&self, id: i64) -> SeoResult<bool>;

    /// Returns every pattern, ordered by id.
    async fn patterns(&self) -> SeoResult<Vec<RedirectPattern>>;

    /// Returns the patterns that apply to a request on `site` from
    /// `subdomain`, subdomain-specific patterns first, then by id.
    async fn candidate_patterns(&self, site: u64, subdomain: &str)
        -> SeoResult<Vec<RedirectPattern>>;

    /// Returns the redirect stored for `(site, old_path)`, creating it from
    /// `redirect` when there is none. The flag is `true` if it was created.
    async fn get_or_create_redirect(&self, redirect: NewRedirect) -> SeoResult<(Redirect, bool)>;

    /// Finds the redirect for `old_path` visible from `subdomain`,
    /// preferring a subdomain-specific one over a wildcard.
    async fn find_redirect(
        &self,
        site: u64,
        old_path: &str,
        subdomain: &str,
    ) -> SeoResult<Option<Redirect>>;

    /// Returns every redirect, ordered by id.
    async fn redirects(&self) -> SeoResult<Vec<Redirect>>;

    /// Deletes a redirect. Returns `false` if no redirect had that id.
    async fn remove_redirect(&self, id: i64) -> SeoResult<bool>;
}

/// Orders patterns specific-before-wildcard, then by id.
pub(crate) fn sort_candidates(patterns: &mut [RedirectPattern]) {
    patterns.sort_by_key(|p| (p.all_subdomains, p.id));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_candidates() {
        let mk = |id, all| {
            let mut new = NewRedirectPattern::new(1, "^/", "/x/");
            new.all_subdomains = all;
            RedirectPattern::from_new(id, new)
        };
        let mut patterns = vec![mk(1, true), mk(4, false), mk(2, false), mk(3, true)];
        sort_candidates(&mut patterns);
        let order: Vec<(i64, bool)> = patterns.iter().map(|p| (p.id, p.all_subdomains)).collect();
        assert_eq!(order, vec![(2, false), (4, false), (1, true), (3, true)]);
    }
}
