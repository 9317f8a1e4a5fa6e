//! In-memory redirect store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use djangoseo_core::SeoResult;

use super::{sort_candidates, RedirectStore};
use crate::models::{NewRedirect, NewRedirectPattern, Redirect, RedirectPattern};

#[derive(Debug, Default)]
struct Tables {
    patterns: Vec<RedirectPattern>,
    redirects: Vec<Redirect>,
    last_pattern_id: i64,
    last_redirect_id: i64,
}

/// A [`RedirectStore`] held entirely in process memory.
///
/// Get-or-create runs under a single write lock, so concurrent requests for
/// the same unseen path still produce exactly one redirect.
///
/// # Examples
///
/// ```
/// use djangoseo_redirects::models::NewRedirectPattern;
/// use djangoseo_redirects::store::{MemoryRedirectStore, RedirectStore};
///
/// # tokio_test::block_on(async {
/// let store = MemoryRedirectStore::new();
/// let pattern = store
///     .add_pattern(NewRedirectPattern::new(1, "^/old/", "/new/"))
///     .await
///     .unwrap();
/// assert_eq!(pattern.id, 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryRedirectStore {
    tables: RwLock<Tables>,
}

impl MemoryRedirectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RedirectStore for MemoryRedirectStore {
    async fn add_pattern(&self, pattern: NewRedirectPattern) -> SeoResult<RedirectPattern> {
        pattern.validate()?;
        let mut tables = self.tables.write().await;
        tables.last_pattern_id += 1;
        let stored = RedirectPattern::from_new(tables.last_pattern_id, pattern);
        tables.patterns.push(stored.clone());
        Ok(stored)
    }

    async fn remove_pattern(&self, id: i64) -> SeoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.patterns.len();
        tables.patterns.retain(|p| p.id != id);
        Ok(tables.patterns.len() != before)
    }

    async fn patterns(&self) -> SeoResult<Vec<RedirectPattern>> {
        Ok(self.tables.read().await.patterns.clone())
    }

    async fn candidate_patterns(
        &self,
        site: u64,
        subdomain: &str,
    ) -> SeoResult<Vec<RedirectPattern>> {
        let mut candidates: Vec<RedirectPattern> = self
            .tables
            .read()
            .await
            .patterns
            .iter()
            .filter(|p| p.applies_to(site, subdomain))
            .cloned()
            .collect();
        sort_candidates(&mut candidates);
        Ok(candidates)
    }

    async fn get_or_create_redirect(&self, redirect: NewRedirect) -> SeoResult<(Redirect, bool)> {
        redirect.validate()?;
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables
            .redirects
            .iter()
            .find(|r| r.site == redirect.site && r.old_path == redirect.old_path)
        {
            return Ok((existing.clone(), false));
        }
        tables.last_redirect_id += 1;
        let stored = Redirect::from_new(tables.last_redirect_id, redirect);
        tables.redirects.push(stored.clone());
        Ok((stored, true))
    }

    async fn find_redirect(
        &self,
        site: u64,
        old_path: &str,
        subdomain: &str,
    ) -> SeoResult<Option<Redirect>> {
        Ok(self
            .tables
            .read()
            .await
            .redirects
            .iter()
            .filter(|r| r.old_path == old_path && r.applies_to(site, subdomain))
            .min_by_key(|r| (r.all_subdomains, r.id))
            .cloned())
    }

    async fn redirects(&self) -> SeoResult<Vec<Redirect>> {
        Ok(self.tables.read().await.redirects.clone())
    }

    async fn remove_redirect(&self, id: i64) -> SeoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.redirects.len();
        tables.redirects.retain(|r| r.id != id);
        Ok(tables.redirects.len() != before)
    }
}
