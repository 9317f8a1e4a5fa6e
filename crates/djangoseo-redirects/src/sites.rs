//! Sites framework.
//!
//! Patterns and redirects belong to a site. The current site is the
//! registered site with the longest domain that equals the request's host
//! (without port) or is a parent of it, so `shop.example.org` belongs to
//! `example.org`. Otherwise the configured default site id is used, like
//! Django's `django.contrib.sites` with `SITE_ID` set.
//!
//! ```
//! use djangoseo_redirects::sites::{Site, SiteRegistry};
//!
//! let mut registry = SiteRegistry::new();
//! registry.register(Site::new(1, "example.com", "Example"));
//! registry.register(Site::new(2, "example.org", "Mirror"));
//!
//! assert_eq!(registry.get_by_domain("example.org").unwrap().id, 2);
//! assert_eq!(registry.get_by_host("shop.example.org").unwrap().id, 2);
//! ```

use std::collections::HashMap;

use djangoseo_http::HttpRequest;

/// A site: one logical tenant served by this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub id: u64,
    /// The domain name for this site (e.g. "example.com").
    pub domain: String,
    pub name: String,
}

impl Site {
    pub fn new(id: u64, domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            domain: domain.into().to_ascii_lowercase(),
            name: name.into(),
        }
    }
}

/// An in-memory registry of sites.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    sites: HashMap<u64, Site>,
    domain_index: HashMap<String, u64>,
    default_site_id: u64,
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteRegistry {
    /// Creates a new empty site registry with a default site ID of 1.
    pub fn new() -> Self {
        Self {
            sites: HashMap::new(),
            domain_index: HashMap::new(),
            default_site_id: 1,
        }
    }

    /// Creates a registry whose fallback is the given site id.
    pub fn with_default_site_id(default_site_id: u64) -> Self {
        Self {
            default_site_id,
            ..Self::new()
        }
    }

    /// Sets the default site ID (Django's `SITE_ID`).
    pub fn set_default_site_id(&mut self, id: u64) {
        self.default_site_id = id;
    }

    pub const fn default_site_id(&self) -> u64 {
        self.default_site_id
    }

    /// Registers a site. Overwrites any existing site with the same ID.
    pub fn register(&mut self, site: Site) {
        if let Some(previous) = self.sites.get(&site.id) {
            self.domain_index.remove(&previous.domain);
        }
        self.domain_index.insert(site.domain.clone(), site.id);
        self.sites.insert(site.id, site);
    }

    /// Removes a site by ID.
    pub fn unregister(&mut self, id: u64) -> Option<Site> {
        let site = self.sites.remove(&id)?;
        self.domain_index.remove(&site.domain);
        Some(site)
    }

    pub fn get_by_id(&self, id: u64) -> Option<&Site> {
        self.sites.get(&id)
    }

    pub fn get_by_domain(&self, domain: &str) -> Option<&Site> {
        self.domain_index
            .get(&domain.to_ascii_lowercase())
            .and_then(|id| self.sites.get(id))
    }

    /// Returns the site serving `host`: an exact domain match, else the site
    /// with the longest domain `host` is a subdomain of.
    pub fn get_by_host(&self, host: &str) -> Option<&Site> {
        let host = host.to_ascii_lowercase();
        if let Some(site) = self.get_by_domain(&host) {
            return Some(site);
        }
        self.sites
            .values()
            .filter(|site| {
                host.strip_suffix(site.domain.as_str())
                    .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.'))
            })
            .max_by_key(|site| site.domain.len())
    }

    /// Returns the current site based on the request host.
    ///
    /// Falls back to the default site. Returns `None` only if neither the
    /// host nor the default id is registered.
    pub fn get_current_site(&self, request: &HttpRequest) -> Option<&Site> {
        self.get_by_host(&request.get_domain())
            .or_else(|| self.get_by_id(self.default_site_id))
    }

    /// Returns the id of the current site, or the default id when no site
    /// is registered for the request.
    pub fn current_site_id(&self, request: &HttpRequest) -> u64 {
        self.get_current_site(request)
            .map_or(self.default_site_id, |site| site.id)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Returns all registered sites, ordered by id.
    pub fn all(&self) -> Vec<&Site> {
        let mut sites: Vec<&Site> = self.sites.values().collect();
        sites.sort_by_key(|s| s.id);
        sites
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request(host: &str) -> HttpRequest {
        HttpRequest::builder().host(host).build()
    }

    #[test]
    fn test_site_new_lowercases_domain() {
        let site = Site::new(1, "Example.COM", "Example");
        assert_eq!(site.domain, "example.com");
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = SiteRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.default_site_id(), 1);
    }

    #[test]
    fn test_registry_overwrite_drops_old_domain() {
        let mut registry = SiteRegistry::new();
        registry.register(Site::new(1, "old.com", "Old"));
        registry.register(Site::new(1, "new.com", "New"));

        assert_eq!(registry.len(), 1);
        assert!(registry.get_by_domain("old.com").is_none());
        assert_eq!(registry.get_by_domain("new.com").unwrap().name, "New");
    }

    #[test]
    fn test_registry_unregister() {
        let mut registry = SiteRegistry::new();
        registry.register(Site::new(1, "example.com", "Example"));
        assert_eq!(registry.unregister(1).unwrap().domain, "example.com");
        assert!(registry.get_by_domain("example.com").is_none());
        assert!(registry.unregister(1).is_none());
    }

    #[test]
    fn test_get_current_site_by_host() {
        let mut registry = SiteRegistry::new();
        registry.register(Site::new(1, "example.com", "Example"));
        registry.register(Site::new(2, "example.org", "Mirror"));

        let site = registry.get_current_site(&make_request("example.org:8000")).unwrap();
        assert_eq!(site.id, 2);
    }

    #[test]
    fn test_get_by_host_matches_parent_domain() {
        let mut registry = SiteRegistry::new();
        registry.register(Site::new(1, "example.com", "Example"));
        registry.register(Site::new(2, "example.org", "Mirror"));

        assert_eq!(registry.get_by_host("shop.example.org").unwrap().id, 2);
        assert_eq!(registry.get_by_host("a.b.Example.ORG").unwrap().id, 2);
        assert_eq!(registry.get_by_host("shop.example.com").unwrap().id, 1);
        assert!(registry.get_by_host("notexample.org").is_none());
        assert!(registry.get_by_host(".example.org").is_none());
    }

    #[test]
    fn test_get_by_host_prefers_longest_domain() {
        let mut registry = SiteRegistry::new();
        registry.register(Site::new(1, "example.com", "Example"));
        registry.register(Site::new(2, "shop.example.com", "Shop"));

        assert_eq!(registry.get_by_host("eu.shop.example.com").unwrap().id, 2);
        assert_eq!(registry.get_by_host("shop.example.com").unwrap().id, 2);
        assert_eq!(registry.get_by_host("blog.example.com").unwrap().id, 1);
    }

    #[test]
    fn test_get_current_site_for_subdomain_of_other_site() {
        let mut registry = SiteRegistry::with_default_site_id(1);
        registry.register(Site::new(1, "example.com", "Example"));
        registry.register(Site::new(2, "example.org", "Mirror"));

        let site = registry.get_current_site(&make_request("shop.example.org:8000")).unwrap();
        assert_eq!(site.id, 2);
    }

    #[test]
    fn test_get_current_site_falls_back_to_default() {
        let mut registry = SiteRegistry::with_default_site_id(1);
        registry.register(Site::new(1, "example.com", "Example"));

        let site = registry.get_current_site(&make_request("unknown.net")).unwrap();
        assert_eq!(site.id, 1);
    }

    #[test]
    fn test_current_site_id_without_sites() {
        let registry = SiteRegistry::with_default_site_id(4);
        assert!(registry.get_current_site(&make_request("a.com")).is_none());
        assert_eq!(registry.current_site_id(&make_request("a.com")), 4);
    }

    #[test]
    fn test_all_sorted() {
        let mut registry = SiteRegistry::new();
        registry.register(Site::new(3, "c.com", "C"));
        registry.register(Site::new(1, "a.com", "A"));
        let ids: Vec<u64> = registry.all().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
