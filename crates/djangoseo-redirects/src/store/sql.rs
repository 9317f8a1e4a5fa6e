//! SQL-backed redirect store.
//!
//! Tables follow Django's naming (`<app>_<model>`):
//!
//! - `djangoseo_redirectpattern`, indexed on `(site_id, subdomain, all_subdomains)`
//! - `djangoseo_redirect`, with `UNIQUE (site_id, old_path)`
//!
//! Every statement is a single auto-committed write, so a redirect created
//! while handling a request is visible to that request's own lookup.

use async_trait::async_trait;

use djangoseo_core::SeoResult;
use djangoseo_db::{DatabaseBackend, Row, Value};

use super::RedirectStore;
use crate::models::{NewRedirect, NewRedirectPattern, Redirect, RedirectPattern};

const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS djangoseo_redirectpattern (\
        id INTEGER PRIMARY KEY AUTOINCREMENT, \
        url_pattern VARCHAR(250) NOT NULL, \
        site_id INTEGER NOT NULL, \
        redirect_path VARCHAR(250) NOT NULL, \
        subdomain VARCHAR(250) NOT NULL DEFAULT '', \
        all_subdomains BOOLEAN NOT NULL DEFAULT 0)",
    "CREATE INDEX IF NOT EXISTS djangoseo_redirectpattern_scope \
        ON djangoseo_redirectpattern (site_id, subdomain, all_subdomains)",
    "CREATE TABLE IF NOT EXISTS djangoseo_redirect (\
        id INTEGER PRIMARY KEY AUTOINCREMENT, \
        site_id INTEGER NOT NULL, \
        old_path VARCHAR(250) NOT NULL, \
        new_path VARCHAR(250) NOT NULL, \
        subdomain VARCHAR(250) NOT NULL DEFAULT '', \
        all_subdomains BOOLEAN NOT NULL DEFAULT 0, \
        UNIQUE (site_id, old_path))",
];

const PATTERN_COLUMNS: &str = "id, url_pattern, site_id, redirect_path, subdomain, all_subdomains";
const REDIRECT_COLUMNS: &str = "id, site_id, old_path, new_path, subdomain, all_subdomains";

/// A [`RedirectStore`] over any [`DatabaseBackend`].
///
/// Call [`create_tables`](Self::create_tables) once at deploy time (the CLI's
/// `migrate` command does this) before serving requests.
pub struct SqlRedirectStore<B: DatabaseBackend> {
    backend: B,
}

impl<B: DatabaseBackend> std::fmt::Debug for SqlRedirectStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlRedirectStore")
            .field("vendor", &self.backend.vendor())
            .finish()
    }
}

impl<B: DatabaseBackend> SqlRedirectStore<B> {
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the underlying database backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Creates both tables and their indexes if they do not exist yet.
    pub async fn create_tables(&self) -> SeoResult<()> {
        for statement in CREATE_TABLES {
            self.backend.execute(statement, &[]).await?;
        }
        tracing::info!(vendor = self.backend.vendor(), "redirect tables ready");
        Ok(())
    }

    async fn get_redirect(&self, site: u64, old_path: &str) -> SeoResult<Option<Redirect>> {
        let sql = format!(
            "SELECT {REDIRECT_COLUMNS} FROM djangoseo_redirect \
             WHERE site_id = ? AND old_path = ?"
        );
        let rows = self
            .backend
            .query(&sql, &[Value::from(site), Value::from(old_path)])
            .await?;
        rows.first().map(redirect_from_row).transpose()
    }
}

fn pattern_from_row(row: &Row) -> SeoResult<RedirectPattern> {
    Ok(RedirectPattern {
        id: row.get("id")?,
        url_pattern: row.get("url_pattern")?,
        site: row.get("site_id")?,
        redirect_path: row.get("redirect_path")?,
        subdomain: row.get::<Option<String>>("subdomain")?.unwrap_or_default(),
        all_subdomains: row.get("all_subdomains")?,
    })
}

fn redirect_from_row(row: &Row) -> SeoResult<Redirect> {
    Ok(Redirect {
        id: row.get("id")?,
        site: row.get("site_id")?,
        old_path: row.get("old_path")?,
        new_path: row.get("new_path")?,
        subdomain: row.get::<Option<String>>("subdomain")?.unwrap_or_default(),
        all_subdomains: row.get("all_subdomains")?,
    })
}

#[async_trait]
impl<B: DatabaseBackend> RedirectStore for SqlRedirectStore<B> {
    async fn add_pattern(&self, pattern: NewRedirectPattern) -> SeoResult<RedirectPattern> {
        pattern.validate()?;
        let row = self
            .backend
            .query_one(
                "INSERT INTO djangoseo_redirectpattern \
                 (url_pattern, site_id, redirect_path, subdomain, all_subdomains) \
                 VALUES (?, ?, ?, ?, ?) RETURNING id",
                &[
                    Value::from(pattern.url_pattern.as_str()),
                    Value::from(pattern.site),
                    Value::from(pattern.redirect_path.as_str()),
                    Value::from(pattern.subdomain.as_str()),
                    Value::from(pattern.all_subdomains),
                ],
            )
            .await?;
        Ok(RedirectPattern::from_new(row.get("id")?, pattern))
    }

    async fn remove_pattern(&self, id: i64) -> SeoResult<bool> {
        let deleted = self
            .backend
            .execute(
                "DELETE FROM djangoseo_redirectpattern WHERE id = ?",
                &[Value::from(id)],
            )
            .await?;
        Ok(deleted > 0)
    }

    async fn patterns(&self) -> SeoResult<Vec<RedirectPattern>> {
        let sql = format!("SELECT {PATTERN_COLUMNS} FROM djangoseo_redirectpattern ORDER BY id");
        self.backend
            .query(&sql, &[])
            .await?
            .iter()
            .map(pattern_from_row)
            .collect()
    }

    async fn candidate_patterns(
        &self,
        site: u64,
        subdomain: &str,
    ) -> SeoResult<Vec<RedirectPattern>> {
        let sql = format!(
            "SELECT {PATTERN_COLUMNS} FROM djangoseo_redirectpattern \
             WHERE site_id = ? AND (subdomain = ? OR all_subdomains = 1) \
             ORDER BY all_subdomains ASC, id ASC"
        );
        self.backend
            .query(&sql, &[Value::from(site), Value::from(subdomain)])
            .await?
            .iter()
            .map(pattern_from_row)
            .collect()
    }

    async fn get_or_create_redirect(&self, redirect: NewRedirect) -> SeoResult<(Redirect, bool)> {
        redirect.validate()?;
        if let Some(existing) = self.get_redirect(redirect.site, &redirect.old_path).await? {
            return Ok((existing, false));
        }

        // A concurrent insert of the same (site, old_path) fails here with
        // IntegrityError from the UNIQUE constraint.
        let row = self
            .backend
            .query_one(
                "INSERT INTO djangoseo_redirect \
                 (site_id, old_path, new_path, subdomain, all_subdomains) \
                 VALUES (?, ?, ?, ?, ?) RETURNING id",
                &[
                    Value::from(redirect.site),
                    Value::from(redirect.old_path.as_str()),
                    Value::from(redirect.new_path.as_str()),
                    Value::from(redirect.subdomain.as_str()),
                    Value::from(redirect.all_subdomains),
                ],
            )
            .await?;
        Ok((Redirect::from_new(row.get("id")?, redirect), true))
    }

    async fn find_redirect(
        &self,
        site: u64,
        old_path: &str,
        subdomain: &str,
    ) -> SeoResult<Option<Redirect>> {
        let sql = format!(
            "SELECT {REDIRECT_COLUMNS} FROM djangoseo_redirect \
             WHERE site_id = ? AND old_path = ? AND (subdomain = ? OR all_subdomains = 1) \
             ORDER BY all_subdomains ASC, id ASC LIMIT 1"
        );
        let rows = self
            .backend
            .query(
                &sql,
                &[Value::from(site), Value::from(old_path), Value::from(subdomain)],
            )
            .await?;
        rows.first().map(redirect_from_row).transpose()
    }

    async fn redirects(&self) -> SeoResult<Vec<Redirect>> {
        let sql = format!("SELECT {REDIRECT_COLUMNS} FROM djangoseo_redirect ORDER BY id");
        self.backend
            .query(&sql, &[])
            .await?
            .iter()
            .map(redirect_from_row)
            .collect()
    }

    async fn remove_redirect(&self, id: i64) -> SeoResult<bool> {
        let deleted = self
            .backend
            .execute(
                "DELETE FROM djangoseo_redirect WHERE id = ?",
                &[Value::from(id)],
            )
            .await?;
        Ok(deleted > 0)
    }
}
