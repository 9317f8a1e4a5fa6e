//! The `migrate` management command.
//!
//! Creates the redirect tables in the configured database. Safe to run on
//! every deploy: existing tables are left alone.

use async_trait::async_trait;
use djangoseo_core::{SeoError, Settings};

use super::open_store;
use crate::command::ManagementCommand;

/// Creates the pattern and redirect tables.
pub struct MigrateCommand;

#[async_trait]
impl ManagementCommand for MigrateCommand {
    fn name(&self) -> &'static str {
        "migrate"
    }

    fn help(&self) -> &'static str {
        "Create the redirect tables"
    }

    async fn handle(
        &self,
        _matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), SeoError> {
        tracing::info!("Running migrations on '{}'", settings.database.name);
        open_store(settings)?.create_tables().await?;
        tracing::info!("Migrations applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use djangoseo_redirects::store::RedirectStore;

    use crate::commands::open_store;
    use crate::commands::testing::{run, settings_in};

    #[tokio::test]
    async fn test_migrate_creates_tables_and_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);

        run(&["migrate"], &settings).await.unwrap();
        run(&["migrate"], &settings).await.unwrap();

        let store = open_store(&settings).unwrap();
        assert!(store.patterns().await.unwrap().is_empty());
        assert!(store.redirects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_unusable_before_migrate() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);
        assert!(open_store(&settings).unwrap().patterns().await.is_err());
    }
}
