//! Built-in management commands.
//!
//! Each command implements the
//! [`ManagementCommand`](crate::command::ManagementCommand) trait. Commands
//! that touch redirect data open the SQL store described by
//! `settings.database`.

pub mod check;
pub mod migrate;
pub mod patterns;
pub mod redirects;
pub mod runserver;

pub use check::CheckCommand;
pub use migrate::MigrateCommand;
pub use patterns::{AddPatternCommand, ListPatternsCommand, RemovePatternCommand};
pub use redirects::{ListRedirectsCommand, RemoveRedirectCommand};
pub use runserver::RunserverCommand;

use djangoseo_core::{SeoResult, Settings};
use djangoseo_db::{DatabaseConfig, SqliteBackend};
use djangoseo_redirects::store::SqlRedirectStore;

use crate::command::CommandRegistry;

/// Registers all built-in management commands into the given registry.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(CheckCommand));
    registry.register(Box::new(MigrateCommand));
    registry.register(Box::new(AddPatternCommand));
    registry.register(Box::new(ListPatternsCommand));
    registry.register(Box::new(RemovePatternCommand));
    registry.register(Box::new(ListRedirectsCommand));
    registry.register(Box::new(RemoveRedirectCommand));
    registry.register(Box::new(RunserverCommand));
}

/// Opens the redirect store configured in `settings.database`.
pub fn open_store(settings: &Settings) -> SeoResult<SqlRedirectStore<SqliteBackend>> {
    let config = DatabaseConfig::from_settings(&settings.database);
    let backend = SqliteBackend::from_config(&config)?;
    Ok(SqlRedirectStore::new(backend))
}

#[cfg(test)]
pub(crate) mod testing {
    use djangoseo_core::Settings;

    use crate::command::CommandRegistry;

    use super::register_builtin_commands;

    /// Settings pointing at a fresh SQLite file inside `dir`.
    pub fn settings_in(dir: &tempfile::TempDir) -> Settings {
        let mut settings = Settings::default();
        settings.database.name = dir.path().join("seo.sqlite3").display().to_string();
        settings
    }

    /// Parses and runs one command line against `settings`.
    pub async fn run(args: &[&str], settings: &Settings) -> djangoseo_core::SeoResult<()> {
        let mut registry = CommandRegistry::new();
        register_builtin_commands(&mut registry);
        let mut argv = vec!["djangoseo"];
        argv.extend_from_slice(args);
        let matches = registry
            .build_cli()
            .try_get_matches_from(argv)
            .expect("valid command line");
        registry.execute(&matches, settings).await
    }
}
