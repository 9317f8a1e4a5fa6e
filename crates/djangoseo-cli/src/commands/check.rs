//! The `check` management command.
//!
//! Runs the system checks against the loaded settings. This mirrors Django's
//! `check` command.

use async_trait::async_trait;
use djangoseo_core::checks::{CheckLevel, CheckMessage, CheckRegistry};
use djangoseo_core::{SeoError, Settings};

use crate::command::ManagementCommand;

/// Runs system checks to validate the configuration.
pub struct CheckCommand;

/// Runs the built-in checks, optionally only those with one of `tags`.
pub fn run_checks(tags: &[String], settings: &Settings) -> Vec<CheckMessage> {
    let registry = CheckRegistry::with_builtins();
    if tags.is_empty() {
        registry.run_checks(None, settings)
    } else {
        let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
        registry.run_checks(Some(&tags), settings)
    }
}

#[async_trait]
impl ManagementCommand for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn help(&self) -> &'static str {
        "Run system checks"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("tag")
                .long("tag")
                .short('t')
                .action(clap::ArgAction::Append)
                .help("Only run checks with this tag"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), SeoError> {
        let tags: Vec<String> = matches
            .get_many::<String>("tag")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        let messages = run_checks(&tags, settings);

        if messages.is_empty() {
            tracing::info!("System check identified no issues");
            return Ok(());
        }

        let errors = messages.iter().filter(|m| m.level >= CheckLevel::Error).count();
        let warnings = messages.iter().filter(|m| m.level == CheckLevel::Warning).count();

        for msg in &messages {
            tracing::warn!("{msg}");
        }

        tracing::info!(
            "System check identified {} issue(s) ({} error(s), {} warning(s))",
            messages.len(),
            errors,
            warnings
        );

        if errors > 0 {
            return Err(SeoError::ImproperlyConfigured(format!(
                "System check found {errors} error(s)"
            )));
        }

        Ok(())
    }
}
