//! Redirect administration: `listredirects`, `removeredirect`.

use async_trait::async_trait;
use djangoseo_core::{SeoError, Settings};
use djangoseo_redirects::models::Redirect;
use djangoseo_redirects::store::RedirectStore;

use super::open_store;
use crate::command::ManagementCommand;

/// Lists every materialized redirect.
pub struct ListRedirectsCommand;

/// Formats redirects one per line.
pub fn render_redirects(redirects: &[Redirect]) -> String {
    redirects
        .iter()
        .map(|r| format!("{:>5}  site={:<3} {r}\n", r.id, r.site))
        .collect()
}

#[async_trait]
impl ManagementCommand for ListRedirectsCommand {
    fn name(&self) -> &'static str {
        "listredirects"
    }

    fn help(&self) -> &'static str {
        "List materialized redirects"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("json")
                .long("json")
                .action(clap::ArgAction::SetTrue)
                .help("Print JSON instead of a table"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), SeoError> {
        let redirects = open_store(settings)?.redirects().await?;
        if matches.get_flag("json") {
            let json = serde_json::to_string_pretty(&redirects)
                .map_err(|e| SeoError::InternalServerError(e.to_string()))?;
            println!("{json}");
        } else {
            print!("{}", render_redirects(&redirects));
        }
        Ok(())
    }
}

/// Deletes a redirect by id. The next miss on its path may materialize it
/// again from the patterns.
pub struct RemoveRedirectCommand;

#[async_trait]
impl ManagementCommand for RemoveRedirectCommand {
    fn name(&self) -> &'static str {
        "removeredirect"
    }

    fn help(&self) -> &'static str {
        "Remove a materialized redirect"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("id")
                .required(true)
                .value_parser(clap::value_parser!(i64))
                .help("Redirect id"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), SeoError> {
        let id = matches
            .get_one::<i64>("id")
            .copied()
            .ok_or_else(|| SeoError::BadRequest("id is required".into()))?;
        if open_store(settings)?.remove_redirect(id).await? {
            tracing::info!("Removed redirect {id}");
            Ok(())
        } else {
            Err(SeoError::DoesNotExist(format!("No redirect with id {id}")))
        }
    }
}
