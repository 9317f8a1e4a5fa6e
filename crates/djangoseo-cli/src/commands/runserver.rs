//! The `runserver` management command.
//!
//! Serves the redirect engine over HTTP in front of a view that answers
//! every path with a not-found error, so patterns and redirects can be
//! exercised end to end.

use std::sync::Arc;

use async_trait::async_trait;
use djangoseo_core::{SeoError, Settings};
use djangoseo_redirects::middleware::{view_handler, ViewHandler};
use djangoseo_redirects::sites::Site;
use djangoseo_redirects::sources::TomlPatternSource;
use djangoseo_redirects::{SeoApp, SeoService};

use super::open_store;
use crate::command::ManagementCommand;

/// Starts the development server.
///
/// By default, the server binds to `127.0.0.1:8000` and registers the
/// configured `site_id` under the domain `localhost`.
pub struct RunserverCommand;

/// A view with no pages: every request is a miss.
pub fn not_found_view() -> ViewHandler {
    view_handler(|request| async move { Err(SeoError::NotFound(request.get_full_path())) })
}

/// Builds the service `runserver` would serve.
pub async fn build_service(
    matches: &clap::ArgMatches,
    settings: &Settings,
) -> Result<SeoService, SeoError> {
    let domain = matches
        .get_one::<String>("domain")
        .map_or("localhost", String::as_str);

    let store = open_store(settings)?;
    store.create_tables().await?;

    let mut app = SeoApp::new(settings.clone())
        .store(Arc::new(store))
        .site(Site::new(settings.site_id, domain, domain));
    if let Some(subdomain) = matches.get_one::<String>("default_subdomain") {
        app = app.default_subdomain(subdomain.as_str());
    }
    if let Some(path) = matches.get_one::<String>("patterns") {
        app = app.pattern_source(TomlPatternSource::from_file(path, settings.site_id));
    }
    app.build().await
}

#[async_trait]
impl ManagementCommand for RunserverCommand {
    fn name(&self) -> &'static str {
        "runserver"
    }

    fn help(&self) -> &'static str {
        "Starts the development server"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("host")
                .long("host")
                .default_value("127.0.0.1")
                .help("Host to bind to"),
        )
        .arg(
            clap::Arg::new("port")
                .long("port")
                .default_value("8000")
                .help("Port to bind to"),
        )
        .arg(
            clap::Arg::new("domain")
                .long("domain")
                .default_value("localhost")
                .help("Domain of the configured site"),
        )
        .arg(
            clap::Arg::new("default_subdomain")
                .long("default-subdomain")
                .help("Subdomain treated as the bare domain, e.g. www"),
        )
        .arg(
            clap::Arg::new("patterns")
                .long("patterns")
                .help("TOML file of [[pattern]] tables to install at startup"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), SeoError> {
        let host = matches
            .get_one::<String>("host")
            .map_or("127.0.0.1", String::as_str);
        let port = matches
            .get_one::<String>("port")
            .map_or("8000", String::as_str);
        let addr = format!("{host}:{port}");

        let service = build_service(matches, settings).await?;

        tracing::info!(
            "Starting development server at http://{addr}/ (debug={}, seo_use_redirects={})",
            settings.debug,
            settings.seo_use_redirects
        );
        service.run(&addr, not_found_view()).await
    }
}
