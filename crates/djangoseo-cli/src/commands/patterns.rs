//! Pattern administration: `addpattern`, `listpatterns`, `removepattern`.

use async_trait::async_trait;
use djangoseo_core::{SeoError, Settings};
use djangoseo_redirects::models::{NewRedirectPattern, RedirectPattern};
use djangoseo_redirects::store::RedirectStore;

use super::open_store;
use crate::command::ManagementCommand;

/// Adds a redirect pattern.
///
/// ```text
/// djangoseo addpattern '^/old/.*' /new/ --subdomain shop --all-subdomains
/// ```
///
/// Leaving out the redirect path makes matching paths answer 410 Gone.
pub struct AddPatternCommand;

#[async_trait]
impl ManagementCommand for AddPatternCommand {
    fn name(&self) -> &'static str {
        "addpattern"
    }

    fn help(&self) -> &'static str {
        "Add a redirect pattern"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("url_pattern")
                .required(true)
                .help("Regular expression matched against the start of the full path"),
        )
        .arg(
            clap::Arg::new("redirect_path")
                .default_value("")
                .help("Destination; empty means gone"),
        )
        .arg(
            clap::Arg::new("site")
                .long("site")
                .value_parser(clap::value_parser!(u64))
                .help("Site id (defaults to the site_id setting)"),
        )
        .arg(
            clap::Arg::new("subdomain")
                .long("subdomain")
                .default_value("")
                .help("Subdomain the pattern is scoped to"),
        )
        .arg(
            clap::Arg::new("all_subdomains")
                .long("all-subdomains")
                .action(clap::ArgAction::SetTrue)
                .help("Apply the pattern on every subdomain"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), SeoError> {
        let url_pattern = matches
            .get_one::<String>("url_pattern")
            .ok_or_else(|| SeoError::BadRequest("url_pattern is required".into()))?;
        let redirect_path = matches
            .get_one::<String>("redirect_path")
            .map_or("", String::as_str);
        let site = matches
            .get_one::<u64>("site")
            .copied()
            .unwrap_or(settings.site_id);
        let subdomain = matches
            .get_one::<String>("subdomain")
            .map_or("", String::as_str);

        let mut pattern =
            NewRedirectPattern::new(site, url_pattern.as_str(), redirect_path).subdomain(subdomain);
        if matches.get_flag("all_subdomains") {
            pattern = pattern.all_subdomains();
        }

        let stored = open_store(settings)?.add_pattern(pattern).await?;
        tracing::info!(id = stored.id, "Added pattern {} -> {}", stored.url_pattern, describe(&stored.redirect_path));
        Ok(())
    }
}

/// Lists every redirect pattern.
pub struct ListPatternsCommand;

/// Formats patterns as an aligned table, one per line.
pub fn render_patterns(patterns: &[RedirectPattern]) -> String {
    let mut out = String::new();
    for p in patterns {
        let scope = match (p.subdomain.as_str(), p.all_subdomains) {
            (_, true) => "*".to_string(),
            ("", false) => "-".to_string(),
            (subdomain, false) => subdomain.to_string(),
        };
        out.push_str(&format!(
            "{:>5}  site={:<3} {:<10} {} -> {}\n",
            p.id,
            p.site,
            scope,
            p.url_pattern,
            describe(&p.redirect_path)
        ));
    }
    out
}

fn describe(path: &str) -> &str {
    if path.is_empty() {
        "(gone)"
    } else {
        path
    }
}

#[async_trait]
impl ManagementCommand for ListPatternsCommand {
    fn name(&self) -> &'static str {
        "listpatterns"
    }

    fn help(&self) -> &'static str {
        "List redirect patterns"
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
        let patterns = open_store(settings)?.patterns().await?;
        if matches.get_flag("json") {
            let json = serde_json::to_string_pretty(&patterns)
                .map_err(|e| SeoError::InternalServerError(e.to_string()))?;
            println!("{json}");
        } else {
            print!("{}", render_patterns(&patterns));
        }
        Ok(())
    }
}

/// Deletes a redirect pattern by id.
pub struct RemovePatternCommand;

#[async_trait]
impl ManagementCommand for RemovePatternCommand {
    fn name(&self) -> &'static str {
        "removepattern"
    }

    fn help(&self) -> &'static str {
        "Remove a redirect pattern"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("id")
                .required(true)
                .value_parser(clap::value_parser!(i64))
                .help("Pattern id"),
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
        if open_store(settings)?.remove_pattern(id).await? {
            tracing::info!("Removed pattern {id}");
            Ok(())
        } else {
            Err(SeoError::DoesNotExist(format!("No pattern with id {id}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{run, settings_in};

    #[tokio::test]
    async fn test_add_list_remove() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);
        run(&["migrate"], &settings).await.unwrap();

        run(&["addpattern", "^/old/.*", "/new/"], &settings).await.unwrap();
        run(
            &["addpattern", "^/gone/", "--site", "2", "--subdomain", "shop", "--all-subdomains"],
            &settings,
        )
        .await
        .unwrap();

        let patterns = open_store(&settings).unwrap().patterns().await.unwrap();
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].site, settings.site_id);
        assert_eq!(patterns[0].redirect_path, "/new/");
        assert_eq!(patterns[1].site, 2);
        assert_eq!(patterns[1].redirect_path, "");
        assert_eq!(patterns[1].subdomain, "shop");
        assert!(patterns[1].all_subdomains);

        run(&["listpatterns"], &settings).await.unwrap();
        run(&["listpatterns", "--json"], &settings).await.unwrap();

        let id = patterns[0].id.to_string();
        run(&["removepattern", &id], &settings).await.unwrap();
        let err = run(&["removepattern", &id], &settings).await.unwrap_err();
        assert!(matches!(err, SeoError::DoesNotExist(_)));
        assert_eq!(open_store(&settings).unwrap().patterns().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_invalid_regex() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(&dir);
        run(&["migrate"], &settings).await.unwrap();

        let err = run(&["addpattern", "(", "/x/"], &settings).await.unwrap_err();
        assert!(matches!(err, SeoError::ValidationError(_)));
    }

    #[test]
    fn test_render_patterns() {
        let patterns = vec![
            RedirectPattern::from_new(1, NewRedirectPattern::new(1, "^/a/", "/b/")),
            RedirectPattern::from_new(2, NewRedirectPattern::new(1, "^/c/", "").subdomain("shop")),
            RedirectPattern::from_new(3, NewRedirectPattern::new(1, "^/d/", "/e/").all_subdomains()),
        ];
        let table = render_patterns(&patterns);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("^/a/ -> /b/"));
        assert!(lines[0].contains(" - "));
        assert!(lines[1].contains("shop"));
        assert!(lines[1].contains("(gone)"));
        assert!(lines[2].contains("*"));
    }
}
