//! Command dispatch for the `cukehub` entrypoint.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use eyre::{Context, Result, bail};
use tracing::info;

use cukehub_core::config::{ConfigOverrides, EditorConfig, LogLevel};
use cukehub_core::formatter::try_render;
use cukehub_core::logging::init_logging;
use cukehub_core::notification::Notification;
use cukehub_core::parser::parse_feature_file;
use cukehub_core::session::EditorSession;

use crate::output::{write_document, write_export_report, write_matches, write_tags};

/// Edit tags across a tree of Gherkin feature files.
#[derive(Parser, Debug)]
#[command(name = "cukehub", version, about)]
pub(crate) struct Cli {
    /// JSON settings file (`directoryPath`, `outputFolder`, ...).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory scanned for `.feature` files.
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Comma-separated exclusion patterns; `*` matches any run of characters.
    #[arg(long, global = true)]
    exclude: Option<String>,
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// List every document with its scenarios.
    List,
    /// List every distinct tag.
    Tags,
    /// Print a feature file in canonical layout.
    Fmt {
        /// Feature file to format.
        file: PathBuf,
    },
    /// List scenarios matching a tag expression and the test command for it.
    Select {
        /// Expression such as `@smoke and not @wip`.
        expression: String,
    },
    /// Write every document to the output directory.
    Export(ExportArgs),
    /// Rename a tag in every document, then export.
    Retag {
        /// Tag to rename.
        old: String,
        /// Replacement name.
        new: String,
    },
    /// Remove a tag from every document, then export.
    Untag {
        /// Tag to remove.
        tag: String,
    },
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Output directory, overriding the configured one.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write every file directly under the output directory.
    #[arg(long)]
    flatten: bool,
}

pub(crate) fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    init_logging(&config);
    info!(version = env!("CARGO_PKG_VERSION"), "starting cukehub");

    match cli.command {
        Commands::Fmt { file } => handle_fmt(&file),
        Commands::List => handle_list(&EditorSession::new(config)),
        Commands::Tags => handle_tags(&EditorSession::new(config)),
        Commands::Select { expression } => handle_select(&EditorSession::new(config), &expression),
        Commands::Export(args) => handle_export(&EditorSession::new(with_export_args(config, args))),
        Commands::Retag { old, new } => handle_retag(&EditorSession::new(config), &old, &new),
        Commands::Untag { tag } => handle_untag(&EditorSession::new(config), &tag),
    }
}

fn build_config(cli: &Cli) -> Result<EditorConfig> {
    let config = EditorConfig::load(cli.config.as_deref())
        .wrap_err("failed to load configuration")?;
    Ok(config.apply_overrides(ConfigOverrides {
        root_dir: cli.root.clone(),
        exclude_patterns: cli.exclude.clone(),
        log_level: cli.log_level,
        ..ConfigOverrides::default()
    }))
}

fn with_export_args(config: EditorConfig, args: ExportArgs) -> EditorConfig {
    config.apply_overrides(ConfigOverrides {
        output_dir: args.output,
        keep_folder_structure: args.flatten.then_some(false),
        ..ConfigOverrides::default()
    })
}

fn handle_fmt(file: &Path) -> Result<()> {
    let root = file.parent().unwrap_or_else(|| Path::new(""));
    let document = parse_feature_file(file, root)
        .wrap_err_with(|| format!("failed to parse {}", file.display()))?;
    let text = try_render(&document)
        .wrap_err_with(|| format!("failed to render {}", file.display()))?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .wrap_err("failed to write formatted feature")?;
    stdout.flush().wrap_err("failed to flush formatted feature")
}

fn handle_list(session: &EditorSession) -> Result<()> {
    let mut stdout = io::stdout().lock();
    session.with_store(|store| {
        store
            .list()
            .iter()
            .try_for_each(|document| write_document(&mut stdout, document))
    })??;
    report_discovery_failures(session)?;
    stdout.flush().wrap_err("failed to flush document listing")
}

fn handle_tags(session: &EditorSession) -> Result<()> {
    let tags = session.all_tags()?;
    let mut stdout = io::stdout().lock();
    write_tags(&mut stdout, &tags)?;
    stdout.flush().wrap_err("failed to flush tag listing")
}

fn handle_select(session: &EditorSession, expression: &str) -> Result<()> {
    let matches = session.select_scenarios(expression)?;
    let mut stderr = io::stderr().lock();
    for tag in session.unknown_tags(expression)? {
        writeln!(stderr, "warning: no document carries {tag}")
            .wrap_err("failed to report unknown tag")?;
    }
    let mut stdout = io::stdout().lock();
    write_matches(&mut stdout, &matches)?;
    if session.config().test_command.is_some() {
        let command = session.test_command(expression)?;
        writeln!(stdout, "command: {command}").wrap_err("failed to write test command")?;
    }
    stdout.flush().wrap_err("failed to flush scenario selection")
}

fn handle_export(session: &EditorSession) -> Result<()> {
    let report = session.export()?;
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    write_export_report(&mut stdout, &mut stderr, &report)?;
    stdout.flush().wrap_err("failed to flush export listing")?;
    if !report.is_success() {
        bail!("{} documents could not be exported", report.failures.len());
    }
    Ok(())
}

fn handle_retag(session: &EditorSession, old: &str, new: &str) -> Result<()> {
    match session.rename_tag_everywhere(old, new)? {
        Some(Notification::Error { message }) => bail!(message),
        Some(_) => handle_export(session),
        None => bail!("tag {old} was not renamed: not found or {new} is not a valid tag name"),
    }
}

fn handle_untag(session: &EditorSession, tag: &str) -> Result<()> {
    if session.delete_tag_everywhere(tag)?.is_none() {
        bail!("tag {tag} not found");
    }
    handle_export(session)
}

fn report_discovery_failures(session: &EditorSession) -> Result<()> {
    let mut stderr = io::stderr().lock();
    for failure in session.discovery_failures() {
        writeln!(stderr, "skipped {}: {}", failure.path.display(), failure.reason)
            .wrap_err("failed to report skipped file")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use rstest::rstest;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case(&["cukehub", "export"], None, None)]
    #[case(&["cukehub", "export", "--flatten"], None, Some(false))]
    #[case(&["cukehub", "export", "--output", "out"], Some("out"), None)]
    fn export_flags_become_overrides(
        #[case] argv: &[&str],
        #[case] output: Option<&str>,
        #[case] keep: Option<bool>,
    ) {
        let Ok(cli) = Cli::try_parse_from(argv) else {
            panic!("arguments should parse");
        };
        let Commands::Export(args) = cli.command else {
            panic!("expected export");
        };
        let base = EditorConfig {
            keep_folder_structure: true,
            ..EditorConfig::default()
        };
        let config = with_export_args(base, args);
        assert_eq!(config.output_dir, output.map(PathBuf::from));
        assert_eq!(config.keep_folder_structure, keep.unwrap_or(true));
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let Ok(cli) = Cli::try_parse_from(["cukehub", "tags", "--root", "features"]) else {
            panic!("arguments should parse");
        };
        assert_eq!(cli.root, Some(PathBuf::from("features")));
    }

    #[test]
    fn unknown_log_levels_are_rejected() {
        assert!(Cli::try_parse_from(["cukehub", "--log-level", "loud", "tags"]).is_err());
    }
}
