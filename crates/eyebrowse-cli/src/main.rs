//! EyeBrowse - Command Line Entry Point
//!
//! Loads an HTML file as a tab, applies the stored settings, runs any
//! commands given on the command line, and prints the resulting markup.
//!
//! ```text
//! eyebrowse <page.html> [--settings FILE] [--command JSON]... [--reset] [--read]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use eyebrowse_engine::{
    Command, CommandOutcome, CommandRouter, JsonFileStore, MemoryStore, ReadingQueue, SettingsStore,
};
use tracing_subscriber::EnvFilter;
use url::Url;

const USAGE: &str =
    "usage: eyebrowse <page.html> [--settings FILE] [--command JSON]... [--reset] [--read]";

#[derive(Debug, Default)]
struct Options {
    page: PathBuf,
    settings: Option<PathBuf>,
    commands: Vec<String>,
    reset: bool,
    read: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options> {
    let mut options = Options::default();
    let mut page = None;
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" => {
                let path = args.next().context("--settings needs a file")?;
                options.settings = Some(PathBuf::from(path));
            }
            "--command" => {
                options.commands.push(args.next().context("--command needs a JSON message")?);
            }
            "--reset" => options.reset = true,
            "--read" => options.read = true,
            "-h" | "--help" => bail!(USAGE),
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            _ if page.is_none() => page = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument {arg}\n{USAGE}"),
        }
    }
    options.page = page.context(USAGE)?;
    Ok(options)
}

fn page_url(path: &Path) -> Result<String> {
    let absolute = path
        .canonicalize()
        .with_context(|| format!("cannot resolve {}", path.display()))?;
    let url = Url::from_file_path(&absolute)
        .map_err(|()| anyhow::anyhow!("{} is not a valid file path", absolute.display()))?;
    Ok(url.to_string())
}

fn run<S: SettingsStore>(store: S, options: &Options) -> Result<String> {
    let url = page_url(&options.page)?;
    let html = std::fs::read_to_string(&options.page)
        .with_context(|| format!("cannot read {}", options.page.display()))?;
    let document = eyebrowse_html::parse_document(&html, &url)?;

    let mut router = CommandRouter::new(store);
    let tab = router.open_tab(&url, document);

    for raw in &options.commands {
        let message: serde_json::Value =
            serde_json::from_str(raw).with_context(|| format!("invalid JSON: {raw}"))?;
        let command = Command::from_message(&message)?;
        let name = command.name();
        match router.dispatch(tab, command) {
            Ok(CommandOutcome::Applied) => tracing::info!("{} applied", name),
            Ok(CommandOutcome::Skipped(reason)) => tracing::warn!("{} skipped: {}", name, reason),
            Err(e) => tracing::warn!("{} failed: {}", name, e),
        }
    }

    let session = router.session_mut(tab)?;
    if options.reset {
        session.coordinator.reset_all(&mut session.document);
    }
    if options.read {
        return Ok(ReadingQueue::collect(&session.document).text().to_string());
    }
    Ok(eyebrowse_html::serialize(&session.document))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = parse_args(std::env::args().skip(1))?;
    tracing::debug!("{:?}", options);

    let output = match &options.settings {
        Some(path) => run(JsonFileStore::open(path)?, &options)?,
        None => run(MemoryStore::new(), &options)?,
    };
    println!("{output}");
    Ok(())
}
