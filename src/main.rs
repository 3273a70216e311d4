//! roster-scrape CLI.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use roster_scrape::dom::cdp::{CdpBrowser, CdpDom};
use roster_scrape::{export, Command, Config, Relay};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "roster-scrape", version, about = "Export a chat group's member roster as CSV")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat page, extract the current group's roster, write a CSV.
    Extract {
        /// URL of the chat page with the target group's info panel open.
        #[arg(long)]
        url: String,

        /// Directory the CSV is written into.
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Observation window in seconds (the operator scrolls during this).
        #[arg(long, default_value_t = 30)]
        window_secs: u64,

        /// Timeout in seconds for the panel and dialog waits.
        #[arg(long, default_value_t = 15)]
        wait_secs: u64,

        /// Run the browser headless. Default is headed: the operator has to
        /// log in and scroll the member list by hand.
        #[arg(long)]
        headless: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roster_scrape=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract {
            url,
            out,
            window_secs,
            wait_secs,
            headless,
        } => extract(url, out, window_secs, wait_secs, headless).await,
    }
}

async fn extract(
    url: String,
    out: PathBuf,
    window_secs: u64,
    wait_secs: u64,
    headless: bool,
) -> Result<()> {
    let config = Config {
        panel_timeout: Duration::from_secs(wait_secs),
        dialog_timeout: Duration::from_secs(wait_secs),
        observe_window: Duration::from_secs(window_secs),
        ..Config::default()
    };

    info!("launching browser");
    let browser = CdpBrowser::launch(!headless)
        .await
        .context("launching browser")?;

    // The browser process must come down on every exit path, so nothing
    // past this point is allowed to early-return before close().
    let outcome = match browser.open(&url, config.mutation_poll).await {
        Ok(dom) => run_and_export(dom, config, &out).await,
        Err(e) => Err(e).with_context(|| format!("opening {url}")),
    };

    browser.close().await.ok();
    outcome
}

async fn run_and_export(dom: CdpDom, config: Config, out: &Path) -> Result<()> {
    let (relay, mut status) = Relay::spawn(Arc::new(dom), config);
    tokio::spawn(async move {
        while let Some(message) = status.recv().await {
            info!("{message}");
        }
    });

    let response = relay.send(Command::ExtractGroupMembers).await?;
    match response.data {
        Some(result) => {
            if let Some(path) = export::write_csv_if_any(out, &result)? {
                println!(
                    "Extracted {} members from {} -> {}",
                    result.members.len(),
                    result.group_name,
                    path.display()
                );
            }
            Ok(())
        }
        None => {
            let message = response
                .error
                .unwrap_or_else(|| "extraction failed".to_string());
            bail!(message)
        }
    }
}
