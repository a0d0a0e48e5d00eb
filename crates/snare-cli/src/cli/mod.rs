//! CLI for snare.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use snare_core::config;
use snare_core::format::parse_size;
use std::path::PathBuf;

use commands::{
    run_clear, run_completions, run_host, run_import_har, run_links, run_man, run_probe,
    run_remove, run_scan_dom, run_send, run_test_connection, run_toggle,
};

/// Top-level CLI for snare.
#[derive(Debug, Parser)]
#[command(name = "snare")]
#[command(
    about = "snare: catch browser downloads and hand them to an aria2 daemon",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run as the browser's native-messaging host (framed JSON on stdin/stdout).
    Host {
        /// Keep the link list in memory only.
        #[arg(long)]
        ephemeral: bool,
    },

    /// Replay a HAR file through the capture rules and store the links found.
    ImportHar {
        /// Path to the HAR file.
        path: PathBuf,

        /// Keep Cookie and Authorization headers from the HAR for dispatch.
        #[arg(long)]
        allow_cookies: bool,

        /// Send the captured links to the daemon right away.
        #[arg(long)]
        send: bool,
    },

    /// Scan a page document (JSON element tree) for download links.
    ScanDom {
        /// Path to the document JSON (`{ "url": ..., "root": { "tag": ... } }`).
        document: PathBuf,
    },

    /// List captured links.
    Links {
        /// Only show links at least this large (e.g. `10MB`, `512kb`).
        #[arg(long, value_name = "SIZE", value_parser = parse_size_arg)]
        min_size: Option<u64>,
    },

    /// Flip the selection of one link.
    Toggle {
        /// Link identifier.
        id: String,
    },

    /// Remove one link from the list.
    Remove {
        /// Link identifier.
        id: String,
    },

    /// Remove every link from the list.
    Clear,

    /// Send the selected links to the daemon.
    Send,

    /// Check that the daemon answers.
    TestConnection,

    /// Show size, type and filename of a URL without downloading it.
    Probe {
        /// HTTP/HTTPS URL.
        url: String,
    },

    /// Print a shell completion script.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print the man page (roff).
    Man,
}

fn parse_size_arg(s: &str) -> Result<u64, String> {
    parse_size(s).ok_or_else(|| format!("invalid size '{}' (try 10MB or 512KB)", s))
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Host { ephemeral } => run_host(ephemeral).await?,
            CliCommand::ImportHar {
                path,
                allow_cookies,
                send,
            } => run_import_har(&cfg, &path, allow_cookies, send).await?,
            CliCommand::ScanDom { document } => run_scan_dom(&cfg, &document).await?,
            CliCommand::Links { min_size } => run_links(min_size).await?,
            CliCommand::Toggle { id } => run_toggle(&id).await?,
            CliCommand::Remove { id } => run_remove(&id).await?,
            CliCommand::Clear => run_clear().await?,
            CliCommand::Send => run_send(&cfg).await?,
            CliCommand::TestConnection => run_test_connection(&cfg).await?,
            CliCommand::Probe { url } => run_probe(&url).await?,
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
