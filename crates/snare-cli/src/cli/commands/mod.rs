//! CLI command handlers, one file per command group.

mod completions;
mod connection;
mod host;
mod import_har;
mod links;
mod probe;
mod scan_dom;
mod send;

pub use completions::{run_completions, run_man};
pub use connection::run_test_connection;
pub use host::run_host;
pub use import_har::run_import_har;
pub use links::{run_clear, run_links, run_remove, run_toggle};
pub use probe::run_probe;
pub use scan_dom::run_scan_dom;
pub use send::run_send;

use anyhow::Result;
use snare_core::config;
use snare_core::dispatch::DispatchReport;
use snare_core::format::format_size;
use snare_core::link::{JsonFileStore, Link, LinkStore};

/// The persisted link list under the XDG data dir.
async fn open_store() -> Result<LinkStore<JsonFileStore>> {
    let path = config::link_store_path()?;
    LinkStore::open(JsonFileStore::new(path)).await
}

fn print_links(links: &[Link]) {
    println!(
        "{:<32} {:<3} {:>10} {:<6} {}",
        "ID", "SEL", "SIZE", "TYPE", "FILENAME"
    );
    for l in links {
        let size = l.size.map(format_size).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<32} {:<3} {:>10} {:<6} {}",
            l.id,
            if l.selected { "*" } else { "" },
            size,
            l.file_type,
            l.filename
        );
        println!("{:<32} {}", "", l.url);
    }
}

fn print_report(report: &DispatchReport) {
    for r in &report.results {
        match (&r.job_id, &r.error) {
            (Some(gid), _) => println!("sent    {} (job {})", r.link.filename, gid),
            (None, Some(e)) => println!("failed  {}: {}", r.link.filename, e),
            (None, None) => println!("failed  {}", r.link.filename),
        }
    }
    println!(
        "{} sent, {} failed, {} total",
        report.succeeded, report.failed, report.total
    );
}

/// Error when any item of the batch failed.
fn ensure_sent(report: &DispatchReport) -> Result<()> {
    anyhow::ensure!(
        report.is_success(),
        "{} of {} link(s) failed to send",
        report.failed,
        report.total
    );
    Ok(())
}
