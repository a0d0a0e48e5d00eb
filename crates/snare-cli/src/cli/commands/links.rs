//! `snare links`, `toggle`, `remove`, `clear` – the captured link list.

use anyhow::Result;
use snare_core::link::Link;

use super::{open_store, print_links};

pub async fn run_links(min_size: Option<u64>) -> Result<()> {
    let store = open_store().await?;
    let links: Vec<Link> = store
        .links()
        .iter()
        .filter(|l| min_size.map_or(true, |min| l.size.is_some_and(|s| s >= min)))
        .cloned()
        .collect();
    if links.is_empty() {
        println!("No links captured.");
        return Ok(());
    }
    print_links(&links);
    println!(
        "{} link(s), {} selected for sending",
        links.len(),
        store.selected_count()
    );
    Ok(())
}

pub async fn run_toggle(id: &str) -> Result<()> {
    let mut store = open_store().await?;
    match store.toggle(id).await? {
        Some(true) => println!("Selected {id}"),
        Some(false) => println!("Deselected {id}"),
        None => anyhow::bail!("no link with id {}", id),
    }
    Ok(())
}

pub async fn run_remove(id: &str) -> Result<()> {
    let mut store = open_store().await?;
    anyhow::ensure!(store.remove(id).await?, "no link with id {}", id);
    println!("Removed {id}");
    Ok(())
}

pub async fn run_clear() -> Result<()> {
    let mut store = open_store().await?;
    let count = store.links().len();
    store.clear().await?;
    println!("Cleared {count} link(s)");
    Ok(())
}
