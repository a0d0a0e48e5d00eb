//! `snare probe <url>` – HEAD request summary.

use anyhow::Result;
use snare_core::fetch_head::probe_async;
use snare_core::format::format_size;

pub async fn run_probe(url: &str) -> Result<()> {
    let result = probe_async(url.to_string(), Vec::new()).await?;
    let size = result
        .content_length
        .map(|n| format!("{} ({} bytes)", format_size(n), n))
        .unwrap_or_else(|| "unknown".to_string());

    println!("URL:       {}", result.final_url);
    println!("Filename:  {}", result.filename());
    println!("Size:      {}", size);
    println!("Type:      {}", result.content_type.as_deref().unwrap_or("unknown"));
    println!(
        "Resumable: {}",
        if result.accept_ranges { "yes" } else { "no" }
    );
    Ok(())
}
