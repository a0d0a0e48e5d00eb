//! HEAD probe against a local HTTP server.

mod common;

use common::http_server::{self, FileHeaders};
use snare_core::fetch_head::{probe, probe_async};

fn headers() -> FileHeaders {
    FileHeaders {
        content_length: 734_003_200,
        content_type: "application/x-iso9660-image",
        disposition: Some("attachment; filename=\"debian-12.iso\""),
        accept_ranges: true,
    }
}

#[test]
fn probe_reads_size_type_and_name() {
    let base = http_server::start(headers());
    let result = probe(&format!("{}/files/debian-12.iso", base), &[]).unwrap();

    assert_eq!(result.content_length, Some(734_003_200));
    assert_eq!(result.content_type.as_deref(), Some("application/x-iso9660-image"));
    assert!(result.accept_ranges);
    assert_eq!(result.filename(), "debian-12.iso");
}

#[test]
fn probe_follows_redirects() {
    let base = http_server::start(FileHeaders {
        disposition: None,
        accept_ranges: false,
        ..headers()
    });
    let result = probe(&format!("{}/go/image.iso", base), &["Referer: https://x.test/".to_string()])
        .unwrap();

    assert_eq!(result.final_url, format!("{}/files/image.iso", base));
    assert!(!result.accept_ranges);
    assert_eq!(result.content_disposition, None);
    assert_eq!(result.filename(), "image.iso");
}

#[test]
fn http_error_status_is_an_error() {
    let base = http_server::start(headers());
    let err = probe(&format!("{}/missing", base), &[]).unwrap_err();
    assert!(format!("{:#}", err).contains("404"));
}

#[tokio::test]
async fn async_probe_runs_off_the_runtime() {
    let base = http_server::start(headers());
    let result = probe_async(format!("{}/files/a.iso", base), Vec::new())
        .await
        .unwrap();
    assert_eq!(result.content_length, Some(734_003_200));
}
