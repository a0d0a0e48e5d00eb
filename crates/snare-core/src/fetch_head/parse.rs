//! Header-line parsing for HEAD responses.

use super::ProbeResult;

/// Parse collected header lines. With redirects curl reports every hop;
/// each status line starts over so the final response wins.
pub(crate) fn parse_headers(lines: &[String]) -> ProbeResult {
    let mut result = ProbeResult::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            result = ProbeResult::default();
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            result.content_length = value.parse::<u64>().ok();
        } else if name.eq_ignore_ascii_case("content-type") {
            let essence = value.split(';').next().unwrap_or("").trim();
            if !essence.is_empty() {
                result.content_type = Some(essence.to_ascii_lowercase());
            }
        } else if name.eq_ignore_ascii_case("content-disposition") {
            result.content_disposition = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("accept-ranges") {
            result.accept_ranges = value.eq_ignore_ascii_case("bytes");
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn length_type_and_ranges() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 200 OK",
            "Content-Length: 12345",
            "Content-Type: application/zip; charset=binary",
            "Accept-Ranges: bytes",
        ]));
        assert_eq!(r.content_length, Some(12345));
        assert_eq!(r.content_type.as_deref(), Some("application/zip"));
        assert!(r.accept_ranges);
    }

    #[test]
    fn final_hop_wins() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 302 Found",
            "Location: https://cdn.example.com/f.iso",
            "Content-Length: 0",
            "Content-Type: text/html",
            "",
            "HTTP/2 200",
            "content-length: 4096",
            "content-disposition: attachment; filename=\"f.iso\"",
        ]));
        assert_eq!(r.content_length, Some(4096));
        assert_eq!(r.content_type, None);
        assert!(r.content_disposition.as_deref().unwrap().contains("f.iso"));
        assert!(!r.accept_ranges);
    }

    #[test]
    fn malformed_length_is_absent() {
        let r = parse_headers(&lines(&["Content-Length: lots", "Accept-Ranges: none"]));
        assert_eq!(r.content_length, None);
        assert!(!r.accept_ranges);
    }

    #[test]
    fn filename_prefers_disposition() {
        let r = ProbeResult {
            final_url: "https://cdn.example.com/dl?id=7".to_string(),
            content_disposition: Some("attachment; filename=\"manual.pdf\"".to_string()),
            ..ProbeResult::default()
        };
        assert_eq!(r.filename(), "manual.pdf");
    }
}
