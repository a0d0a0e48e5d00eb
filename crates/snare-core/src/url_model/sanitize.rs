//! Cross-platform filename sanitization.

/// Characters rejected by at least one common filesystem.
const ILLEGAL: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Linux NAME_MAX in bytes.
const NAME_MAX: usize = 255;

/// Sanitizes a candidate filename for safe use as a download output name.
///
/// - Replaces `< > : " / \ | ? *` and control characters with `_`
/// - Trims surrounding whitespace
/// - Limits length to 255 bytes
/// - Replaces an empty result (or `.`/`..`) with `download_<unix millis>`
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if ILLEGAL.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return generated_name();
    }

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}

fn generated_name() -> String {
    format!("download_{}", chrono::Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_reserved_characters() {
        assert_eq!(sanitize_filename("a/b:c*d.txt"), "a_b_c_d.txt");
        assert_eq!(sanitize_filename("<x>|\"y\"?.bin"), "_x___y__.bin");
        assert_eq!(sanitize_filename("back\\slash.txt"), "back_slash.txt");
    }

    #[test]
    fn keeps_valid_names() {
        assert_eq!(sanitize_filename("report 2024 (final).pdf"), "report 2024 (final).pdf");
        assert_eq!(sanitize_filename("café.txt"), "café.txt");
    }

    #[test]
    fn control_chars() {
        assert_eq!(sanitize_filename("file\x00name.txt"), "file_name.txt");
    }

    #[test]
    fn empty_gets_generated_name() {
        for input in ["", "   ", ".", ".."] {
            let name = sanitize_filename(input);
            let suffix = name.strip_prefix("download_").expect("generated prefix");
            assert!(suffix.parse::<i64>().is_ok(), "{name}");
        }
    }

    #[test]
    fn truncates_long_names_on_char_boundary() {
        let long = "é".repeat(200);
        let out = sanitize_filename(&long);
        assert!(out.len() <= NAME_MAX);
        assert!(out.chars().all(|c| c == 'é'));
    }
}
