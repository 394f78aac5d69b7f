//! Helpers for normalizing caller-supplied strings.

use std::path::Path;

/// Sanitize arbitrary string input by trimming whitespace and dropping empties.
pub(crate) fn sanitize_string(value: Option<String>) -> Option<String> {
    value.and_then(|input| {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Return at most `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Reduce an uploaded filename to its base name.
///
/// Directory components (either separator style) are discarded; names that are empty or consist
/// only of dots are rejected.
pub fn sanitize_filename(value: &str) -> Option<String> {
    let base = value.rsplit(['/', '\\']).next().unwrap_or(value).trim();
    let base = Path::new(base).file_name()?.to_str()?.trim();
    if base.is_empty() || base.chars().all(|ch| ch == '.') {
        return None;
    }
    let cleaned: String = base
        .chars()
        .map(|ch| if ch.is_control() { '_' } else { ch })
        .collect();
    Some(cleaned)
}

/// Normalize a user question or query; blank input yields `None`.
pub fn sanitize_question(value: &str) -> Option<String> {
    sanitize_string(Some(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_respects_multibyte_boundaries() {
        assert_eq!(truncate_chars("§§ 1983", 2), "§§");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn sanitize_filename_keeps_base_name_only() {
        assert_eq!(
            sanitize_filename("../../etc/lease.pdf").as_deref(),
            Some("lease.pdf")
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\me\\nda.docx").as_deref(),
            Some("nda.docx")
        );
        assert!(sanitize_filename("..").is_none());
        assert!(sanitize_filename("   ").is_none());
        assert!(sanitize_filename("dir/").is_none());
    }

    #[test]
    fn sanitize_question_trims_and_rejects_blank() {
        assert_eq!(
            sanitize_question("  Who are the parties? ").as_deref(),
            Some("Who are the parties?")
        );
        assert!(sanitize_question(" \n\t").is_none());
    }
}
