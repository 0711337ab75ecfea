//! Filesystem-safe path segments from untrusted issuer/ISIN strings.
//!
//! Issuer names arrive Cyrillic, quoted, and punctuation-laden; they become
//! directory names, so anything a filesystem could object to is replaced.
//! Truncation keeps segments portable, and a digest suffix keeps two long
//! names from silently merging into one directory.

use sha2::{Digest, Sha256};

/// Longest segment emitted, in characters.
const MAX_SEGMENT_CHARS: usize = 150;
/// Hex characters of the digest suffix appended on truncation.
const SUFFIX_CHARS: usize = 8;

/// Windows device names that cannot be used as path segments.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Maps an arbitrary string to a safe path segment: unsafe characters become
/// `_`, whitespace collapses, leading/trailing dots and spaces go, reserved
/// device names get a prefix, and overlong input is truncated with a digest
/// suffix derived from the untruncated original so distinct inputs stay
/// distinct.
pub fn sanitize_segment(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c| c == '.' || c == ' ');

    let mut segment = if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    };

    let stem = segment.split('.').next().unwrap_or("").to_ascii_uppercase();
    if RESERVED_NAMES.contains(&stem.as_str()) {
        segment.insert(0, '_');
    }

    if segment.chars().count() > MAX_SEGMENT_CHARS {
        let keep: String = segment
            .chars()
            .take(MAX_SEGMENT_CHARS - SUFFIX_CHARS - 1)
            .collect();
        segment = format!("{}_{}", keep, digest_suffix(input));
    }

    segment
}

/// Sanitizes a filename while keeping its extension recognizable.
pub fn sanitize_filename(input: &str) -> String {
    match input.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(
                "{}.{}",
                sanitize_segment(stem),
                ext.to_ascii_lowercase()
            )
        }
        _ => sanitize_segment(input),
    }
}

fn digest_suffix(original: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(original.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(SUFFIX_CHARS);
    for byte in digest.iter().take(SUFFIX_CHARS / 2) {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}
