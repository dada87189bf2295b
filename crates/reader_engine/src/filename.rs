use sha2::{Digest, Sha256};

use crate::types::JobId;

const MAX_TITLE_BYTES: usize = 80;

/// Portable, deterministic output name:
/// `{job_id:04}-{sanitized_title}--{short_hash(url)}.pdf`.
///
/// The job id keeps duplicate URLs in one run from overwriting each other.
pub fn pdf_filename(job_id: JobId, title: Option<&str>, url: &str) -> String {
    let sanitized = sanitize_title(title.unwrap_or("untitled"));
    let hash = short_hash(url);
    format!("{job_id:04}-{sanitized}--{hash}.pdf")
}

/// Forbidden characters and whitespace become `_`, runs of `_` collapse, and
/// the result fits in [`MAX_TITLE_BYTES`] without splitting a character.
pub(crate) fn sanitize_title(input: &str) -> String {
    let mut name = String::with_capacity(input.len().min(MAX_TITLE_BYTES));
    for c in input.chars() {
        let c = if is_forbidden(c) || c.is_whitespace() {
            '_'
        } else {
            c
        };
        if c == '_' && (name.is_empty() || name.ends_with('_')) {
            continue;
        }
        if name.len() + c.len_utf8() > MAX_TITLE_BYTES {
            break;
        }
        name.push(c);
    }

    let trimmed = name.trim_matches(['_', '.', '-']);
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}' | '\u{7F}'
    )
}

/// First 4 bytes of SHA-256, as 8 lowercase hex digits.
fn short_hash(input: &str) -> String {
    Sha256::digest(input.as_bytes())[..4]
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
