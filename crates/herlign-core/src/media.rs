//! Media use-count bookkeeping.
//!
//! A content field holds at most one media URL. When the field changes the
//! vacated URL loses a reference and the new one gains a reference; a field
//! rewritten with the same URL is a no-op.

use crate::CoreError;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Accepted MIME types with the extension stored files get.
pub const ALLOWED_MIME_TYPES: [(&str, &str); 4] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/svg+xml", "svg"),
];

/// Checks an upload's declared type and size, returning the file extension
/// to store it under.
pub fn check_upload(mime_type: &str, size: usize) -> Result<&'static str, CoreError> {
    let ext = ALLOWED_MIME_TYPES
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(mime_type))
        .map(|(_, ext)| *ext)
        .ok_or(CoreError::UnsupportedMediaType)?;
    if size > MAX_UPLOAD_BYTES {
        return Err(CoreError::FileTooLarge);
    }
    Ok(ext)
}

/// Net per-URL changes caused by moving a field from `old` to `new`.
///
/// Empty strings count as "no media". URLs with a net change of zero are
/// omitted, so the result has at most two entries.
pub fn use_count_deltas(old: Option<&str>, new: Option<&str>) -> Vec<(String, i64)> {
    let mut changes: Vec<(String, i64)> = Vec::with_capacity(2);
    let mut bump = |url: Option<&str>, delta: i64| {
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            return;
        };
        match changes.iter_mut().find(|(u, _)| u == url) {
            Some((_, d)) => *d += delta,
            None => changes.push((url.to_owned(), delta)),
        }
    };
    bump(old, -1);
    bump(new, 1);
    changes.retain(|(_, d)| *d != 0);
    changes
}

/// Apply a delta to a stored count, never going below zero.
pub fn apply_delta(current: i64, delta: i64) -> i64 {
    current.saturating_add(delta).max(0)
}
