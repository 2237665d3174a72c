//! File naming, sizing, and pre-upload validation.
//!
//! Checks applied when files are staged:
//! 1. Extension must be in the accepted set (case-insensitive)
//! 2. Size must not exceed the store's upload limit

/// Units used by [`format_bytes`].
const SIZE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Result of pre-upload validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub allowed: bool,
    pub block_reason: Option<String>,
}

impl ValidationResult {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            block_reason: None,
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            block_reason: Some(reason.into()),
        }
    }
}

/// Validate a picked file against the accepted extensions and size limit.
///
/// An empty `accepted` list accepts every extension.
pub fn validate_upload(
    filename: &str,
    size_bytes: u64,
    accepted: &[String],
    max_size_bytes: u64,
) -> ValidationResult {
    if size_bytes > max_size_bytes {
        return ValidationResult::blocked(format!(
            "File too large. Maximum size is {}",
            format_bytes(Some(max_size_bytes))
        ));
    }

    if accepted.is_empty() {
        return ValidationResult::allowed();
    }

    match extension(filename) {
        Some(ext) if accepted.iter().any(|a| a.eq_ignore_ascii_case(ext)) => {
            ValidationResult::allowed()
        }
        Some(ext) => ValidationResult::blocked(format!("File type .{} is not allowed", ext)),
        None => ValidationResult::blocked("File has no extension"),
    }
}

/// Extension of `filename`, without the dot.
pub fn extension(filename: &str) -> Option<&str> {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Uppercase type token shown next to a document, e.g. `PDF`.
///
/// Names without a dot yield the whole name uppercased.
pub fn file_type_from_name(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_uppercase()
}

/// Human readable size with up to two decimals, e.g. `1.5 KB`.
///
/// Unknown sizes render as `0 B`.
pub fn format_bytes(bytes: Option<u64>) -> String {
    let bytes = match bytes {
        Some(b) if b > 0 => b,
        _ => return "0 B".to_string(),
    };

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// Size in megabytes with exactly two decimals, e.g. `0.01 MB`.
pub fn size_label_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}
