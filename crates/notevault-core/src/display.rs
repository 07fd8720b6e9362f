//! Presentation helpers shared by every view of the catalog.

use crate::defaults::FALLBACK_DISPLAY_NAME;

const BYTE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Strip a generated `<timestamp>-` prefix from a stored title.
///
/// Everything up to and including the first hyphen is dropped when something
/// follows it; titles without a hyphen (or ending in one) are shown as-is.
pub fn display_title(title: &str) -> &str {
    match title.split_once('-') {
        Some((_, rest)) if !rest.is_empty() => rest,
        _ => title,
    }
}

/// Short greeting name derived from an email's local part.
pub fn display_name(email: Option<&str>) -> &str {
    email
        .and_then(|e| e.split('@').next())
        .filter(|local| !local.is_empty())
        .unwrap_or(FALLBACK_DISPLAY_NAME)
}

/// Human-readable byte count, e.g. `1.5 KB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, BYTE_UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_strips_timestamp_prefix() {
        assert_eq!(display_title("1718000000000-DBMS-Unit-2.pdf"), "DBMS-Unit-2.pdf");
    }

    #[test]
    fn test_display_title_without_hyphen() {
        assert_eq!(display_title("Physics Notes"), "Physics Notes");
    }

    #[test]
    fn test_display_title_trailing_hyphen_keeps_raw() {
        assert_eq!(display_title("draft-"), "draft-");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Some("riya.k@college.edu")), "riya.k");
        assert_eq!(display_name(Some("@nolocal")), "Explorer");
        assert_eq!(display_name(None), "Explorer");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(500), "500 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024 * 1024), "3072 GB");
    }
}
