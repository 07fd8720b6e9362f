//! Upload validation and object naming for PDF study material.
//!
//! Multi-layer check before anything reaches the object store:
//! 1. Size limit (non-empty, at most [`MAX_UPLOAD_BYTES`])
//! 2. Declared content type must be `application/pdf`
//! 3. Magic bytes must actually be a PDF

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::{MAX_UPLOAD_BYTES, PDF_MIME};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Result of upload validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub allowed: bool,
    pub block_reason: Option<String>,
    pub detected_type: Option<String>,
}

impl ValidationResult {
    pub fn allowed(detected: impl Into<String>) -> Self {
        Self {
            allowed: true,
            block_reason: None,
            detected_type: Some(detected.into()),
        }
    }

    pub fn blocked(reason: impl Into<String>, detected: impl Into<String>) -> Self {
        Self {
            allowed: false,
            block_reason: Some(reason.into()),
            detected_type: Some(detected.into()),
        }
    }
}

/// Validate a PDF upload.
pub fn validate_pdf(declared_type: &str, data: &[u8]) -> ValidationResult {
    if data.is_empty() {
        return ValidationResult::blocked("No PDF file provided", "empty");
    }

    if data.len() as u64 > MAX_UPLOAD_BYTES {
        return ValidationResult::blocked(
            format!("File exceeds maximum size of {} bytes", MAX_UPLOAD_BYTES),
            "oversized",
        );
    }

    if !declared_type.eq_ignore_ascii_case(PDF_MIME) {
        return ValidationResult::blocked(
            "Only PDF files are allowed",
            format!("declared:{}", declared_type),
        );
    }

    match infer::get(data) {
        Some(kind) if kind.mime_type() == PDF_MIME => ValidationResult::allowed(PDF_MIME),
        Some(kind) => ValidationResult::blocked(
            format!("Content is {}, not a PDF", kind.mime_type()),
            kind.mime_type(),
        ),
        None => ValidationResult::blocked("Content is not a PDF", "unknown"),
    }
}

/// Strip path components and collapse whitespace runs to `-`.
pub fn sanitize_upload_name(file_name: &str) -> String {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name).trim();
    let collapsed = WHITESPACE_RUN.replace_all(name, "-");
    if collapsed.is_empty() {
        "unnamed.pdf".to_string()
    } else {
        collapsed.into_owned()
    }
}

/// Object key for a regular upload: `user-{user_id}/{millis}-{name}`.
pub fn pdf_object_path(user_id: &str, millis: i64, file_name: &str) -> String {
    format!("user-{}/{}-{}", user_id, millis, sanitize_upload_name(file_name))
}

/// Object key for a community contribution: `{millis}-{name}` with every
/// whitespace character replaced by `_`.
pub fn contribution_object_name(millis: i64, file_name: &str) -> String {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{}-{}", millis, cleaned)
}

/// Parse a comma-separated tag list: trimmed, empties dropped, first
/// occurrence of a duplicate kept.
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Subject/chapter guessed from an upload's file name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataSuggestion {
    pub subject: String,
    pub chapter: String,
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Guess metadata from names like `dbms_unit-2.pdf` → (`Dbms`, `Unit 2`).
pub fn suggest_metadata(file_name: &str) -> MetadataSuggestion {
    let split = file_name.len().saturating_sub(4);
    let stem = match file_name.get(split..) {
        Some(ext) if ext.eq_ignore_ascii_case(".pdf") => &file_name[..split],
        _ => file_name,
    };
    let normalized = WHITESPACE_RUN.replace_all(&stem.replace('-', "_"), "_").into_owned();
    let mut parts = normalized.split('_').filter(|p| !p.is_empty());

    let subject = parts.next().map(capitalize).unwrap_or_default();
    let chapter = capitalize(&parts.collect::<Vec<_>>().join(" "));
    MetadataSuggestion { subject, chapter }
}
