//! Input validation helpers shared by the API and repository layers.

use std::sync::LazyLock;

use regex::Regex;
use validator::ValidateEmail;

use crate::error::CoreError;

/// Lowercase hostname with at least one dot and an alphabetic TLD.
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$").expect("valid regex")
});

/// Require a non-blank string field, returning it trimmed.
pub fn require_non_empty<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, CoreError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CoreError::Validation(format!("{field} is required"))),
    }
}

/// Require a syntactically valid email address.
pub fn require_email<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, CoreError> {
    let email = require_non_empty(value, field)?;
    if !email.validate_email() {
        return Err(CoreError::Validation(format!(
            "{field} '{email}' is not a valid email address"
        )));
    }
    Ok(email)
}

/// Normalize and validate a domain name (`Example.COM` -> `example.com`).
pub fn normalize_domain(name: &str) -> Result<String, CoreError> {
    let normalized = name.trim().trim_end_matches('.').to_lowercase();
    if normalized.len() > 253 || !DOMAIN_RE.is_match(&normalized) {
        return Err(CoreError::Validation(format!(
            "'{name}' is not a valid domain name"
        )));
    }
    Ok(normalized)
}
