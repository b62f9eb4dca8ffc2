//! Workspace slug derivation.
//!
//! A slug is the lowercase workspace name with every run of
//! non-alphanumeric characters collapsed to a single hyphen and leading or
//! trailing hyphens stripped. Slugs are globally unique.
//!
//! Truncation at [`MAX_SLUG_LEN`] means distinct long names can share a
//! slug. A shared slug never grants access to another tenant's workspace:
//! checkout intake moves a buyer who does not belong to the workspace onto
//! a [`suffixed_slug`] instead.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Maximum slug length stored in `workspaces.slug`.
pub const MAX_SLUG_LEN: usize = 64;

static NON_ALNUM_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Derive a slug from a display name.
///
/// ```
/// use mailroom_core::slug::slugify;
///
/// assert_eq!(slugify("My Co!"), "my-co");
/// assert_eq!(slugify("  A--B  "), "a-b");
/// ```
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    let collapsed = NON_ALNUM_RUN.replace_all(&lower, "-");
    let trimmed = collapsed.trim_matches('-');

    if trimmed.len() <= MAX_SLUG_LEN {
        return trimmed.to_string();
    }
    // Slugs are ASCII after the replacement, so byte slicing is safe.
    trimmed[..MAX_SLUG_LEN].trim_end_matches('-').to_string()
}

/// Append `-{suffix}` to `base`, shortening `base` so the result still
/// fits in [`MAX_SLUG_LEN`]. `base` must already be a slug.
///
/// ```
/// use mailroom_core::slug::suffixed_slug;
///
/// assert_eq!(suffixed_slug("acme", "2"), "acme-2");
/// ```
pub fn suffixed_slug(base: &str, suffix: &str) -> String {
    let suffix = slugify(suffix);
    if suffix.is_empty() {
        return base.to_string();
    }
    let keep = MAX_SLUG_LEN
        .saturating_sub(suffix.len() + 1)
        .min(base.len());
    let head = base.get(..keep).unwrap_or(base).trim_end_matches('-');
    if head.is_empty() {
        return suffix;
    }
    format!("{head}-{suffix}")
}

/// Derive a slug and reject names that normalize to nothing.
pub fn slug_for_workspace_name(name: &str) -> Result<String, CoreError> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(CoreError::Validation(format!(
            "Workspace name '{name}' must contain at least one letter or digit"
        )));
    }
    Ok(slug)
}

/// Default workspace name for a purchase that did not carry one: the
/// email's local part followed by "Workspace".
pub fn default_workspace_name(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    format!("{local} Workspace")
}
