//! Slugs: lowercase, underscore-separated forms used inside entity ids.

/// Lowercase `text`, collapse every run of non-alphanumeric characters into
/// a single `_`, and trim underscores from both ends.
///
/// Returns `"unknown"` when nothing alphanumeric is left.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_sep = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    if slug.is_empty() {
        return "unknown".to_string();
    }
    slug
}
