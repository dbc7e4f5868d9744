//! Slug generation for category names.

/// Convert a category display name to its URL slug.
///
/// Rules:
/// - Lowercase
/// - Replace spaces with hyphens
///
/// Nothing else is stripped, so distinct names stay distinct.
///
/// # Examples
///
/// ```
/// use miniblog_core::category_slug;
///
/// assert_eq!(category_slug("Open Source"), "open-source");
/// assert_eq!(category_slug("rust"), "rust");
/// ```
pub fn category_slug(name: &str) -> String {
    name.replace(' ', "-").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slug() {
        assert_eq!(category_slug("Open Source"), "open-source");
        assert_eq!(category_slug("Rust Programming"), "rust-programming");
    }

    #[test]
    fn test_mixed_case() {
        assert_eq!(category_slug("CamelCase"), "camelcase");
        assert_eq!(category_slug("UPPERCASE"), "uppercase");
    }

    #[test]
    fn test_every_space_becomes_a_hyphen() {
        assert_eq!(category_slug("a  b"), "a--b");
    }

    #[test]
    fn test_case_variants_share_a_slug() {
        assert_eq!(category_slug("Open Source"), category_slug("open source"));
    }
}
