//! Slug synthesis shared by categories and tags.

use crate::domain::CATEGORY_SLUG_MAX;

/// Longest slug the schema accepts, suffix included.
pub const SLUG_MAX: usize = CATEGORY_SLUG_MAX;

/// Room kept free at the end of a base slug for a `-N` suffix.
const SUFFIX_RESERVE: usize = 8;

/// URL-safe slug for a display name.
///
/// Non-Latin scripts are transliterated, so `"장고"` still yields a readable
/// ASCII slug. Names that transliterate to nothing fall back to their
/// code points.
pub fn slugify_name(name: &str) -> String {
    let slug = slug::slugify(name);
    let slug = if slug.is_empty() {
        name.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| format!("u{:x}", c as u32))
            .collect::<Vec<_>>()
            .join("-")
    } else {
        slug
    };

    slug.chars()
        .take(SLUG_MAX - SUFFIX_RESERVE)
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

/// The `attempt`-th slug to try for `base`: `base`, then `base-1`, `base-2`, ...
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

/// `true` if `slug` only holds lowercase ASCII letters, digits, `-` and `_`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= SLUG_MAX
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic_names() {
        assert_eq!(slugify_name("Hello World"), "hello-world");
        assert_eq!(slugify_name("  Rust & Web  "), "rust-web");
    }

    #[test]
    fn slugify_transliterates_unicode() {
        let slug = slugify_name("Café Déjà");
        assert_eq!(slug, "cafe-deja");

        let korean = slugify_name("장고");
        assert!(!korean.is_empty());
        assert!(is_valid_slug(&korean));
    }

    #[test]
    fn slugify_never_returns_empty() {
        let slug = slugify_name("!!!");
        assert!(!slug.is_empty());
        assert!(is_valid_slug(&slug));
    }

    #[test]
    fn slugify_truncates_long_names() {
        let slug = slugify_name(&"a".repeat(500));
        assert!(slug.len() <= SLUG_MAX);
        assert!(is_valid_slug(&format!("{slug}-12")));
    }

    #[test]
    fn candidates_append_counters() {
        let first: Vec<_> = (0..3).map(|n| slug_candidate("news", n)).collect();
        assert_eq!(first, vec!["news", "news-1", "news-2"]);
    }

    #[test]
    fn slug_validation() {
        assert!(is_valid_slug("rust-2024"));
        assert!(is_valid_slug("no_category"));
        assert!(!is_valid_slug("Rust"));
        assert!(!is_valid_slug("a b"));
        assert!(!is_valid_slug(""));
    }
}
