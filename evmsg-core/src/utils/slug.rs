/// Turn an event name into a URL-friendly slug.
///
/// Lowercases, drops non-ASCII, maps spaces and underscores to `-`, keeps
/// only `[a-z0-9-]`, collapses runs of `-` and trims them from both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().filter(char::is_ascii) {
        let c = match c.to_ascii_lowercase() {
            ' ' | '_' => '-',
            c => c,
        };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug.trim_matches('-').to_string()
}

/// The `attempt`-th candidate for `base`: `base`, `base-2`, `base-3`, ...
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Graduation 2026"), "graduation-2026");
        assert_eq!(slugify("Sam_and Alex's  Wedding!"), "sam-and-alexs-wedding");
    }

    #[test]
    fn test_slugify_trims_and_collapses() {
        assert_eq!(slugify("  --Hello   World--  "), "hello-world");
        assert_eq!(slugify("a - b"), "a-b");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("Café Reunión"), "caf-reunin");
        assert_eq!(slugify("日本"), "");
    }

    #[test]
    fn test_slug_candidates() {
        assert_eq!(slug_candidate("party", 1), "party");
        assert_eq!(slug_candidate("party", 2), "party-2");
        assert_eq!(slug_candidate("party", 3), "party-3");
    }
}
