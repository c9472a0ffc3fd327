//! # Slugs and Usernames
//!
//! URL slugs for catalog entities and username suggestions for partners.
//! Uniqueness is checked by a caller-supplied predicate so this module
//! never touches storage.

/// Lowercases and collapses every run of non-alphanumerics into one hyphen.
///
/// ```rust
/// use atelier_core::slug::slugify;
///
/// assert_eq!(slugify("  Hermès Birkin 30 / Gold "), "herm-s-birkin-30-gold");
/// assert_eq!(slugify("Louis Vuitton"), "louis-vuitton");
/// ```
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// The slug a name starts from. A name with no alphanumerics becomes `item`.
pub fn base_slug(name: &str) -> String {
    match slugify(name) {
        s if s.is_empty() => "item".to_string(),
        s => s,
    }
}

/// First of `base`, `base-2`, `base-3`, … for which `taken` is false.
pub fn unique_slug<F>(name: &str, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let base = base_slug(name);

    if !taken(&base) {
        return base;
    }

    let mut n = 2u32;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Reduces free text to the username alphabet `[a-z0-9_.]`.
pub fn username_base(input: &str) -> String {
    let local = input.split('@').next().unwrap_or_default();
    let base: String = local
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '.' => Some(c),
            'A'..='Z' => Some(c.to_ascii_lowercase()),
            ' ' | '-' => Some('_'),
            _ => None,
        })
        .take(28)
        .collect();

    let base = base.trim_matches(|c| c == '_' || c == '.').to_string();
    match base.len() {
        0 => "partner".to_string(),
        1 | 2 => format!("{}_partner", base),
        _ => base,
    }
}

/// First of `base`, `base1`, `base2`, … for which `taken` is false.
pub fn suggest_username<F>(input: &str, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let base = username_base(input);
    if !taken(&base) {
        return base;
    }

    let mut n = 1u32;
    loop {
        let candidate = format!("{}{}", base, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Chanel"), "chanel");
        assert_eq!(slugify("--Small  Leather   Goods--"), "small-leather-goods");
        assert_eq!(slugify("EU 38.5"), "eu-38-5");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_unique_slug_appends_counter() {
        let existing: HashSet<&str> = ["chanel", "chanel-2"].into_iter().collect();
        assert_eq!(unique_slug("Chanel", |s| existing.contains(s)), "chanel-3");
        assert_eq!(unique_slug("Dior", |s| existing.contains(s)), "dior");
        assert_eq!(unique_slug("!!!", |_| false), "item");
    }

    #[test]
    fn test_username_base() {
        assert_eq!(username_base("Jane.Doe@example.com"), "jane.doe");
        assert_eq!(username_base("Maison Nord"), "maison_nord");
        assert_eq!(username_base("é"), "partner");
        assert_eq!(username_base("jo"), "jo_partner");
    }

    #[test]
    fn test_suggest_username_counts_up() {
        let existing: HashSet<&str> = ["maison", "maison1"].into_iter().collect();
        assert_eq!(suggest_username("maison", |u| existing.contains(u)), "maison2");
        assert_eq!(suggest_username("atelier", |u| existing.contains(u)), "atelier");
    }
}
