//! URL slugs for events: 6-20 chars of `[a-z0-9-]` ending in a 3-digit suffix.

const MAX_BASE_LEN: usize = 16;
const MIN_BASE_LEN: usize = 6;
const MAX_SLUG_LEN: usize = 20;
const TIMESTAMP_DIGITS: usize = 6;
const STOP_CHARS: &str = "():!#,.?&@$%^*+=[]{};'\"|<>/\\";

/// Build a slug from `title` and a numeric `suffix` in `100..=999`.
pub fn slug_from_title(title: &str, suffix: u16) -> String {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .map(|c| if STOP_CHARS.contains(c) { ' ' } else { c })
        .collect();
    let mut base = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
    base = base.trim_matches('-').to_owned();

    if base.chars().count() > MAX_BASE_LEN {
        base = base.chars().take(MAX_BASE_LEN).collect();
        base = base.trim_end_matches('-').to_owned();
    }
    if base.chars().count() < MIN_BASE_LEN {
        base = format!("event-{base}").chars().take(MAX_BASE_LEN).collect();
        base = base.trim_end_matches('-').to_owned();
    }

    format!("{base}-{}", suffix.clamp(100, 999))
}

/// Fallback when every random suffix collided: the last six digits of a
/// timestamp, with the base shortened so the result still fits 20 chars.
pub fn slug_with_timestamp(slug: &str, millis: i64) -> String {
    let base: String = slug.chars().take(MAX_SLUG_LEN - TIMESTAMP_DIGITS - 1).collect();
    let digits = millis.rem_euclid(1_000_000);
    format!("{}-{digits:06}", base.trim_end_matches('-'))
}

pub fn is_valid_slug(slug: &str) -> bool {
    (MIN_BASE_LEN..=MAX_SLUG_LEN).contains(&slug.len())
        && slug.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic_title() {
        assert_eq!(slug_from_title("Career Kickoff", 123), "career-kickoff-123");
    }

    #[test]
    fn special_characters_become_separators() {
        assert_eq!(slug_from_title("Q&A: Pricing (Live!)", 456), "q-a-pricing-live-456");
    }

    #[test]
    fn long_titles_are_truncated() {
        let s = slug_from_title("Women in Product Management Summit", 789);
        assert_eq!(s, "women-in-product-789");
        assert!(is_valid_slug(&s));
    }

    #[test]
    fn short_titles_get_prefix() {
        assert_eq!(slug_from_title("AI", 100), "event-ai-100");
        assert_eq!(slug_from_title("!!!", 100), "event-100");
    }

    #[test]
    fn generated_slugs_validate() {
        for title in ["Career Kickoff", "Q&A: Pricing (Live!)", "AI", "A very long workshop title indeed"] {
            let s = slug_from_title(title, 555);
            assert!(is_valid_slug(&s), "{s}");
        }
    }

    #[test]
    fn validation_rules() {
        assert!(!is_valid_slug("abc"));
        assert!(!is_valid_slug("-leading-1"));
        assert!(!is_valid_slug("UPPER-case"));
        assert!(is_valid_slug("event-ai-100"));
    }

    #[test]
    fn timestamp_fallback_stays_valid() {
        let s = slug_with_timestamp("career-kickoff-123", 1_700_000_123_456);
        assert_eq!(s, "career-kickof-123456");
        assert!(is_valid_slug(&s));
        for title in ["Women in Product Management Summit", "AI", "Pay Equity Clinic"] {
            let s = slug_with_timestamp(&slug_from_title(title, 999), 42);
            assert!(is_valid_slug(&s), "{s}");
        }
        // A cut landing on a hyphen does not leave a double separator.
        assert_eq!(slug_with_timestamp("product-team-x-321", 7), "product-team-000007");
    }
}
