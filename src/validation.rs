use std::sync::LazyLock;

use regex::Regex;

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]+$").expect("email pattern compiles")
});

/// Trim surrounding whitespace and lowercase.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Syntactic `local@domain.tld` check. Deliverability is not checked.
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_SHAPE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co.uk"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in ["", "plain", "a@b", "@b.com", "a@@b.com", "a b@c.com", "a@b.com."] {
            assert!(!is_valid_email(email), "{email:?} should be rejected");
        }
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_email("  Person@Example.COM \n"), "person@example.com");
    }
}
