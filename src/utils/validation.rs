// src/utils/validation.rs
use regex::Regex;

use crate::models::MAX_NICHE_LEN;

lazy_static::lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Case-folds and trims an address before it is written anywhere.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic `local@domain` shape check used by the hero capture box.
pub fn is_plausible_email(email: &str) -> bool {
    validator::validate_email(email.trim())
}

/// Squashes newlines and runs of spaces so user text stays on one prompt line.
pub fn collapse_whitespace(input: &str) -> String {
    WHITESPACE_RUN.replace_all(input.trim(), " ").into_owned()
}

/// Validates the copywriter's niche input
pub fn validate_niche(niche: &str) -> Result<String, &'static str> {
    let niche = collapse_whitespace(niche);
    if niche.is_empty() {
        return Err("Niche is required");
    }
    if niche.chars().count() > MAX_NICHE_LEN {
        return Err("Niche too long (maximum 120 characters)");
    }
    Ok(niche)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
        assert_eq!(normalize_email("a@b.com"), "a@b.com");
    }

    #[test]
    fn test_plausible_email() {
        assert!(is_plausible_email("a@b.com"));
        assert!(is_plausible_email(" name@work-email.com "));
        assert!(!is_plausible_email("not-an-email"));
        assert!(!is_plausible_email(""));
    }

    #[test]
    fn test_niche_validation() {
        assert_eq!(validate_niche("  Fintech\n apps "), Ok("Fintech apps".to_string()));
        assert!(validate_niche("   ").is_err());
        assert!(validate_niche(&"x".repeat(MAX_NICHE_LEN + 1)).is_err());
    }
}
