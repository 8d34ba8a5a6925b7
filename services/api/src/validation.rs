//! Input validation utilities
//!
//! Field constraints are declared once here and enforced at the request
//! boundary before anything reaches the repositories.

use regex::Regex;
use std::sync::OnceLock;

use crate::config::ScoreRange;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate display pseudo
pub fn validate_pseudo(pseudo: &str) -> Result<(), String> {
    let len = pseudo.chars().count();

    if len < 2 {
        return Err("Pseudo must be at least 2 characters long".to_string());
    }

    if len > 50 {
        return Err("Pseudo must be at most 50 characters long".to_string());
    }

    Ok(())
}

/// Validate review comment
pub fn validate_comment(comment: &str) -> Result<(), String> {
    if comment.trim().is_empty() {
        return Err("Comment is required".to_string());
    }

    if comment.len() > 5000 {
        return Err("Comment must be at most 5000 characters long".to_string());
    }

    Ok(())
}

/// Validate review score against the configured range
pub fn validate_score(score: f64, range: &ScoreRange) -> Result<(), String> {
    if !score.is_finite() {
        return Err("Score must be a finite number".to_string());
    }

    if !range.contains(score) {
        return Err(format!(
            "Score must be between {} and {}",
            range.min, range.max
        ));
    }

    Ok(())
}

/// Validate job role label
pub fn validate_role(role: &str) -> Result<(), String> {
    if role.chars().count() > 80 {
        return Err("Role must be at most 80 characters long".to_string());
    }

    Ok(())
}

/// Validate contract type label
pub fn validate_contract(contract: &str) -> Result<(), String> {
    if contract.chars().count() > 40 {
        return Err("Contract must be at most 40 characters long".to_string());
    }

    Ok(())
}

/// Validate establishment name
pub fn validate_establishment_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }

    if name.len() > 255 {
        return Err("Name must be at most 255 characters long".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_accepts_plain_addresses() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last+tag@sub.domain.fr").is_ok());
    }

    #[test]
    fn test_validate_email_rejects_malformed() {
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email(&format!("{}@x.com", "a".repeat(255))).is_err());
    }

    #[test]
    fn test_validate_pseudo_length_bounds() {
        assert!(validate_pseudo("ab").is_ok());
        assert!(validate_pseudo("a").is_err());
        assert!(validate_pseudo(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_comment() {
        assert!(validate_comment("great kitchen, awful hours").is_ok());
        assert!(validate_comment("   ").is_err());
        assert!(validate_comment(&"x".repeat(5001)).is_err());
    }

    #[test]
    fn test_validate_score_respects_configured_range() {
        let range = ScoreRange { min: 0.0, max: 10.0 };
        assert!(validate_score(10.0, &range).is_ok());
        assert!(validate_score(10.5, &range).is_err());
        assert!(validate_score(-1.0, &range).is_err());
        assert!(validate_score(f64::NAN, &range).is_err());
    }

    #[test]
    fn test_validate_role_and_contract_caps() {
        assert!(validate_role("commis de cuisine").is_ok());
        assert!(validate_role(&"r".repeat(81)).is_err());
        assert!(validate_contract("saisonnier").is_ok());
        assert!(validate_contract(&"c".repeat(41)).is_err());
    }
}
