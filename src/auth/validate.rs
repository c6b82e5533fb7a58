use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::error::AuthError;

/// A field check; `Err` carries the message shown to the client.
pub type Validator = fn(&str) -> Result<(), &'static str>;

/// Ordered `(field, validator)` pairs. The first failure wins.
pub type Rules = &'static [(&'static str, Validator)];

pub const MIN_PASSWORD_LEN: usize = 8;

pub const LOGIN_RULES: Rules = &[("email", email), ("password", password_present)];

pub const REGISTER_RULES: Rules = &[("email", email), ("password", password_strength)];

pub const PASSWORD_CHANGE_RULES: Rules = &[
    ("email", email),
    ("password", password_present),
    ("new_password", password_strength),
];

pub const REFRESH_RULES: Rules = &[("token", token_present), ("refreshToken", token_present)];

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn email(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() || !is_valid_email(value.trim()) {
        return Err("Not valid email");
    }
    Ok(())
}

fn password_present(value: &str) -> Result<(), &'static str> {
    if value.is_empty() {
        return Err("Password field empty");
    }
    Ok(())
}

fn password_strength(value: &str) -> Result<(), &'static str> {
    password_present(value)?;
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password too short");
    }
    Ok(())
}

fn token_present(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("Token data empty");
    }
    Ok(())
}

/// Runs `rules` against `fields`. A rule whose field is absent is checked against "".
pub fn validate(rules: Rules, fields: &[(&str, &str)]) -> Result<(), AuthError> {
    for (name, check) in rules {
        let value = fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, v)| *v)
            .unwrap_or("");
        check(value).map_err(AuthError::InputInvalid)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(rules: Rules, fields: &[(&str, &str)]) -> Option<&'static str> {
        match validate(rules, fields) {
            Ok(()) => None,
            Err(AuthError::InputInvalid(msg)) => Some(msg),
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn email_syntax() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn login_checks_email_before_password() {
        assert_eq!(
            reason(LOGIN_RULES, &[("email", "nope"), ("password", "")]),
            Some("Not valid email")
        );
        assert_eq!(
            reason(LOGIN_RULES, &[("email", "a@x.com"), ("password", "")]),
            Some("Password field empty")
        );
        assert_eq!(
            reason(LOGIN_RULES, &[("email", "a@x.com"), ("password", "x")]),
            None
        );
    }

    #[test]
    fn missing_field_counts_as_empty() {
        assert_eq!(reason(LOGIN_RULES, &[("password", "x")]), Some("Not valid email"));
    }

    #[test]
    fn register_enforces_min_length() {
        assert_eq!(
            reason(REGISTER_RULES, &[("email", "a@x.com"), ("password", "short")]),
            Some("Password too short")
        );
        assert_eq!(
            reason(REGISTER_RULES, &[("email", "a@x.com"), ("password", "long-enough")]),
            None
        );
    }

    #[test]
    fn refresh_requires_both_tokens() {
        assert_eq!(
            reason(REFRESH_RULES, &[("token", "abc"), ("refreshToken", " ")]),
            Some("Token data empty")
        );
        assert_eq!(
            reason(REFRESH_RULES, &[("token", "abc"), ("refreshToken", "def")]),
            None
        );
    }
}
