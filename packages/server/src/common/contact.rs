//! Contact normalization and format checks (e-mail, phone).
//!
//! Lookups everywhere go through the normalized form, so callers must run
//! user input through `normalize_email` before touching a store.

use lazy_static::lazy_static;
use regex::Regex;

/// RFC 5321 path limit.
const MAX_EMAIL_LEN: usize = 254;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles");
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[1-9]\d{7,14}$").expect("phone pattern compiles");
}

/// Trim and lower-case an e-mail address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Pragmatic `local@domain.tld` check on an already normalized address.
pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && email.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(email)
}

/// Trim and drop the separators people type into phone fields.
pub fn normalize_phone(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect()
}

/// E.164-ish: optional `+`, no leading zero, 8 to 15 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}
