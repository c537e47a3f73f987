//! Input validators for the registration flow.

use std::sync::LazyLock;

use regex::Regex;

static MOBILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+91)?[6-9][0-9]{9}$").expect("mobile pattern"));

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

/// Optional `+91` prefix followed by ten ASCII digits starting with 6-9.
pub fn is_valid_mobile(input: &str) -> bool {
    MOBILE_PATTERN.is_match(input)
}

pub fn is_valid_email(input: &str) -> bool {
    EMAIL_PATTERN.is_match(input)
}
