use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

/// Loose shape check for a submitted email address.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
