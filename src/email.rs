use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

lazy_static! {
    // Non-empty local part, at least one domain character before a dot and
    // a top-level label of 2+ characters. No whitespace or extra `@` anywhere.
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@][^\s@]*\.[^\s@]{2,}$").expect("email pattern compiles");
}

pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Checks an already normalized address.
pub fn is_valid(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

// Short stable tag for logs so addresses never land in them verbatim
pub fn fingerprint(email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(12);
    hex
}
