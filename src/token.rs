//! Idempotency tokens for HIT creation.
//!
//! Re-submitting the same logical creation request (same HIT type, layout,
//! annotation and input line) yields the same token, which the Task Service
//! uses to refuse the duplicate.

use sha2::{Digest, Sha256};

/// Derives the `UniqueRequestToken` for one HIT creation.
///
/// The four inputs are hashed as raw bytes, in this order, without
/// separators. A missing annotation contributes nothing. The result is 64
/// lowercase hex characters, which is also the longest token the Task
/// Service accepts.
///
/// # Examples
///
/// ```
/// use mturkish::token::unique_request_token;
///
/// let a = unique_request_token("TYPE", "LAYOUT", None, r#"{"x": 1}"#);
/// let b = unique_request_token("TYPE", "LAYOUT", Some(""), r#"{"x": 1}"#);
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn unique_request_token(
    hit_type_id: &str,
    hit_layout_id: &str,
    annotation: Option<&str>,
    raw_line: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(hit_type_id.as_bytes());
    hasher.update(hit_layout_id.as_bytes());
    hasher.update(annotation.unwrap_or_default().as_bytes());
    hasher.update(raw_line.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_deterministic() {
        let first = unique_request_token("T", "L", Some("ann"), r#"{"a":1}"#);
        let second = unique_request_token("T", "L", Some("ann"), r#"{"a":1}"#);
        assert_eq!(first, second);
    }

    #[test]
    fn test_token_is_plain_concatenation() {
        // Same concatenated bytes, different split between fields.
        let a = unique_request_token("TL", "", None, "x");
        let b = unique_request_token("T", "L", None, "x");
        assert_eq!(a, b);
    }

    #[test]
    fn test_token_changes_with_each_input() {
        let base = unique_request_token("T", "L", Some("ann"), "{}");
        assert_ne!(base, unique_request_token("T2", "L", Some("ann"), "{}"));
        assert_ne!(base, unique_request_token("T", "L2", Some("ann"), "{}"));
        assert_ne!(base, unique_request_token("T", "L", Some("other"), "{}"));
        assert_ne!(base, unique_request_token("T", "L", Some("ann"), "[]"));
    }

    #[test]
    fn test_token_is_lowercase_hex() {
        let token = unique_request_token("T", "L", None, "{}");
        assert_eq!(token.len(), 64);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
