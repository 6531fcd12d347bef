//! # Helpers
//!
//! Validation patterns, order numbers and a few formatting helpers.

use chrono::Utc;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

// =====================================
// Patterns
// =====================================
/// Shop SKU: letters, digits and dashes. Stored upper-cased.
pub static VALID_SKU: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]{2,31}$").expect("Invalid regex pattern"));

/// Upper-cases and trims a SKU before storage.
#[must_use]
pub fn normalize_sku(sku: &str) -> String {
    sku.trim().to_ascii_uppercase()
}

/// Trims optional free text; blank input becomes `None`.
///
/// ```rust
/// use bookstore::utils::clean_text;
///
/// assert_eq!(clean_text(Some("  hi ".into())), Some("hi".to_string()));
/// assert_eq!(clean_text(Some("   ".into())), None);
/// ```
#[must_use]
pub fn clean_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

// =====================================
// Order Numbers
// =====================================
const ORDER_PREFIX: &str = "BK";

/// Human-friendly order number: `BK-<base62 millis>-<4 random digits>`.
///
/// ```rust
/// let number = bookstore::utils::generate_order_number();
/// assert!(number.starts_with("BK-"));
/// ```
#[must_use]
pub fn generate_order_number() -> String {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("{}-{}-{:04}", ORDER_PREFIX, base62::encode(millis), suffix)
}

// =====================================
// Formatting
// =====================================
/// Renders minor units as a decimal amount, e.g. `1999` → `"19.99"`.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Hides most of the local part of an email for logs.
///
/// ```rust
/// use bookstore::utils::mask_email;
///
/// assert_eq!(mask_email("reader@example.com"), "re***@example.com");
/// ```
#[must_use]
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            format!("{}***@{}", visible, domain)
        }
        None => "***".to_string(),
    }
}

/// Escapes `%`, `_` and `\` so user text is matched literally by `LIKE ... ESCAPE '\'`.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku_validation() {
        let is_valid_sku = |sku: &str| VALID_SKU.is_match(sku);
        assert!(is_valid_sku("DUNE-001"));
        assert!(is_valid_sku("ABC"));
        assert!(!is_valid_sku("AB"));
        assert!(!is_valid_sku("-ABC"));
        assert!(is_valid_sku("abc-1"));
        assert!(!is_valid_sku("ab_c"));
        assert!(!is_valid_sku("AB C"));
        assert_eq!(normalize_sku("  dune-001 "), "DUNE-001");
    }

    #[test]
    fn test_order_number_shape() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "BK");
        assert!(base62::decode(parts[1]).is_ok());
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(1999), "19.99");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-250), "-2.50");
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("a@b.c"), "a***@b.c");
        assert_eq!(mask_email("nope"), "***");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("dune"), "%dune%");
    }
}
