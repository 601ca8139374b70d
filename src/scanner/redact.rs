//! Redactor
//!
//! Produces safe-to-display context strings and masked values. Masking is
//! edge-preserving: enough of the secret stays visible for a reviewer to
//! recognise its shape, never more than four characters per edge.

/// Maximum characters kept visible at each edge of a masked secret
const MAX_VISIBLE_EDGE: usize = 4;

/// Mask a secret, keeping `min(4, len/4)` characters at each edge.
///
/// Secrets too short for two visible edges are masked entirely. The
/// result always has the same character count as the input.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let len = chars.len();
    let visible = MAX_VISIBLE_EDGE.min(len / 4);
    if visible == 0 {
        return "*".repeat(len);
    }
    let head: String = chars[..visible].iter().collect();
    let tail: String = chars[len - visible..].iter().collect();
    format!("{}{}{}", head, "*".repeat(len - 2 * visible), tail)
}

/// Build the context string for a finding.
///
/// With redaction on, the full line is kept except the secret span, which
/// is replaced by its mask; with redaction off the raw line is returned.
pub fn redact_context(line: &str, start: usize, end: usize, redact: bool) -> String {
    if !redact || start >= end || end > line.len() {
        return line.to_string();
    }
    let mut context = line.to_string();
    let masked = mask_secret(&line[start..end]);
    context.replace_range(start..end, &masked);
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_preserves_length_and_edges() {
        let secret = "ABCDEFGHIJKLMNOPQRST"; // 20 chars -> 4 visible each edge
        let masked = mask_secret(secret);
        assert_eq!(masked, "ABCD************QRST");
        assert_eq!(masked.len(), secret.len());
    }

    #[test]
    fn test_mask_never_reveals_more_than_four_per_edge() {
        for len in 1..=64 {
            let secret: String = ('a'..='z').cycle().take(len).collect();
            let masked = mask_secret(&secret);
            let visible_front = masked.chars().take_while(|c| *c != '*').count();
            let visible_back = masked.chars().rev().take_while(|c| *c != '*').count();
            if masked.contains('*') {
                assert!(visible_front <= 4, "len {}: front {}", len, visible_front);
                assert!(visible_back <= 4, "len {}: back {}", len, visible_back);
            } else {
                // Fully-visible output only ever happens for empty input
                assert!(secret.is_empty());
            }
        }
    }

    #[test]
    fn test_short_secret_masked_entirely() {
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret("a"), "*");
    }

    #[test]
    fn test_mid_length_secret_keeps_one_char_edges() {
        // len 4..7 -> visible = 1
        assert_eq!(mask_secret("abcd"), "a**d");
        assert_eq!(mask_secret("abcdefg"), "a*****g");
    }

    #[test]
    fn test_redacted_context_keeps_surrounding_line() {
        let line = r#"api_key: "ABCDEFGHIJKLMNOPQRST""#;
        let start = line.find('A').unwrap();
        let end = start + 20;
        let context = redact_context(line, start, end, true);
        assert_eq!(context, r#"api_key: "ABCD************QRST""#);
    }

    #[test]
    fn test_unredacted_context_is_raw_line() {
        let line = "password = hunter2hunter2";
        assert_eq!(redact_context(line, 11, 25, false), line);
    }

    #[test]
    fn test_out_of_bounds_span_returns_line() {
        let line = "short";
        assert_eq!(redact_context(line, 2, 99, true), line);
    }

    #[test]
    fn test_multibyte_secret_masks_by_chars() {
        let secret = "p\u{00e4}ssw\u{00f6}rd!"; // 9 chars -> visible 2
        let masked = mask_secret(secret);
        assert_eq!(masked.chars().count(), 9);
        assert!(masked.starts_with("p\u{00e4}"));
        assert!(masked.ends_with("d!"));
    }
}
