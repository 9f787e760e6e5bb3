//! CNJ unified process numbers (`NNNNNNN-DD.AAAA.J.TR.OOOO`).

const CNJ_DIGITS: usize = 20;

/// Keeps only the ASCII digits.
pub fn normalize(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Formats a 20-digit number with the CNJ mask. Other lengths come back unchanged.
pub fn format(value: &str) -> String {
    let digits = normalize(value);
    if digits.len() != CNJ_DIGITS {
        return value.to_string();
    }
    format!(
        "{}-{}.{}.{}.{}.{}",
        &digits[0..7],
        &digits[7..9],
        &digits[9..13],
        &digits[13..14],
        &digits[14..16],
        &digits[16..20],
    )
}

/// A valid number has 20 digits and a justice segment between 1 and 9.
pub fn is_valid(value: &str) -> bool {
    let digits = normalize(value);
    digits.len() == CNJ_DIGITS && matches!(digits.as_bytes()[13], b'1'..=b'9')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_mask() {
        assert_eq!(normalize("0001234-56.2024.8.19.0001"), "00012345620248190001");
    }

    #[test]
    fn format_applies_mask_to_twenty_digits() {
        assert_eq!(format("00012345620248190001"), "0001234-56.2024.8.19.0001");
        assert_eq!(format("12345"), "12345");
    }

    #[test]
    fn validity_checks_length_and_segment() {
        assert!(is_valid("0001234-56.2024.8.19.0001"));
        assert!(!is_valid("0001234-56.2024.0.19.0001"));
        assert!(!is_valid("123"));
    }
}
