//! Byte classification helpers used by the lexer.

pub const LINE_FEED: u8 = b'\n';
pub const CARRIAGE_RETURN: u8 = b'\r';
pub const BACKSLASH: u8 = b'\\';
pub const OPEN_BRACKET: u8 = b'[';
pub const CLOSE_BRACKET: u8 = b']';
pub const EQUALS: u8 = b'=';
pub const UNDERSCORE: u8 = b'_';

/// Check if a byte is a line terminator.
#[inline]
pub fn is_line_break(ch: u8) -> bool {
    ch == LINE_FEED || ch == CARRIAGE_RETURN
}

/// Check if a byte is whitespace that does not end a line.
#[inline]
pub fn is_white_space_single_line(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | 0x0B | 0x0C)
}

/// Check if a byte is a decimal digit.
#[inline]
pub fn is_digit(ch: u8) -> bool {
    ch.is_ascii_digit()
}

/// Check if a byte is a hex digit.
#[inline]
pub fn is_hex_digit(ch: u8) -> bool {
    ch.is_ascii_hexdigit()
}

/// Check if a byte can start an identifier.
#[inline]
pub fn is_identifier_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == UNDERSCORE
}

/// Check if a byte can continue an identifier.
#[inline]
pub fn is_identifier_part(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == UNDERSCORE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_bytes() {
        assert!(is_identifier_start(b'_'));
        assert!(is_identifier_start(b'z'));
        assert!(!is_identifier_start(b'9'));
        assert!(is_identifier_part(b'9'));
        assert!(!is_identifier_part(b'-'));
    }

    #[test]
    fn test_whitespace_excludes_line_breaks() {
        assert!(is_white_space_single_line(b'\t'));
        assert!(!is_white_space_single_line(b'\n'));
        assert!(is_line_break(b'\r'));
    }
}
