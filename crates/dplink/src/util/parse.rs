//! Argument parsing utilities.
//!
//! Integers use base-0 rules: `0x`/`0X` selects hexadecimal, a leading `0`
//! followed by digits selects octal, anything else is decimal. A leading
//! sign is accepted; negative values only fit signed targets.

/// Error type for parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("number out of range: {0}")]
    OutOfRange(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse a u8 from string.
pub fn get_u8(s: &str) -> Result<u8> {
    parse_int(s)
}

/// Parse a u32 from string.
pub fn get_u32(s: &str) -> Result<u32> {
    parse_int(s)
}

/// Parse a u64 from string.
pub fn get_u64(s: &str) -> Result<u64> {
    parse_int(s)
}

/// Parse an i32 from string.
pub fn get_i32(s: &str) -> Result<i32> {
    parse_int(s)
}

/// Parse an i64 from string.
pub fn get_i64(s: &str) -> Result<i64> {
    parse_int(s)
}

/// Generic integer parsing with hex/octal support.
fn parse_int<T: TryFrom<i128>>(s: &str) -> Result<T> {
    let s = s.trim();

    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, body) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    // from_str_radix would accept a second sign here
    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return Err(ParseError::InvalidNumber(s.to_string()));
    }

    let magnitude = u64::from_str_radix(body, radix)
        .map_err(|_| ParseError::OutOfRange(s.to_string()))?;
    let value = if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    };

    T::try_from(value).map_err(|_| ParseError::OutOfRange(s.to_string()))
}
