//! Reversible base62 codec between record identifiers and short codes.
//!
//! Digits are emitted least-significant first, so the code for `62` is `"01"`
//! rather than the positional `"10"`. [`decode`] reads the code from the last
//! character to the first, which inverts that order exactly. Existing short
//! links depend on this layout; do not switch it to positional order.

use crate::error::CodecError;
use crate::shortcode::ShortCode;

/// Number of symbols in the alphabet.
pub const BASE: i64 = 62;

/// Digits, then uppercase, then lowercase. A symbol's index is its value.
pub static ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// The code produced for identifier `0`, which the digit loop alone would
/// leave empty.
pub const ZERO_CODE: &str = "0";

const INVALID: u8 = u8::MAX;

/// Reverse lookup from an ASCII byte to its symbol value, `INVALID` otherwise.
static VALUES: [u8; 256] = build_values();

const fn build_values() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Encodes a non-negative identifier as a short code.
///
/// Returns [`CodecError::InvalidArgument`] for negative identifiers.
pub fn encode(id: i64) -> Result<ShortCode, CodecError> {
    encode_str(id).map(ShortCode::from_encoded)
}

pub(crate) fn encode_str(id: i64) -> Result<String, CodecError> {
    if id < 0 {
        return Err(CodecError::InvalidArgument(id));
    }
    if id == 0 {
        return Ok(ZERO_CODE.to_owned());
    }

    // i64::MAX needs 11 symbols in base62.
    let mut code = String::with_capacity(11);
    let mut rest = id;
    while rest > 0 {
        code.push(ALPHABET[(rest % BASE) as usize] as char);
        rest /= BASE;
    }
    Ok(code)
}

/// Decodes a short code back to the identifier it was produced from.
///
/// Fails with [`CodecError::InvalidCode`] when the code is empty, contains a
/// symbol outside `[0-9A-Za-z]`, or encodes a value larger than `i64::MAX`.
pub fn decode(code: &str) -> Result<i64, CodecError> {
    if code.is_empty() {
        return Err(CodecError::InvalidCode("code is empty".to_string()));
    }

    let mut id: i64 = 0;
    for byte in code.bytes().rev() {
        let value = VALUES[byte as usize];
        if value == INVALID {
            return Err(CodecError::InvalidCode(format!(
                "symbol {:?} is not in the base62 alphabet: '{}'",
                byte as char, code
            )));
        }
        id = id
            .checked_mul(BASE)
            .and_then(|acc| acc.checked_add(i64::from(value)))
            .ok_or_else(|| CodecError::InvalidCode(format!("value out of range: '{}'", code)))?;
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_is_ordered_and_unique() {
        assert_eq!(ALPHABET.len(), 62);
        let unique: std::collections::HashSet<_> = ALPHABET.iter().collect();
        assert_eq!(unique.len(), 62);
        assert_eq!(ALPHABET[0], b'0');
        assert_eq!(ALPHABET[10], b'A');
        assert_eq!(ALPHABET[36], b'a');
    }

    #[test]
    fn zero_has_a_defined_code() {
        assert_eq!(encode_str(0).unwrap(), "0");
        assert_eq!(decode("0").unwrap(), 0);
    }

    #[test]
    fn single_symbol_codes() {
        assert_eq!(encode_str(1).unwrap(), "1");
        assert_eq!(encode_str(10).unwrap(), "A");
        assert_eq!(encode_str(61).unwrap(), "z");
    }

    #[test]
    fn digits_are_least_significant_first() {
        // 62 = 1*62 + 0, written low digit first.
        assert_eq!(encode_str(62).unwrap(), "01");
        assert_eq!(encode_str(63).unwrap(), "11");
        // 125 = 2*62 + 1
        assert_eq!(encode_str(125).unwrap(), "12");
        assert_eq!(decode("12").unwrap(), 125);
        // 3843 = 61*62 + 61
        assert_eq!(encode_str(3843).unwrap(), "zz");
        assert_eq!(encode_str(3844).unwrap(), "001");
    }

    #[test]
    fn trailing_zero_symbols_are_significant() {
        assert_eq!(decode("1").unwrap(), 1);
        assert_eq!(decode("10").unwrap(), 1);
        assert_eq!(decode("01").unwrap(), 62);
    }

    #[test]
    fn negative_id_is_rejected() {
        assert!(matches!(encode(-1), Err(CodecError::InvalidArgument(-1))));
        assert!(matches!(
            encode(i64::MIN),
            Err(CodecError::InvalidArgument(i64::MIN))
        ));
    }

    #[test]
    fn round_trips_across_the_range() {
        let mut samples = vec![0, 1, 61, 62, 3843, 3844, 1 << 31, 1 << 53, i64::MAX];
        let mut x: i64 = 1;
        while x < (1 << 53) {
            samples.push(x);
            samples.push(x - 1);
            x = x.saturating_mul(7);
        }

        for id in samples {
            let code = encode(id).unwrap();
            assert_eq!(decode(code.as_str()).unwrap(), id, "code {}", code);
        }
    }

    #[test]
    fn max_id_fits_in_eleven_symbols() {
        assert_eq!(encode_str(i64::MAX).unwrap().len(), 11);
    }

    #[test]
    fn empty_code_is_rejected() {
        assert!(matches!(decode(""), Err(CodecError::InvalidCode(_))));
    }

    #[test]
    fn foreign_symbols_are_rejected() {
        for code in ["abc-def", "a_b", "a b", "abc/", "é", "+", "=="] {
            assert!(
                matches!(decode(code), Err(CodecError::InvalidCode(_))),
                "{code} should be rejected"
            );
        }
    }

    #[test]
    fn overflowing_code_is_rejected() {
        let max = encode_str(i64::MAX).unwrap();
        assert_eq!(decode(&max).unwrap(), i64::MAX);
        assert!(matches!(
            decode("zzzzzzzzzzzz"),
            Err(CodecError::InvalidCode(_))
        ));
    }
}
