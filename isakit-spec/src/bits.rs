//! # Width-aware bit operations
//!
//! Values travel through the toolkit as `i64` (signed) or `u64` (raw bit
//! patterns). Every helper here takes an explicit width in bits, between 1
//! and 64, so that ISAs with odd word sizes behave like real hardware.

/// All-ones mask covering the low `width` bits
#[inline]
pub const fn mask(width: u32) -> u64 {
    if width == 0 {
        0
    } else if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Number of whole bytes needed to hold `bits` bits
#[inline]
pub const fn byte_width(bits: u32) -> u32 {
    (bits + 7) / 8
}

/// Render the low `width` bits of `value` as a zero-padded binary string.
pub fn to_binary_string(value: u64, width: u32) -> String {
    format!("{:0w$b}", value & mask(width), w = width as usize)
}

/// Parse a string of `0`/`1` digits. The empty string parses as zero.
pub fn from_binary_string(text: &str) -> Option<u64> {
    if text.is_empty() {
        return Some(0);
    }
    u64::from_str_radix(text, 2).ok()
}

/// Render `value` as `0x`-prefixed uppercase hex with `ceil(width / 4)` digits.
///
/// With `signed` set, negative values are written as `-0x` followed by their
/// magnitude; otherwise the two's-complement bit pattern is shown.
pub fn to_hex_string(value: i64, width: u32, signed: bool) -> String {
    let digits = ((width + 3) / 4).max(1) as usize;
    if signed && value < 0 {
        format!("-0x{:0d$X}", value.unsigned_abs(), d = digits)
    } else {
        format!("0x{:0d$X}", value as u64 & mask(width), d = digits)
    }
}

/// Parse a numeric literal: `0x`-prefixed values are hexadecimal, anything
/// else must be decimal digits. A leading `-` negates either form.
pub fn parse_literal(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let magnitude = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex) => {
            if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return None;
            }
            u64::from_str_radix(hex, 16).ok()?
        }
        None => {
            if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            body.parse::<u64>().ok()?
        }
    };

    let value = magnitude as i64;
    Some(if negative { value.wrapping_neg() } else { value })
}

/// Extract bits `hi..=lo` of `value`, shifted down to bit 0.
#[inline]
pub fn extract_bits(value: u64, hi: u32, lo: u32) -> u64 {
    debug_assert!(hi >= lo && hi < 64);
    (value >> lo) & mask(hi - lo + 1)
}

/// Replace bits `hi..=lo` of `value` with the low bits of `field`.
#[inline]
pub fn insert_bits(value: u64, hi: u32, lo: u32, field: u64) -> u64 {
    debug_assert!(hi >= lo && hi < 64);
    let m = mask(hi - lo + 1) << lo;
    (value & !m) | ((field << lo) & m)
}

/// Sign-extend `value`, treating `from_bit` as its sign bit.
#[inline]
pub fn sign_extend(value: i64, from_bit: u32) -> i64 {
    if from_bit >= 63 {
        return value;
    }
    let shift = 63 - from_bit;
    (value << shift) >> shift
}

/// Keep only the low `width` bits, as a non-negative value.
#[inline]
pub fn zero_extend(value: i64, width: u32) -> i64 {
    (value as u64 & mask(width)) as i64
}

/// Truncate to `width` bits and sign-extend back to 64.
///
/// This is the canonical form of every register value.
#[inline]
pub fn restrict_to_width(value: i64, width: u32) -> i64 {
    match width {
        0 => 0,
        w if w >= 64 => value,
        w => sign_extend(zero_extend(value, w), w - 1),
    }
}

/// Left shift, keeping the result in canonical `width`-bit form. Shifts of
/// 64 or more clear the value.
pub fn shift_left(value: i64, amount: u32, width: u32) -> i64 {
    if amount >= 64 {
        return 0;
    }
    restrict_to_width(value.wrapping_shl(amount), width)
}

/// Logical right shift of the `width`-bit pattern of `value`.
pub fn shift_right_logical(value: i64, amount: u32, width: u32) -> i64 {
    if amount >= 64 {
        return 0;
    }
    let bits = value as u64 & mask(width);
    restrict_to_width((bits >> amount) as i64, width)
}

/// Arithmetic right shift of `value` read as a signed `width`-bit number.
///
/// ```
/// use isakit_spec::bits::shift_right_arithmetic;
///
/// assert_eq!(shift_right_arithmetic(0xF0, 2, 8), -4);
/// assert_eq!(shift_right_arithmetic(-1, 100, 32), -1);
/// ```
pub fn shift_right_arithmetic(value: i64, amount: u32, width: u32) -> i64 {
    let value = restrict_to_width(value, width);
    if amount >= 64 {
        return if value < 0 { -1 } else { 0 };
    }
    value >> amount
}

/// Reverse the order of the low `bytes` bytes of `value`.
pub fn swap_bytes(value: u64, bytes: u32) -> u64 {
    (0..bytes.min(8)).fold(0u64, |acc, i| (acc << 8) | ((value >> (8 * i)) & 0xFF))
}
