//! Unsigned bit-field access on 64-bit words.
//!
//! Fields are addressed by `width` (number of bits) and `lsb` (position of
//! the least significant bit). Both the instruction decoder and the image
//! loader are built on these two primitives.

use thiserror::Error;

/// Widest word the codec operates on.
pub const WORD_BITS: u32 = 64;

/// Errors raised when a value cannot be stored in a field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitpackError {
    #[error("value {value:#x} does not fit in {width} unsigned bits")]
    Overflow { value: u64, width: u32 },
}

/// Returns true if `n` can be represented in `width` unsigned bits.
#[inline]
pub fn fits_u(n: u64, width: u32) -> bool {
    if width >= WORD_BITS {
        true
    } else {
        n >> width == 0
    }
}

#[inline]
fn mask(width: u32) -> u64 {
    if width >= WORD_BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Extract the unsigned field of `width` bits starting at `lsb`.
///
/// # Panics
/// Panics if the field extends past bit 63.
#[inline]
pub fn get_u(word: u64, width: u32, lsb: u32) -> u64 {
    assert!(width + lsb <= WORD_BITS, "field {}@{} exceeds word", width, lsb);
    if width == 0 {
        return 0;
    }
    (word >> lsb) & mask(width)
}

/// Return `word` with the field of `width` bits at `lsb` replaced by `value`.
///
/// # Panics
/// Panics if the field extends past bit 63.
pub fn new_u(word: u64, width: u32, lsb: u32, value: u64) -> Result<u64, BitpackError> {
    assert!(width + lsb <= WORD_BITS, "field {}@{} exceeds word", width, lsb);
    if !fits_u(value, width) {
        return Err(BitpackError::Overflow { value, width });
    }
    if width == 0 {
        return Ok(word);
    }
    let field = mask(width) << lsb;
    Ok((word & !field) | (value << lsb))
}

/// 32-bit convenience wrapper over [`get_u`].
#[inline]
pub fn get_u32(word: u32, width: u32, lsb: u32) -> u32 {
    assert!(width + lsb <= 32, "field {}@{} exceeds 32-bit word", width, lsb);
    get_u(word as u64, width, lsb) as u32
}

/// 32-bit convenience wrapper over [`new_u`].
pub fn new_u32(word: u32, width: u32, lsb: u32, value: u32) -> Result<u32, BitpackError> {
    assert!(width + lsb <= 32, "field {}@{} exceeds 32-bit word", width, lsb);
    new_u(word as u64, width, lsb, value as u64).map(|w| w as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_u() {
        assert!(fits_u(7, 3));
        assert!(!fits_u(8, 3));
        assert!(fits_u(0, 0));
        assert!(!fits_u(1, 0));
        assert!(fits_u(u64::MAX, 64));
    }

    #[test]
    fn test_get_u() {
        let word = 0xD200_0048u64;
        assert_eq!(get_u(word, 4, 28), 0xD);
        assert_eq!(get_u(word, 3, 25), 1);
        assert_eq!(get_u(word, 25, 0), 72);
        assert_eq!(get_u(u64::MAX, 64, 0), u64::MAX);
    }

    #[test]
    fn test_new_u_replaces_only_the_field() {
        let word = new_u(0xFFFF_FFFF, 8, 8, 0x12).unwrap();
        assert_eq!(word, 0xFFFF_12FF);
    }

    #[test]
    fn test_new_u_overflow() {
        assert_eq!(
            new_u(0, 3, 0, 8),
            Err(BitpackError::Overflow { value: 8, width: 3 })
        );
    }

    #[test]
    fn test_u32_wrappers() {
        let word = new_u32(0, 4, 28, 7).unwrap();
        assert_eq!(word, 0x7000_0000);
        assert_eq!(get_u32(word, 4, 28), 7);
    }
}
