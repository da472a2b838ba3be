//! Endian primitives: fixed-width scalar byte swapping and the platform
//! endianness probe.
//!
//! Stream data is stored either big- or little-endian; the host order is
//! known at compile time. Decoding boils down to a single rule: swap the
//! bytes iff the host endianness differs from the requested one. Encoding
//! is the same swap, so the transformation is its own inverse.

use std::fmt;

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(target_endian = "big")] {
        /// Whether the host we were compiled for stores integers big-endian.
        pub const HOST_BIG_ENDIAN: bool = true;
    } else {
        /// Whether the host we were compiled for stores integers big-endian.
        pub const HOST_BIG_ENDIAN: bool = false;
    }
}

/// Per-operation endian override for reads and writes.
///
/// `Current` honours the reader's/writer's endian flag; `Big` and `Little`
/// force the byte order for this operation only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndianSelect {
    Current,
    Big,
    Little,
}

impl EndianSelect {
    /// Resolve the selection against the stream's current endian flag.
    #[inline]
    pub fn is_big(self, current_big: bool) -> bool {
        match self {
            EndianSelect::Current => current_big,
            EndianSelect::Big => true,
            EndianSelect::Little => false,
        }
    }
}

/// A fixed-width scalar that can cross the stream boundary.
///
/// Implemented for the unsigned and signed integers up to 64 bits and for
/// `f32`/`f64` (floats swap through their bit pattern).
pub trait Scalar: Copy + Default + PartialEq + fmt::Debug {
    /// Number of bytes this scalar occupies in the stream.
    const WIDTH: u32;
    /// Floating point scalars are exempt from the writer's match check.
    const IS_FLOAT: bool = false;

    /// The value with its bytes reversed.
    fn swapped(self) -> Self;
    /// Reinterpret the first `WIDTH` bytes of `buf` in host order.
    fn get_ne(buf: &[u8]) -> Self;
    /// Store into the first `WIDTH` bytes of `buf` in host order.
    fn put_ne(self, buf: &mut [u8]);
    /// Truncate a 32-bit word into this scalar. Used for link sentinels;
    /// floats take the word as their bit pattern.
    fn from_word(word: u32) -> Self;

    /// Swap iff the host byte order differs from the requested one.
    ///
    /// The transformation is symmetric: it both decodes stream data into
    /// host values and encodes host values for the stream.
    #[inline]
    fn to_endian(self, big: bool) -> Self {
        if big != HOST_BIG_ENDIAN {
            self.swapped()
        } else {
            self
        }
    }

    /// Decode `WIDTH` bytes of `buf` stored in the given byte order.
    #[inline]
    fn get(buf: &[u8], big: bool) -> Self {
        Self::get_ne(buf).to_endian(big)
    }

    /// Encode into the first `WIDTH` bytes of `buf` in the given byte order.
    #[inline]
    fn put(self, buf: &mut [u8], big: bool) {
        self.to_endian(big).put_ne(buf)
    }
}

macro_rules! impl_scalar_int {
    ($t:ty, $w:expr) => {
        impl Scalar for $t {
            const WIDTH: u32 = $w;

            #[inline]
            fn swapped(self) -> Self {
                self.swap_bytes()
            }
            #[inline]
            fn get_ne(buf: &[u8]) -> Self {
                let mut raw = [0u8; $w];
                raw.copy_from_slice(&buf[..$w]);
                <$t>::from_ne_bytes(raw)
            }
            #[inline]
            fn put_ne(self, buf: &mut [u8]) {
                buf[..$w].copy_from_slice(&self.to_ne_bytes());
            }
            #[inline]
            fn from_word(word: u32) -> Self {
                word as $t
            }
        }
    };
}

impl_scalar_int!(u8, 1);
impl_scalar_int!(i8, 1);
impl_scalar_int!(u16, 2);
impl_scalar_int!(i16, 2);
impl_scalar_int!(u32, 4);
impl_scalar_int!(i32, 4);
impl_scalar_int!(u64, 8);
impl_scalar_int!(i64, 8);

impl Scalar for f32 {
    const WIDTH: u32 = 4;
    const IS_FLOAT: bool = true;

    #[inline]
    fn swapped(self) -> Self {
        f32::from_bits(self.to_bits().swap_bytes())
    }
    #[inline]
    fn get_ne(buf: &[u8]) -> Self {
        f32::from_bits(u32::get_ne(buf))
    }
    #[inline]
    fn put_ne(self, buf: &mut [u8]) {
        self.to_bits().put_ne(buf)
    }
    #[inline]
    fn from_word(word: u32) -> Self {
        f32::from_bits(word)
    }
}

impl Scalar for f64 {
    const WIDTH: u32 = 8;
    const IS_FLOAT: bool = true;

    #[inline]
    fn swapped(self) -> Self {
        f64::from_bits(self.to_bits().swap_bytes())
    }
    #[inline]
    fn get_ne(buf: &[u8]) -> Self {
        f64::from_bits(u64::get_ne(buf))
    }
    #[inline]
    fn put_ne(self, buf: &mut [u8]) {
        self.to_bits().put_ne(buf)
    }
    #[inline]
    fn from_word(word: u32) -> Self {
        f64::from_bits(word as u64)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck::quickcheck;

    #[test]
    fn big_endian_get() {
        let buf = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(u32::get(&buf, true), 0x12345678);
        assert_eq!(u16::get(&buf, true), 0x1234);
        assert_eq!(u8::get(&buf, true), 0x12);
    }

    #[test]
    fn little_endian_get() {
        let buf = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(u32::get(&buf, false), 0x78563412);
        assert_eq!(u16::get(&buf, false), 0x3412);
    }

    #[test]
    fn put_then_get() {
        let mut buf = [0u8; 8];
        0x0123456789abcdefu64.put(&mut buf, true);
        assert_eq!(buf, [0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
        assert_eq!(u64::get(&buf, true), 0x0123456789abcdef);
    }

    #[test]
    fn signed_get() {
        let buf = [0xff, 0xfe];
        assert_eq!(i16::get(&buf, true), -2);
        assert_eq!(i8::get(&buf, true), -1);
    }

    #[test]
    fn float_swap_is_bitwise() {
        let x = 1.5f32;
        assert_eq!(x.swapped().swapped(), x);
        let mut buf = [0u8; 4];
        x.put(&mut buf, true);
        assert_eq!(buf, 1.5f32.to_bits().to_be_bytes());
    }

    #[test]
    fn select_resolution() {
        assert!(EndianSelect::Current.is_big(true));
        assert!(!EndianSelect::Current.is_big(false));
        assert!(EndianSelect::Big.is_big(false));
        assert!(!EndianSelect::Little.is_big(true));
    }

    quickcheck! {
        fn prop_swap_involution(x: u32) -> bool {
            x.swapped().swapped() == x
        }

        fn prop_roundtrip_u32(x: u32, big: bool) -> bool {
            let mut buf = [0u8; 4];
            x.put(&mut buf, big);
            u32::get(&buf, big) == x
        }

        fn prop_roundtrip_i64(x: i64, big: bool) -> bool {
            let mut buf = [0u8; 8];
            x.put(&mut buf, big);
            i64::get(&buf, big) == x
        }
    }
}
