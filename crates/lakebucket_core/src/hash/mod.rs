//! Canonical hashing of values for bucket partitioning.
//!
//! Every hash is MurmurHash3 (x86, 32-bit, seed 0) over a canonical byte
//! encoding of the value. Hashes decide which partition a value is written
//! to, so the encodings here are a persisted contract.
pub mod struct_hash;

use bytes::Buf;
use lakebucket_error::{BucketError, Result};
use uuid::Uuid;

use crate::types::decimal::DecimalScalar;
use crate::types::scalar::ScalarValue;

pub use struct_hash::hash_struct;

/// Version of the hashing scheme implemented in this module.
///
/// Must be bumped on any change to any encoding.
pub const HASH_VERSION: u32 = 1;

/// Seed used for all hashing.
const MURMUR3_SEED: u32 = 0;

/// MurmurHash3 x86 32-bit of `bytes`, reinterpreted as signed.
pub fn murmur3_32(bytes: &[u8]) -> i32 {
    let mut source = bytes;
    murmur3::murmur3_32(&mut source, MURMUR3_SEED).expect("reading from a slice to not fail") as i32
}

/// Hash a 64-bit integer using its little-endian encoding.
pub fn hash_long(value: i64) -> i32 {
    murmur3_32(&value.to_le_bytes())
}

/// Bits of the canonical quiet NaN.
const CANONICAL_NAN_BITS: i64 = 0x7ff8_0000_0000_0000;

/// Bits of a double, with negative zero mapped to positive zero and every
/// NaN mapped to the canonical NaN.
fn canonical_f64_bits(value: f64) -> i64 {
    if value.is_nan() {
        return CANONICAL_NAN_BITS;
    }
    let bits = value.to_bits() as i64;
    if bits == i64::MIN { 0 } else { bits }
}

/// Hash the remaining bytes of a buffer.
///
/// The caller's buffer is never advanced.
pub fn hash_buf<B>(buf: &B) -> i32
where
    B: Buf + Clone,
{
    let chunk = buf.chunk();
    if chunk.len() == buf.remaining() {
        return murmur3_32(chunk);
    }

    let mut copy = buf.clone();
    let bytes = copy.copy_to_bytes(copy.remaining());
    murmur3_32(&bytes)
}

/// Canonical 32-bit hash of a value.
///
/// Values that are equal under their type's equality produce equal hashes.
pub trait CanonicalHash {
    fn canonical_hash(&self) -> i32;
}

macro_rules! impl_canonical_hash_integer {
    ($typ:ty) => {
        impl CanonicalHash for $typ {
            fn canonical_hash(&self) -> i32 {
                hash_long(*self as i64)
            }
        }
    };
}

impl_canonical_hash_integer!(i32);
impl_canonical_hash_integer!(i64);

impl CanonicalHash for f32 {
    fn canonical_hash(&self) -> i32 {
        hash_long(canonical_f64_bits(*self as f64))
    }
}

impl CanonicalHash for f64 {
    fn canonical_hash(&self) -> i32 {
        hash_long(canonical_f64_bits(*self))
    }
}

impl CanonicalHash for str {
    fn canonical_hash(&self) -> i32 {
        murmur3_32(self.as_bytes())
    }
}

impl CanonicalHash for [u8] {
    fn canonical_hash(&self) -> i32 {
        murmur3_32(self)
    }
}

impl CanonicalHash for Uuid {
    fn canonical_hash(&self) -> i32 {
        let (msb, lsb) = self.as_u64_pair();

        // Each half is byte reversed then written little-endian, most
        // significant half first.
        let mut buf = [0; 16];
        buf[..8].copy_from_slice(&msb.swap_bytes().to_le_bytes());
        buf[8..].copy_from_slice(&lsb.swap_bytes().to_le_bytes());

        murmur3_32(&buf)
    }
}

impl CanonicalHash for DecimalScalar {
    /// Hashes the unscaled value only, scale is not part of the hash.
    fn canonical_hash(&self) -> i32 {
        murmur3_32(&self.unscaled_be_bytes())
    }
}

/// Hash any non-null scalar.
///
/// Errors for nulls and booleans, neither of which have a canonical hash.
pub fn hash_scalar(value: &ScalarValue) -> Result<i32> {
    Ok(match value {
        ScalarValue::Int32(v) => v.canonical_hash(),
        ScalarValue::Int64(v) => v.canonical_hash(),
        ScalarValue::Float32(v) => v.canonical_hash(),
        ScalarValue::Float64(v) => v.canonical_hash(),
        ScalarValue::Decimal128(v) => v.canonical_hash(),
        ScalarValue::Utf8(v) => v.as_str().canonical_hash(),
        ScalarValue::Binary(v) => v.as_ref().canonical_hash(),
        ScalarValue::Uuid(v) => v.canonical_hash(),
        ScalarValue::Struct(v) => hash_struct(v)?,
        ScalarValue::Null => return Err(BucketError::new("Cannot hash a null value")),
        ScalarValue::Boolean(_) => return Err(BucketError::new("Cannot hash a boolean value")),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;

    use bytes::Bytes;
    use rstest::rstest;

    use super::*;

    #[test]
    fn int_widens_to_long() {
        assert_eq!(2017239379, 34_i32.canonical_hash());
        assert_eq!(2017239379, 34_i64.canonical_hash());
    }

    #[rstest]
    #[case::one(1.0, -142385009)]
    #[case::zero(0.0, 1669671676)]
    fn float_vectors(#[case] value: f64, #[case] expected: i32) {
        assert_eq!(expected, value.canonical_hash());
        assert_eq!(expected, (value as f32).canonical_hash());
    }

    #[test]
    fn negative_zero_matches_zero() {
        assert_eq!(0.0_f64.canonical_hash(), (-0.0_f64).canonical_hash());
        assert_eq!(0.0_f32.canonical_hash(), (-0.0_f32).canonical_hash());
    }

    #[rstest]
    #[case::quiet(f64::NAN)]
    #[case::negative(-f64::NAN)]
    #[case::signalling(f64::from_bits(0x7ff0_0000_0000_0001))]
    #[case::payload(f64::from_bits(0xfff8_0000_dead_beef))]
    fn every_nan_hashes_alike(#[case] value: f64) {
        assert!(value.is_nan());
        assert_eq!(1428788237, value.canonical_hash());
        assert_eq!(1428788237, hash_long(0x7ff8_0000_0000_0000));
    }

    #[test]
    fn every_f32_nan_hashes_alike() {
        for value in [f32::NAN, -f32::NAN, f32::from_bits(0x7f80_0001), f32::from_bits(0xffc0_1234)] {
            assert!(value.is_nan());
            assert_eq!(1428788237, value.canonical_hash());
            assert_eq!(
                1428788237,
                hash_scalar(&ScalarValue::Float32(value)).unwrap()
            );
        }
    }

    #[test]
    fn string_vector() {
        assert_eq!(1210000089, "iceberg".canonical_hash());
        assert_eq!("iceberg".canonical_hash(), " iceberg ".trim().canonical_hash());
    }

    #[test]
    fn bytes_vector() {
        assert_eq!(-188683207, [0_u8, 1, 2, 3].as_slice().canonical_hash());
    }

    #[test]
    fn uuid_vector() {
        let uuid = Uuid::parse_str("f79c3e09-677c-4bbd-a479-3f349cb785e7").unwrap();
        assert_eq!(1488055340, uuid.canonical_hash());

        // Same value regardless of construction.
        let from_bytes = Uuid::from_bytes(*uuid.as_bytes());
        let from_pair = Uuid::from_u64_pair(0xf79c3e09677c4bbd, 0xa4793f349cb785e7);
        assert_eq!(uuid.canonical_hash(), from_bytes.canonical_hash());
        assert_eq!(uuid.canonical_hash(), from_pair.canonical_hash());
        assert_eq!(uuid.canonical_hash(), uuid.as_bytes().as_slice().canonical_hash());
    }

    #[test]
    fn decimal_vector() {
        let dec = DecimalScalar::try_new(9, 2, 1420).unwrap();
        assert_eq!(-500754589, dec.canonical_hash());
        assert_eq!(dec.canonical_hash(), dec.canonical_hash());
    }

    #[test]
    fn decimal_scale_not_hashed() {
        let a = DecimalScalar::try_new(9, 2, 1420).unwrap();
        let b = DecimalScalar::try_new(9, 3, 1420).unwrap();
        let c = DecimalScalar::try_new(9, 3, 14200).unwrap();
        assert_eq!(a.canonical_hash(), b.canonical_hash());
        assert_ne!(a.canonical_hash(), c.canonical_hash());
    }

    #[test]
    fn sliced_bytes_hash_window_only() {
        let full = Bytes::from_static(b"xx\x00\x01\x02\x03yy");
        let window = full.slice(2..6);
        assert_eq!(-188683207, hash_buf(&window));
        assert_eq!(
            -188683207,
            hash_scalar(&ScalarValue::Binary(window)).unwrap()
        );
    }

    #[test]
    fn hash_buf_keeps_cursor() {
        let data = [9_u8, 9, 0, 1, 2, 3];
        let mut cursor = Cursor::new(&data[..]);
        cursor.set_position(2);

        assert_eq!(-188683207, hash_buf(&cursor));
        assert_eq!(2, cursor.position());
        assert_eq!(4, cursor.remaining());
    }

    #[test]
    fn non_contiguous_buffer() {
        let mut deque = VecDeque::from(vec![8_u8, 8, 0, 1]);
        deque.pop_front();
        deque.pop_front();
        deque.extend([2, 3]);

        assert_eq!(-188683207, hash_buf(&deque));
        assert_eq!(4, deque.len());
    }

    #[test]
    fn hash_scalar_rejects_null() {
        hash_scalar(&ScalarValue::Null).unwrap_err();
        hash_scalar(&ScalarValue::Boolean(true)).unwrap_err();
    }

    #[test]
    fn hash_scalar_matches_typed() {
        assert_eq!(
            34_i64.canonical_hash(),
            hash_scalar(&ScalarValue::Int32(34)).unwrap()
        );
        assert_eq!(
            1210000089,
            hash_scalar(&ScalarValue::from("iceberg")).unwrap()
        );
    }
}
