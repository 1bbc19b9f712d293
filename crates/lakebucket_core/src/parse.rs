//! Parsing values from their text representations.
use std::marker::PhantomData;
use std::str::FromStr;

use bytes::Bytes;
use lakebucket_error::{BucketError, Result, not_implemented};
use uuid::Uuid;

use crate::types::datatype::DataType;
use crate::types::decimal::DecimalScalar;
use crate::types::scalar::ScalarValue;

/// Logic for parsing a string into some type.
pub trait Parser {
    /// The type we'll be producing.
    type Type;

    /// Parse a string into `Type`, returning None if the parse cannot be done.
    fn parse(&mut self, s: &str) -> Option<Self::Type>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolParser;

impl Parser for BoolParser {
    type Type = bool;
    fn parse(&mut self, s: &str) -> Option<Self::Type> {
        match s {
            "t" | "true" | "TRUE" | "T" => Some(true),
            "f" | "false" | "FALSE" | "F" => Some(false),
            _ => None,
        }
    }
}

/// Parser that uses the stdlib `FromStr` trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FromStrParser<T: FromStr> {
    _type: PhantomData<T>,
}

impl<T: FromStr> FromStrParser<T> {
    pub const fn new() -> Self {
        FromStrParser { _type: PhantomData }
    }
}

impl<T: FromStr> Parser for FromStrParser<T> {
    type Type = T;
    fn parse(&mut self, s: &str) -> Option<Self::Type> {
        T::from_str(s).ok()
    }
}

pub type Int32Parser = FromStrParser<i32>;
pub type Int64Parser = FromStrParser<i64>;
pub type Float32Parser = FromStrParser<f32>;
pub type Float64Parser = FromStrParser<f64>;

/// Parses a decimal string into its unscaled value.
///
/// Input with more fractional digits than the scale allows is rejected
/// rather than rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalParser {
    precision: u8,
    scale: i8,
}

impl DecimalParser {
    pub fn new(precision: u8, scale: i8) -> Self {
        DecimalParser { precision, scale }
    }
}

impl Parser for DecimalParser {
    type Type = i128;
    fn parse(&mut self, s: &str) -> Option<Self::Type> {
        let bs = s.as_bytes();
        let (neg, bs) = match bs.first() {
            Some(b'-') => (true, &bs[1..]),
            Some(b'+') => (false, &bs[1..]),
            _ => (false, bs),
        };

        let mut val: i128 = 0;
        let mut digits: u8 = 0; // Significant digits.
        let mut decimals: i8 = 0; // Digits to right of decimal point.
        let mut seen_digit = false;

        let mut iter = bs.iter();

        // Leading digits.
        for b in iter.by_ref() {
            match b {
                b'0'..=b'9' => {
                    seen_digit = true;
                    // Leading zero.
                    if digits == 0 && *b == b'0' {
                        continue;
                    }
                    digits = digits.checked_add(1)?;
                    val = val.checked_mul(10)?.checked_add((b - b'0') as i128)?;
                }
                b'.' => break,
                _ => return None,
            }
        }

        // Digits after decimal.
        for b in iter {
            match b {
                b'0'..=b'9' => {
                    seen_digit = true;
                    if decimals >= self.scale {
                        return None;
                    }
                    decimals += 1;
                    digits = digits.checked_add(1)?;
                    val = val.checked_mul(10)?.checked_add((b - b'0') as i128)?;
                }
                _ => return None,
            }
        }

        if !seen_digit {
            return None;
        }

        if self.scale < 0 {
            let exp = self.scale.unsigned_abs();
            let div = 10_i128.checked_pow(exp as u32)?;
            if val % div != 0 {
                return None;
            }
            val /= div;
            digits = digits.saturating_sub(exp);
        }

        if decimals < self.scale {
            let exp = (self.scale - decimals) as u8;
            val = val.checked_mul(10_i128.checked_pow(exp as u32)?)?;
            digits = digits.checked_add(exp)?;
        }

        if digits > self.precision {
            return None;
        }

        if neg {
            val = -val;
        }

        Some(val)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UuidParser;

impl Parser for UuidParser {
    type Type = Uuid;
    fn parse(&mut self, s: &str) -> Option<Self::Type> {
        Uuid::parse_str(s).ok()
    }
}

/// Parses hex encoded bytes, with an optional `0x` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HexParser {
    buf: Vec<u8>,
}

impl Parser for HexParser {
    type Type = Bytes;
    fn parse(&mut self, s: &str) -> Option<Self::Type> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bs = s.as_bytes();
        if bs.len() % 2 != 0 {
            return None;
        }

        self.buf.clear();
        for pair in bs.chunks_exact(2) {
            let high = hex_digit(pair[0])?;
            let low = hex_digit(pair[1])?;
            self.buf.push((high << 4) | low);
        }

        Some(Bytes::copy_from_slice(&self.buf))
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Parse a value of the given type from text.
pub fn parse_scalar(datatype: &DataType, s: &str) -> Result<ScalarValue> {
    let parsed = match datatype {
        DataType::Boolean => BoolParser.parse(s).map(ScalarValue::Boolean),
        DataType::Int32 => Int32Parser::new().parse(s).map(ScalarValue::Int32),
        DataType::Int64 => Int64Parser::new().parse(s).map(ScalarValue::Int64),
        DataType::Float32 => Float32Parser::new().parse(s).map(ScalarValue::Float32),
        DataType::Float64 => Float64Parser::new().parse(s).map(ScalarValue::Float64),
        DataType::Decimal128(meta) => {
            match DecimalParser::new(meta.precision, meta.scale).parse(s) {
                Some(v) => Some(DecimalScalar::try_new(meta.precision, meta.scale, v)?.into()),
                None => None,
            }
        }
        DataType::Utf8 => Some(ScalarValue::Utf8(s.to_string())),
        DataType::Binary => HexParser::default().parse(s).map(ScalarValue::Binary),
        DataType::Uuid => UuidParser.parse(s).map(ScalarValue::Uuid),
        DataType::Struct(_) | DataType::List(_) | DataType::Map(_) => {
            not_implemented!("parsing values of type {datatype}")
        }
    };

    parsed.ok_or_else(|| BucketError::new(format!("Failed to parse '{s}' as {datatype}")))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn bools() {
        assert_eq!(Some(true), BoolParser.parse("t"));
        assert_eq!(Some(false), BoolParser.parse("FALSE"));
        assert_eq!(None, BoolParser.parse("yes"));
    }

    #[rstest]
    #[case::integer("14", 2, 1400)]
    #[case::exact("14.20", 2, 1420)]
    #[case::short_fraction("14.2", 2, 1420)]
    #[case::negative("-0.05", 2, -5)]
    #[case::leading_zeros("007.5", 1, 75)]
    #[case::plus("+3", 0, 3)]
    #[case::no_int_part(".5", 1, 5)]
    #[case::negative_scale("1200", -2, 12)]
    fn decimals(#[case] s: &str, #[case] scale: i8, #[case] expected: i128) {
        assert_eq!(Some(expected), DecimalParser::new(9, scale).parse(s));
    }

    #[rstest]
    #[case::too_many_decimals("1.234", 9, 2)]
    #[case::too_many_digits("123456", 5, 0)]
    #[case::scaled_overflow("1234", 5, 2)]
    #[case::exponent("1e4", 9, 2)]
    #[case::empty("", 9, 2)]
    #[case::sign_only("-", 9, 2)]
    #[case::garbage("1x", 9, 2)]
    #[case::inexact_negative_scale("1250", 9, -2)]
    fn decimal_rejects(#[case] s: &str, #[case] precision: u8, #[case] scale: i8) {
        assert_eq!(None, DecimalParser::new(precision, scale).parse(s));
    }

    #[test]
    fn decimal_overflow_is_none() {
        let s = "9".repeat(60);
        assert_eq!(None, DecimalParser::new(38, 0).parse(&s));
    }

    #[test]
    fn hex() {
        let mut parser = HexParser::default();
        assert_eq!(
            Some(Bytes::from_static(&[0, 1, 0xab, 0xff])),
            parser.parse("0001abFF")
        );
        assert_eq!(Some(Bytes::from_static(&[0x10])), parser.parse("0x10"));
        assert_eq!(None, parser.parse("abc"));
        assert_eq!(None, parser.parse("zz"));
    }

    #[test]
    fn parse_scalars() {
        assert_eq!(
            ScalarValue::Int64(34),
            parse_scalar(&DataType::Int64, "34").unwrap()
        );
        assert_eq!(
            ScalarValue::from(DecimalScalar::try_new(9, 2, 1420).unwrap()),
            parse_scalar(&DataType::try_new_decimal(9, 2).unwrap(), "14.20").unwrap()
        );
        assert_eq!(
            ScalarValue::from("iceberg"),
            parse_scalar(&DataType::Utf8, "iceberg").unwrap()
        );
        assert!(matches!(
            parse_scalar(&DataType::Uuid, "f79c3e09-677c-4bbd-a479-3f349cb785e7").unwrap(),
            ScalarValue::Uuid(_)
        ));

        let err = parse_scalar(&DataType::Int32, "abc").unwrap_err();
        assert_eq!("Failed to parse 'abc' as Int32", err.get_msg());

        let err = parse_scalar(&DataType::new_list(DataType::Int32), "[1]").unwrap_err();
        assert!(err.get_msg().starts_with("Not yet implemented"));
    }
}
