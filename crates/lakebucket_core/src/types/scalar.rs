use std::cmp::Ordering;
use std::fmt;

use bytes::Bytes;
use lakebucket_error::{BucketError, Result};
use uuid::Uuid;

use super::datatype::{DataType, DataTypeId};
use super::decimal::DecimalScalar;
use super::struct_value::StructValue;

/// A single scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// Absence of a value.
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Decimal128(DecimalScalar),
    /// Utf-8 encoded string.
    Utf8(String),
    /// Opaque bytes. Only the visible window of the buffer is considered part
    /// of the value.
    Binary(Bytes),
    Uuid(Uuid),
    Struct(StructValue),
}

impl ScalarValue {
    /// Get the id of the type this value belongs to, None for null.
    pub fn datatype_id(&self) -> Option<DataTypeId> {
        Some(match self {
            Self::Null => return None,
            Self::Boolean(_) => DataTypeId::Boolean,
            Self::Int32(_) => DataTypeId::Int32,
            Self::Int64(_) => DataTypeId::Int64,
            Self::Float32(_) => DataTypeId::Float32,
            Self::Float64(_) => DataTypeId::Float64,
            Self::Decimal128(_) => DataTypeId::Decimal128,
            Self::Utf8(_) => DataTypeId::Utf8,
            Self::Binary(_) => DataTypeId::Binary,
            Self::Uuid(_) => DataTypeId::Uuid,
            Self::Struct(_) => DataTypeId::Struct,
        })
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn is_nan(&self) -> bool {
        match self {
            Self::Float32(v) => v.is_nan(),
            Self::Float64(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Check if this value can be stored in a column of the given type.
    ///
    /// Null is compatible with every type. Decimals must share the type's
    /// scale, structs must share the full struct type.
    pub fn is_compatible_with(&self, datatype: &DataType) -> bool {
        match (self, datatype) {
            (Self::Null, _) => true,
            (Self::Decimal128(v), DataType::Decimal128(meta)) => {
                v.scale == meta.scale && v.precision <= meta.precision
            }
            (Self::Struct(v), DataType::Struct(meta)) => v.struct_meta() == meta,
            (v, datatype) => v.datatype_id() == Some(datatype.datatype_id()),
        }
    }

    /// Compare two values of the same kind.
    ///
    /// Returns `None` when the values are unordered (NaN involved). Errors if
    /// the values are of different kinds, or either is null.
    ///
    /// Records of the same struct type are always ordered. Their fields are
    /// compared by value identity, so NaN fields are equal to each other.
    pub fn try_compare(&self, other: &ScalarValue) -> Result<Option<Ordering>> {
        Ok(match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::Int32(a), Self::Int32(b)) => Some(a.cmp(b)),
            (Self::Int64(a), Self::Int64(b)) => Some(a.cmp(b)),
            (Self::Float32(a), Self::Float32(b)) => a.partial_cmp(b),
            (Self::Float64(a), Self::Float64(b)) => a.partial_cmp(b),
            (Self::Decimal128(a), Self::Decimal128(b)) => Some(compare_decimals(a, b)?),
            (Self::Utf8(a), Self::Utf8(b)) => Some(a.cmp(b)),
            (Self::Binary(a), Self::Binary(b)) => Some(a.cmp(b)),
            (Self::Uuid(a), Self::Uuid(b)) => Some(a.cmp(b)),
            (Self::Struct(a), Self::Struct(b)) => Some(compare_structs(a, b)?),
            (a, b) => {
                return Err(BucketError::new(format!(
                    "Cannot compare {a} with {b}"
                )));
            }
        })
    }
}

fn compare_decimals(a: &DecimalScalar, b: &DecimalScalar) -> Result<Ordering> {
    if a.scale == b.scale {
        return Ok(a.value.cmp(&b.value));
    }

    // Rescale the value with the smaller scale up to the larger one.
    let rescale = |v: &DecimalScalar, to: i8| -> Result<i128> {
        let exp = (to as i32 - v.scale as i32) as u32;
        10_i128
            .checked_pow(exp)
            .and_then(|mul| v.value.checked_mul(mul))
            .ok_or_else(|| BucketError::new(format!("Overflow rescaling {v} to scale {to}")))
    };

    if a.scale < b.scale {
        Ok(rescale(a, b.scale)?.cmp(&b.value))
    } else {
        Ok(a.value.cmp(&rescale(b, a.scale)?))
    }
}

/// Total order over records of the same struct type.
///
/// Fields are compared in physical order. A null field sorts before any
/// value. Floats compare by value identity: every NaN equals every other NaN
/// and sorts after all numbers, and -0.0 sorts before 0.0. Two records are
/// equal exactly when their rendered text is equal, which keeps equality in
/// step with the struct hash.
fn compare_structs(a: &StructValue, b: &StructValue) -> Result<Ordering> {
    if a.struct_meta() != b.struct_meta() {
        return Err(BucketError::new(format!(
            "Cannot compare records of different types: {} and {}",
            a.datatype(),
            b.datatype()
        )));
    }

    for (left, right) in a.values().iter().zip(b.values()) {
        let ord = match (left, right) {
            (ScalarValue::Null, ScalarValue::Null) => Ordering::Equal,
            (ScalarValue::Null, _) => Ordering::Less,
            (_, ScalarValue::Null) => Ordering::Greater,
            (ScalarValue::Float32(x), ScalarValue::Float32(y)) => {
                canonical_nan(*x as f64).total_cmp(&canonical_nan(*y as f64))
            }
            (ScalarValue::Float64(x), ScalarValue::Float64(y)) => {
                canonical_nan(*x).total_cmp(&canonical_nan(*y))
            }
            (left, right) => left.try_compare(right)?.unwrap_or(Ordering::Equal),
        };
        if ord != Ordering::Equal {
            return Ok(ord);
        }
    }

    Ok(Ordering::Equal)
}

fn canonical_nan(v: f64) -> f64 {
    if v.is_nan() { f64::NAN } else { v }
}

/// Formats floats so that integral values keep a trailing `.0`, and
/// non-finite values use their spelled out names.
fn write_float<F>(f: &mut fmt::Formatter<'_>, v: F, is_nan: bool, is_inf: bool, neg: bool) -> fmt::Result
where
    F: fmt::Debug,
{
    if is_nan {
        write!(f, "NaN")
    } else if is_inf {
        if neg {
            write!(f, "-Infinity")
        } else {
            write!(f, "Infinity")
        }
    } else {
        write!(f, "{v:?}")
    }
}

/// Stable text rendering of values.
///
/// Struct bucketing hashes this text, so changing any of these formats
/// changes bucket assignment.
impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float32(v) => {
                write_float(f, v, v.is_nan(), v.is_infinite(), v.is_sign_negative())
            }
            Self::Float64(v) => {
                write_float(f, v, v.is_nan(), v.is_infinite(), v.is_sign_negative())
            }
            Self::Decimal128(v) => write!(f, "{v}"),
            Self::Utf8(v) => write!(f, "{v}"),
            Self::Binary(v) => {
                for b in v.iter() {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Self::Uuid(v) => write!(f, "{}", v.hyphenated()),
            Self::Struct(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int32(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int64(value)
    }
}

impl From<f32> for ScalarValue {
    fn from(value: f32) -> Self {
        ScalarValue::Float32(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float64(value)
    }
}

impl From<DecimalScalar> for ScalarValue {
    fn from(value: DecimalScalar) -> Self {
        ScalarValue::Decimal128(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Utf8(value)
    }
}

impl From<Bytes> for ScalarValue {
    fn from(value: Bytes) -> Self {
        ScalarValue::Binary(value)
    }
}

impl From<&[u8]> for ScalarValue {
    fn from(value: &[u8]) -> Self {
        ScalarValue::Binary(Bytes::copy_from_slice(value))
    }
}

impl From<Vec<u8>> for ScalarValue {
    fn from(value: Vec<u8>) -> Self {
        ScalarValue::Binary(Bytes::from(value))
    }
}

impl From<Uuid> for ScalarValue {
    fn from(value: Uuid) -> Self {
        ScalarValue::Uuid(value)
    }
}

impl From<StructValue> for ScalarValue {
    fn from(value: StructValue) -> Self {
        ScalarValue::Struct(value)
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => ScalarValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::datatype::{DecimalTypeMeta, Field, StructTypeMeta};

    #[test]
    fn display_floats() {
        assert_eq!("1.0", ScalarValue::Float64(1.0).to_string());
        assert_eq!("-0.0", ScalarValue::Float64(-0.0).to_string());
        assert_eq!("2.5", ScalarValue::Float32(2.5).to_string());
        assert_eq!("NaN", ScalarValue::Float32(f32::NAN).to_string());
        assert_eq!("-Infinity", ScalarValue::Float64(f64::NEG_INFINITY).to_string());
    }

    #[test]
    fn display_binary_and_uuid() {
        assert_eq!("00010aff", ScalarValue::from(vec![0, 1, 10, 255]).to_string());

        let uuid = Uuid::parse_str("F79C3E09-677C-4BBD-A479-3F349CB785E7").unwrap();
        assert_eq!(
            "f79c3e09-677c-4bbd-a479-3f349cb785e7",
            ScalarValue::from(uuid).to_string()
        );
    }

    #[test]
    fn compatibility() {
        let dec = DecimalScalar::try_new(9, 2, 1420).unwrap();
        let value = ScalarValue::from(dec);
        assert!(value.is_compatible_with(&DataType::Decimal128(DecimalTypeMeta::new(9, 2))));
        assert!(!value.is_compatible_with(&DataType::Decimal128(DecimalTypeMeta::new(9, 3))));
        assert!(ScalarValue::Null.is_compatible_with(&DataType::Uuid));
        assert!(!ScalarValue::Int32(1).is_compatible_with(&DataType::Int64));
    }

    #[test]
    fn compare_values() {
        assert_eq!(
            Some(Ordering::Equal),
            ScalarValue::Float64(0.0)
                .try_compare(&ScalarValue::Float64(-0.0))
                .unwrap()
        );
        assert_eq!(
            None,
            ScalarValue::Float64(f64::NAN)
                .try_compare(&ScalarValue::Float64(1.0))
                .unwrap()
        );
        assert_eq!(
            Some(Ordering::Less),
            ScalarValue::from("a").try_compare(&ScalarValue::from("b")).unwrap()
        );
        ScalarValue::Int32(1)
            .try_compare(&ScalarValue::Int64(1))
            .unwrap_err();
    }

    fn record(id: i64, score: f64) -> ScalarValue {
        StructValue::try_from_pairs([
            (Field::required(1, "id", DataType::Int64), ScalarValue::Int64(id)),
            (Field::optional(2, "score", DataType::Float64), ScalarValue::Float64(score)),
        ])
        .unwrap()
        .into()
    }

    #[test]
    fn compare_records() {
        assert_eq!(
            Some(Ordering::Equal),
            record(1, 2.5).try_compare(&record(1, 2.5)).unwrap()
        );
        assert_eq!(
            Some(Ordering::Less),
            record(1, 9.0).try_compare(&record(2, 0.0)).unwrap()
        );
        assert_eq!(
            Some(Ordering::Greater),
            record(1, 3.0).try_compare(&record(1, 2.0)).unwrap()
        );

        // Fields compare by identity, matching how records are hashed.
        assert_eq!(
            Some(Ordering::Equal),
            record(1, f64::NAN).try_compare(&record(1, -f64::NAN)).unwrap()
        );
        assert_eq!(
            Some(Ordering::Less),
            record(1, -0.0).try_compare(&record(1, 0.0)).unwrap()
        );
    }

    #[test]
    fn compare_records_with_nulls() {
        let meta = StructTypeMeta::try_new([
            Field::required(1, "id", DataType::Int64),
            Field::optional(2, "region", DataType::Utf8),
        ])
        .unwrap();
        let row = |region: Option<&str>| {
            ScalarValue::from(
                StructValue::try_new(meta.clone(), vec![ScalarValue::Int64(1), region.into()])
                    .unwrap(),
            )
        };

        assert_eq!(Some(Ordering::Equal), row(None).try_compare(&row(None)).unwrap());
        assert_eq!(Some(Ordering::Less), row(None).try_compare(&row(Some("eu"))).unwrap());
        assert_eq!(Some(Ordering::Greater), row(Some("eu")).try_compare(&row(None)).unwrap());
    }

    #[test]
    fn compare_records_of_different_types() {
        let other = StructValue::try_from_pairs([(
            Field::required(1, "id", DataType::Int64),
            ScalarValue::Int64(1),
        )])
        .unwrap();
        record(1, 0.0)
            .try_compare(&ScalarValue::from(other))
            .unwrap_err();
    }

    #[test]
    fn compare_rescaled_decimals() {
        let a = ScalarValue::from(DecimalScalar::try_new(9, 2, 1420).unwrap());
        let b = ScalarValue::from(DecimalScalar::try_new(9, 1, 142).unwrap());
        assert_eq!(Some(Ordering::Equal), a.try_compare(&b).unwrap());

        let c = ScalarValue::from(DecimalScalar::try_new(9, 1, 143).unwrap());
        assert_eq!(Some(Ordering::Less), a.try_compare(&c).unwrap());
    }
}
