use std::fmt;
use std::str::FromStr;

use lakebucket_error::{BucketError, Result};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use tracing::trace;

use crate::hash::{CanonicalHash, hash_struct};
use crate::types::datatype::DataType;
use crate::types::scalar::ScalarValue;

/// Scalar kinds that can be bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal128,
    Utf8,
    Binary,
    Uuid,
}

/// What a bound bucket transform hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketSource {
    /// A single column of a scalar type.
    Scalar(ScalarKind),
    /// Multiple columns presented as a record.
    Struct,
}

impl BucketSource {
    /// Resolve the source for a data type, None if the type can't be bucketed.
    pub fn for_datatype(datatype: &DataType) -> Option<Self> {
        Some(match datatype {
            DataType::Int32 => Self::Scalar(ScalarKind::Int32),
            DataType::Int64 => Self::Scalar(ScalarKind::Int64),
            DataType::Float32 => Self::Scalar(ScalarKind::Float32),
            DataType::Float64 => Self::Scalar(ScalarKind::Float64),
            DataType::Decimal128(_) => Self::Scalar(ScalarKind::Decimal128),
            DataType::Utf8 => Self::Scalar(ScalarKind::Utf8),
            DataType::Binary => Self::Scalar(ScalarKind::Binary),
            DataType::Uuid => Self::Scalar(ScalarKind::Uuid),
            DataType::Struct(_) => Self::Struct,
            DataType::Boolean | DataType::List(_) | DataType::Map(_) => return None,
        })
    }
}

/// Partition transform mapping values to one of `num_buckets` buckets.
///
/// Identified solely by the number of buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketTransform {
    num_buckets: i32,
}

impl BucketTransform {
    pub fn try_new(num_buckets: i32) -> Result<Self> {
        if num_buckets <= 0 {
            return Err(BucketError::new(format!(
                "Invalid number of buckets: {num_buckets} (must be > 0)"
            )));
        }
        Ok(BucketTransform { num_buckets })
    }

    pub const fn num_buckets(&self) -> i32 {
        self.num_buckets
    }

    pub fn can_transform(&self, datatype: &DataType) -> bool {
        BucketSource::for_datatype(datatype).is_some()
    }

    /// Bucket indices are always 32-bit integers.
    pub fn result_type(&self, _source: &DataType) -> DataType {
        DataType::Int32
    }

    /// Bind this transform to a source type.
    pub fn bind(&self, datatype: &DataType) -> Result<BoundBucket> {
        let source = BucketSource::for_datatype(datatype)
            .ok_or_else(|| BucketError::new(format!("Cannot bucket by type: {datatype}")))?;
        trace!(transform = %self, %datatype, ?source, "bound bucket transform");

        Ok(BoundBucket {
            transform: *self,
            datatype: datatype.clone(),
            source,
        })
    }
}

impl fmt::Display for BucketTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bucket[{}]", self.num_buckets)
    }
}

impl FromStr for BucketTransform {
    type Err = BucketError;

    fn from_str(s: &str) -> Result<Self> {
        let num = s
            .trim()
            .strip_prefix("bucket[")
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| BucketError::new(format!("Invalid bucket transform: '{s}'")))?;
        Self::try_new(num.trim().parse()?)
    }
}

impl Serialize for BucketTransform {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BucketTransform {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<BucketTransform>()
            .map_err(|e| de::Error::custom(e.get_msg()))
    }
}

/// A bucket transform specialized for a source type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundBucket {
    transform: BucketTransform,
    datatype: DataType,
    source: BucketSource,
}

impl BoundBucket {
    /// The type this transform was bound to.
    pub fn datatype(&self) -> &DataType {
        &self.datatype
    }

    pub fn source(&self) -> BucketSource {
        self.source
    }

    /// Hash a non-null value of the bound source type.
    ///
    /// Errors if the value doesn't belong to the bound type, including
    /// decimals of another scale and records of another struct type.
    pub fn hash_value(&self, value: &ScalarValue) -> Result<i32> {
        if !value.is_compatible_with(&self.datatype) {
            return Err(BucketError::new(format!(
                "Value {value} doesn't match bound type {}",
                self.datatype
            )));
        }

        Ok(match (self.source, value) {
            (BucketSource::Scalar(ScalarKind::Int32), ScalarValue::Int32(v)) => v.canonical_hash(),
            (BucketSource::Scalar(ScalarKind::Int64), ScalarValue::Int64(v)) => v.canonical_hash(),
            (BucketSource::Scalar(ScalarKind::Float32), ScalarValue::Float32(v)) => {
                v.canonical_hash()
            }
            (BucketSource::Scalar(ScalarKind::Float64), ScalarValue::Float64(v)) => {
                v.canonical_hash()
            }
            (BucketSource::Scalar(ScalarKind::Decimal128), ScalarValue::Decimal128(v)) => {
                v.canonical_hash()
            }
            (BucketSource::Scalar(ScalarKind::Utf8), ScalarValue::Utf8(v)) => {
                v.as_str().canonical_hash()
            }
            (BucketSource::Scalar(ScalarKind::Binary), ScalarValue::Binary(v)) => {
                v.as_ref().canonical_hash()
            }
            (BucketSource::Scalar(ScalarKind::Uuid), ScalarValue::Uuid(v)) => v.canonical_hash(),
            (BucketSource::Struct, ScalarValue::Struct(v)) => hash_struct(v)?,
            (source, value) => {
                return Err(BucketError::new(format!(
                    "Value {value} doesn't match bucket source {source:?}"
                )));
            }
        })
    }

    /// Map a precomputed hash to a bucket index.
    pub const fn apply_hash(&self, hash: i32) -> i32 {
        (hash & i32::MAX) % self.transform.num_buckets
    }

    /// Compute the bucket for a value, None for null.
    pub fn apply(&self, value: &ScalarValue) -> Result<Option<i32>> {
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(self.apply_hash(self.hash_value(value)?)))
    }
}
