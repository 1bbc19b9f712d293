use std::fmt;

use lakebucket_error::{BucketError, Result};

use super::datatype::{DataType, Field, StructTypeMeta};
use super::scalar::ScalarValue;

/// A record: one value per field of a struct type, in the struct's physical
/// field order.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    meta: StructTypeMeta,
    values: Vec<ScalarValue>,
}

impl StructValue {
    /// Create a record from its type and values.
    ///
    /// Errors if the number of values doesn't match the number of fields, a
    /// value doesn't match its field's type, or a required field is null.
    pub fn try_new(meta: StructTypeMeta, values: Vec<ScalarValue>) -> Result<Self> {
        if meta.fields().len() != values.len() {
            return Err(BucketError::new(format!(
                "Received {} values for struct with {} fields",
                values.len(),
                meta.fields().len()
            )));
        }

        for (field, value) in meta.fields().iter().zip(&values) {
            if value.is_null() && !field.nullable {
                return Err(BucketError::new(format!(
                    "Required field '{}' cannot be null",
                    field.name
                )));
            }
            if !value.is_compatible_with(&field.datatype) {
                return Err(BucketError::new(format!(
                    "Value {value} is not valid for field '{}' of type {}",
                    field.name, field.datatype
                )));
            }
        }

        Ok(StructValue { meta, values })
    }

    /// Create a record from (field, value) pairs.
    pub fn try_from_pairs(pairs: impl IntoIterator<Item = (Field, ScalarValue)>) -> Result<Self> {
        let (fields, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self::try_new(StructTypeMeta::try_new(fields)?, values)
    }

    pub fn struct_meta(&self) -> &StructTypeMeta {
        &self.meta
    }

    pub fn datatype(&self) -> DataType {
        DataType::Struct(self.meta.clone())
    }

    /// Fields in physical order.
    pub fn fields(&self) -> &[Field] {
        self.meta.fields()
    }

    pub fn values(&self) -> &[ScalarValue] {
        &self.values
    }

    /// Get a field's value by name.
    ///
    /// Returns None if the struct has no such field, or if the field is null.
    pub fn get_field(&self, name: &str) -> Option<&ScalarValue> {
        let (idx, _) = self.meta.field_by_name(name)?;
        match &self.values[idx] {
            ScalarValue::Null => None,
            value => Some(value),
        }
    }
}

impl fmt::Display for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, (field, value)) in self.meta.fields().iter().zip(&self.values).enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {value}", field.name)?;
        }
        write!(f, "}}")
    }
}
