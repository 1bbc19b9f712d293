use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use lakebucket_error::{BucketError, Result};

use super::decimal::{DECIMAL_MAX_PRECISION, validate_decimal_meta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataTypeId {
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal128,
    Utf8,
    Binary,
    Uuid,
    Struct,
    List,
    Map,
}

impl fmt::Display for DataTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "Boolean"),
            Self::Int32 => write!(f, "Int32"),
            Self::Int64 => write!(f, "Int64"),
            Self::Float32 => write!(f, "Float32"),
            Self::Float64 => write!(f, "Float64"),
            Self::Decimal128 => write!(f, "Decimal128"),
            Self::Utf8 => write!(f, "Utf8"),
            Self::Binary => write!(f, "Binary"),
            Self::Uuid => write!(f, "Uuid"),
            Self::Struct => write!(f, "Struct"),
            Self::List => write!(f, "List"),
            Self::Map => write!(f, "Map"),
        }
    }
}

/// Metadata associated with decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecimalTypeMeta {
    pub precision: u8,
    pub scale: i8,
}

impl DecimalTypeMeta {
    pub const fn new(precision: u8, scale: i8) -> Self {
        DecimalTypeMeta { precision, scale }
    }
}

/// A named field with a schema assigned identifier.
///
/// Identifiers are stable across schema changes and unique within a struct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub id: i32,
    pub name: String,
    pub datatype: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(id: i32, name: impl Into<String>, datatype: DataType, nullable: bool) -> Self {
        Field {
            id,
            name: name.into(),
            datatype,
            nullable,
        }
    }

    pub fn optional(id: i32, name: impl Into<String>, datatype: DataType) -> Self {
        Self::new(id, name, datatype, true)
    }

    pub fn required(id: i32, name: impl Into<String>, datatype: DataType) -> Self {
        Self::new(id, name, datatype, false)
    }
}

/// Metadata associated with structs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructTypeMeta {
    fields: Vec<Field>,
}

impl StructTypeMeta {
    /// Create struct metadata from fields in their physical order.
    ///
    /// Errors if two fields share an identifier or a name.
    pub fn try_new(fields: impl IntoIterator<Item = Field>) -> Result<Self> {
        let fields: Vec<_> = fields.into_iter().collect();

        let mut ids = HashSet::with_capacity(fields.len());
        let mut names = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !ids.insert(field.id) {
                return Err(BucketError::new(format!(
                    "Duplicate field id {} in struct (field '{}')",
                    field.id, field.name
                )));
            }
            if !names.insert(field.name.as_str()) {
                return Err(BucketError::new(format!(
                    "Duplicate field name '{}' in struct",
                    field.name
                )));
            }
        }

        Ok(StructTypeMeta { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_by_name(&self, name: &str) -> Option<(usize, &Field)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }
}

/// Metadata associated with lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListTypeMeta {
    pub datatype: Box<DataType>,
}

/// Metadata associated with maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapTypeMeta {
    pub key: Box<DataType>,
    pub value: Box<DataType>,
}

/// Supported data types.
///
/// Only the types that participate in bucketing are represented, along with
/// the nested types so that struct members can be checked for nesting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    /// Decimal with up to 38 digits of precision.
    Decimal128(DecimalTypeMeta),
    Utf8,
    Binary,
    /// 128-bit universally unique identifier.
    Uuid,
    /// A struct of different types.
    Struct(StructTypeMeta),
    /// A list of values all of the same type.
    List(ListTypeMeta),
    /// Key/value pairs.
    Map(MapTypeMeta),
}

impl DataType {
    pub fn try_new_decimal(precision: u8, scale: i8) -> Result<Self> {
        let meta = DecimalTypeMeta::new(precision, scale);
        validate_decimal_meta(&meta)?;
        Ok(DataType::Decimal128(meta))
    }

    pub fn try_new_struct(fields: impl IntoIterator<Item = Field>) -> Result<Self> {
        Ok(DataType::Struct(StructTypeMeta::try_new(fields)?))
    }

    pub fn new_list(datatype: DataType) -> Self {
        DataType::List(ListTypeMeta {
            datatype: Box::new(datatype),
        })
    }

    pub fn new_map(key: DataType, value: DataType) -> Self {
        DataType::Map(MapTypeMeta {
            key: Box::new(key),
            value: Box::new(value),
        })
    }

    /// Get the data type id from the data type.
    pub const fn datatype_id(&self) -> DataTypeId {
        match self {
            DataType::Boolean => DataTypeId::Boolean,
            DataType::Int32 => DataTypeId::Int32,
            DataType::Int64 => DataTypeId::Int64,
            DataType::Float32 => DataTypeId::Float32,
            DataType::Float64 => DataTypeId::Float64,
            DataType::Decimal128(_) => DataTypeId::Decimal128,
            DataType::Utf8 => DataTypeId::Utf8,
            DataType::Binary => DataTypeId::Binary,
            DataType::Uuid => DataTypeId::Uuid,
            DataType::Struct(_) => DataTypeId::Struct,
            DataType::List(_) => DataTypeId::List,
            DataType::Map(_) => DataTypeId::Map,
        }
    }

    pub const fn is_struct(&self) -> bool {
        matches!(self, DataType::Struct(_))
    }

    /// Return if this datatype contains other types.
    pub const fn is_nested(&self) -> bool {
        matches!(
            self,
            DataType::Struct(_) | DataType::List(_) | DataType::Map(_)
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "Boolean"),
            Self::Int32 => write!(f, "Int32"),
            Self::Int64 => write!(f, "Int64"),
            Self::Float32 => write!(f, "Float32"),
            Self::Float64 => write!(f, "Float64"),
            Self::Decimal128(meta) => write!(f, "Decimal128({},{})", meta.precision, meta.scale),
            Self::Utf8 => write!(f, "Utf8"),
            Self::Binary => write!(f, "Binary"),
            Self::Uuid => write!(f, "Uuid"),
            Self::Struct(meta) => {
                write!(
                    f,
                    "Struct {{{}}}",
                    meta.fields
                        .iter()
                        .map(|field| format!("{}: {}", field.name, field.datatype))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Self::List(meta) => write!(f, "List[{}]", meta.datatype),
            Self::Map(meta) => write!(f, "Map[{}, {}]", meta.key, meta.value),
        }
    }
}

/// Parses primitive type names.
///
/// Accepts both the table format names (`int`, `long`, `string`, ...) and the
/// display names (`Int32`, `Int64`, `Utf8`, ...). Nested types can't be parsed.
impl FromStr for DataType {
    type Err = BucketError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let datatype = match lower.as_str() {
            "boolean" | "bool" => DataType::Boolean,
            "int" | "int32" | "integer" => DataType::Int32,
            "long" | "int64" | "bigint" => DataType::Int64,
            "float" | "float32" => DataType::Float32,
            "double" | "float64" => DataType::Float64,
            "string" | "utf8" | "text" => DataType::Utf8,
            "binary" | "bytes" => DataType::Binary,
            "uuid" => DataType::Uuid,
            other => {
                let args = other
                    .strip_prefix("decimal128(")
                    .or_else(|| other.strip_prefix("decimal("))
                    .and_then(|rest| rest.strip_suffix(')'));

                match args.and_then(|args| args.split_once(',')) {
                    Some((precision, scale)) => {
                        let precision: u8 = precision.trim().parse()?;
                        let scale: i8 = scale.trim().parse()?;
                        if precision > DECIMAL_MAX_PRECISION {
                            return Err(BucketError::new(format!(
                                "Decimal precision {precision} exceeds max of {DECIMAL_MAX_PRECISION}"
                            )));
                        }
                        DataType::try_new_decimal(precision, scale)?
                    }
                    None => return Err(BucketError::new(format!("Unknown data type: '{s}'"))),
                }
            }
        };

        Ok(datatype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_types() {
        let st = DataType::try_new_struct([Field::optional(1, "a", DataType::Int32)]).unwrap();
        assert!(st.is_struct());
        assert!(st.is_nested());
        assert!(DataType::new_list(DataType::Utf8).is_nested());
        assert!(DataType::new_map(DataType::Utf8, DataType::Int64).is_nested());
        assert!(!DataType::Utf8.is_nested());
        assert!(!DataType::Uuid.is_struct());
    }

    #[test]
    fn struct_rejects_duplicate_ids() {
        let err = DataType::try_new_struct([
            Field::optional(1, "a", DataType::Int32),
            Field::optional(1, "b", DataType::Utf8),
        ])
        .unwrap_err();
        assert!(err.get_msg().contains("Duplicate field id 1"));
    }

    #[test]
    fn parse_primitive_names() {
        assert_eq!(DataType::Int32, "int".parse().unwrap());
        assert_eq!(DataType::Int64, "Int64".parse().unwrap());
        assert_eq!(DataType::Utf8, "string".parse().unwrap());
        assert_eq!(
            DataType::Decimal128(DecimalTypeMeta::new(9, 2)),
            "decimal(9, 2)".parse().unwrap()
        );
        assert!("decimal(40,2)".parse::<DataType>().is_err());
        assert!("struct".parse::<DataType>().is_err());
    }

    #[test]
    fn display_struct() {
        let st = DataType::try_new_struct([
            Field::optional(1, "a", DataType::Int32),
            Field::optional(2, "b", DataType::new_list(DataType::Utf8)),
        ])
        .unwrap();
        assert_eq!("Struct {a: Int32, b: List[Utf8]}", st.to_string());
    }
}
