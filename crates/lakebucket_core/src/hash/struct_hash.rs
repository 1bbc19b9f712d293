//! Hashing of records for bucketing on multiple columns.
use std::fmt::Write as _;

use lakebucket_error::{BucketError, Result};

use super::CanonicalHash;
use crate::types::struct_value::StructValue;

/// Separates names and values in the canonical record text.
const UNIT_SEPARATOR: char = '\u{1f}';

/// Hash a record.
///
/// Fields are visited in field id order, so the physical field order of the
/// record has no effect on the result. Errors if any field is of a nested
/// type.
pub fn hash_struct(record: &StructValue) -> Result<i32> {
    let canonical = canonical_struct_text(record)?;
    Ok(canonical.as_str().canonical_hash())
}

/// Build the text hashed for a record.
///
/// Each field contributes `<name> 0x1F <value> 0x1F`, where the value is
/// empty for absent fields.
pub fn canonical_struct_text(record: &StructValue) -> Result<String> {
    let fields = record.fields();

    if let Some(nested) = fields.iter().find(|f| f.datatype.is_nested()) {
        return Err(BucketError::new(format!(
            "Cannot bucket on multiple columns with nested field '{}' of type {}",
            nested.name, nested.datatype
        )));
    }

    let mut order: Vec<_> = (0..fields.len()).collect();
    order.sort_by_key(|&idx| fields[idx].id);

    let mut buf = String::new();
    for idx in order {
        let field = &fields[idx];
        buf.push_str(&field.name);
        buf.push(UNIT_SEPARATOR);
        if let Some(value) = record.get_field(&field.name) {
            write!(buf, "{value}")?;
        }
        buf.push(UNIT_SEPARATOR);
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::datatype::{DataType, Field};
    use crate::types::decimal::DecimalScalar;
    use crate::types::scalar::ScalarValue;

    fn id_field() -> Field {
        Field::required(1, "id", DataType::Int64)
    }

    fn name_field() -> Field {
        Field::optional(2, "name", DataType::Utf8)
    }

    #[test]
    fn canonical_text_layout() {
        let record = StructValue::try_from_pairs([
            (name_field(), ScalarValue::from("bob")),
            (id_field(), ScalarValue::Int64(42)),
        ])
        .unwrap();

        let text = canonical_struct_text(&record).unwrap();
        assert_eq!("id\u{1f}42\u{1f}name\u{1f}bob\u{1f}", text);
        assert_eq!(text.as_str().canonical_hash(), hash_struct(&record).unwrap());
    }

    #[test]
    fn physical_order_ignored() {
        let a = StructValue::try_from_pairs([
            (id_field(), ScalarValue::Int64(42)),
            (name_field(), ScalarValue::from("bob")),
        ])
        .unwrap();
        let b = StructValue::try_from_pairs([
            (name_field(), ScalarValue::from("bob")),
            (id_field(), ScalarValue::Int64(42)),
        ])
        .unwrap();

        assert_eq!(hash_struct(&a).unwrap(), hash_struct(&b).unwrap());
    }

    #[test]
    fn absent_value_keeps_name() {
        let null = StructValue::try_from_pairs([
            (id_field(), ScalarValue::Int64(1)),
            (name_field(), ScalarValue::Null),
        ])
        .unwrap();
        let empty = StructValue::try_from_pairs([
            (id_field(), ScalarValue::Int64(1)),
            (name_field(), ScalarValue::from("")),
        ])
        .unwrap();

        assert_eq!(
            "id\u{1f}1\u{1f}name\u{1f}\u{1f}",
            canonical_struct_text(&null).unwrap()
        );
        // Null and empty text render the same. A record without the field at
        // all does not.
        assert_eq!(hash_struct(&null).unwrap(), hash_struct(&empty).unwrap());

        let missing = StructValue::try_from_pairs([(id_field(), ScalarValue::Int64(1))]).unwrap();
        assert_ne!(hash_struct(&null).unwrap(), hash_struct(&missing).unwrap());
    }

    #[test]
    fn separators_prevent_boundary_collisions() {
        let a = StructValue::try_from_pairs([
            (Field::optional(1, "a", DataType::Utf8), ScalarValue::from("bc")),
            (Field::optional(2, "d", DataType::Utf8), ScalarValue::from("e")),
        ])
        .unwrap();
        let b = StructValue::try_from_pairs([
            (Field::optional(1, "a", DataType::Utf8), ScalarValue::from("b")),
            (Field::optional(2, "d", DataType::Utf8), ScalarValue::from("ce")),
        ])
        .unwrap();

        assert_ne!(hash_struct(&a).unwrap(), hash_struct(&b).unwrap());
    }

    #[test]
    fn decimals_render_with_scale() {
        let field = Field::optional(1, "price", DataType::try_new_decimal(9, 2).unwrap());
        let record = StructValue::try_from_pairs([(
            field,
            ScalarValue::from(DecimalScalar::try_new(9, 2, 1420).unwrap()),
        )])
        .unwrap();

        assert_eq!(
            "price\u{1f}14.20\u{1f}",
            canonical_struct_text(&record).unwrap()
        );
    }

    #[test]
    fn nested_field_rejected() {
        let inner = DataType::try_new_struct([Field::optional(10, "x", DataType::Int32)]).unwrap();
        let record = StructValue::try_from_pairs([
            (id_field(), ScalarValue::Int64(1)),
            (Field::optional(2, "inner", inner), ScalarValue::Null),
        ])
        .unwrap();

        let err = hash_struct(&record).unwrap_err();
        assert!(err.get_msg().contains("nested field 'inner'"));

        let list = StructValue::try_from_pairs([(
            Field::optional(3, "tags", DataType::new_list(DataType::Utf8)),
            ScalarValue::Null,
        )])
        .unwrap();
        hash_struct(&list).unwrap_err();
    }
}
