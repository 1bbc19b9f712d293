use std::fmt;

use lakebucket_error::{BucketError, Result};
use num::BigInt;

use super::datatype::DecimalTypeMeta;

/// Max precision for a decimal backed by an i128.
pub const DECIMAL_MAX_PRECISION: u8 = 38;

pub fn validate_decimal_meta(meta: &DecimalTypeMeta) -> Result<()> {
    if meta.precision == 0 || meta.precision > DECIMAL_MAX_PRECISION {
        return Err(BucketError::new(format!(
            "Precision {} must be between 1 and {DECIMAL_MAX_PRECISION}",
            meta.precision
        )));
    }
    Ok(())
}

/// Represents a single decimal value.
///
/// `value` is the unscaled integer, the logical value is
/// `value * 10^(-scale)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecimalScalar {
    pub precision: u8,
    pub scale: i8,
    pub value: i128,
}

impl DecimalScalar {
    /// Create a new decimal, validating that the unscaled value fits in the
    /// precision.
    pub fn try_new(precision: u8, scale: i8, value: i128) -> Result<Self> {
        validate_decimal_meta(&DecimalTypeMeta::new(precision, scale))?;

        let digits = value.unsigned_abs().checked_ilog10().map(|d| d + 1).unwrap_or(1);
        if digits > precision as u32 {
            return Err(BucketError::new(format!(
                "{value} cannot be stored in decimal with a precision of {precision}"
            )));
        }

        Ok(DecimalScalar {
            precision,
            scale,
            value,
        })
    }

    pub const fn meta(&self) -> DecimalTypeMeta {
        DecimalTypeMeta::new(self.precision, self.scale)
    }

    /// Minimal big-endian two's-complement bytes of the unscaled value.
    ///
    /// Zero encodes as a single zero byte.
    pub fn unscaled_be_bytes(&self) -> Vec<u8> {
        BigInt::from(self.value).to_signed_bytes_be()
    }
}

/// Formats using the canonical decimal text form.
///
/// Plain notation is used when the scale is non-negative and the adjusted
/// exponent is at least -6, scientific notation otherwise.
impl fmt::Display for DecimalScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let coeff = self.value.unsigned_abs().to_string();
        let scale = self.scale as i64;
        let adjusted = -scale + (coeff.len() as i64 - 1);

        if self.value < 0 {
            write!(f, "-")?;
        }

        if scale >= 0 && adjusted >= -6 {
            let scale = scale as usize;
            if scale == 0 {
                write!(f, "{coeff}")
            } else if coeff.len() > scale {
                let (int, frac) = coeff.split_at(coeff.len() - scale);
                write!(f, "{int}.{frac}")
            } else {
                write!(f, "0.{}{coeff}", "0".repeat(scale - coeff.len()))
            }
        } else {
            let (first, rest) = coeff.split_at(1);
            write!(f, "{first}")?;
            if !rest.is_empty() {
                write!(f, ".{rest}")?;
            }
            if adjusted != 0 {
                write!(f, "E")?;
                if adjusted > 0 {
                    write!(f, "+")?;
                }
                write!(f, "{adjusted}")?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(precision: u8, scale: i8, value: i128) -> DecimalScalar {
        DecimalScalar::try_new(precision, scale, value).unwrap()
    }

    #[test]
    fn validate_precision() {
        DecimalScalar::try_new(3, 0, 222).unwrap();
        DecimalScalar::try_new(4, 0, -222).unwrap();
        DecimalScalar::try_new(1, 0, 0).unwrap();

        DecimalScalar::try_new(2, 0, 222).unwrap_err();
        DecimalScalar::try_new(39, 0, 222).unwrap_err();
        DecimalScalar::try_new(0, 0, 0).unwrap_err();
    }

    #[test]
    fn unscaled_bytes_minimal() {
        assert_eq!(vec![0x05, 0x8c], dec(9, 2, 1420).unscaled_be_bytes());
        assert_eq!(vec![0x00], dec(9, 2, 0).unscaled_be_bytes());
        assert_eq!(vec![0x7f], dec(9, 2, 127).unscaled_be_bytes());
        assert_eq!(vec![0x00, 0x80], dec(9, 2, 128).unscaled_be_bytes());
        assert_eq!(vec![0xff], dec(9, 2, -1).unscaled_be_bytes());
        assert_eq!(vec![0x80], dec(9, 2, -128).unscaled_be_bytes());
        assert_eq!(vec![0xff, 0x7f], dec(9, 2, -129).unscaled_be_bytes());
    }

    #[test]
    fn display_plain() {
        assert_eq!("14.20", dec(9, 2, 1420).to_string());
        assert_eq!("-0.5", dec(9, 1, -5).to_string());
        assert_eq!("0.001", dec(9, 3, 1).to_string());
        assert_eq!("0.00", dec(9, 2, 0).to_string());
        assert_eq!("42", dec(9, 0, 42).to_string());
    }

    #[test]
    fn display_scientific() {
        assert_eq!("1E-7", dec(9, 7, 1).to_string());
        assert_eq!("1.23E+4", dec(9, -2, 123).to_string());
        assert_eq!("-4.5E-8", dec(9, 9, -45).to_string());
    }
}
