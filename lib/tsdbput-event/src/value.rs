use std::fmt::{self, Write as _};

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer,
};

/// The value of a record field.
///
/// Two values are only equal when they are the same variant with equal payloads: `Integer(1)` and `Float(1.0)` differ,
/// and a `NaN` float never equals anything, itself included.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Text.
    Text(String),

    /// Signed integer.
    Integer(i64),

    /// Floating-point number.
    Float(f64),

    /// Boolean.
    Bool(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write_float(f, *v),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Writes a float in its shortest round-trip form, switching to exponent notation for very large or very small
/// magnitudes.
///
/// Exponent notation (`d.ddde+XX`, at least two exponent digits) is used when the decimal exponent is below -4 or at
/// least 6. Integral values carry no decimal point.
fn write_float<W: fmt::Write>(w: &mut W, value: f64) -> fmt::Result {
    if value.is_nan() {
        return w.write_str("NaN");
    }
    if value.is_infinite() {
        return w.write_str(if value > 0.0 { "+Inf" } else { "-Inf" });
    }
    if value == 0.0 {
        return w.write_str(if value.is_sign_negative() { "-0" } else { "0" });
    }

    // `{:e}` yields the shortest digits that round-trip, e.g. `-1.234567e6` or `5e-324`.
    let mut scientific = String::with_capacity(32);
    write!(scientific, "{:e}", value)?;

    let (mantissa, exponent) = scientific.split_once('e').ok_or(fmt::Error)?;
    let exponent: i32 = exponent.parse().map_err(|_| fmt::Error)?;
    let (negative, mantissa) = match mantissa.strip_prefix('-') {
        Some(mantissa) => (true, mantissa),
        None => (false, mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if negative {
        w.write_char('-')?;
    }

    if !(-4..6).contains(&exponent) {
        w.write_str(&digits[..1])?;
        if digits.len() > 1 {
            w.write_char('.')?;
            w.write_str(&digits[1..])?;
        }
        let sign = if exponent < 0 { '-' } else { '+' };
        return write!(w, "e{}{:02}", sign, exponent.unsigned_abs());
    }

    if exponent < 0 {
        w.write_str("0.")?;
        for _ in 0..(-exponent - 1) {
            w.write_char('0')?;
        }
        return w.write_str(&digits);
    }

    let integral_len = exponent as usize + 1;
    if digits.len() <= integral_len {
        w.write_str(&digits)?;
        for _ in digits.len()..integral_len {
            w.write_char('0')?;
        }
        Ok(())
    } else {
        w.write_str(&digits[..integral_len])?;
        w.write_char('.')?;
        w.write_str(&digits[integral_len..])
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FieldValueVisitor;

        impl Visitor<'_> for FieldValueVisitor {
            type Value = FieldValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string, integer, float, or boolean")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(FieldValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(FieldValue::Integer(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                // Anything beyond `i64::MAX` can't be an integer field, so keep it as the nearest float.
                Ok(i64::try_from(v).map_or(FieldValue::Float(v as f64), FieldValue::Integer))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(FieldValue::Float(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(FieldValue::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(FieldValue::Text(v))
            }
        }

        deserializer.deserialize_any(FieldValueVisitor)
    }
}
