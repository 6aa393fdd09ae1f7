//! Arbitrary-precision scalars and curve points parsed out of prover JSON.
//!
//! Provers disagree on how to spell a field element: JSON numbers, decimal
//! strings and `0x` hex strings all show up, sometimes within one artifact.
//! [`Numeric`] coerces every such leaf to a [`BigUint`] up front so codecs
//! only deal with one representation.

use std::collections::BTreeMap;

use num_bigint::BigUint;
use num_traits::Num;
use serde_json::Value;

use crate::error::CodecError;
use crate::system::Endianness;

/// A JSON tree whose numeric leaves have been coerced to [`BigUint`].
#[derive(Clone, Debug, PartialEq)]
pub enum Numeric {
    Scalar(BigUint),
    List(Vec<Numeric>),
    Map(BTreeMap<String, Numeric>),
    /// A leaf that is not a number, e.g. `"protocol": "groth16"`.
    Text(String),
    Null,
}

impl Numeric {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Numeric::Null,
            Value::Bool(b) => Numeric::Text(b.to_string()),
            Value::Number(_) | Value::String(_) => match parse_scalar(value) {
                Ok(n) => Numeric::Scalar(n),
                Err(_) => Numeric::Text(render(value)),
            },
            Value::Array(items) => Numeric::List(items.iter().map(Self::from_json).collect()),
            Value::Object(fields) => Numeric::Map(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn scalar(&self) -> Result<&BigUint, CodecError> {
        match self {
            Numeric::Scalar(n) => Ok(n),
            Numeric::Text(s) => Err(CodecError::InvalidNumber(s.clone())),
            other => Err(CodecError::InvalidNumber(other.describe())),
        }
    }

    pub fn list(&self) -> Result<&[Numeric], CodecError> {
        match self {
            Numeric::List(items) => Ok(items),
            other => Err(CodecError::UnexpectedShape(format!(
                "expected an array, found {}",
                other.describe()
            ))),
        }
    }

    pub fn field(&self, name: &str) -> Result<&Numeric, CodecError> {
        match self {
            Numeric::Map(fields) => fields
                .get(name)
                .ok_or_else(|| CodecError::MissingField(name.to_owned())),
            other => Err(CodecError::UnexpectedShape(format!(
                "expected an object with field `{name}`, found {}",
                other.describe()
            ))),
        }
    }

    pub fn index(&self, i: usize) -> Result<&Numeric, CodecError> {
        self.list()?.get(i).ok_or_else(|| {
            CodecError::UnexpectedShape(format!("expected an array with at least {} items", i + 1))
        })
    }

    fn describe(&self) -> String {
        match self {
            Numeric::Scalar(n) => n.to_string(),
            Numeric::List(items) => format!("an array of {} items", items.len()),
            Numeric::Map(_) => "an object".to_owned(),
            Numeric::Text(s) => format!("`{s}`"),
            Numeric::Null => "null".to_owned(),
        }
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parses a JSON number, decimal string or `0x` hex string.
pub fn parse_scalar(value: &Value) -> Result<BigUint, CodecError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(BigUint::from)
            .ok_or_else(|| CodecError::InvalidNumber(n.to_string())),
        Value::String(s) => parse_scalar_str(s),
        other => Err(CodecError::InvalidNumber(render(other))),
    }
}

pub fn parse_scalar_str(s: &str) -> Result<BigUint, CodecError> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some("") => None,
        Some(hex) if hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            BigUint::from_str_radix(hex, 16).ok()
        }
        Some(_) => None,
        None if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            BigUint::from_str_radix(s, 10).ok()
        }
        None => None,
    };
    parsed.ok_or_else(|| CodecError::InvalidNumber(s.to_owned()))
}

/// Serializes `n` into exactly `width` bytes.
pub fn to_fixed_bytes(
    n: &BigUint,
    width: usize,
    endianness: Endianness,
) -> Result<Vec<u8>, CodecError> {
    let be = n.to_bytes_be();
    // `to_bytes_be` of zero is `[0]`.
    let significant = be.iter().skip_while(|b| **b == 0).count();
    if significant > width {
        return Err(CodecError::ValueTooLarge(width));
    }
    let mut out = vec![0u8; width - significant];
    out.extend_from_slice(&be[be.len() - significant..]);
    if endianness == Endianness::Little {
        out.reverse();
    }
    Ok(out)
}

/// `0x`-prefixed hex of `n` in exactly `width` bytes.
pub fn to_fixed_hex(n: &BigUint, width: usize, endianness: Endianness) -> Result<String, CodecError> {
    Ok(format!("0x{}", hex::encode(to_fixed_bytes(n, width, endianness)?)))
}

/// A point on the first source group, in affine coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct G1 {
    pub x: BigUint,
    pub y: BigUint,
}

/// A point on the second source group. Coordinates live in the quadratic
/// extension and are stored as `[c0, c1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct G2 {
    pub x: [BigUint; 2],
    pub y: [BigUint; 2],
}

impl G1 {
    /// Reads `[x, y]` or projective `[x, y, z]`; `z` is ignored.
    pub fn from_coordinates(point: &Numeric) -> Result<Self, CodecError> {
        Ok(Self {
            x: point.index(0)?.scalar()?.clone(),
            y: point.index(1)?.scalar()?.clone(),
        })
    }

    pub fn to_bytes(&self, width: usize, endianness: Endianness) -> Result<Vec<u8>, CodecError> {
        let mut out = to_fixed_bytes(&self.x, width, endianness)?;
        out.extend(to_fixed_bytes(&self.y, width, endianness)?);
        Ok(out)
    }

    pub fn to_hex(&self, width: usize, endianness: Endianness) -> Result<String, CodecError> {
        Ok(format!("0x{}", hex::encode(self.to_bytes(width, endianness)?)))
    }
}

impl G2 {
    /// Reads `[[x.c0, x.c1], [y.c0, y.c1]]`, optionally followed by a
    /// projective `z` which is ignored.
    pub fn from_coordinates(point: &Numeric) -> Result<Self, CodecError> {
        let pair = |i: usize| -> Result<[BigUint; 2], CodecError> {
            let coordinate = point.index(i)?;
            Ok([
                coordinate.index(0)?.scalar()?.clone(),
                coordinate.index(1)?.scalar()?.clone(),
            ])
        };
        Ok(Self {
            x: pair(0)?,
            y: pair(1)?,
        })
    }

    /// Little-endian encodings lead with `c0`, big-endian ones with `c1`.
    pub fn to_bytes(&self, width: usize, endianness: Endianness) -> Result<Vec<u8>, CodecError> {
        let order: [usize; 2] = match endianness {
            Endianness::Little => [0, 1],
            Endianness::Big => [1, 0],
        };
        let mut out = Vec::with_capacity(width * 4);
        for coordinate in [&self.x, &self.y] {
            for i in order {
                out.extend(to_fixed_bytes(&coordinate[i], width, endianness)?);
            }
        }
        Ok(out)
    }

    pub fn to_hex(&self, width: usize, endianness: Endianness) -> Result<String, CodecError> {
        Ok(format!("0x{}", hex::encode(self.to_bytes(width, endianness)?)))
    }
}
