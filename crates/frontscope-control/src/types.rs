//! Parameter types and their wire encoding.
//!
//! Every value travels little-endian. `char` and `uint8` occupy one byte,
//! the other types four.

use crate::{ControlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;

/// Element type of a command's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Single character, read-only.
    Char,
    /// Unsigned byte.
    Uint8,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    Uint32,
    /// 32-bit float.
    Float,
    /// 32-bit float holding an angle in radians.
    Radians,
}

impl ParamType {
    /// Encoded size of one value in bytes.
    pub fn size(self) -> usize {
        match self {
            ParamType::Char | ParamType::Uint8 => 1,
            ParamType::Int32 | ParamType::Uint32 | ParamType::Float | ParamType::Radians => 4,
        }
    }

    /// Lowercase type name used in listings and messages.
    pub fn name(self) -> &'static str {
        match self {
            ParamType::Char => "char",
            ParamType::Uint8 => "uint8",
            ParamType::Int32 => "int32",
            ParamType::Uint32 => "uint32",
            ParamType::Float => "float",
            ParamType::Radians => "radians",
        }
    }

    /// Parse a command-line argument as a value of this type.
    ///
    /// Integers accept decimal or `0x` hexadecimal with an optional sign.
    /// Values that are numbers but do not fit the type fail with
    /// [`ControlError::OutOfTypeRange`].
    pub fn parse_value(self, text: &str) -> Result<ParamValue> {
        let text = text.trim();
        match self {
            ParamType::Char => Err(ControlError::CharWrite),
            ParamType::Uint8 => {
                let v = parse_int(self, text)?;
                u8::try_from(v)
                    .map(ParamValue::Uint8)
                    .map_err(|_| ControlError::out_of_type_range(self, text))
            }
            ParamType::Int32 => {
                let v = parse_int(self, text)?;
                i32::try_from(v)
                    .map(ParamValue::Int32)
                    .map_err(|_| ControlError::out_of_type_range(self, text))
            }
            ParamType::Uint32 => {
                let v = parse_int(self, text)?;
                u32::try_from(v)
                    .map(ParamValue::Uint32)
                    .map_err(|_| ControlError::out_of_type_range(self, text))
            }
            ParamType::Float | ParamType::Radians => {
                let v: f32 = text
                    .parse()
                    .map_err(|_| ControlError::invalid_value(self, text))?;
                let literal_inf = text
                    .trim_start_matches(['+', '-'])
                    .to_ascii_lowercase()
                    .starts_with("inf");
                if v.is_infinite() && !literal_inf {
                    return Err(ControlError::out_of_type_range(self, text));
                }
                Ok(if self == ParamType::Float {
                    ParamValue::Float(v)
                } else {
                    ParamValue::Radians(v)
                })
            }
        }
    }
}

fn parse_int(ty: ParamType, text: &str) -> Result<i128> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = match unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, unsigned),
    };
    if digits.starts_with(['+', '-']) {
        return Err(ControlError::invalid_value(ty, text));
    }
    match i128::from_str_radix(digits, radix) {
        Ok(v) => Ok(if negative { -v } else { v }),
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            Err(ControlError::out_of_type_range(ty, text))
        }
        Err(_) => Err(ControlError::invalid_value(ty, text)),
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParamType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "char" => Ok(ParamType::Char),
            "uint8" => Ok(ParamType::Uint8),
            "int32" => Ok(ParamType::Int32),
            "uint32" => Ok(ParamType::Uint32),
            "float" => Ok(ParamType::Float),
            "radians" => Ok(ParamType::Radians),
            other => Err(format!("unknown parameter type '{other}'")),
        }
    }
}

/// Access mode of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RwMode {
    /// Values can only be read.
    #[serde(rename = "ro")]
    ReadOnly,
    /// Values can only be written.
    #[serde(rename = "wo")]
    WriteOnly,
    /// Values can be read and written.
    #[serde(rename = "rw")]
    ReadWrite,
}

impl RwMode {
    /// Name shown in command listings.
    pub fn name(self) -> &'static str {
        match self {
            RwMode::ReadOnly => "READ ONLY",
            RwMode::WriteOnly => "WRITE ONLY",
            RwMode::ReadWrite => "READ/WRITE",
        }
    }

    /// Whether a read is allowed.
    pub fn readable(self) -> bool {
        self != RwMode::WriteOnly
    }

    /// Whether a write is allowed.
    pub fn writable(self) -> bool {
        self != RwMode::ReadOnly
    }
}

impl fmt::Display for RwMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single typed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// Raw character byte.
    Char(u8),
    /// Unsigned byte.
    Uint8(u8),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Unsigned 32-bit integer.
    Uint32(u32),
    /// 32-bit float.
    Float(f32),
    /// Angle in radians.
    Radians(f32),
}

impl ParamValue {
    /// Type of this value.
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Char(_) => ParamType::Char,
            ParamValue::Uint8(_) => ParamType::Uint8,
            ParamValue::Int32(_) => ParamType::Int32,
            ParamValue::Uint32(_) => ParamType::Uint32,
            ParamValue::Float(_) => ParamType::Float,
            ParamValue::Radians(_) => ParamType::Radians,
        }
    }

    /// Append the little-endian encoding to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match *self {
            ParamValue::Char(v) | ParamValue::Uint8(v) => out.push(v),
            ParamValue::Int32(v) => out.extend_from_slice(&v.to_le_bytes()),
            ParamValue::Uint32(v) => out.extend_from_slice(&v.to_le_bytes()),
            ParamValue::Float(v) | ParamValue::Radians(v) => {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
    }

    /// Decode one value; `bytes` must be exactly `ty.size()` long.
    pub fn decode(ty: ParamType, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != ty.size() {
            return None;
        }
        let word = || -> Option<[u8; 4]> { bytes.try_into().ok() };
        Some(match ty {
            ParamType::Char => ParamValue::Char(bytes[0]),
            ParamType::Uint8 => ParamValue::Uint8(bytes[0]),
            ParamType::Int32 => ParamValue::Int32(i32::from_le_bytes(word()?)),
            ParamType::Uint32 => ParamValue::Uint32(u32::from_le_bytes(word()?)),
            ParamType::Float => ParamValue::Float(f32::from_le_bytes(word()?)),
            ParamType::Radians => ParamValue::Radians(f32::from_le_bytes(word()?)),
        })
    }

    /// Numeric value for range checks.
    pub fn as_f64(&self) -> f64 {
        match *self {
            ParamValue::Char(v) | ParamValue::Uint8(v) => f64::from(v),
            ParamValue::Int32(v) => f64::from(v),
            ParamValue::Uint32(v) => f64::from(v),
            ParamValue::Float(v) | ParamValue::Radians(v) => f64::from(v),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ParamValue::Char(v) => write!(f, "{}", char::from(v)),
            ParamValue::Uint8(v) => write!(f, "{v}"),
            ParamValue::Int32(v) => write!(f, "{v}"),
            ParamValue::Uint32(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Radians(v) => {
                write!(f, "{v} ({:.2} deg)", v.to_degrees())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_wire_format() {
        assert_eq!(ParamType::Char.size(), 1);
        assert_eq!(ParamType::Uint8.size(), 1);
        for ty in [
            ParamType::Int32,
            ParamType::Uint32,
            ParamType::Float,
            ParamType::Radians,
        ] {
            assert_eq!(ty.size(), 4);
        }
    }

    #[test]
    fn integers_accept_hex_and_sign() {
        assert_eq!(
            ParamType::Int32.parse_value("-894564").unwrap(),
            ParamValue::Int32(-894564)
        );
        assert_eq!(
            ParamType::Uint32.parse_value("0xFFFFFFFF").unwrap(),
            ParamValue::Uint32(u32::MAX)
        );
        assert_eq!(
            ParamType::Int32.parse_value("-0x10").unwrap(),
            ParamValue::Int32(-16)
        );
        assert_eq!(
            ParamType::Uint8.parse_value("255").unwrap(),
            ParamValue::Uint8(255)
        );
    }

    #[test]
    fn out_of_type_range_is_rejected() {
        for (ty, text) in [
            (ParamType::Uint8, "256"),
            (ParamType::Uint8, "-1"),
            (ParamType::Int32, "2147483648"),
            (ParamType::Uint32, "-1"),
            (ParamType::Uint32, "0x100000000"),
            (ParamType::Float, "1e39"),
            (ParamType::Int32, "99999999999999999999999999999999999999999"),
        ] {
            let err = ty.parse_value(text).unwrap_err();
            assert!(
                matches!(err, ControlError::OutOfTypeRange { .. }),
                "{ty} {text}: {err}"
            );
        }
    }

    #[test]
    fn garbage_is_invalid_not_out_of_range() {
        let err = ParamType::Int32.parse_value("twelve").unwrap_err();
        assert!(matches!(err, ControlError::InvalidValue { .. }));
        let err = ParamType::Int32.parse_value("--3").unwrap_err();
        assert!(matches!(err, ControlError::InvalidValue { .. }));
    }

    #[test]
    fn char_values_cannot_be_written() {
        assert!(matches!(
            ParamType::Char.parse_value("a"),
            Err(ControlError::CharWrite)
        ));
    }

    #[test]
    fn encode_is_little_endian() {
        let mut out = Vec::new();
        ParamValue::Int32(-2).encode_into(&mut out);
        ParamValue::Uint8(7).encode_into(&mut out);
        assert_eq!(out, [0xFE, 0xFF, 0xFF, 0xFF, 7]);
        assert_eq!(
            ParamValue::decode(ParamType::Int32, &out[..4]),
            Some(ParamValue::Int32(-2))
        );
        assert_eq!(ParamValue::decode(ParamType::Int32, &out[..3]), None);
    }

    #[test]
    fn radians_show_degrees() {
        let text = ParamValue::Radians(std::f32::consts::FRAC_PI_2).to_string();
        assert!(text.ends_with("(90.00 deg)"), "{text}");
    }

    #[test]
    fn float_display_round_trips() {
        let v = 0.1f32 + 0.2f32;
        let text = ParamValue::Float(v).to_string();
        assert_eq!(text.parse::<f32>().unwrap(), v);
    }

    #[test]
    fn rw_mode_names() {
        assert_eq!(RwMode::ReadOnly.name(), "READ ONLY");
        assert_eq!(RwMode::WriteOnly.name(), "WRITE ONLY");
        assert_eq!(RwMode::ReadWrite.name(), "READ/WRITE");
        assert!(!RwMode::WriteOnly.readable());
        assert!(!RwMode::ReadOnly.writable());
    }
}
