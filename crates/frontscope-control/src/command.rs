//! Command descriptors.

use crate::types::{ParamType, ParamValue, RwMode};
use crate::{ControlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bit set in the command id of read transactions.
pub const READ_BIT: u8 = 0x80;

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Values flow from device to host.
    Read,
    /// Values flow from host to device.
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Access::Read => "Read",
            Access::Write => "Write",
        })
    }
}

/// Inclusive interval of accepted values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl ValueRange {
    /// Create a range.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies in `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// One entry of a command map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Uppercase command name.
    pub name: String,
    /// Resource (servicer) id.
    #[serde(default)]
    pub res_id: u8,
    /// Command id within the resource, below `0x80`.
    pub cmd_id: u8,
    /// Element type.
    #[serde(rename = "type")]
    pub param_type: ParamType,
    /// Access mode.
    pub rw: RwMode,
    /// Values per transaction.
    pub num_values: usize,
    /// Help text.
    #[serde(default)]
    pub info: String,
    /// Hidden commands stay out of listings and dumps.
    #[serde(default)]
    pub hidden: bool,
    /// Accepted sub-ranges for written values; empty accepts anything.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<ValueRange>,
}

impl CommandSpec {
    /// Create a visible command with no range restrictions.
    pub fn new(
        name: &str,
        res_id: u8,
        cmd_id: u8,
        param_type: ParamType,
        rw: RwMode,
        num_values: usize,
        info: &str,
    ) -> Self {
        Self {
            name: name.to_ascii_uppercase(),
            res_id,
            cmd_id,
            param_type,
            rw,
            num_values,
            info: info.to_string(),
            hidden: false,
            ranges: Vec::new(),
        }
    }

    /// Mark the command hidden.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Restrict written values to `ranges`.
    pub fn with_ranges(mut self, ranges: Vec<ValueRange>) -> Self {
        self.ranges = ranges;
        self
    }

    /// Payload size of a transaction, excluding the read status byte.
    pub fn payload_len(&self) -> usize {
        self.num_values * self.param_type.size()
    }

    /// Command id sent for reads.
    pub fn read_id(&self) -> u8 {
        self.cmd_id | READ_BIT
    }

    /// Whether the command appears in listings and dumps.
    pub fn is_listed(&self) -> bool {
        !self.hidden && !self.name.starts_with("SPECIAL_CMD_") && !self.name.starts_with("TEST_")
    }

    /// Decide the direction from the number of arguments.
    ///
    /// Read-only commands take none, write-only commands exactly
    /// `num_values`, read/write commands either.
    pub fn access_for(&self, given: usize) -> Result<Access> {
        let access = match (self.rw, given) {
            (RwMode::ReadOnly | RwMode::ReadWrite, 0) => Some(Access::Read),
            (RwMode::WriteOnly | RwMode::ReadWrite, n) if n == self.num_values => {
                Some(Access::Write)
            }
            _ => None,
        };
        access.ok_or_else(|| ControlError::ArgCount {
            name: self.name.clone(),
            rw: self.rw,
            expected: self.num_values,
            given,
        })
    }

    /// Parse command-line arguments into values of this command's type.
    pub fn parse_values<S: AsRef<str>>(&self, args: &[S]) -> Result<Vec<ParamValue>> {
        if self.param_type == ParamType::Char {
            return Err(ControlError::CharWrite);
        }
        args.iter()
            .map(|arg| self.param_type.parse_value(arg.as_ref()))
            .collect()
    }

    /// Reject values outside every declared range.
    pub fn check_ranges(&self, values: &[ParamValue]) -> Result<()> {
        if self.ranges.is_empty() {
            return Ok(());
        }
        for value in values {
            let v = value.as_f64();
            if !self.ranges.iter().any(|r| r.contains(v)) {
                let ranges: Vec<String> = self.ranges.iter().map(ToString::to_string).collect();
                return Err(ControlError::OutOfRange {
                    name: self.name.clone(),
                    value: value.to_string(),
                    ranges: ranges.join(" "),
                });
            }
        }
        Ok(())
    }

    /// Encode values for a write.
    pub fn encode(&self, values: &[ParamValue]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload_len());
        for value in values {
            value.encode_into(&mut out);
        }
        out
    }

    /// Decode a read payload (status byte already removed).
    pub fn decode(&self, payload: &[u8]) -> Result<Vec<ParamValue>> {
        let size = self.param_type.size();
        if payload.len() != self.payload_len() {
            return Err(ControlError::Command {
                access: Access::Read,
                name: self.name.clone(),
                ret: crate::ControlRet::DataLengthError,
            });
        }
        Ok(payload
            .chunks_exact(size)
            .filter_map(|chunk| ParamValue::decode(self.param_type, chunk))
            .collect())
    }

    /// Render a read result the way the host prints it.
    ///
    /// Character commands print as one string, everything else as
    /// `NAME v1 v2 ...`.
    pub fn format_values(&self, values: &[ParamValue]) -> String {
        if self.param_type == ParamType::Char {
            return values.iter().map(ToString::to_string).collect();
        }
        let mut line = self.name.clone();
        for value in values {
            line.push(' ');
            line.push_str(&value.to_string());
        }
        line
    }
}
