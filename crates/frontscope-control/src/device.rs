//! Device transport abstraction and the file-backed simulated device.

use crate::command::READ_BIT;
use crate::ret::ControlRet;
use crate::{ControlError, Result};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A device the host can send control transactions to.
///
/// `get` fills `payload` with a status byte followed by the values; `set`
/// sends the encoded values. Transport failures are returned as the
/// matching [`ControlRet`].
pub trait Device {
    /// Register with the device. `info` is the command map's tag.
    fn init(&mut self, info: &str) -> std::result::Result<(), ControlRet>;

    /// Read transaction. `cmd_id` already carries the read bit.
    fn get(
        &mut self,
        res_id: u8,
        cmd_id: u8,
        payload: &mut [u8],
    ) -> std::result::Result<(), ControlRet>;

    /// Write transaction.
    fn set(&mut self, res_id: u8, cmd_id: u8, payload: &[u8])
    -> std::result::Result<(), ControlRet>;
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn init(&mut self, info: &str) -> std::result::Result<(), ControlRet> {
        (**self).init(info)
    }

    fn get(
        &mut self,
        res_id: u8,
        cmd_id: u8,
        payload: &mut [u8],
    ) -> std::result::Result<(), ControlRet> {
        (**self).get(res_id, cmd_id, payload)
    }

    fn set(
        &mut self,
        res_id: u8,
        cmd_id: u8,
        payload: &[u8],
    ) -> std::result::Result<(), ControlRet> {
        (**self).set(res_id, cmd_id, payload)
    }
}

/// Transport selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// I2C bus.
    #[default]
    I2c,
    /// SPI bus.
    Spi,
    /// USB control transfers.
    Usb,
}

impl FromStr for Protocol {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "i2c" => Ok(Protocol::I2c),
            "spi" => Ok(Protocol::Spi),
            "usb" => Ok(Protocol::Usb),
            _ => Err(ControlError::UnknownProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protocol::I2c => "i2c",
            Protocol::Spi => "spi",
            Protocol::Usb => "usb",
        })
    }
}

/// File holding the simulated device's register contents.
pub const BUFFER_FILE: &str = "test_buf.bin";

/// Size of the simulated register buffer: 20 values of 4 bytes.
pub const BUFFER_LEN: usize = 80;

const CHAR_COMMAND_ID: u8 = 5;
const DEVICE_NAME: &[u8; 20] = b"my name is Pavel\0\0\0\0";

/// Simulated device keeping its state in [`BUFFER_FILE`].
///
/// Every write replaces the whole buffer with the payload padded with zeros.
/// Every read returns a success status followed by the start of the buffer,
/// except command id 5 which returns a fixed device name.
#[derive(Debug, Clone)]
pub struct FileDevice {
    dir: PathBuf,
    protocol: Protocol,
}

impl FileDevice {
    /// Device whose buffer file lives in `dir`.
    pub fn new(dir: impl Into<PathBuf>, protocol: Protocol) -> Self {
        Self {
            dir: dir.into(),
            protocol,
        }
    }

    /// Path of the buffer file.
    pub fn buffer_path(&self) -> PathBuf {
        self.dir.join(BUFFER_FILE)
    }

    /// Write an all-zero buffer file, as a freshly reset device would hold.
    pub fn reset(dir: &Path) -> std::io::Result<()> {
        std::fs::write(dir.join(BUFFER_FILE), [0u8; BUFFER_LEN])
    }

    fn load(&self) -> std::result::Result<Vec<u8>, ControlRet> {
        let buf = std::fs::read(self.buffer_path()).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                tracing::warn!(path = %self.buffer_path().display(), "device buffer missing");
            }
            ControlRet::ControlError
        })?;
        if buf.len() != BUFFER_LEN {
            tracing::warn!(len = buf.len(), "device buffer has wrong size");
            return Err(ControlRet::DataLengthError);
        }
        Ok(buf)
    }
}

impl Device for FileDevice {
    fn init(&mut self, info: &str) -> std::result::Result<(), ControlRet> {
        tracing::debug!(protocol = %self.protocol, info, "simulated device init");
        if info == crate::command_map::TEST_MAP_INFO {
            Ok(())
        } else {
            Err(ControlRet::RegistrationFailed)
        }
    }

    fn get(
        &mut self,
        res_id: u8,
        cmd_id: u8,
        payload: &mut [u8],
    ) -> std::result::Result<(), ControlRet> {
        tracing::debug!(res_id, cmd_id, len = payload.len(), "device get");
        if payload.len() > BUFFER_LEN + 1 {
            return Err(ControlRet::DataLengthError);
        }
        let buf = self.load()?;
        let Some((status, values)) = payload.split_first_mut() else {
            return Err(ControlRet::DataLengthError);
        };
        *status = ControlRet::Success.code();

        let source: &[u8] = if cmd_id & !READ_BIT == CHAR_COMMAND_ID {
            DEVICE_NAME
        } else {
            &buf
        };
        let n = values.len().min(source.len());
        values[..n].copy_from_slice(&source[..n]);
        values[n..].fill(0);
        Ok(())
    }

    fn set(
        &mut self,
        res_id: u8,
        cmd_id: u8,
        payload: &[u8],
    ) -> std::result::Result<(), ControlRet> {
        tracing::debug!(res_id, cmd_id, len = payload.len(), "device set");
        if payload.len() > BUFFER_LEN {
            return Err(ControlRet::DataLengthError);
        }
        let mut buf = [0u8; BUFFER_LEN];
        buf[..payload.len()].copy_from_slice(payload);
        std::fs::write(self.buffer_path(), buf).map_err(|e| {
            tracing::warn!(error = %e, "failed to store device buffer");
            ControlRet::ControlError
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> (tempfile::TempDir, FileDevice) {
        let dir = tempfile::tempdir().unwrap();
        FileDevice::reset(dir.path()).unwrap();
        let dev = FileDevice::new(dir.path(), Protocol::I2c);
        (dir, dev)
    }

    #[test]
    fn init_checks_info_tag() {
        let (_dir, mut dev) = device();
        assert!(dev.init("test").is_ok());
        assert_eq!(dev.init("prod"), Err(ControlRet::RegistrationFailed));
    }

    #[test]
    fn set_then_get_returns_payload() {
        let (_dir, mut dev) = device();
        dev.set(0, 7, &[1, 2, 3, 4]).unwrap();
        let mut out = [0xAAu8; 9];
        dev.get(0, 7 | READ_BIT, &mut out).unwrap();
        assert_eq!(out, [0, 1, 2, 3, 4, 0, 0, 0, 0]);
    }

    #[test]
    fn char_command_returns_device_name() {
        let (_dir, mut dev) = device();
        let mut out = [0u8; 21];
        dev.get(0, 5 | READ_BIT, &mut out).unwrap();
        assert_eq!(&out[1..], DEVICE_NAME);
    }

    #[test]
    fn oversized_payloads_are_length_errors() {
        let (_dir, mut dev) = device();
        assert_eq!(
            dev.set(0, 0, &[0; BUFFER_LEN + 1]),
            Err(ControlRet::DataLengthError)
        );
        let mut out = [0u8; BUFFER_LEN + 2];
        assert_eq!(
            dev.get(0, READ_BIT, &mut out),
            Err(ControlRet::DataLengthError)
        );
    }

    #[test]
    fn missing_or_corrupt_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let mut dev = FileDevice::new(dir.path(), Protocol::Spi);
        let mut out = [0u8; 5];
        assert_eq!(dev.get(0, READ_BIT, &mut out), Err(ControlRet::ControlError));

        std::fs::write(dir.path().join(BUFFER_FILE), [0u8; 10]).unwrap();
        assert_eq!(
            dev.get(0, READ_BIT, &mut out),
            Err(ControlRet::DataLengthError)
        );
    }

    #[test]
    fn protocol_names_parse() {
        assert_eq!("USB".parse::<Protocol>().unwrap(), Protocol::Usb);
        assert_eq!(Protocol::default().to_string(), "i2c");
        assert!("can".parse::<Protocol>().is_err());
    }
}
