//! Raw float32 coefficient dumps.
//!
//! Dumps are headerless little-endian IEEE 754 single-precision values, the
//! layout the host application writes when reading buffers off the device.

use crate::{Error, Result};
use std::path::Path;

/// Read a whole dump file as float32 values.
pub fn read_f32_dump<P: AsRef<Path>>(path: P) -> Result<Vec<f32>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    if bytes.len() % 4 != 0 {
        return Err(Error::invalid(
            path,
            format!("size {} is not a multiple of 4 bytes", bytes.len()),
        ));
    }

    let values: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    tracing::debug!(file = %path.display(), values = values.len(), "read float32 dump");
    Ok(values)
}

/// Write float32 values as a headerless dump.
pub fn write_f32_dump<P: AsRef<Path>>(path: P, values: &[f32]) -> Result<()> {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn dump_roundtrip_is_bit_exact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("buf.bin");
        let values = [0.0, -1.5, f32::MIN_POSITIVE, 3.25e7, f32::MAX];

        write_f32_dump(&path, &values).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 20);
        assert_eq!(read_f32_dump(&path).unwrap(), values);
    }

    #[test]
    fn truncated_dump_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.bin");
        std::fs::write(&path, [0u8; 7]).unwrap();

        let err = read_f32_dump(&path).unwrap_err();
        assert!(err.to_string().contains("multiple of 4"), "got: {err}");
    }

    #[test]
    fn bytes_are_little_endian() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("one.bin");
        std::fs::write(&path, [0x00, 0x00, 0x80, 0x3f]).unwrap();

        assert_eq!(read_f32_dump(&path).unwrap(), vec![1.0]);
    }
}
