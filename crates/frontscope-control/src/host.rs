//! Host-side command execution.

use crate::command::{Access, CommandSpec};
use crate::command_map::CommandMap;
use crate::device::Device;
use crate::ret::ControlRet;
use crate::types::ParamValue;
use crate::{ControlError, Result};
use std::io::Write;
use std::path::Path;

/// Attempts before a busy read or write is given up.
pub const MAX_READ_ATTEMPTS: usize = 10_000;

/// Attempts after which a slow read is reported.
const SLOW_READ_ATTEMPTS: usize = 1000;

fn command_error(spec: &CommandSpec, access: Access, ret: ControlRet) -> ControlError {
    ControlError::Command {
        access,
        name: spec.name.clone(),
        ret,
    }
}

/// Read the raw payload of `spec`, without the status byte.
///
/// The device is polled again for as long as it answers with a non-zero
/// status byte.
pub fn read_raw<D: Device + ?Sized>(device: &mut D, spec: &CommandSpec) -> Result<Vec<u8>> {
    let mut data = vec![0u8; spec.payload_len() + 1];
    for attempt in 1..=MAX_READ_ATTEMPTS {
        device
            .get(spec.res_id, spec.read_id(), &mut data)
            .map_err(|ret| command_error(spec, Access::Read, ret))?;
        if data[0] == ControlRet::Success.code() {
            data.remove(0);
            return Ok(data);
        }
        if attempt == SLOW_READ_ATTEMPTS {
            tracing::warn!(command = %spec.name, "Read is taking a while..");
        }
        tracing::trace!(command = %spec.name, status = data[0], attempt, "read not ready");
    }
    let ret = ControlRet::from_code(data[0]).unwrap_or(ControlRet::ControlError);
    Err(command_error(spec, Access::Read, ret))
}

/// Write a raw payload to `spec`, retrying while the servicer is busy.
pub fn write_raw<D: Device + ?Sized>(
    device: &mut D,
    spec: &CommandSpec,
    payload: &[u8],
) -> Result<()> {
    for _ in 0..MAX_READ_ATTEMPTS {
        match device.set(spec.res_id, spec.cmd_id, payload) {
            Ok(()) => return Ok(()),
            Err(ControlRet::ServicerCommandRetry) => continue,
            Err(ret) => return Err(command_error(spec, Access::Write, ret)),
        }
    }
    Err(command_error(
        spec,
        Access::Write,
        ControlRet::ServicerCommandRetry,
    ))
}

/// Executes named commands against a device.
pub struct Host<D> {
    device: D,
    map: CommandMap,
    bypass_range_check: bool,
}

impl<D: Device> Host<D> {
    /// Create a host for `device` speaking the commands in `map`.
    pub fn new(device: D, map: CommandMap) -> Self {
        Self {
            device,
            map,
            bypass_range_check: false,
        }
    }

    /// Skip the per-command value range check on writes.
    pub fn bypass_range_check(mut self, bypass: bool) -> Self {
        self.bypass_range_check = bypass;
        self
    }

    /// The command map in use.
    pub fn map(&self) -> &CommandMap {
        &self.map
    }

    /// Register with the device.
    pub fn init(&mut self) -> Result<()> {
        self.device
            .init(&self.map.info)
            .map_err(ControlError::DeviceInit)
    }

    /// Read the current values of a command.
    pub fn read(&mut self, name: &str) -> Result<Vec<ParamValue>> {
        let spec = self.map.lookup(name)?;
        spec.access_for(0)?;
        spec.decode(&read_raw(&mut self.device, spec)?)
    }

    /// Write values given as text.
    pub fn write<S: AsRef<str>>(&mut self, name: &str, args: &[S]) -> Result<()> {
        let spec = self.map.lookup(name)?;
        if spec.access_for(args.len())? != Access::Write {
            return Err(ControlError::ArgCount {
                name: spec.name.clone(),
                rw: spec.rw,
                expected: spec.num_values,
                given: args.len(),
            });
        }
        let values = spec.parse_values(args)?;
        if self.bypass_range_check {
            tracing::debug!(command = %spec.name, "range check bypassed");
        } else {
            spec.check_ranges(&values)?;
        }
        write_raw(&mut self.device, spec, &spec.encode(&values))
    }

    /// Run one command line: no arguments reads and prints, otherwise writes.
    pub fn execute<S: AsRef<str>>(
        &mut self,
        name: &str,
        args: &[S],
        out: &mut impl Write,
    ) -> Result<()> {
        let spec = self.map.lookup(name)?;
        match spec.access_for(args.len())? {
            Access::Read => {
                let values = spec.decode(&read_raw(&mut self.device, spec)?)?;
                writeln!(out, "{}", spec.format_values(&values))?;
                Ok(())
            }
            Access::Write => self.write(name, args),
        }
    }

    /// Execute every non-blank line of `path` as a command with arguments.
    ///
    /// Stops at the first failing line. Returns the number of commands run.
    pub fn execute_command_list(&mut self, path: &Path, out: &mut impl Write) -> Result<usize> {
        if !path.is_file() {
            return Err(ControlError::PathNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let mut executed = 0;
        for (lineno, line) in text.lines().enumerate() {
            let mut tokens = line.split_whitespace();
            let Some(name) = tokens.next() else {
                continue;
            };
            let args: Vec<&str> = tokens.collect();
            tracing::debug!(line = lineno + 1, command = name, args = args.len(), "executing");
            self.execute(name, &args, out)?;
            executed += 1;
        }
        Ok(executed)
    }

    /// Print the listed commands with their access mode, type, size and help.
    pub fn list_commands(&self, out: &mut impl Write) -> Result<()> {
        let name_width = self.map.listed().map(|c| c.name.len()).max().unwrap_or(0);
        for cmd in self.map.listed() {
            let mut info = cmd.info.clone();
            if !cmd.ranges.is_empty() {
                let ranges: Vec<String> = cmd.ranges.iter().map(ToString::to_string).collect();
                info.push_str(&format!(" Valid range(s): {}", ranges.join(" ")));
            }
            writeln!(
                out,
                "{:<name_width$}  {:<10}  {:<7}  {:>3}  {}",
                cmd.name,
                cmd.rw.name(),
                cmd.param_type.name(),
                cmd.num_values,
                info
            )?;
        }
        Ok(())
    }

    /// Read and print every listed readable command.
    pub fn dump_params(&mut self, out: &mut impl Write) -> Result<()> {
        for spec in self.map.listed().filter(|c| c.rw.readable()) {
            let values = spec.decode(&read_raw(&mut self.device, spec)?)?;
            writeln!(out, "{}", spec.format_values(&values))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{FileDevice, Protocol};

    fn host() -> (tempfile::TempDir, Host<FileDevice>) {
        let dir = tempfile::tempdir().unwrap();
        FileDevice::reset(dir.path()).unwrap();
        let mut host = Host::new(
            FileDevice::new(dir.path(), Protocol::I2c),
            CommandMap::test_map(),
        );
        host.init().unwrap();
        (dir, host)
    }

    /// Device that reports busy a fixed number of times before answering.
    struct Busy {
        remaining: usize,
    }

    impl Device for Busy {
        fn init(&mut self, _info: &str) -> std::result::Result<(), ControlRet> {
            Ok(())
        }

        fn get(
            &mut self,
            _res_id: u8,
            _cmd_id: u8,
            payload: &mut [u8],
        ) -> std::result::Result<(), ControlRet> {
            payload.fill(0);
            if self.remaining > 0 {
                self.remaining -= 1;
                payload[0] = ControlRet::ServicerCommandRetry.code();
            } else {
                payload[1..].fill(7);
            }
            Ok(())
        }

        fn set(
            &mut self,
            _res_id: u8,
            _cmd_id: u8,
            _payload: &[u8],
        ) -> std::result::Result<(), ControlRet> {
            Ok(())
        }
    }

    #[test]
    fn write_then_read_round_trips() {
        let (_dir, mut host) = host();
        host.write("cmd_small", &["156", "-894564", "4586543"]).unwrap();
        let mut out = Vec::new();
        host.execute("CMD_SMALL", &[] as &[&str], &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "CMD_SMALL 156 -894564 4586543\n"
        );
    }

    #[test]
    fn busy_reads_are_retried() {
        let spec = CommandMap::test_map().find("CMD_UINT8").cloned().unwrap();
        let mut dev = Busy { remaining: 5 };
        let raw = read_raw(&mut dev, &spec).unwrap();
        assert_eq!(raw, vec![7; 20]);
        assert_eq!(dev.remaining, 0);

        let mut stuck = Busy {
            remaining: usize::MAX,
        };
        match read_raw(&mut stuck, &spec) {
            Err(ControlError::Command { ret, .. }) => {
                assert_eq!(ret, ControlRet::ServicerCommandRetry);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ranged_writes_respect_bypass() {
        let (dir, mut host) = host();
        host.write("CMD_RANGED", &["0.5", "15"]).unwrap();
        assert!(matches!(
            host.write("CMD_RANGED", &["5", "15"]),
            Err(ControlError::OutOfRange { .. })
        ));

        let mut host = Host::new(
            FileDevice::new(dir.path(), Protocol::I2c),
            CommandMap::test_map(),
        )
        .bypass_range_check(true);
        host.write("CMD_RANGED", &["5", "15"]).unwrap();
        assert_eq!(
            host.read("CMD_RANGED").unwrap(),
            vec![ParamValue::Float(5.0), ParamValue::Float(15.0)]
        );
    }

    #[test]
    fn listing_hides_hidden_commands() {
        let (_dir, host) = host();
        let mut out = Vec::new();
        host.list_commands(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("CMD_FLOAT"));
        assert!(text.contains("READ/WRITE"));
        assert!(text.contains("READ ONLY"));
        assert!(text.contains("Valid range(s): [-1, 1] [10, 20]"));
        assert!(!text.contains("CMD_HIDDEN"));
    }

    #[test]
    fn dump_reads_every_listed_command() {
        let (_dir, mut host) = host();
        let mut out = Vec::new();
        host.dump_params(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let listed = host.map().listed().count();
        assert_eq!(text.lines().count(), listed);
        assert!(text.lines().any(|l| l.starts_with("my name is Pavel")));
        assert!(!text.contains("CMD_HIDDEN"));
    }

    #[test]
    fn command_list_skips_blank_lines() {
        let (dir, mut host) = host();
        let list = dir.path().join("commands.txt");
        std::fs::write(&list, "CMD_SMALL 156   -894564     4586543\n\n   \nCMD_SMALL\n").unwrap();
        let mut out = Vec::new();
        let n = host.execute_command_list(&list, &mut out).unwrap();
        assert_eq!(n, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "CMD_SMALL 156 -894564 4586543\n"
        );
    }

    #[test]
    fn registration_requires_test_tag() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = CommandMap::test_map();
        map.info = "other".into();
        let mut host = Host::new(FileDevice::new(dir.path(), Protocol::Usb), map);
        let err = host.init().unwrap_err();
        assert_eq!(err.exit_code(), ControlRet::RegistrationFailed.code());
    }
}
