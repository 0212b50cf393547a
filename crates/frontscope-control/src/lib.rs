//! Control protocol for the audio front-end device.
//!
//! The host talks to device *servicers* through numbered commands. Each
//! command carries a fixed number of typed values; reads set bit 7 of the
//! command id and get back one status byte followed by the payload.
//!
//! This crate provides:
//!
//! - **Protocol types**: [`ParamType`], [`ParamValue`], [`RwMode`] and the
//!   [`ControlRet`] status codes
//! - **Command maps**: [`CommandMap`] with case-insensitive lookup, loaded
//!   from TOML or the built-in test map
//! - **Devices**: the [`Device`] trait and [`FileDevice`], a simulated device
//!   that keeps its state in a file in the working directory
//! - **Host operations**: [`Host`] for reading, writing, listing and dumping
//!   commands, and [`DfuClient`] for firmware image transfers against
//!   [`SimulatedDfu`]
//!
//! The `fs_host` and `fs_dfu` binaries wrap these for command-line use.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use frontscope_control::{CommandMap, FileDevice, Host, Protocol};
//!
//! let device = FileDevice::new(".", Protocol::I2c);
//! let mut host = Host::new(device, CommandMap::test_map());
//! host.init()?;
//! host.execute("CMD_SMALL", &["1", "2", "3"], &mut std::io::stdout())?;
//! ```

pub mod args;
mod command;
mod command_map;
mod device;
pub mod dfu;
mod host;
mod ret;
mod types;

pub use command::{Access, CommandSpec, ValueRange};
pub use command_map::{CommandMap, edit_distance};
pub use device::{BUFFER_FILE, BUFFER_LEN, Device, FileDevice, Protocol};
pub use dfu::{DfuClient, DfuState, DfuStatus, SimulatedDfu};
pub use host::{Host, MAX_READ_ATTEMPTS, read_raw, write_raw};
pub use ret::ControlRet;
pub use types::{ParamType, ParamValue, RwMode};

use std::path::PathBuf;

/// Exit status for host-side usage errors.
pub const HOST_APP_ERROR: u8 = 255;

/// Error types for control operations.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// No command with this name exists.
    #[error("Command {name} does not exist.{}", suggestion_line(.suggestion))]
    UnknownCommand {
        /// Name as given, uppercased.
        name: String,
        /// Closest existing command.
        suggestion: Option<String>,
    },

    /// Wrong number of values for the command's access mode.
    #[error("{}", arg_count_message(.name, .rw, .expected, .given))]
    ArgCount {
        /// Command name.
        name: String,
        /// Access mode of the command.
        rw: RwMode,
        /// Values the command carries.
        expected: usize,
        /// Values given.
        given: usize,
    },

    /// The value is a number but does not fit the command's type.
    #[error("Value given is out of range of {param_type} type")]
    OutOfTypeRange {
        /// Target type.
        param_type: ParamType,
        /// Text as given.
        value: String,
    },

    /// The value could not be parsed at all.
    #[error("Value '{value}' is not a valid {param_type}")]
    InvalidValue {
        /// Target type.
        param_type: ParamType,
        /// Text as given.
        value: String,
    },

    /// The value lies outside every valid range of the command.
    #[error("Value {value} is outside the valid range of {name}: {ranges}")]
    OutOfRange {
        /// Command name.
        name: String,
        /// Offending value.
        value: String,
        /// Accepted ranges.
        ranges: String,
    },

    /// A write was attempted on a character command.
    #[error("TYPE_CHAR commands can only be READ_ONLY")]
    CharWrite,

    /// The device or servicer returned a failure status.
    #[error("{access} command {name} returned control_ret_t error {}, {}", .ret.code(), .ret)]
    Command {
        /// Direction of the failed transaction.
        access: Access,
        /// Command name.
        name: String,
        /// Returned status.
        ret: ControlRet,
    },

    /// The device refused to initialise.
    #[error("Could not connect to the device: error {}, {}", .0.code(), .0)]
    DeviceInit(ControlRet),

    /// Transport name not recognised.
    #[error("unknown protocol '{0}', expected one of i2c, spi, usb")]
    UnknownProtocol(String),

    /// Command map content is inconsistent.
    #[error("invalid command map: {0}")]
    InvalidMap(String),

    /// Command map file could not be read.
    #[error("failed to read command map {path}: {source}")]
    MapRead {
        /// Map file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Command map file is not valid TOML.
    #[error("failed to parse command map {path}: {source}")]
    MapParse {
        /// Map file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },

    /// A DFU operation left the device in an error state.
    #[error("DFU operation failed: status {status}, state {state}")]
    Dfu {
        /// Reported status.
        status: DfuStatus,
        /// Reported state.
        state: DfuState,
    },

    /// An option that needs a path was given none.
    #[error("Error: missing file path for {option}")]
    MissingPath {
        /// Option name.
        option: String,
    },

    /// An input path does not exist.
    #[error("Error: File at path '{}' not found", .0.display())]
    PathNotFound(PathBuf),

    /// An output path would be overwritten.
    #[error("Error: File at path '{}' already exists", .0.display())]
    PathExists(PathBuf),

    /// Command-line usage error.
    #[error("{0}")]
    Usage(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn suggestion_line(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!("\nMaybe you meant {s}."))
        .unwrap_or_default()
}

fn arg_count_message(name: &str, rw: &RwMode, expected: &usize, given: &usize) -> String {
    match rw {
        RwMode::ReadOnly => {
            format!("Command: {name} is read-only, so it does not require any arguments.")
        }
        RwMode::WriteOnly => format!(
            "Command: {name} is write-only and expects {expected} argument(s), \n{given} are given."
        ),
        RwMode::ReadWrite => format!(
            "Command: {name} is a read/write command.\n\
             If you want to read do not give any arguments to this command.\n\
             If you want to write give {expected} argument(s) to this command, {given} are given."
        ),
    }
}

impl ControlError {
    pub(crate) fn out_of_type_range(param_type: ParamType, value: &str) -> Self {
        ControlError::OutOfTypeRange {
            param_type,
            value: value.to_string(),
        }
    }

    pub(crate) fn invalid_value(param_type: ParamType, value: &str) -> Self {
        ControlError::InvalidValue {
            param_type,
            value: value.to_string(),
        }
    }

    /// Process exit status for this error.
    ///
    /// Device failures exit with their status code, bad values with
    /// `CONTROL_BAD_COMMAND` and host-side usage errors with
    /// [`HOST_APP_ERROR`].
    pub fn exit_code(&self) -> u8 {
        match self {
            ControlError::Command { ret, .. } | ControlError::DeviceInit(ret) => ret.code(),
            ControlError::OutOfTypeRange { .. }
            | ControlError::InvalidValue { .. }
            | ControlError::OutOfRange { .. } => ControlRet::BadCommand.code(),
            _ => HOST_APP_ERROR,
        }
    }
}

/// Convenience result type for control operations.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Install the stderr tracing subscriber used by the binaries.
///
/// `RUST_LOG` overrides the default level, which is `warn` or `debug` when
/// `verbose` is set. Command output goes to stdout and stays unaffected.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init in the same process is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
