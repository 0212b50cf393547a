//! Device firmware upgrade over the control protocol.
//!
//! DFU requests travel as ordinary commands to a dedicated resource. The
//! state machine follows USB DFU 1.1: after `SETALTERNATE` the device sits in
//! `dfuIDLE`, downloads alternate between `DNLOAD` and `GETSTATUS`, and a
//! zero-length `DNLOAD` triggers manifestation.
//!
//! [`SimulatedDfu`] implements the device side against two image files in a
//! directory; [`DfuClient`] drives any [`Device`] through the host side.

use crate::command::{CommandSpec, READ_BIT};
use crate::command_map::CommandMap;
use crate::device::Device;
use crate::host::{read_raw, write_raw};
use crate::ret::ControlRet;
use crate::types::{ParamType, RwMode};
use crate::{ControlError, Result};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resource id of the DFU servicer.
pub const DFU_RESID: u8 = 0xF0;

/// Info tag of the DFU command map.
pub const DFU_MAP_INFO: &str = "dfu";

/// Bytes carried by one `DNLOAD` or `UPLOAD` block.
pub const TRANSFER_BLOCK_SIZE: usize = 64;

/// Alternate setting addressing the factory image.
pub const ALT_FACTORY: u8 = 0;

/// Alternate setting addressing the upgrade image.
pub const ALT_UPGRADE: u8 = 1;

/// Factory image file of [`SimulatedDfu`].
pub const FACTORY_IMAGE: &str = "dfu_factory.bin";

/// Upgrade image file of [`SimulatedDfu`].
pub const UPGRADE_IMAGE: &str = "dfu_upgrade.bin";

const DETACH: u8 = 0;
const DNLOAD: u8 = 1;
const UPLOAD: u8 = 2;
const GETSTATUS: u8 = 3;
const CLRSTATUS: u8 = 4;
const GETSTATE: u8 = 5;
const ABORT: u8 = 6;
const SETALTERNATE: u8 = 64;
const TRANSFERBLOCK: u8 = 65;
const GETVERSION: u8 = 88;
const REBOOT: u8 = 89;

/// Commands understood by the DFU servicer.
pub fn command_map() -> CommandMap {
    use RwMode::{ReadOnly, ReadWrite, WriteOnly};

    let block = TRANSFER_BLOCK_SIZE + 1;
    let cmd = |name, id, rw, n, info| CommandSpec::new(name, DFU_RESID, id, ParamType::Uint8, rw, n, info);
    let commands = vec![
        cmd("DFU_DETACH", DETACH, WriteOnly, 1, "Leave DFU mode and restart the application"),
        cmd("DFU_DNLOAD", DNLOAD, WriteOnly, block, "Length byte followed by one image block"),
        cmd("DFU_UPLOAD", UPLOAD, ReadOnly, block, "Length byte followed by one image block"),
        cmd("DFU_GETSTATUS", GETSTATUS, ReadOnly, 5, "Status, 24-bit poll timeout in ms, state"),
        cmd("DFU_CLRSTATUS", CLRSTATUS, WriteOnly, 1, "Clear an error status"),
        cmd("DFU_GETSTATE", GETSTATE, ReadOnly, 1, "Current DFU state"),
        cmd("DFU_ABORT", ABORT, WriteOnly, 1, "Abort the transfer and return to dfuIDLE"),
        cmd("DFU_SETALTERNATE", SETALTERNATE, WriteOnly, 1, "Select the factory or upgrade image"),
        cmd("DFU_TRANSFERBLOCK", TRANSFERBLOCK, ReadWrite, 2, "Current transfer block number"),
        cmd("DFU_GETVERSION", GETVERSION, ReadOnly, 3, "Firmware version"),
        cmd("DFU_REBOOT", REBOOT, WriteOnly, 1, "Reboot the device"),
    ];
    CommandMap::from_table(DFU_MAP_INFO, commands)
}

/// DFU device state (DFU 1.1, section 6.1.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DfuState {
    /// Running the application.
    AppIdle = 0,
    /// Detach requested, waiting for reset.
    AppDetach = 1,
    /// Idle in DFU mode.
    DfuIdle = 2,
    /// Block received, waiting for `GETSTATUS`.
    DnloadSync = 3,
    /// Programming a block.
    DnBusy = 4,
    /// Ready for the next block.
    DnloadIdle = 5,
    /// Download finished, waiting for `GETSTATUS`.
    ManifestSync = 6,
    /// Manifesting the image.
    Manifest = 7,
    /// Manifested, waiting for reset.
    ManifestWaitReset = 8,
    /// Upload in progress.
    UploadIdle = 9,
    /// An error occurred, cleared by `CLRSTATUS`.
    Error = 10,
}

impl DfuState {
    const ALL: [DfuState; 11] = [
        DfuState::AppIdle,
        DfuState::AppDetach,
        DfuState::DfuIdle,
        DfuState::DnloadSync,
        DfuState::DnBusy,
        DfuState::DnloadIdle,
        DfuState::ManifestSync,
        DfuState::Manifest,
        DfuState::ManifestWaitReset,
        DfuState::UploadIdle,
        DfuState::Error,
    ];

    /// Decode a wire value.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| *s as u8 == code)
    }

    /// Name as used by the USB DFU class.
    pub fn name(self) -> &'static str {
        match self {
            DfuState::AppIdle => "appIDLE",
            DfuState::AppDetach => "appDETACH",
            DfuState::DfuIdle => "dfuIDLE",
            DfuState::DnloadSync => "dfuDNLOAD-SYNC",
            DfuState::DnBusy => "dfuDNBUSY",
            DfuState::DnloadIdle => "dfuDNLOAD-IDLE",
            DfuState::ManifestSync => "dfuMANIFEST-SYNC",
            DfuState::Manifest => "dfuMANIFEST",
            DfuState::ManifestWaitReset => "dfuMANIFEST-WAIT-RESET",
            DfuState::UploadIdle => "dfuUPLOAD-IDLE",
            DfuState::Error => "dfuERROR",
        }
    }
}

impl fmt::Display for DfuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// DFU status code (DFU 1.1, section 6.1.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DfuStatus {
    /// No error.
    Ok = 0,
    /// File is not targeted for this device.
    Target = 1,
    /// File failed a vendor-specific check.
    File = 2,
    /// Memory could not be written.
    Write = 3,
    /// Memory erase failed.
    Erase = 4,
    /// Erase check failed.
    CheckErased = 5,
    /// Program memory function failed.
    Prog = 6,
    /// Programmed memory failed verification.
    Verify = 7,
    /// Address out of range.
    Address = 8,
    /// Zero-length download before all data arrived.
    NotDone = 9,
    /// Firmware is corrupt.
    Firmware = 10,
    /// Vendor-specific error.
    Vendor = 11,
    /// Unexpected USB reset.
    UsbReset = 12,
    /// Unexpected power-on reset.
    PowerOnReset = 13,
    /// Unknown error.
    Unknown = 14,
    /// Unexpected request.
    StalledPacket = 15,
}

impl DfuStatus {
    const ALL: [DfuStatus; 16] = [
        DfuStatus::Ok,
        DfuStatus::Target,
        DfuStatus::File,
        DfuStatus::Write,
        DfuStatus::Erase,
        DfuStatus::CheckErased,
        DfuStatus::Prog,
        DfuStatus::Verify,
        DfuStatus::Address,
        DfuStatus::NotDone,
        DfuStatus::Firmware,
        DfuStatus::Vendor,
        DfuStatus::UsbReset,
        DfuStatus::PowerOnReset,
        DfuStatus::Unknown,
        DfuStatus::StalledPacket,
    ];

    /// Decode a wire value; codes past the table are `errUNKNOWN`.
    pub fn from_code(code: u8) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| *s as u8 == code)
            .unwrap_or(DfuStatus::Unknown)
    }

    /// Name as used by the USB DFU class.
    pub fn name(self) -> &'static str {
        match self {
            DfuStatus::Ok => "OK",
            DfuStatus::Target => "errTARGET",
            DfuStatus::File => "errFILE",
            DfuStatus::Write => "errWRITE",
            DfuStatus::Erase => "errERASE",
            DfuStatus::CheckErased => "errCHECK_ERASED",
            DfuStatus::Prog => "errPROG",
            DfuStatus::Verify => "errVERIFY",
            DfuStatus::Address => "errADDRESS",
            DfuStatus::NotDone => "errNOTDONE",
            DfuStatus::Firmware => "errFIRMWARE",
            DfuStatus::Vendor => "errVENDOR",
            DfuStatus::UsbReset => "errUSBR",
            DfuStatus::PowerOnReset => "errPOR",
            DfuStatus::Unknown => "errUNKNOWN",
            DfuStatus::StalledPacket => "errSTALLEDPKT",
        }
    }
}

impl fmt::Display for DfuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// File-backed DFU servicer.
///
/// The factory image is read-only; downloads go to the upgrade image and
/// are written out when manifested.
#[derive(Debug)]
pub struct SimulatedDfu {
    dir: PathBuf,
    state: DfuState,
    status: DfuStatus,
    alternate: u8,
    download: Vec<u8>,
    upload: Option<(Vec<u8>, usize)>,
    block: u16,
    version: [u8; 3],
}

impl SimulatedDfu {
    /// Device serving images from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            state: DfuState::AppIdle,
            status: DfuStatus::Ok,
            alternate: ALT_UPGRADE,
            download: Vec::new(),
            upload: None,
            block: 0,
            version: [1, 0, 0],
        }
    }

    /// Report `version` from `GETVERSION`.
    pub fn with_version(mut self, version: [u8; 3]) -> Self {
        self.version = version;
        self
    }

    /// Current state.
    pub fn state(&self) -> DfuState {
        self.state
    }

    /// Image file behind an alternate setting.
    pub fn image_path(&self, alternate: u8) -> PathBuf {
        let name = if alternate == ALT_FACTORY {
            FACTORY_IMAGE
        } else {
            UPGRADE_IMAGE
        };
        self.dir.join(name)
    }

    fn fail(&mut self, status: DfuStatus) {
        tracing::debug!(%status, state = %self.state, "dfu error");
        self.status = status;
        self.state = DfuState::Error;
    }

    fn reset_transfers(&mut self) {
        self.download.clear();
        self.upload = None;
        self.block = 0;
    }

    fn manifest(&mut self) {
        let path = self.image_path(self.alternate);
        match std::fs::write(&path, &self.download) {
            Ok(()) => {
                tracing::info!(path = %path.display(), bytes = self.download.len(), "image manifested");
                self.reset_transfers();
                self.state = DfuState::DfuIdle;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to store image");
                self.fail(DfuStatus::Write);
            }
        }
    }

    fn next_upload_block(&mut self, out: &mut [u8]) -> std::result::Result<(), ControlRet> {
        if !matches!(self.state, DfuState::DfuIdle | DfuState::UploadIdle) {
            self.fail(DfuStatus::StalledPacket);
            return Err(ControlRet::CommandIgnoredInDevice);
        }
        if self.upload.is_none() {
            match std::fs::read(self.image_path(self.alternate)) {
                Ok(image) => self.upload = Some((image, 0)),
                Err(_) => {
                    self.fail(DfuStatus::File);
                    return Err(ControlRet::ControlError);
                }
            }
        }
        let Some((image, offset)) = self.upload.as_mut() else {
            return Err(ControlRet::ControlError);
        };
        let n = (image.len() - *offset).min(TRANSFER_BLOCK_SIZE).min(out.len().saturating_sub(1));
        out.fill(0);
        out[0] = n as u8;
        out[1..=n].copy_from_slice(&image[*offset..*offset + n]);
        *offset += n;
        self.block = self.block.wrapping_add(1);
        if n < TRANSFER_BLOCK_SIZE {
            self.upload = None;
            self.block = 0;
            self.state = DfuState::DfuIdle;
        } else {
            self.state = DfuState::UploadIdle;
        }
        Ok(())
    }

    fn accept_block(&mut self, payload: &[u8]) -> std::result::Result<(), ControlRet> {
        let Some((&len, data)) = payload.split_first() else {
            return Err(ControlRet::ServicerWrongCommandLen);
        };
        let len = len as usize;
        if len > TRANSFER_BLOCK_SIZE || len > data.len() {
            return Err(ControlRet::ServicerWrongPayload);
        }
        match (self.state, len) {
            (DfuState::DfuIdle | DfuState::DnloadIdle, _) if self.alternate == ALT_FACTORY => {
                self.fail(DfuStatus::Write);
            }
            (DfuState::DfuIdle, 0) => self.fail(DfuStatus::NotDone),
            (DfuState::DnloadIdle, 0) => self.state = DfuState::ManifestSync,
            (DfuState::DfuIdle | DfuState::DnloadIdle, _) => {
                self.download.extend_from_slice(&data[..len]);
                self.block = self.block.wrapping_add(1);
                self.state = DfuState::DnloadSync;
            }
            _ => self.fail(DfuStatus::StalledPacket),
        }
        Ok(())
    }
}

impl Device for SimulatedDfu {
    fn init(&mut self, info: &str) -> std::result::Result<(), ControlRet> {
        if info == DFU_MAP_INFO {
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
        if res_id != DFU_RESID {
            return Err(ControlRet::BadResource);
        }
        let Some((status, out)) = payload.split_first_mut() else {
            return Err(ControlRet::DataLengthError);
        };
        *status = ControlRet::Success.code();
        match cmd_id & !READ_BIT {
            GETSTATUS => {
                match self.state {
                    DfuState::DnloadSync => self.state = DfuState::DnloadIdle,
                    DfuState::ManifestSync => self.manifest(),
                    _ => {}
                }
                if out.len() < 5 {
                    return Err(ControlRet::DataLengthError);
                }
                // Zero poll timeout: the simulation never needs the host to wait.
                out[..5].copy_from_slice(&[self.status as u8, 0, 0, 0, self.state as u8]);
            }
            GETSTATE => {
                let first = out.first_mut().ok_or(ControlRet::DataLengthError)?;
                *first = self.state as u8;
            }
            UPLOAD => self.next_upload_block(out)?,
            TRANSFERBLOCK => {
                let bytes = self.block.to_le_bytes();
                let n = out.len().min(2);
                out[..n].copy_from_slice(&bytes[..n]);
            }
            GETVERSION => {
                let n = out.len().min(3);
                out[..n].copy_from_slice(&self.version[..n]);
            }
            _ => return Err(ControlRet::ServicerWrongCommandId),
        }
        Ok(())
    }

    fn set(
        &mut self,
        res_id: u8,
        cmd_id: u8,
        payload: &[u8],
    ) -> std::result::Result<(), ControlRet> {
        if res_id != DFU_RESID {
            return Err(ControlRet::BadResource);
        }
        match cmd_id {
            SETALTERNATE => {
                let alt = *payload.first().ok_or(ControlRet::DataLengthError)?;
                if alt != ALT_FACTORY && alt != ALT_UPGRADE {
                    self.fail(DfuStatus::Target);
                } else if matches!(self.state, DfuState::AppIdle | DfuState::DfuIdle) {
                    self.alternate = alt;
                    self.reset_transfers();
                    self.state = DfuState::DfuIdle;
                } else {
                    self.fail(DfuStatus::StalledPacket);
                }
            }
            DNLOAD => self.accept_block(payload)?,
            CLRSTATUS => {
                self.status = DfuStatus::Ok;
                self.state = DfuState::DfuIdle;
            }
            ABORT => {
                self.reset_transfers();
                self.state = DfuState::DfuIdle;
            }
            TRANSFERBLOCK => {
                let bytes: [u8; 2] = payload
                    .get(..2)
                    .and_then(|b| b.try_into().ok())
                    .ok_or(ControlRet::DataLengthError)?;
                self.block = u16::from_le_bytes(bytes);
            }
            DETACH | REBOOT => {
                tracing::info!("simulated device reboot");
                self.reset_transfers();
                self.status = DfuStatus::Ok;
                self.state = DfuState::AppIdle;
            }
            _ => return Err(ControlRet::ServicerWrongCommandId),
        }
        Ok(())
    }
}

/// Host side of the DFU protocol.
pub struct DfuClient<D> {
    device: D,
    map: CommandMap,
    poll_limit: usize,
}

impl<D: Device> DfuClient<D> {
    /// Client for `device` using the standard DFU command map.
    pub fn new(device: D) -> Self {
        Self {
            device,
            map: command_map(),
            poll_limit: 1000,
        }
    }

    /// Register with the device.
    pub fn init(&mut self) -> Result<()> {
        self.device
            .init(&self.map.info)
            .map_err(ControlError::DeviceInit)
    }

    /// Consume the client and return the device.
    pub fn into_device(self) -> D {
        self.device
    }

    fn get(&mut self, name: &str) -> Result<Vec<u8>> {
        let spec = self.map.lookup(name)?;
        tracing::debug!(command = name, "send");
        read_raw(&mut self.device, spec)
    }

    fn set(&mut self, name: &str, payload: &[u8]) -> Result<()> {
        let spec = self.map.lookup(name)?;
        let mut data = payload.to_vec();
        data.resize(spec.payload_len(), 0);
        tracing::debug!(command = name, len = payload.len(), "send");
        write_raw(&mut self.device, spec, &data)
    }

    /// `GETSTATUS`, honoring the poll timeout the device asks for.
    pub fn get_status(&mut self) -> Result<(DfuStatus, DfuState)> {
        let values = self.get("DFU_GETSTATUS")?;
        let status = DfuStatus::from_code(values[0]);
        let timeout = u32::from_le_bytes([values[1], values[2], values[3], 0]);
        let state = DfuState::from_code(values[4]).unwrap_or(DfuState::Error);
        tracing::debug!(%status, %state, timeout_ms = timeout, "DFU_GETSTATUS");
        if timeout > 0 {
            std::thread::sleep(Duration::from_millis(u64::from(timeout)));
        }
        Ok((status, state))
    }

    /// `GETSTATE`.
    pub fn get_state(&mut self) -> Result<DfuState> {
        let values = self.get("DFU_GETSTATE")?;
        Ok(DfuState::from_code(values[0]).unwrap_or(DfuState::Error))
    }

    /// `CLRSTATUS`.
    pub fn clear_status(&mut self) -> Result<()> {
        self.set("DFU_CLRSTATUS", &[])
    }

    /// `ABORT`.
    pub fn abort(&mut self) -> Result<()> {
        self.set("DFU_ABORT", &[])
    }

    /// `SETALTERNATE`.
    pub fn set_alternate(&mut self, alternate: u8) -> Result<()> {
        tracing::debug!(alternate, "DFU_SETALTERNATE");
        self.set("DFU_SETALTERNATE", &[alternate])
    }

    /// Poll until the device reports `target`, clearing and failing on
    /// `dfuERROR`.
    fn wait_for(&mut self, target: DfuState) -> Result<()> {
        let mut last = (DfuStatus::Ok, DfuState::Error);
        for _ in 0..self.poll_limit {
            last = self.get_status()?;
            match last.1 {
                s if s == target => return Ok(()),
                DfuState::Error => {
                    self.clear_status()?;
                    return Err(ControlError::Dfu {
                        status: last.0,
                        state: last.1,
                    });
                }
                _ => {}
            }
        }
        Err(ControlError::Dfu {
            status: last.0,
            state: last.1,
        })
    }

    /// Wait for `dfuIDLE`.
    pub fn wait_idle(&mut self) -> Result<()> {
        self.wait_for(DfuState::DfuIdle)
    }

    /// Download `image` to the selected alternate.
    pub fn download(&mut self, image: &Path, out: &mut impl Write) -> Result<usize> {
        if !image.is_file() {
            return Err(ControlError::PathNotFound(image.to_path_buf()));
        }
        writeln!(out, "Download upgrade image {}", image.display())?;
        let data = std::fs::read(image)?;
        let mut sent = 0;
        for chunk in data.chunks(TRANSFER_BLOCK_SIZE) {
            let mut block = Vec::with_capacity(chunk.len() + 1);
            block.push(chunk.len() as u8);
            block.extend_from_slice(chunk);
            self.set("DFU_DNLOAD", &block)?;
            self.wait_for(DfuState::DnloadIdle)?;
            sent += chunk.len();
            write!(
                out,
                "\rDownloaded {:.2}% of the image",
                sent as f64 / data.len() as f64 * 100.0
            )?;
            out.flush()?;
        }
        writeln!(out)?;
        writeln!(out, "Download completed. Send DFU_DNLOAD message with size zero")?;
        self.set("DFU_DNLOAD", &[0])?;
        self.wait_idle()?;
        Ok(sent)
    }

    /// Upload the selected alternate's image into `dest`, which must not
    /// exist yet.
    pub fn upload(&mut self, dest: &Path, out: &mut impl Write) -> Result<usize> {
        if dest.exists() {
            return Err(ControlError::PathExists(dest.to_path_buf()));
        }
        writeln!(out, "Uploading image to {}", dest.display())?;
        let mut image = Vec::new();
        let mut blocks = 0usize;
        loop {
            let values = self.get("DFU_UPLOAD")?;
            let len = (values[0] as usize).min(values.len() - 1);
            image.extend_from_slice(&values[1..=len]);
            if len > 0 {
                blocks += 1;
                write!(
                    out,
                    "\rUploaded {blocks} blocks of {TRANSFER_BLOCK_SIZE} bytes"
                )?;
                out.flush()?;
            }
            if len < TRANSFER_BLOCK_SIZE {
                writeln!(out)?;
                writeln!(
                    out,
                    "Received transport block with size {len} (smaller than {TRANSFER_BLOCK_SIZE}): upload complete"
                )?;
                break;
            }
        }
        std::fs::write(dest, &image)?;
        Ok(image.len())
    }

    /// `DETACH`, rebooting the device into the application.
    pub fn reboot(&mut self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "Reboot device")?;
        self.set("DFU_DETACH", &[])
    }

    /// `GETVERSION`.
    pub fn version(&mut self) -> Result<[u8; 3]> {
        let values = self.get("DFU_GETVERSION")?;
        Ok([values[0], values[1], values[2]])
    }
}
