//! Status codes shared by the host and the device servicers.

use std::fmt;

/// Result code of a control transaction.
///
/// Values 0..=8 come from the transport layer, 64..=73 from the servicer
/// tasks running on the device. The numeric value doubles as the host
/// application's exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControlRet {
    /// Transaction completed.
    Success = 0,
    /// The device rejected the host's registration.
    RegistrationFailed = 1,
    /// Unknown or malformed command.
    BadCommand = 2,
    /// Payload length does not match the command.
    DataLengthError = 3,
    /// Transport-level failure.
    OtherTransportError = 4,
    /// Unknown resource id.
    BadResource = 5,
    /// Packet failed validation.
    MalformedPacket = 6,
    /// The device chose to ignore the command.
    CommandIgnoredInDevice = 7,
    /// Generic failure.
    ControlError = 8,
    /// Servicer busy, read again later.
    ServicerCommandRetry = 64,
    /// Servicer does not know the command id.
    ServicerWrongCommandId = 65,
    /// Servicer expected a different payload length.
    ServicerWrongCommandLen = 66,
    /// Servicer rejected the payload contents.
    ServicerWrongPayload = 67,
    /// Servicer command queue is full.
    ServicerQueueFull = 68,
    /// A special command is already running.
    ServicerSpecialCommandAlreadyOngoing = 69,
    /// Special command buffer overflowed.
    ServicerSpecialCommandBufferOverflow = 70,
    /// Servicer resource failure.
    ServicerResourceError = 71,
    /// Special command chunks arrived out of order.
    ServicerSpecialCommandWrongOrder = 72,
    /// Special command buffer has the wrong size.
    ServicerSpecialCommandBufSizeError = 73,
}

impl ControlRet {
    /// Every code, in value order.
    pub const ALL: [ControlRet; 19] = [
        ControlRet::Success,
        ControlRet::RegistrationFailed,
        ControlRet::BadCommand,
        ControlRet::DataLengthError,
        ControlRet::OtherTransportError,
        ControlRet::BadResource,
        ControlRet::MalformedPacket,
        ControlRet::CommandIgnoredInDevice,
        ControlRet::ControlError,
        ControlRet::ServicerCommandRetry,
        ControlRet::ServicerWrongCommandId,
        ControlRet::ServicerWrongCommandLen,
        ControlRet::ServicerWrongPayload,
        ControlRet::ServicerQueueFull,
        ControlRet::ServicerSpecialCommandAlreadyOngoing,
        ControlRet::ServicerSpecialCommandBufferOverflow,
        ControlRet::ServicerResourceError,
        ControlRet::ServicerSpecialCommandWrongOrder,
        ControlRet::ServicerSpecialCommandBufSizeError,
    ];

    /// Numeric wire value.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Decode a wire value.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|ret| ret.code() == code)
    }

    /// Symbolic name as declared in the firmware headers.
    pub fn name(self) -> &'static str {
        match self {
            ControlRet::Success => "CONTROL_SUCCESS",
            ControlRet::RegistrationFailed => "CONTROL_REGISTRATION_FAILED",
            ControlRet::BadCommand => "CONTROL_BAD_COMMAND",
            ControlRet::DataLengthError => "CONTROL_DATA_LENGTH_ERROR",
            ControlRet::OtherTransportError => "CONTROL_OTHER_TRANSPORT_ERROR",
            ControlRet::BadResource => "CONTROL_BAD_RESOURCE",
            ControlRet::MalformedPacket => "CONTROL_MALFORMED_PACKET",
            ControlRet::CommandIgnoredInDevice => "CONTROL_COMMAND_IGNORED_IN_DEVICE",
            ControlRet::ControlError => "CONTROL_ERROR",
            ControlRet::ServicerCommandRetry => "SERVICER_COMMAND_RETRY",
            ControlRet::ServicerWrongCommandId => "SERVICER_WRONG_COMMAND_ID",
            ControlRet::ServicerWrongCommandLen => "SERVICER_WRONG_COMMAND_LEN",
            ControlRet::ServicerWrongPayload => "SERVICER_WRONG_PAYLOAD",
            ControlRet::ServicerQueueFull => "SERVICER_QUEUE_FULL",
            ControlRet::ServicerSpecialCommandAlreadyOngoing => {
                "SERVICER_SPECIAL_COMMAND_ALREADY_ONGOING"
            }
            ControlRet::ServicerSpecialCommandBufferOverflow => {
                "SERVICER_SPECIAL_COMMAND_BUFFER_OVERFLOW"
            }
            ControlRet::ServicerResourceError => "SERVICER_RESOURCE_ERROR",
            ControlRet::ServicerSpecialCommandWrongOrder => "SERVICER_SPECIAL_COMMAND_WRONG_ORDER",
            ControlRet::ServicerSpecialCommandBufSizeError => {
                "SERVICER_SPECIAL_COMMAND_BUF_SIZE_ERROR"
            }
        }
    }

    /// Name for an arbitrary status byte, `UNUSED_ENUM` if no code has it.
    pub fn name_of(code: u8) -> &'static str {
        Self::from_code(code).map_or("UNUSED_ENUM", Self::name)
    }

    /// `Ok(())` for [`ControlRet::Success`], `Err(self)` otherwise.
    pub fn check(self) -> Result<(), ControlRet> {
        if self == ControlRet::Success {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ControlRet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
