// SPDX-FileCopyrightText: Copyright (c) 2025 the modbus-rtu authors
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

/// Slave ID
pub type SlaveId = u8;

/// A Modbus address is represented by 16 bit (from `0` to `65535`).
pub type Address = u16;

/// A Coil represents a single bit.
///
/// - `true` is equivalent to `ON`, `1` and `0xFF00`.
/// - `false` is equivalent to `OFF`, `0` and `0x0000`.
pub type Coil = bool;

/// Modbus uses 16 bit for its data items (big-endian representation).
pub type Word = u16;

/// Number of items to process (`0` - `65535`).
pub type Quantity = u16;

/// Fixed capacity of the reusable ADU scratch buffer.
pub const MAX_ADU_LEN: usize = 64;

/// Capacity of the response and transmit word buffers.
pub const MAX_BUFFER_LEN: usize = 64;

/// A function code with this bit set marks an exception response.
pub const EXCEPTION_FLAG: u8 = 0x80;

/// A Modbus function code.
///
/// It is represented by an unsigned 8 bit integer.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCode {
    /// Modbus Function Code: `01` (`0x01`).
    ReadCoils,

    /// Modbus Function Code: `02` (`0x02`).
    ReadDiscreteInputs,

    /// Modbus Function Code: `03` (`0x03`).
    ReadHoldingRegisters,

    /// Modbus Function Code: `04` (`0x04`).
    ReadInputRegisters,

    /// Modbus Function Code: `05` (`0x05`).
    WriteSingleCoil,

    /// Modbus Function Code: `06` (`0x06`).
    WriteSingleRegister,

    /// Modbus Function Code: `15` (`0x0F`).
    WriteMultipleCoils,

    /// Modbus Function Code: `16` (`0x10`).
    WriteMultipleRegisters,

    /// Modbus Function Code: `22` (`0x16`).
    MaskWriteRegister,

    /// Modbus Function Code: `23` (`0x17`).
    ReadWriteMultipleRegisters,
}

impl FunctionCode {
    /// Create a new [`FunctionCode`] with `value`.
    ///
    /// Returns `None` for codes outside the supported set.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        let code = match value {
            0x01 => Self::ReadCoils,
            0x02 => Self::ReadDiscreteInputs,
            0x03 => Self::ReadHoldingRegisters,
            0x04 => Self::ReadInputRegisters,
            0x05 => Self::WriteSingleCoil,
            0x06 => Self::WriteSingleRegister,
            0x0F => Self::WriteMultipleCoils,
            0x10 => Self::WriteMultipleRegisters,
            0x16 => Self::MaskWriteRegister,
            0x17 => Self::ReadWriteMultipleRegisters,
            _ => return None,
        };
        Some(code)
    }

    /// Get the [`u8`] value of the current [`FunctionCode`].
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::ReadCoils => 0x01,
            Self::ReadDiscreteInputs => 0x02,
            Self::ReadHoldingRegisters => 0x03,
            Self::ReadInputRegisters => 0x04,
            Self::WriteSingleCoil => 0x05,
            Self::WriteSingleRegister => 0x06,
            Self::WriteMultipleCoils => 0x0F,
            Self::WriteMultipleRegisters => 0x10,
            Self::MaskWriteRegister => 0x16,
            Self::ReadWriteMultipleRegisters => 0x17,
        }
    }
}

impl fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value().fmt(f)
    }
}

/// A server (slave) exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    IllegalFunction = 0x01,
    IllegalDataAddress = 0x02,
    IllegalDataValue = 0x03,
    ServerDeviceFailure = 0x04,
}

impl Exception {
    const fn get_name(self) -> &'static str {
        match self {
            Self::IllegalFunction => "Illegal function",
            Self::IllegalDataAddress => "Illegal data address",
            Self::IllegalDataValue => "Illegal data value",
            Self::ServerDeviceFailure => "Server device failure",
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.get_name())
    }
}

#[cfg(all(feature = "defmt", target_os = "none"))]
impl defmt::Format for Exception {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.get_name())
    }
}

/// The 8-bit outcome of a single transaction attempt.
///
/// `0x01`-`0x04` are protocol exceptions signalled by the responding slave
/// and carried back on the wire. `0xE0`-`0xE3` are communication failures
/// detected locally by the master and never transmitted.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Status {
    /// The transaction completed and all validation checks passed.
    Success = 0x00,
    /// The slave does not support the requested function code.
    IllegalFunction = 0x01,
    /// Address and quantity do not fit the slave's register map.
    IllegalDataAddress = 0x02,
    /// A value in the request is outside the allowable range.
    IllegalDataValue = 0x03,
    /// The slave failed while performing the requested action.
    ServerDeviceFailure = 0x04,
    /// The slave ID in the response does not match that of the request.
    InvalidSlaveId = 0xE0,
    /// The function code in the response does not match that of the request.
    InvalidFunction = 0xE1,
    /// The entire response was not received within the timeout period.
    ResponseTimedOut = 0xE2,
    /// The CRC in the received frame does not match the one calculated.
    InvalidCrc = 0xE3,
}

impl Status {
    /// Whether this status marks a completed, validated transaction.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Get the [`u8`] value of the current [`Status`].
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Map an exception code carried in a response frame.
    ///
    /// Codes outside the defined range are folded into
    /// [`Status::ServerDeviceFailure`].
    pub(crate) const fn from_exception_code(code: u8) -> Self {
        match code {
            0x01 => Self::IllegalFunction,
            0x02 => Self::IllegalDataAddress,
            0x03 => Self::IllegalDataValue,
            _ => Self::ServerDeviceFailure,
        }
    }
}

impl From<Exception> for Status {
    fn from(ex: Exception) -> Self {
        match ex {
            Exception::IllegalFunction => Self::IllegalFunction,
            Exception::IllegalDataAddress => Self::IllegalDataAddress,
            Exception::IllegalDataValue => Self::IllegalDataValue,
            Exception::ServerDeviceFailure => Self::ServerDeviceFailure,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Success => "Success",
            Self::IllegalFunction => Exception::IllegalFunction.get_name(),
            Self::IllegalDataAddress => Exception::IllegalDataAddress.get_name(),
            Self::IllegalDataValue => Exception::IllegalDataValue.get_name(),
            Self::ServerDeviceFailure => Exception::ServerDeviceFailure.get_name(),
            Self::InvalidSlaveId => "Invalid response slave ID",
            Self::InvalidFunction => "Invalid response function code",
            Self::ResponseTimedOut => "Response timed out",
            Self::InvalidCrc => "Invalid CRC",
        };
        write!(f, "{name}")
    }
}
