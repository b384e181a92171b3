// SPDX-FileCopyrightText: Copyright (c) 2025 the modbus-rtu authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ADU codec.
//!
//! One encode/decode pair per function code family, all operating in place
//! on a coordinator-owned scratch buffer at fixed byte offsets:
//! `[unit-id:1][function-code:1][payload:N][crc:2]`.
//!
//! The client half builds requests and extracts response payloads; the
//! server half applies a request to the register map and overwrites the
//! buffer with the response.

pub(crate) mod client;
pub(crate) mod server;

use crate::frame::{Address, Coil, FunctionCode, Quantity, Word};

/// Trailing checksum size within an ADU.
pub(crate) const CRC_LEN: usize = 2;

/// A request from the master to a slave, ready to be encoded.
///
/// Multi-value writes borrow the staged words from the caller; coils are
/// packed 16 per word, low byte first on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Request<'r> {
    ReadCoils(Address, Quantity),
    ReadDiscreteInputs(Address, Quantity),
    ReadHoldingRegisters(Address, Quantity),
    ReadInputRegisters(Address, Quantity),
    WriteSingleCoil(Address, Coil),
    WriteSingleRegister(Address, Word),
    WriteMultipleCoils(Address, Quantity, &'r [Word]),
    WriteMultipleRegisters(Address, Quantity, &'r [Word]),
    MaskWriteRegister(Address, Word, Word),
    ReadWriteMultipleRegisters(Address, Quantity, Address, Quantity, &'r [Word]),
}

impl Request<'_> {
    pub(crate) const fn function_code(&self) -> FunctionCode {
        use Request as R;

        match self {
            R::ReadCoils(_, _) => FunctionCode::ReadCoils,
            R::ReadDiscreteInputs(_, _) => FunctionCode::ReadDiscreteInputs,
            R::ReadHoldingRegisters(_, _) => FunctionCode::ReadHoldingRegisters,
            R::ReadInputRegisters(_, _) => FunctionCode::ReadInputRegisters,
            R::WriteSingleCoil(_, _) => FunctionCode::WriteSingleCoil,
            R::WriteSingleRegister(_, _) => FunctionCode::WriteSingleRegister,
            R::WriteMultipleCoils(_, _, _) => FunctionCode::WriteMultipleCoils,
            R::WriteMultipleRegisters(_, _, _) => FunctionCode::WriteMultipleRegisters,
            R::MaskWriteRegister(_, _, _) => FunctionCode::MaskWriteRegister,
            R::ReadWriteMultipleRegisters(_, _, _, _, _) => {
                FunctionCode::ReadWriteMultipleRegisters
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_code_from_request() {
        let requests = [
            (Request::ReadCoils(0, 1), 0x01),
            (Request::ReadDiscreteInputs(0, 1), 0x02),
            (Request::ReadHoldingRegisters(0, 1), 0x03),
            (Request::ReadInputRegisters(0, 1), 0x04),
            (Request::WriteSingleCoil(0, true), 0x05),
            (Request::WriteSingleRegister(0, 0), 0x06),
            (Request::WriteMultipleCoils(0, 1, &[1]), 0x0F),
            (Request::WriteMultipleRegisters(0, 1, &[1]), 0x10),
            (Request::MaskWriteRegister(0, 0, 0), 0x16),
            (Request::ReadWriteMultipleRegisters(0, 1, 0, 1, &[1]), 0x17),
        ];
        for (req, expected) in requests {
            assert_eq!(req.function_code().value(), expected);
        }
    }
}
