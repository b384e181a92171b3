// SPDX-FileCopyrightText: Copyright (c) 2025 the modbus-rtu authors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![doc = include_str!("../README.md")]
#![no_std]
#![deny(unsafe_code)]

mod assembler;
mod codec;
mod crc;
mod error;
mod frame;
mod master;
mod slave;
mod transport;
mod util;

#[cfg(test)]
mod mock;

pub use crate::crc::crc16;
pub use crate::error::Error;
pub use crate::frame::{
    Address, Coil, Exception, FunctionCode, Quantity, SlaveId, Status, Word, EXCEPTION_FLAG,
    MAX_ADU_LEN, MAX_BUFFER_LEN,
};
pub use crate::master::Master;
pub use crate::slave::Slave;
pub use crate::transport::{Clock, NullTransceiver, Transceiver, Transport};
pub use crate::util::{bool_to_u16_coil, packed_coils_len, u16_coil_to_bool};
