// SPDX-FileCopyrightText: Copyright (c) 2025 the modbus-rtu authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common helpers

use crate::error::Error;
use crate::frame::{Coil, Word};

/// Turn a bool into a u16 coil value
pub const fn bool_to_u16_coil(state: bool) -> u16 {
    if state { 0xFF00 } else { 0x0000 }
}

/// Turn a u16 coil value into a boolean value.
pub const fn u16_coil_to_bool(coil: u16) -> Result<bool, Error> {
    match coil {
        0xFF00 => Ok(true),
        0x0000 => Ok(false),
        _ => Err(Error::CoilValue(coil)),
    }
}

/// Calculate the number of bytes required for a given number of coils.
pub const fn packed_coils_len(bitcount: usize) -> usize {
    bitcount.div_ceil(8)
}

/// Read a single coil out of a register map.
///
/// Coils are bit-addressed into the 16-bit word array: coil `i` lives in bit
/// `i % 16` of word `i / 16`.
pub(crate) fn coil_get(regs: &[Word], idx: usize) -> Option<Coil> {
    let word = regs.get(idx / 16)?;
    Some((word >> (idx % 16)) & 0b1 > 0)
}

/// Write a single coil into a register map.
pub(crate) fn coil_set(regs: &mut [Word], idx: usize, state: Coil) -> Option<()> {
    let word = regs.get_mut(idx / 16)?;
    if state {
        *word |= 1 << (idx % 16);
    } else {
        *word &= !(1 << (idx % 16));
    }
    Some(())
}
