// SPDX-FileCopyrightText: Copyright (c) 2025 the modbus-rtu authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slave (server) side of the ADU codec.
//!
//! Each handler decodes the request fields at their fixed offsets, applies
//! the operation to the caller-owned register map and overwrites the scratch
//! buffer with the response, request and response sharing the one buffer.
//! Returned lengths exclude the trailing checksum; the coordinator appends
//! it before transmitting.

use byteorder::{BigEndian, ByteOrder};

use super::CRC_LEN;
use crate::frame::{Exception, Word};
use crate::util::{coil_get, coil_set, packed_coils_len, u16_coil_to_bool};

/// Dispatch a CRC-validated request against the register map.
///
/// On success the buffer holds the response (checksum not yet appended) and
/// the response length is returned. On failure nothing has been written to
/// the register map and the caller is expected to answer with an exception
/// frame.
pub(crate) fn process_request(
    adu: &mut [u8],
    len: usize,
    regs: &mut [Word],
) -> Result<usize, Exception> {
    match adu[1] {
        0x01 | 0x02 => read_bits(adu, len, regs),
        0x03 | 0x04 => read_registers(adu, len, regs),
        0x05 => write_single_coil(adu, len, regs),
        0x06 => write_single_register(adu, len, regs),
        0x0F => write_multiple_coils(adu, len, regs),
        0x10 => write_multiple_registers(adu, len, regs),
        0x16 => mask_write_register(adu, len, regs),
        0x17 => read_write_multiple_registers(adu, len, regs),
        _ => Err(Exception::IllegalFunction),
    }
}

/// Read coils / read discrete inputs (0x01/0x02).
///
/// Coils are bit-addressed into the register map; the response packs them
/// least-significant bit first, a partial final byte zero-padded.
fn read_bits(adu: &mut [u8], len: usize, regs: &[Word]) -> Result<usize, Exception> {
    if len < 8 {
        return Err(Exception::IllegalDataValue);
    }
    let addr = BigEndian::read_u16(&adu[2..4]) as usize;
    let quantity = BigEndian::read_u16(&adu[4..6]) as usize;
    let byte_count = packed_coils_len(quantity);
    if quantity == 0 || 3 + byte_count + CRC_LEN > adu.len() {
        return Err(Exception::IllegalDataValue);
    }
    if addr + quantity > regs.len() * 16 {
        return Err(Exception::IllegalDataAddress);
    }
    adu[2] = byte_count as u8;
    adu[3..3 + byte_count].fill(0);
    for i in 0..quantity {
        if coil_get(regs, addr + i) == Some(true) {
            adu[3 + i / 8] |= 1 << (i % 8);
        }
    }
    Ok(3 + byte_count)
}

/// Read holding / input registers (0x03/0x04).
fn read_registers(adu: &mut [u8], len: usize, regs: &[Word]) -> Result<usize, Exception> {
    if len < 8 {
        return Err(Exception::IllegalDataValue);
    }
    let addr = BigEndian::read_u16(&adu[2..4]) as usize;
    let quantity = BigEndian::read_u16(&adu[4..6]) as usize;
    if quantity == 0 || 3 + 2 * quantity + CRC_LEN > adu.len() {
        return Err(Exception::IllegalDataValue);
    }
    if addr + quantity > regs.len() {
        return Err(Exception::IllegalDataAddress);
    }
    adu[2] = (2 * quantity) as u8;
    for i in 0..quantity {
        BigEndian::write_u16(&mut adu[3 + 2 * i..], regs[addr + i]);
    }
    Ok(3 + 2 * quantity)
}

/// Write single coil (0x05); the request is echoed as its own response.
fn write_single_coil(adu: &mut [u8], len: usize, regs: &mut [Word]) -> Result<usize, Exception> {
    if len < 8 {
        return Err(Exception::IllegalDataValue);
    }
    let addr = BigEndian::read_u16(&adu[2..4]) as usize;
    let value = BigEndian::read_u16(&adu[4..6]);
    let state = u16_coil_to_bool(value).map_err(|_| Exception::IllegalDataValue)?;
    coil_set(regs, addr, state).ok_or(Exception::IllegalDataAddress)?;
    Ok(6)
}

/// Write single register (0x06); the request is echoed as its own response.
fn write_single_register(
    adu: &mut [u8],
    len: usize,
    regs: &mut [Word],
) -> Result<usize, Exception> {
    if len < 8 {
        return Err(Exception::IllegalDataValue);
    }
    let addr = BigEndian::read_u16(&adu[2..4]) as usize;
    if addr >= regs.len() {
        return Err(Exception::IllegalDataAddress);
    }
    regs[addr] = BigEndian::read_u16(&adu[4..6]);
    Ok(6)
}

/// Write multiple coils (0x0F); the response strips the bit payload.
fn write_multiple_coils(adu: &mut [u8], len: usize, regs: &mut [Word]) -> Result<usize, Exception> {
    if len < 9 {
        return Err(Exception::IllegalDataValue);
    }
    let addr = BigEndian::read_u16(&adu[2..4]) as usize;
    let quantity = BigEndian::read_u16(&adu[4..6]) as usize;
    let byte_count = adu[6] as usize;
    if quantity == 0 || byte_count != packed_coils_len(quantity) || len < 7 + byte_count + CRC_LEN {
        return Err(Exception::IllegalDataValue);
    }
    if addr + quantity > regs.len() * 16 {
        return Err(Exception::IllegalDataAddress);
    }
    for i in 0..quantity {
        let state = (adu[7 + i / 8] >> (i % 8)) & 0b1 > 0;
        // bounds were checked against the full range above
        let _ = coil_set(regs, addr + i, state);
    }
    Ok(6)
}

/// Write multiple registers (0x10); the response strips the word payload.
fn write_multiple_registers(
    adu: &mut [u8],
    len: usize,
    regs: &mut [Word],
) -> Result<usize, Exception> {
    if len < 9 {
        return Err(Exception::IllegalDataValue);
    }
    let addr = BigEndian::read_u16(&adu[2..4]) as usize;
    let quantity = BigEndian::read_u16(&adu[4..6]) as usize;
    let byte_count = adu[6] as usize;
    if quantity == 0 || byte_count != 2 * quantity || len < 7 + byte_count + CRC_LEN {
        return Err(Exception::IllegalDataValue);
    }
    if addr + quantity > regs.len() {
        return Err(Exception::IllegalDataAddress);
    }
    for i in 0..quantity {
        regs[addr + i] = BigEndian::read_u16(&adu[7 + 2 * i..]);
    }
    Ok(6)
}

/// Mask write register (0x16); the request is echoed as its own response.
fn mask_write_register(adu: &mut [u8], len: usize, regs: &mut [Word]) -> Result<usize, Exception> {
    if len < 10 {
        return Err(Exception::IllegalDataValue);
    }
    let addr = BigEndian::read_u16(&adu[2..4]) as usize;
    let and_mask = BigEndian::read_u16(&adu[4..6]);
    let or_mask = BigEndian::read_u16(&adu[6..8]);
    if addr >= regs.len() {
        return Err(Exception::IllegalDataAddress);
    }
    regs[addr] = (regs[addr] & and_mask) | (or_mask & !and_mask);
    Ok(8)
}

/// Read/write multiple registers (0x17); the write is applied before the
/// read, and the response carries the read payload only.
fn read_write_multiple_registers(
    adu: &mut [u8],
    len: usize,
    regs: &mut [Word],
) -> Result<usize, Exception> {
    if len < 13 {
        return Err(Exception::IllegalDataValue);
    }
    let read_addr = BigEndian::read_u16(&adu[2..4]) as usize;
    let read_quantity = BigEndian::read_u16(&adu[4..6]) as usize;
    let write_addr = BigEndian::read_u16(&adu[6..8]) as usize;
    let write_quantity = BigEndian::read_u16(&adu[8..10]) as usize;
    let byte_count = adu[10] as usize;
    if read_quantity == 0
        || write_quantity == 0
        || byte_count != 2 * write_quantity
        || len < 11 + byte_count + CRC_LEN
        || 3 + 2 * read_quantity + CRC_LEN > adu.len()
    {
        return Err(Exception::IllegalDataValue);
    }
    if read_addr + read_quantity > regs.len() || write_addr + write_quantity > regs.len() {
        return Err(Exception::IllegalDataAddress);
    }
    for i in 0..write_quantity {
        regs[write_addr + i] = BigEndian::read_u16(&adu[11 + 2 * i..]);
    }
    adu[2] = (2 * read_quantity) as u8;
    for i in 0..read_quantity {
        BigEndian::write_u16(&mut adu[3 + 2 * i..], regs[read_addr + i]);
    }
    Ok(3 + 2 * read_quantity)
}
