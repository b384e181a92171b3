// SPDX-FileCopyrightText: Copyright (c) 2025 the modbus-rtu authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU checksum.

/// Calculate the CRC (Cyclic Redundancy Check) sum.
///
/// The result bytes are already swapped: writing the returned value
/// big-endian puts the CRC low byte first on the wire, as required for RTU
/// frames.
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0xFFFF;
    for x in data {
        crc ^= u16::from(*x);
        for _ in 0..8 {
            // if we followed clippy's suggestion to move out the crc >>= 1, the condition may not be met any more
            // the recommended action therefore makes no sense and it is better to allow this lint
            #[allow(clippy::branches_sharing_code)]
            if (crc & 0x0001) != 0 {
                crc >>= 1;
                crc ^= 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc.rotate_right(8)
}
