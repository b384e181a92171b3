// SPDX-FileCopyrightText: Copyright (c) 2025 the modbus-rtu authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master (client) side of the ADU codec.

use byteorder::{BigEndian, ByteOrder};

use super::{Request, CRC_LEN};
use crate::crc::crc16;
use crate::error::Error;
use crate::frame::{SlaveId, Word};
use crate::util::{bool_to_u16_coil, packed_coils_len};

/// Encode a request ADU, checksum included.
///
/// Returns the total frame length.
pub(crate) fn encode_request(
    slave: SlaveId,
    request: &Request<'_>,
    buf: &mut [u8],
) -> Result<usize, Error> {
    use Request as R;

    if buf.len() < 2 {
        return Err(Error::BufferSize);
    }
    buf[0] = slave;
    buf[1] = request.function_code().value();

    let pdu_end = match *request {
        R::ReadCoils(addr, quantity)
        | R::ReadDiscreteInputs(addr, quantity)
        | R::ReadHoldingRegisters(addr, quantity)
        | R::ReadInputRegisters(addr, quantity) => {
            check_capacity(buf, 6)?;
            BigEndian::write_u16(&mut buf[2..], addr);
            BigEndian::write_u16(&mut buf[4..], quantity);
            6
        }
        R::WriteSingleCoil(addr, state) => {
            check_capacity(buf, 6)?;
            BigEndian::write_u16(&mut buf[2..], addr);
            BigEndian::write_u16(&mut buf[4..], bool_to_u16_coil(state));
            6
        }
        R::WriteSingleRegister(addr, value) => {
            check_capacity(buf, 6)?;
            BigEndian::write_u16(&mut buf[2..], addr);
            BigEndian::write_u16(&mut buf[4..], value);
            6
        }
        R::WriteMultipleCoils(addr, quantity, words) => {
            let byte_count = packed_coils_len(quantity as usize);
            check_capacity(buf, 7 + byte_count)?;
            if words.len() * 16 < quantity as usize {
                return Err(Error::BufferSize);
            }
            BigEndian::write_u16(&mut buf[2..], addr);
            BigEndian::write_u16(&mut buf[4..], quantity);
            buf[6] = byte_count as u8;
            // 16 staged coils per word, low byte first on the wire
            for i in 0..byte_count {
                let word = words[i / 2];
                buf[7 + i] = if i % 2 == 0 {
                    word as u8
                } else {
                    (word >> 8) as u8
                };
            }
            7 + byte_count
        }
        R::WriteMultipleRegisters(addr, quantity, words) => {
            let byte_count = 2 * quantity as usize;
            check_capacity(buf, 7 + byte_count)?;
            if words.len() < quantity as usize {
                return Err(Error::BufferSize);
            }
            BigEndian::write_u16(&mut buf[2..], addr);
            BigEndian::write_u16(&mut buf[4..], quantity);
            buf[6] = byte_count as u8;
            for (i, word) in words.iter().take(quantity as usize).enumerate() {
                BigEndian::write_u16(&mut buf[7 + 2 * i..], *word);
            }
            7 + byte_count
        }
        R::MaskWriteRegister(addr, and_mask, or_mask) => {
            check_capacity(buf, 8)?;
            BigEndian::write_u16(&mut buf[2..], addr);
            BigEndian::write_u16(&mut buf[4..], and_mask);
            BigEndian::write_u16(&mut buf[6..], or_mask);
            8
        }
        R::ReadWriteMultipleRegisters(read_addr, read_quantity, write_addr, write_quantity, words) => {
            let byte_count = 2 * write_quantity as usize;
            check_capacity(buf, 11 + byte_count)?;
            if words.len() < write_quantity as usize {
                return Err(Error::BufferSize);
            }
            BigEndian::write_u16(&mut buf[2..], read_addr);
            BigEndian::write_u16(&mut buf[4..], read_quantity);
            BigEndian::write_u16(&mut buf[6..], write_addr);
            BigEndian::write_u16(&mut buf[8..], write_quantity);
            buf[10] = byte_count as u8;
            for (i, word) in words.iter().take(write_quantity as usize).enumerate() {
                BigEndian::write_u16(&mut buf[11 + 2 * i..], *word);
            }
            11 + byte_count
        }
    };

    let crc = crc16(&buf[..pdu_end]);
    BigEndian::write_u16(&mut buf[pdu_end..], crc);
    Ok(pdu_end + CRC_LEN)
}

const fn check_capacity(buf: &[u8], pdu_end: usize) -> Result<(), Error> {
    if buf.len() < pdu_end + CRC_LEN {
        return Err(Error::BufferSize);
    }
    Ok(())
}

/// Extract the payload of a validated response into the word buffer.
///
/// Returns the number of words written. Bit payloads pack two bytes per
/// word low byte first, register payloads are big-endian; both conventions
/// mirror the slave's own packing exactly.
pub(crate) fn decode_response(adu: &[u8], dst: &mut [Word]) -> usize {
    match adu[1] {
        0x01 | 0x02 => {
            let byte_count = adu[2] as usize;
            let mut written = 0;
            // response bytes are ordered L, H, L, H, ...
            for i in 0..byte_count / 2 {
                if i < dst.len() {
                    dst[i] = u16::from(adu[2 * i + 4]) << 8 | u16::from(adu[2 * i + 3]);
                    written = i + 1;
                }
            }
            // an odd trailing byte becomes a zero-padded word
            if byte_count % 2 != 0 {
                let i = byte_count / 2;
                if i < dst.len() {
                    dst[i] = u16::from(adu[2 * i + 3]);
                    written = i + 1;
                }
            }
            written
        }
        0x03 | 0x04 | 0x17 => {
            let byte_count = adu[2] as usize;
            let mut written = 0;
            // response bytes are ordered H, L, H, L, ...
            for i in 0..byte_count / 2 {
                if i < dst.len() {
                    dst[i] = BigEndian::read_u16(&adu[2 * i + 3..]);
                    written = i + 1;
                }
            }
            written
        }
        // write echoes carry no payload for the response buffer
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_read_holding_registers_request() {
        let buf = &mut [0u8; 64];
        let len = encode_request(0x11, &Request::ReadHoldingRegisters(0x0000, 2), buf).unwrap();
        assert_eq!(&buf[..len], &[0x11, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC6, 0x9B]);
    }

    #[test]
    fn encode_read_coils_request() {
        let buf = &mut [0u8; 64];
        let len = encode_request(0x11, &Request::ReadCoils(0x0013, 0x25), buf).unwrap();
        assert_eq!(&buf[..len], &[0x11, 0x01, 0x00, 0x13, 0x00, 0x25, 0x0E, 0x84]);
    }

    #[test]
    fn encode_write_single_coil_request() {
        let buf = &mut [0u8; 64];
        let len = encode_request(0x11, &Request::WriteSingleCoil(0x00AC, true), buf).unwrap();
        assert_eq!(&buf[..len], &[0x11, 0x05, 0x00, 0xAC, 0xFF, 0x00, 0x4E, 0x8B]);
    }

    #[test]
    fn encode_write_single_register_request() {
        let buf = &mut [0u8; 64];
        let len = encode_request(0x11, &Request::WriteSingleRegister(0x0005, 0x00C8), buf).unwrap();
        assert_eq!(&buf[..len], &[0x11, 0x06, 0x00, 0x05, 0x00, 0xC8, 0x9A, 0xCD]);
    }

    #[test]
    fn encode_write_multiple_coils_request() {
        let buf = &mut [0u8; 64];
        // ten coils staged in one word, packed low byte first
        let words = &[0x01CD];
        let len =
            encode_request(0x11, &Request::WriteMultipleCoils(0x0013, 10, words), buf).unwrap();
        assert_eq!(
            &buf[..len],
            &[0x11, 0x0F, 0x00, 0x13, 0x00, 0x0A, 0x02, 0xCD, 0x01, 0xBF, 0x0B]
        );
    }

    #[test]
    fn encode_write_multiple_registers_request() {
        let buf = &mut [0u8; 64];
        let words = &[0x000A, 0x0102];
        let len =
            encode_request(0x11, &Request::WriteMultipleRegisters(0x0001, 2, words), buf).unwrap();
        assert_eq!(
            &buf[..len],
            &[0x11, 0x10, 0x00, 0x01, 0x00, 0x02, 0x04, 0x00, 0x0A, 0x01, 0x02, 0xC6, 0xF0]
        );
    }

    #[test]
    fn encode_mask_write_register_request() {
        let buf = &mut [0u8; 64];
        let len =
            encode_request(0x11, &Request::MaskWriteRegister(0x0004, 0xF2F2, 0x2525), buf).unwrap();
        assert_eq!(
            &buf[..len],
            &[0x11, 0x16, 0x00, 0x04, 0xF2, 0xF2, 0x25, 0x25, 0x4E, 0xCA]
        );
    }

    #[test]
    fn encode_read_write_multiple_registers_request() {
        let buf = &mut [0u8; 64];
        let words = &[0x00FF];
        let len = encode_request(
            0x11,
            &Request::ReadWriteMultipleRegisters(0x0003, 2, 0x000E, 1, words),
            buf,
        )
        .unwrap();
        assert_eq!(
            &buf[..len],
            &[0x11, 0x17, 0x00, 0x03, 0x00, 0x02, 0x00, 0x0E, 0x00, 0x01, 0x02, 0x00, 0xFF, 0x9B, 0x4A]
        );
    }

    #[test]
    fn encode_rejects_undersized_buffer() {
        let buf = &mut [0u8; 7];
        let err = encode_request(0x11, &Request::ReadCoils(0, 1), buf).unwrap_err();
        assert_eq!(err, Error::BufferSize);
    }

    #[test]
    fn encode_rejects_too_few_staged_words() {
        let buf = &mut [0u8; 64];
        let err =
            encode_request(0x11, &Request::WriteMultipleRegisters(0, 3, &[1, 2]), buf).unwrap_err();
        assert_eq!(err, Error::BufferSize);
        let err =
            encode_request(0x11, &Request::WriteMultipleCoils(0, 17, &[0]), buf).unwrap_err();
        assert_eq!(err, Error::BufferSize);
    }

    #[test]
    fn decode_register_read_response() {
        let adu = &[0x11, 0x03, 0x04, 0x00, 0xFF, 0x12, 0x34, 0xD6, 0xB5];
        let dst = &mut [0u16; 64];
        let written = decode_response(adu, dst);
        assert_eq!(written, 2);
        assert_eq!(&dst[..2], &[0x00FF, 0x1234]);
    }

    #[test]
    fn decode_bit_read_response_packs_low_byte_first() {
        let adu = &[0x11, 0x01, 0x05, 0xCD, 0x6B, 0xB2, 0x0E, 0x1B, 0x45, 0xE6];
        let dst = &mut [0u16; 64];
        let written = decode_response(adu, dst);
        assert_eq!(written, 3);
        assert_eq!(&dst[..3], &[0x6BCD, 0x0EB2, 0x001B]);
    }

    #[test]
    fn decode_even_bit_read_response() {
        let adu = &[0x11, 0x02, 0x02, 0xCD, 0x6B, 0x00, 0x00];
        let dst = &mut [0u16; 64];
        let written = decode_response(adu, dst);
        assert_eq!(written, 1);
        assert_eq!(dst[0], 0x6BCD);
    }

    #[test]
    fn decode_write_echo_leaves_buffer_untouched() {
        let adu = &[0x11, 0x06, 0x00, 0x05, 0x00, 0xC8, 0x9A, 0xCD];
        let dst = &mut [0xAAAAu16; 4];
        assert_eq!(decode_response(adu, dst), 0);
        assert_eq!(dst, &[0xAAAA; 4]);
    }

    #[test]
    fn decode_caps_at_destination_capacity() {
        let adu = &[0x11, 0x03, 0x06, 0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00];
        let dst = &mut [0u16; 2];
        let written = decode_response(adu, dst);
        assert_eq!(written, 2);
        assert_eq!(dst, &[0x0001, 0x0002]);
    }
}
