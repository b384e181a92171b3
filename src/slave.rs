// SPDX-FileCopyrightText: Copyright (c) 2025 the modbus-rtu authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The slave-side transaction coordinator.

use byteorder::{BigEndian, ByteOrder};

use crate::assembler::{Assembly, FrameAssembler};
use crate::codec::{server, CRC_LEN};
use crate::crc::crc16;
use crate::frame::{SlaveId, Status, Word, EXCEPTION_FLAG, MAX_ADU_LEN};
use crate::transport::{Clock, NullTransceiver, Transceiver, Transport};

/// Milliseconds of bus silence that terminate an incoming frame.
const DEFAULT_QUIET_INTERVAL: u32 = 5;

/// A Modbus RTU slave serving a caller-owned register map.
///
/// [`poll`](Self::poll) is meant to be called from the application's main
/// loop. Each call collects at most one request, applies it to the register
/// map and sends the response. Coils are bit-addressed into the same map:
/// coil `i` is bit `i % 16` of word `i / 16`.
#[derive(Debug)]
pub struct Slave<T, C, X = NullTransceiver> {
    slave: SlaveId,
    port: T,
    clock: C,
    transceiver: X,
    quiet_interval: u32,
    adu: [u8; MAX_ADU_LEN],
}

impl<T, C> Slave<T, C, NullTransceiver>
where
    T: Transport,
    C: Clock,
{
    /// Create a slave answering to the given ID (`1..=247`).
    pub fn new(slave: SlaveId, port: T, clock: C) -> Self {
        Self::with_transceiver(slave, port, clock, NullTransceiver)
    }
}

impl<T, C, X> Slave<T, C, X>
where
    T: Transport,
    C: Clock,
    X: Transceiver,
{
    /// Create a slave with explicit transceiver direction control.
    pub fn with_transceiver(slave: SlaveId, port: T, clock: C, transceiver: X) -> Self {
        debug_assert!(matches!(slave, 1..=247));
        Self {
            slave,
            port,
            clock,
            transceiver,
            quiet_interval: DEFAULT_QUIET_INTERVAL,
            adu: [0; MAX_ADU_LEN],
        }
    }

    /// The ID this slave answers to.
    pub const fn slave(&self) -> SlaveId {
        self.slave
    }

    /// The configured end-of-frame silence interval in milliseconds.
    pub const fn quiet_interval(&self) -> u32 {
        self.quiet_interval
    }

    /// Change the end-of-frame silence interval in milliseconds.
    ///
    /// The default suits 19200 baud and above; slower links need a longer
    /// interval (the line is quiet for 3.5 character times between frames).
    pub fn set_quiet_interval(&mut self, quiet: u32) {
        self.quiet_interval = quiet;
    }

    /// Serve at most one pending request.
    ///
    /// Returns `None` when the bus is idle or the frame addresses another
    /// slave, otherwise the outcome of the exchange. Malformed frames are
    /// reported as [`Status::InvalidCrc`] and never answered; a master
    /// recovers via its own timeout. Requests that fail validation are
    /// answered with an exception frame and reported as the matching
    /// exception status.
    pub fn poll(&mut self, regs: &mut [Word]) -> Option<Status> {
        let assembly = FrameAssembler::silence_interval(self.quiet_interval).assemble(
            &mut self.port,
            &self.clock,
            &mut self.transceiver,
            &mut self.adu,
        );
        let request_len = match assembly {
            Assembly::Complete(len) => len,
            Assembly::Empty | Assembly::TimedOut => return None,
        };
        // shortest valid frame: ID, function code and checksum
        if request_len < 2 + CRC_LEN {
            #[cfg(feature = "log")]
            log::warn!("Runt frame of {request_len} byte(s) ignored");
            return Some(Status::InvalidCrc);
        }
        if self.adu[0] != self.slave {
            // traffic for somebody else; stay off the bus
            return None;
        }
        let data_len = request_len - CRC_LEN;
        let calculated = crc16(&self.adu[..data_len]);
        let received = BigEndian::read_u16(&self.adu[data_len..request_len]);
        if calculated != received {
            #[cfg(feature = "log")]
            log::warn!("{}", crate::error::Error::Crc(calculated, received));
            return Some(Status::InvalidCrc);
        }
        let status = match server::process_request(&mut self.adu, request_len, regs) {
            Ok(response_len) => {
                self.respond(response_len);
                Status::Success
            }
            Err(exception) => {
                #[cfg(feature = "log")]
                log::debug!("Request 0x{:02X} rejected: {exception}", self.adu[1]);
                self.adu[1] |= EXCEPTION_FLAG;
                self.adu[2] = exception as u8;
                self.respond(3);
                exception.into()
            }
        };
        Some(status)
    }

    /// Append the checksum and transmit `len + 2` bytes of the scratch
    /// buffer, then discard the echo a two-wire bus feeds back.
    fn respond(&mut self, len: usize) {
        let crc = crc16(&self.adu[..len]);
        BigEndian::write_u16(&mut self.adu[len..], crc);
        self.transceiver.pre_transmission();
        for i in 0..len + CRC_LEN {
            self.port.write(self.adu[i]);
        }
        self.port.flush();
        self.transceiver.post_transmission();
        while self.port.available() > 0 {
            self.port.read();
        }
    }

    #[cfg(test)]
    pub(crate) fn port_mut(&mut self) -> &mut T {
        &mut self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPort, TestClock};

    const SLAVE: SlaveId = 0x11;

    fn slave(port: MockPort) -> Slave<MockPort, TestClock> {
        Slave::new(SLAVE, port, TestClock::ticking(1))
    }

    #[test]
    fn idle_bus_yields_nothing() {
        let mut s = slave(MockPort::new());
        let regs = &mut [0u16; 4];
        assert_eq!(s.poll(regs), None);
        assert!(s.port_mut().transmitted().is_empty());
    }

    #[test]
    fn serves_a_register_write_and_echoes_it() {
        let mut port = MockPort::new();
        port.enqueue(&[0x11, 0x06, 0x00, 0x05, 0x00, 0xC8, 0x9A, 0xCD]);
        let mut s = slave(port);
        let regs = &mut [0u16; 8];
        assert_eq!(s.poll(regs), Some(Status::Success));
        assert_eq!(regs[5], 0x00C8);
        assert_eq!(
            s.port_mut().transmitted(),
            &[0x11, 0x06, 0x00, 0x05, 0x00, 0xC8, 0x9A, 0xCD]
        );
    }

    #[test]
    fn serves_a_register_read_with_checksum() {
        let mut port = MockPort::new();
        port.enqueue(&[0x11, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC6, 0x9B]);
        let mut s = slave(port);
        let regs = &mut [0x00FF, 0x1234];
        assert_eq!(s.poll(regs), Some(Status::Success));
        assert_eq!(
            s.port_mut().transmitted(),
            &[0x11, 0x03, 0x04, 0x00, 0xFF, 0x12, 0x34, 0xD6, 0xB5]
        );
    }

    #[test]
    fn serves_a_coil_read() {
        let mut port = MockPort::new();
        port.enqueue(&[0x11, 0x01, 0x00, 0x00, 0x00, 0x03, 0x7E, 0x9B]);
        let mut s = slave(port);
        let regs = &mut [0b0000_0000_0000_0101u16];
        assert_eq!(s.poll(regs), Some(Status::Success));
        assert_eq!(
            s.port_mut().transmitted(),
            &[0x11, 0x01, 0x01, 0x05, 0x95, 0x4B]
        );
    }

    #[test]
    fn stays_silent_for_other_slaves() {
        let mut port = MockPort::new();
        port.enqueue(&[0x05, 0x06, 0x00, 0x05, 0x00, 0xC8, 0x99, 0xD9]);
        let mut s = slave(port);
        let regs = &mut [0u16; 8];
        assert_eq!(s.poll(regs), None);
        assert!(s.port_mut().transmitted().is_empty());
        assert_eq!(regs[5], 0x0000);
    }

    #[test]
    fn corrupt_checksum_gets_no_response() {
        let mut port = MockPort::new();
        port.enqueue(&[0x11, 0x06, 0x00, 0x05, 0x00, 0xC8, 0x9A, 0x13]);
        let mut s = slave(port);
        let regs = &mut [0u16; 8];
        assert_eq!(s.poll(regs), Some(Status::InvalidCrc));
        assert!(s.port_mut().transmitted().is_empty());
        assert_eq!(regs[5], 0x0000);
    }

    #[test]
    fn runt_frame_gets_no_response() {
        let mut port = MockPort::new();
        port.enqueue(&[0x11, 0x06]);
        let mut s = slave(port);
        let regs = &mut [0u16; 8];
        assert_eq!(s.poll(regs), Some(Status::InvalidCrc));
        assert!(s.port_mut().transmitted().is_empty());
    }

    #[test]
    fn unknown_function_is_answered_with_an_exception_frame() {
        let mut port = MockPort::new();
        port.enqueue(&[0x11, 0x42, 0x00, 0x00, 0xA5, 0x0C]);
        let mut s = slave(port);
        let regs = &mut [0u16; 4];
        assert_eq!(s.poll(regs), Some(Status::IllegalFunction));
        assert_eq!(s.port_mut().transmitted(), &[0x11, 0xC2, 0x01, 0xB1, 0x65]);
    }

    #[test]
    fn out_of_bounds_read_is_answered_with_an_exception_frame() {
        let mut port = MockPort::new();
        port.enqueue(&[0x11, 0x03, 0x00, 0x01, 0x00, 0x02, 0x97, 0x5B]);
        let mut s = slave(port);
        let regs = &mut [0u16; 2];
        assert_eq!(s.poll(regs), Some(Status::IllegalDataAddress));
        assert_eq!(s.port_mut().transmitted(), &[0x11, 0x83, 0x02, 0xC1, 0x34]);
    }

    #[test]
    fn quiet_interval_is_configurable() {
        let mut s = slave(MockPort::new());
        assert_eq!(s.quiet_interval(), 5);
        s.set_quiet_interval(16);
        assert_eq!(s.quiet_interval(), 16);
    }
}
