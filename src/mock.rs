// SPDX-FileCopyrightText: Copyright (c) 2025 the modbus-rtu authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for the transport and clock seams.

use core::cell::Cell;

use crate::frame::{SlaveId, Word};
use crate::slave::Slave;
use crate::transport::{Clock, Transport};

const QUEUE_LEN: usize = 64;

/// A deterministic clock that advances by a fixed step on every reading.
pub(crate) struct TestClock {
    now: Cell<u32>,
    step: u32,
}

impl TestClock {
    pub(crate) const fn ticking(step: u32) -> Self {
        Self {
            now: Cell::new(0),
            step,
        }
    }
}

impl Clock for TestClock {
    fn now(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step));
        now
    }
}

/// An in-memory transport with scripted input.
///
/// Bytes passed to [`enqueue`](Self::enqueue) are readable immediately;
/// bytes passed to [`enqueue_reply`](Self::enqueue_reply) become readable
/// once `flush` is called, mimicking a device that answers only after the
/// request has left the wire.
pub(crate) struct MockPort {
    rx: [u8; QUEUE_LEN],
    rx_len: usize,
    rx_pos: usize,
    reply: [u8; QUEUE_LEN],
    reply_len: usize,
    tx: [u8; QUEUE_LEN],
    tx_len: usize,
}

impl MockPort {
    pub(crate) const fn new() -> Self {
        Self {
            rx: [0; QUEUE_LEN],
            rx_len: 0,
            rx_pos: 0,
            reply: [0; QUEUE_LEN],
            reply_len: 0,
            tx: [0; QUEUE_LEN],
            tx_len: 0,
        }
    }

    pub(crate) fn enqueue(&mut self, bytes: &[u8]) {
        self.rx[self.rx_len..self.rx_len + bytes.len()].copy_from_slice(bytes);
        self.rx_len += bytes.len();
    }

    pub(crate) fn enqueue_reply(&mut self, bytes: &[u8]) {
        self.reply[self.reply_len..self.reply_len + bytes.len()].copy_from_slice(bytes);
        self.reply_len += bytes.len();
    }

    pub(crate) fn transmitted(&self) -> &[u8] {
        &self.tx[..self.tx_len]
    }

    pub(crate) fn clear_transmitted(&mut self) {
        self.tx_len = 0;
    }
}

impl Transport for MockPort {
    fn available(&mut self) -> usize {
        self.rx_len - self.rx_pos
    }

    fn read(&mut self) -> Option<u8> {
        if self.rx_pos < self.rx_len {
            let byte = self.rx[self.rx_pos];
            self.rx_pos += 1;
            Some(byte)
        } else {
            None
        }
    }

    fn write(&mut self, byte: u8) {
        if self.tx_len < QUEUE_LEN {
            self.tx[self.tx_len] = byte;
            self.tx_len += 1;
        }
    }

    fn flush(&mut self) {
        let reply = self.reply;
        let reply_len = self.reply_len;
        self.reply_len = 0;
        self.enqueue(&reply[..reply_len]);
    }
}

/// A transport backed by a real [`Slave`] serving a 16-word register map.
///
/// Written bytes feed the slave's receive queue; `flush` lets the slave
/// serve the request, and its response becomes readable afterwards. Lets a
/// master be tested against the actual server implementation.
pub(crate) struct SlaveBackedPort {
    slave: Slave<MockPort, TestClock>,
    regs: [Word; 16],
    out: [u8; QUEUE_LEN],
    out_len: usize,
    out_pos: usize,
}

impl SlaveBackedPort {
    pub(crate) fn new(slave_id: SlaveId) -> Self {
        Self {
            slave: Slave::new(slave_id, MockPort::new(), TestClock::ticking(1)),
            regs: [0; 16],
            out: [0; QUEUE_LEN],
            out_len: 0,
            out_pos: 0,
        }
    }

    pub(crate) fn regs(&self) -> &[Word] {
        &self.regs
    }

    pub(crate) fn regs_mut(&mut self) -> &mut [Word] {
        &mut self.regs
    }
}

impl Transport for SlaveBackedPort {
    fn available(&mut self) -> usize {
        self.out_len - self.out_pos
    }

    fn read(&mut self) -> Option<u8> {
        if self.out_pos < self.out_len {
            let byte = self.out[self.out_pos];
            self.out_pos += 1;
            Some(byte)
        } else {
            None
        }
    }

    fn write(&mut self, byte: u8) {
        self.slave.port_mut().enqueue(&[byte]);
    }

    fn flush(&mut self) {
        let _ = self.slave.poll(&mut self.regs);
        let response = self.slave.port_mut().transmitted();
        let response_len = response.len();
        self.out[self.out_len..self.out_len + response_len].copy_from_slice(response);
        self.out_len += response_len;
        self.slave.port_mut().clear_transmitted();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticking_clock_advances_per_reading() {
        let clock = TestClock::ticking(3);
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.now(), 3);
        assert_eq!(clock.now(), 6);
    }

    #[test]
    fn reply_becomes_readable_after_flush() {
        let mut port = MockPort::new();
        port.enqueue_reply(&[0xAB, 0xCD]);
        assert_eq!(port.available(), 0);
        port.write(0x01);
        port.flush();
        assert_eq!(port.available(), 2);
        assert_eq!(port.read(), Some(0xAB));
        assert_eq!(port.read(), Some(0xCD));
        assert_eq!(port.read(), None);
        assert_eq!(port.transmitted(), &[0x01]);
    }
}
