// SPDX-FileCopyrightText: Copyright (c) 2025 the modbus-rtu authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External collaborators injected into the coordinators: the byte-stream
//! transport, the millisecond clock and the transceiver direction hooks.

/// A half-duplex byte-stream transport (e.g. a UART driving an RS-485 bus).
///
/// All operations are non-blocking polls; the coordinators own the waiting.
pub trait Transport {
    /// Number of bytes currently available to read.
    fn available(&mut self) -> usize;

    /// Read one byte, or `None` if nothing is pending.
    fn read(&mut self) -> Option<u8>;

    /// Write one byte.
    fn write(&mut self, byte: u8);

    /// Block until all written bytes have physically left the transport.
    fn flush(&mut self);
}

/// A monotonic millisecond clock.
///
/// The value is allowed to wrap; all elapsed-time comparisons inside the
/// crate use wrapping subtraction.
pub trait Clock {
    /// Current time in milliseconds.
    fn now(&self) -> u32;
}

/// Milliseconds elapsed between two [`Clock`] readings, wraparound-safe.
pub(crate) const fn millis_since(now: u32, start: u32) -> u32 {
    now.wrapping_sub(start)
}

/// Transceiver direction control hooks.
///
/// All operations default to no-ops, so the protocol engine has zero
/// knowledge of hardware direction control. A typical RS-485 implementation
/// asserts the driver-enable pin in [`pre_transmission`] and releases it in
/// [`post_transmission`].
///
/// [`pre_transmission`]: Transceiver::pre_transmission
/// [`post_transmission`]: Transceiver::post_transmission
pub trait Transceiver {
    /// Called just before a frame is written to the transport.
    fn pre_transmission(&mut self) {}

    /// Called after a frame has finished sending (i.e. after all data has
    /// been physically transmitted onto the serial bus).
    fn post_transmission(&mut self) {}

    /// Called whenever the coordinator is waiting and no byte is available.
    ///
    /// Use this for cooperative multitasking. Do not touch the transport
    /// used by the coordinator from within this callback.
    fn idle(&mut self) {}
}

/// The default [`Transceiver`]: every hook is a no-op.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullTransceiver;

impl Transceiver for NullTransceiver {}
