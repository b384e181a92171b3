// SPDX-FileCopyrightText: Copyright (c) 2025 the modbus-rtu authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Frame assembly: turning the unstructured byte stream into discrete ADUs.
//!
//! Two strategies cover the two bus roles. A master awaiting a response
//! knows the expected frame shape from the function code and reads until the
//! predicted length is reached or the response timeout fires. A slave cannot
//! predict the length of an incoming request and instead treats a quiet
//! interval on the bus as the end of the frame.
//!
//! Neither strategy validates what it collects; CRC and identity checks are
//! the coordinators' responsibility.

use crate::frame::EXCEPTION_FLAG;
use crate::transport::{millis_since, Clock, Transceiver, Transport};

/// Outcome of one assembly attempt.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Assembly {
    /// A complete frame of the given size sits at the start of the buffer.
    Complete(usize),
    /// The predicted length was not reached within the configured timeout.
    TimedOut,
    /// No byte ever arrived (silence-interval strategy only).
    Empty,
}

#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    PredictedLength { timeout: u32 },
    SilenceInterval { quiet: u32 },
}

/// Consumes bytes from the transport and produces complete, unvalidated
/// ADUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameAssembler {
    strategy: Strategy,
}

impl FrameAssembler {
    /// Strategy for a master awaiting a response of a known shape.
    pub(crate) const fn predicted_length(timeout: u32) -> Self {
        Self {
            strategy: Strategy::PredictedLength { timeout },
        }
    }

    /// Strategy for a slave receiving a request of a priori unknown length.
    pub(crate) const fn silence_interval(quiet: u32) -> Self {
        Self {
            strategy: Strategy::SilenceInterval { quiet },
        }
    }

    pub(crate) fn assemble<T, C, X>(
        &self,
        port: &mut T,
        clock: &C,
        transceiver: &mut X,
        buf: &mut [u8],
    ) -> Assembly
    where
        T: Transport,
        C: Clock,
        X: Transceiver,
    {
        match self.strategy {
            Strategy::PredictedLength { timeout } => {
                assemble_predicted(port, clock, transceiver, buf, timeout)
            }
            Strategy::SilenceInterval { quiet } => assemble_silence(port, clock, buf, quiet),
        }
    }
}

/// Predict the total ADU length of a response from its first bytes.
///
/// Returns `None` while too few bytes have arrived to decide. Unknown
/// function codes are sized as the minimum frame so that validation can
/// reject them afterwards.
pub(crate) const fn response_adu_len(adu: &[u8]) -> Option<usize> {
    if adu.len() < 2 {
        return None;
    }
    let fn_code = adu[1];
    if fn_code & EXCEPTION_FLAG != 0 {
        // slave id + error code + exception + CRC
        return Some(5);
    }
    match fn_code {
        0x01..=0x04 | 0x17 => {
            if adu.len() > 2 {
                Some(5 + adu[2] as usize)
            } else {
                // incomplete frame
                None
            }
        }
        0x05 | 0x06 | 0x0F | 0x10 => Some(8),
        0x16 => Some(10),
        _ => Some(5),
    }
}

fn assemble_predicted<T, C, X>(
    port: &mut T,
    clock: &C,
    transceiver: &mut X,
    buf: &mut [u8],
    timeout: u32,
) -> Assembly
where
    T: Transport,
    C: Clock,
    X: Transceiver,
{
    let start = clock.now();
    let mut len = 0;
    loop {
        while port.available() == 0 {
            if millis_since(clock.now(), start) > timeout {
                #[cfg(feature = "log")]
                log::warn!("Response timed out after {len} byte(s)");
                return Assembly::TimedOut;
            }
            transceiver.idle();
        }
        if let Some(byte) = port.read() {
            if len < buf.len() {
                buf[len] = byte;
                len += 1;
            } else {
                // frame larger than the scratch buffer; the tail is dropped
                // and validation will reject whatever was collected
                #[cfg(feature = "log")]
                log::warn!("ADU buffer full, dropping byte 0x{byte:02X}");
            }
        }
        if let Some(predicted) = response_adu_len(&buf[..len]) {
            if len >= predicted {
                return Assembly::Complete(predicted);
            }
        }
        if millis_since(clock.now(), start) > timeout {
            return Assembly::TimedOut;
        }
    }
}

fn assemble_silence<T, C>(port: &mut T, clock: &C, buf: &mut [u8], quiet: u32) -> Assembly
where
    T: Transport,
    C: Clock,
{
    if port.available() == 0 {
        return Assembly::Empty;
    }
    let mut len = 0;
    let mut last_activity = clock.now();
    loop {
        if port.available() > 0 {
            if let Some(byte) = port.read() {
                if len < buf.len() {
                    buf[len] = byte;
                    len += 1;
                } else {
                    #[cfg(feature = "log")]
                    log::warn!("ADU buffer full, dropping byte 0x{byte:02X}");
                }
                last_activity = clock.now();
            }
        } else if millis_since(clock.now(), last_activity) >= quiet {
            return Assembly::Complete(len);
        }
    }
}
