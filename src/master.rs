// SPDX-FileCopyrightText: Copyright (c) 2025 the modbus-rtu authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The master-side transaction coordinator.

use byteorder::{BigEndian, ByteOrder};

use crate::assembler::{Assembly, FrameAssembler};
use crate::codec::{client, Request};
use crate::crc::crc16;
use crate::frame::{
    Address, Coil, FunctionCode, Quantity, SlaveId, Status, Word, EXCEPTION_FLAG, MAX_ADU_LEN,
    MAX_BUFFER_LEN,
};
use crate::transport::{Clock, NullTransceiver, Transceiver, Transport};
use crate::util::packed_coils_len;

/// Milliseconds to wait for a complete response before giving up.
const DEFAULT_RESPONSE_TIMEOUT: u32 = 2000;

/// A Modbus RTU master.
///
/// Owns the transport, issues one request at a time and blocks until the
/// response arrives or the timeout fires. Every transaction method returns a
/// [`Status`]; payload words of the last successful read are kept in an
/// internal response buffer until the next transaction begins.
///
/// ```no_run
/// # use modbus_rtu::{Clock, Master, Transport};
/// # struct Stub;
/// # impl Transport for Stub {
/// #     fn available(&mut self) -> usize { 0 }
/// #     fn read(&mut self) -> Option<u8> { None }
/// #     fn write(&mut self, _: u8) {}
/// #     fn flush(&mut self) {}
/// # }
/// # impl Clock for Stub { fn now(&self) -> u32 { 0 } }
/// # fn connect() -> (impl Transport, impl Clock) { (Stub, Stub) }
/// let (port, clock) = connect();
/// let mut master = Master::new(0x11, port, clock);
/// if master.read_holding_registers(0x0000, 2).is_success() {
///     while let Some(word) = master.receive() {
///         // ...
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Master<T, C, X = NullTransceiver> {
    slave: SlaveId,
    port: T,
    clock: C,
    transceiver: X,
    response_timeout: u32,
    adu: [u8; MAX_ADU_LEN],
    response: [Word; MAX_BUFFER_LEN],
    response_len: usize,
    response_pos: usize,
    transmit: [Word; MAX_BUFFER_LEN],
    transmit_len: usize,
    write_address: Address,
}

impl<T, C> Master<T, C, NullTransceiver>
where
    T: Transport,
    C: Clock,
{
    /// Create a master addressing the slave with the given ID (`1..=247`).
    pub fn new(slave: SlaveId, port: T, clock: C) -> Self {
        Self::with_transceiver(slave, port, clock, NullTransceiver)
    }
}

impl<T, C, X> Master<T, C, X>
where
    T: Transport,
    C: Clock,
    X: Transceiver,
{
    /// Create a master with explicit transceiver direction control.
    pub fn with_transceiver(slave: SlaveId, port: T, clock: C, transceiver: X) -> Self {
        debug_assert!(matches!(slave, 1..=247));
        Self {
            slave,
            port,
            clock,
            transceiver,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            adu: [0; MAX_ADU_LEN],
            response: [0; MAX_BUFFER_LEN],
            response_len: 0,
            response_pos: 0,
            transmit: [0; MAX_BUFFER_LEN],
            transmit_len: 0,
            write_address: 0,
        }
    }

    /// The ID of the addressed slave.
    pub const fn slave(&self) -> SlaveId {
        self.slave
    }

    /// Retarget subsequent transactions at a different slave (`1..=247`).
    pub fn set_slave(&mut self, slave: SlaveId) {
        debug_assert!(matches!(slave, 1..=247));
        self.slave = slave;
    }

    /// The configured response timeout in milliseconds.
    pub const fn response_timeout(&self) -> u32 {
        self.response_timeout
    }

    /// Change the response timeout in milliseconds.
    pub fn set_response_timeout(&mut self, timeout: u32) {
        self.response_timeout = timeout;
    }

    /// Read `quantity` coils starting at `address` (function code `0x01`).
    ///
    /// On success the coil states are packed into the response buffer,
    /// sixteen coils per word, a partial final word zero-padded.
    pub fn read_coils(&mut self, address: Address, quantity: Quantity) -> Status {
        if !bit_read_fits(quantity) {
            return Status::IllegalDataValue;
        }
        self.transaction(&Request::ReadCoils(address, quantity))
    }

    /// Read `quantity` discrete inputs starting at `address` (function code
    /// `0x02`). Packing matches [`read_coils`](Self::read_coils).
    pub fn read_discrete_inputs(&mut self, address: Address, quantity: Quantity) -> Status {
        if !bit_read_fits(quantity) {
            return Status::IllegalDataValue;
        }
        self.transaction(&Request::ReadDiscreteInputs(address, quantity))
    }

    /// Read `quantity` holding registers starting at `address` (function
    /// code `0x03`). The words land in the response buffer.
    pub fn read_holding_registers(&mut self, address: Address, quantity: Quantity) -> Status {
        if !register_read_fits(quantity) {
            return Status::IllegalDataValue;
        }
        self.transaction(&Request::ReadHoldingRegisters(address, quantity))
    }

    /// Read `quantity` input registers starting at `address` (function code
    /// `0x04`). The words land in the response buffer.
    pub fn read_input_registers(&mut self, address: Address, quantity: Quantity) -> Status {
        if !register_read_fits(quantity) {
            return Status::IllegalDataValue;
        }
        self.transaction(&Request::ReadInputRegisters(address, quantity))
    }

    /// Force a single coil on or off (function code `0x05`).
    pub fn write_single_coil(&mut self, address: Address, state: Coil) -> Status {
        self.transaction(&Request::WriteSingleCoil(address, state))
    }

    /// Write a single holding register (function code `0x06`).
    pub fn write_single_register(&mut self, address: Address, value: Word) -> Status {
        self.transaction(&Request::WriteSingleRegister(address, value))
    }

    /// Write `quantity` coils staged in the transmit buffer (function code
    /// `0x0F`), sixteen coils per staged word starting at bit 0.
    pub fn write_multiple_coils(&mut self, address: Address, quantity: Quantity) -> Status {
        if quantity == 0 {
            return Status::IllegalDataValue;
        }
        let words = self.transmit;
        self.transaction(&Request::WriteMultipleCoils(address, quantity, &words))
    }

    /// Write `quantity` words staged in the transmit buffer (function code
    /// `0x10`).
    pub fn write_multiple_registers(&mut self, address: Address, quantity: Quantity) -> Status {
        if quantity == 0 {
            return Status::IllegalDataValue;
        }
        let words = self.transmit;
        self.transaction(&Request::WriteMultipleRegisters(address, quantity, &words))
    }

    /// Write the words staged via [`begin_transmission`] and [`send`]
    /// (function code `0x10`). The staging buffer is cleared afterwards.
    ///
    /// [`begin_transmission`]: Self::begin_transmission
    /// [`send`]: Self::send
    pub fn write_multiple_registers_buffered(&mut self) -> Status {
        let address = self.write_address;
        let quantity = self.transmit_len as Quantity;
        let status = self.write_multiple_registers(address, quantity);
        if status.is_success() {
            self.clear_transmit_buffer();
        }
        status
    }

    /// Modify a holding register in place (function code `0x16`):
    /// `register = (register & and_mask) | (or_mask & !and_mask)`.
    pub fn mask_write_register(
        &mut self,
        address: Address,
        and_mask: Word,
        or_mask: Word,
    ) -> Status {
        self.transaction(&Request::MaskWriteRegister(address, and_mask, or_mask))
    }

    /// Write staged words and read back registers in one transaction
    /// (function code `0x17`). The write is performed before the read; the
    /// read words land in the response buffer.
    pub fn read_write_multiple_registers(
        &mut self,
        read_address: Address,
        read_quantity: Quantity,
        write_address: Address,
        write_quantity: Quantity,
    ) -> Status {
        if !register_read_fits(read_quantity) || write_quantity == 0 {
            return Status::IllegalDataValue;
        }
        let words = self.transmit;
        self.transaction(&Request::ReadWriteMultipleRegisters(
            read_address,
            read_quantity,
            write_address,
            write_quantity,
            &words,
        ))
    }

    /// Number of response words not yet consumed by [`receive`](Self::receive).
    pub const fn available(&self) -> usize {
        self.response_len - self.response_pos
    }

    /// Consume the next word of the last response.
    pub fn receive(&mut self) -> Option<Word> {
        if self.response_pos < self.response_len {
            let word = self.response[self.response_pos];
            self.response_pos += 1;
            Some(word)
        } else {
            None
        }
    }

    /// Peek at a response buffer slot without consuming it.
    ///
    /// Slots beyond the length of the last response keep their previous
    /// contents; only indices outside the buffer yield `None`.
    pub fn response_buffer(&self, idx: usize) -> Option<Word> {
        if idx < MAX_BUFFER_LEN {
            Some(self.response[idx])
        } else {
            None
        }
    }

    /// Zero the response buffer and reset the read cursor.
    pub fn clear_response_buffer(&mut self) {
        self.response = [0; MAX_BUFFER_LEN];
        self.response_len = 0;
        self.response_pos = 0;
    }

    /// Place a word into a transmit buffer slot.
    pub fn set_transmit_buffer(&mut self, idx: usize, value: Word) -> Status {
        if idx < MAX_BUFFER_LEN {
            self.transmit[idx] = value;
            Status::Success
        } else {
            Status::IllegalDataAddress
        }
    }

    /// Zero the transmit buffer and discard any staged words.
    pub fn clear_transmit_buffer(&mut self) {
        self.transmit = [0; MAX_BUFFER_LEN];
        self.transmit_len = 0;
    }

    /// Start staging words for
    /// [`write_multiple_registers_buffered`](Self::write_multiple_registers_buffered).
    pub fn begin_transmission(&mut self, address: Address) {
        self.write_address = address;
        self.transmit_len = 0;
    }

    /// Append one word to the staged transmission.
    pub fn send(&mut self, value: Word) -> Status {
        if self.transmit_len < MAX_BUFFER_LEN {
            self.transmit[self.transmit_len] = value;
            self.transmit_len += 1;
            Status::Success
        } else {
            Status::IllegalDataValue
        }
    }

    /// Run one complete request/response exchange.
    fn transaction(&mut self, request: &Request<'_>) -> Status {
        // a new transaction invalidates the previous payload, the words
        // themselves are only overwritten by a successful decode
        self.response_len = 0;
        self.response_pos = 0;

        let request_len = match client::encode_request(self.slave, request, &mut self.adu) {
            Ok(len) => len,
            Err(_err) => {
                #[cfg(feature = "log")]
                log::warn!("Cannot encode request: {_err}");
                return Status::IllegalDataValue;
            }
        };

        // stale bytes left over from a previous exchange must not be
        // mistaken for the start of this response
        while self.port.available() > 0 {
            self.port.read();
        }

        self.transceiver.pre_transmission();
        for i in 0..request_len {
            self.port.write(self.adu[i]);
        }
        self.port.flush();
        self.transceiver.post_transmission();

        let assembly = FrameAssembler::predicted_length(self.response_timeout).assemble(
            &mut self.port,
            &self.clock,
            &mut self.transceiver,
            &mut self.adu,
        );
        match assembly {
            Assembly::Complete(len) => self.validate_and_decode(request.function_code(), len),
            Assembly::TimedOut | Assembly::Empty => Status::ResponseTimedOut,
        }
    }

    /// Check a complete response frame and extract its payload.
    ///
    /// Checks run in a fixed order, first failure wins: slave ID, exception
    /// flag, function code echo, CRC.
    fn validate_and_decode(&mut self, fn_code: FunctionCode, len: usize) -> Status {
        let adu = &self.adu[..len];
        if adu[0] != self.slave {
            return Status::InvalidSlaveId;
        }
        if adu[1] & EXCEPTION_FLAG != 0 {
            #[cfg(feature = "log")]
            log::debug!("Slave {} raised exception 0x{:02X}", adu[0], adu[2]);
            return Status::from_exception_code(adu[2]);
        }
        if adu[1] != fn_code.value() {
            return Status::InvalidFunction;
        }
        let calculated = crc16(&adu[..len - 2]);
        let received = BigEndian::read_u16(&adu[len - 2..]);
        if calculated != received {
            #[cfg(feature = "log")]
            log::warn!("{}", crate::error::Error::Crc(calculated, received));
            return Status::InvalidCrc;
        }
        self.response_len = client::decode_response(adu, &mut self.response);
        Status::Success
    }

    #[cfg(test)]
    pub(crate) fn port_mut(&mut self) -> &mut T {
        &mut self.port
    }
}

/// Whether a bit-read response of this quantity fits a single frame.
const fn bit_read_fits(quantity: Quantity) -> bool {
    quantity != 0 && 5 + packed_coils_len(quantity as usize) <= MAX_ADU_LEN
}

/// Whether a register-read response of this quantity fits a single frame.
const fn register_read_fits(quantity: Quantity) -> bool {
    quantity != 0 && 5 + 2 * quantity as usize <= MAX_ADU_LEN
}
