//! Host transfer protocol
//!
//! Half-duplex byte transfers over the shared 8-bit host bus. The host drives
//! chip-select and read/write; the device drives Ready/Busy, holding it low
//! while a response is being sent and raising it once the whole response is
//! on the bus.
//!
//! Every byte is its own framed operation: the symbol engine is restarted at
//! the send or receive entry point before each one. All transfers block with
//! no timeout.

use tako_hal::{BusDirection, DataBus, EngineMode, InputPin, OutputPin, SymbolEngine};

use crate::traits::Responder;

/// Transfer failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// A transfer is already in progress on this port
    Busy,
    /// No transfer was started
    NotActive,
}

/// Direction of the transfer currently holding the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveTransfer {
    Send,
    Receive,
}

/// Control lines sampled from the host
pub struct HostLines<CS: InputPin, RW: InputPin> {
    /// Chip-select, active low
    pub cs: CS,
    /// High while the host reads, low while it writes
    pub rw: RW,
}

/// Device side of the host bus
pub struct TransferPort<E, B, W, CS, RW>
where
    E: SymbolEngine,
    B: DataBus,
    W: OutputPin,
    CS: InputPin,
    RW: InputPin,
{
    engine: E,
    bus: B,
    ready: W,
    lines: HostLines<CS, RW>,
    active: Option<ActiveTransfer>,
    awaiting_response: bool,
}

impl<E, B, W, CS, RW> TransferPort<E, B, W, CS, RW>
where
    E: SymbolEngine,
    B: DataBus,
    W: OutputPin,
    CS: InputPin,
    RW: InputPin,
{
    /// Take ownership of the bus hardware
    ///
    /// Data pins start as inputs and Ready is raised.
    pub fn new(engine: E, mut bus: B, mut ready: W, lines: HostLines<CS, RW>) -> Self {
        bus.set_direction(BusDirection::Input);
        ready.set_high();
        Self {
            engine,
            bus,
            ready,
            lines,
            active: None,
            awaiting_response: false,
        }
    }

    /// True while any transfer holds the bus
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Direction of the running transfer
    pub fn active(&self) -> Option<ActiveTransfer> {
        self.active
    }

    /// True inside [`TransferPort::wait_response`]
    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    /// Host has chip-select asserted
    pub fn host_selected(&self) -> bool {
        self.lines.cs.is_low()
    }

    /// Host is writing (device should receive)
    pub fn host_writing(&self) -> bool {
        self.lines.rw.is_low()
    }

    /// Ready/Busy line level
    pub fn is_ready(&self) -> bool {
        self.ready.is_set_high()
    }

    /// Claim the bus for a send and turn the data pins around
    pub fn begin_send(&mut self) -> Result<(), TransferError> {
        if self.active.is_some() {
            return Err(TransferError::Busy);
        }
        self.active = Some(ActiveTransfer::Send);
        self.bus.set_direction(BusDirection::Output);
        Ok(())
    }

    /// Send one byte of a transfer started with [`TransferPort::begin_send`]
    ///
    /// Blocks until the engine acknowledges the byte.
    pub fn send_byte(&mut self, byte: u8) -> Result<(), TransferError> {
        if self.active != Some(ActiveTransfer::Send) {
            return Err(TransferError::NotActive);
        }
        self.engine.restart(EngineMode::Send);
        self.engine.put(u32::from(byte));
        let _ack = self.engine.get();
        Ok(())
    }

    /// Claim the bus for a receive
    pub fn begin_receive(&mut self) -> Result<(), TransferError> {
        if self.active.is_some() {
            return Err(TransferError::Busy);
        }
        self.active = Some(ActiveTransfer::Receive);
        self.bus.set_direction(BusDirection::Input);
        Ok(())
    }

    /// Receive one byte of a transfer started with [`TransferPort::begin_receive`]
    pub fn receive_byte(&mut self) -> Result<u8, TransferError> {
        if self.active != Some(ActiveTransfer::Receive) {
            return Err(TransferError::NotActive);
        }
        self.engine.restart(EngineMode::Receive);
        Ok(self.engine.get() as u8)
    }

    /// Release the bus
    ///
    /// Data pins are left as inputs so the host can drive them.
    pub fn end(&mut self) {
        if self.active.take() == Some(ActiveTransfer::Send) {
            self.bus.set_direction(BusDirection::Input);
        }
    }

    /// Send `bytes` to the host
    ///
    /// Fails with no side effects if a transfer is already active.
    pub fn send_data(&mut self, bytes: &[u8]) -> Result<(), TransferError> {
        self.begin_send()?;
        for &byte in bytes {
            self.send_byte(byte)?;
        }
        self.end();
        Ok(())
    }

    /// Receive exactly `buffer.len()` bytes from the host
    pub fn receive_data(&mut self, buffer: &mut [u8]) -> Result<(), TransferError> {
        self.begin_receive()?;
        for slot in buffer.iter_mut() {
            *slot = self.receive_byte()?;
        }
        self.end();
        Ok(())
    }

    /// Send a response framed by the Ready line
    ///
    /// Ready drops for the duration of the transfer and rises once the last
    /// byte has gone out. When the port is busy nothing is touched.
    pub fn send_response(&mut self, bytes: &[u8]) -> Result<(), TransferError> {
        if self.active.is_some() {
            return Err(TransferError::Busy);
        }
        self.ready.set_low();
        let result = self.send_data(bytes);
        self.ready.set_high();
        result
    }

    /// Receive a reply from the host
    pub fn wait_response(&mut self, buffer: &mut [u8]) -> Result<(), TransferError> {
        self.awaiting_response = true;
        let result = self.receive_data(buffer);
        self.awaiting_response = false;
        result
    }

    /// Give the hardware back
    pub fn release(self) -> (E, B, W, HostLines<CS, RW>) {
        (self.engine, self.bus, self.ready, self.lines)
    }
}

impl<E, B, W, CS, RW> Responder for TransferPort<E, B, W, CS, RW>
where
    E: SymbolEngine,
    B: DataBus,
    W: OutputPin,
    CS: InputPin,
    RW: InputPin,
{
    type Error = TransferError;

    fn respond(&mut self, bytes: &[u8]) -> Result<(), TransferError> {
        self.send_response(bytes)
    }
}
