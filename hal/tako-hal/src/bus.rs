//! Shared host data bus
//!
//! The host link is an 8-bit bidirectional bus. The device drives it only
//! while sending a response and otherwise leaves it as input.

/// Direction of the data pins from the device's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusDirection {
    /// Pins sample the host
    Input,
    /// Pins drive the host
    Output,
}

/// Direction control for the data pins
pub trait DataBus {
    /// Switch all data pins to `direction`
    fn set_direction(&mut self, direction: BusDirection);

    /// Current direction of the data pins
    fn direction(&self) -> BusDirection;
}
