//! GPIO implementations
//!
//! Plain control lines wrap embassy's `Output`/`Input`. The host data pins
//! belong to a PIO state machine, so their direction is switched with the
//! pad output-enable override instead of through the state machine.

use embassy_rp::gpio::{Input, Output};
use embassy_rp::pac;
use embassy_rp::pac::io::vals::Oeover;

use crate::pins::{HOST_D0, HOST_DATA_PINS};
use tako_hal::{BusDirection, DataBus, InputPin, OutputPin};

/// Push-pull output line
pub struct RpOutput<'d>(Output<'d>);

impl<'d> RpOutput<'d> {
    pub fn new(pin: Output<'d>) -> Self {
        Self(pin)
    }
}

impl OutputPin for RpOutput<'_> {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }

    fn toggle(&mut self) {
        self.0.toggle();
    }
}

/// Sampled input line
pub struct RpInput<'d>(Input<'d>);

impl<'d> RpInput<'d> {
    pub fn new(pin: Input<'d>) -> Self {
        Self(pin)
    }
}

impl InputPin for RpInput<'_> {
    fn is_high(&self) -> bool {
        self.0.is_high()
    }
}

/// Direction control of the eight host data pins
///
/// The pins must already be handed to the host-bus state machine.
pub struct HostDataBus {
    direction: BusDirection,
}

impl HostDataBus {
    /// Take control of the pad overrides; the bus starts as input
    pub fn new() -> Self {
        let mut bus = Self {
            direction: BusDirection::Input,
        };
        bus.set_direction(BusDirection::Input);
        bus
    }
}

impl Default for HostDataBus {
    fn default() -> Self {
        Self::new()
    }
}

impl DataBus for HostDataBus {
    fn set_direction(&mut self, direction: BusDirection) {
        let over = match direction {
            BusDirection::Input => Oeover::DISABLE,
            BusDirection::Output => Oeover::ENABLE,
        };
        for pin in HOST_D0..HOST_D0 + HOST_DATA_PINS {
            pac::IO_BANK0
                .gpio(pin as usize)
                .ctrl()
                .modify(|w| w.set_oeover(over));
        }
        self.direction = direction;
    }

    fn direction(&self) -> BusDirection {
        self.direction
    }
}
