//! Symbol engine abstraction
//!
//! A symbol engine is a small hardware microprogram (a PIO state machine on
//! the RP2350) that bit-bangs one bus protocol. The core never sees the
//! microcode: it restarts the engine at an entry point, pushes symbols into
//! its TX FIFO and pulls symbols out of its RX FIFO.
//!
//! All operations block. There is no timeout at this layer; a peer that
//! never strobes the bus stalls the caller.

/// Entry point an engine is restarted at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineMode {
    /// Drive symbols out of the TX FIFO onto the bus
    Send,
    /// Sample symbols from the bus into the RX FIFO
    Receive,
}

/// One-symbol-per-call engine
pub trait SymbolEngine {
    /// Stop the engine, clear both FIFOs and restart it at `mode`'s entry point
    fn restart(&mut self, mode: EngineMode);

    /// Push one symbol, blocking until the TX FIFO accepts it
    fn put(&mut self, symbol: u32);

    /// Pull one symbol, blocking until the RX FIFO holds one
    fn get(&mut self) -> u32;

    /// Check whether the RX FIFO is empty
    fn rx_is_empty(&self) -> bool;

    /// Discard everything currently waiting in the RX FIFO
    fn drain_rx(&mut self) {
        while !self.rx_is_empty() {
            let _ = self.get();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Loopback {
        rx: [u32; 4],
        len: usize,
    }

    impl SymbolEngine for Loopback {
        fn restart(&mut self, _mode: EngineMode) {
            self.len = 0;
        }

        fn put(&mut self, symbol: u32) {
            self.rx[self.len] = symbol;
            self.len += 1;
        }

        fn get(&mut self) -> u32 {
            self.len -= 1;
            self.rx[self.len]
        }

        fn rx_is_empty(&self) -> bool {
            self.len == 0
        }
    }

    #[test]
    fn test_drain_rx_empties_fifo() {
        let mut engine = Loopback { rx: [0; 4], len: 0 };
        engine.put(1);
        engine.put(2);
        engine.put(3);
        assert!(!engine.rx_is_empty());

        engine.drain_rx();
        assert!(engine.rx_is_empty());
    }

    #[test]
    fn test_drain_rx_on_empty_fifo_is_noop() {
        let mut engine = Loopback { rx: [0; 4], len: 0 };
        engine.drain_rx();
        assert!(engine.rx_is_empty());
    }
}
