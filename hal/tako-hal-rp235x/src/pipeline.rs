//! Line-sync state machine
//!
//! Takes a scanline number, pulses the sync pin for the external line
//! hardware and echoes the number back through its RX FIFO as the compose
//! result.

use embassy_rp::pio::{Common, Config, Direction as PioDirection, Instance, Pin, StateMachine};
use tako_core::traits::LinePipeline;

use crate::pio::PioBlock;

pub struct LineSync<'d, P: Instance, const SM: usize> {
    sm: StateMachine<'d, P, SM>,
    block: PioBlock,
}

impl<'d, P: Instance, const SM: usize> LineSync<'d, P, SM> {
    pub fn new(
        common: &mut Common<'d, P>,
        mut sm: StateMachine<'d, P, SM>,
        block: PioBlock,
        sync: &Pin<'d, P>,
    ) -> Self {
        let prg = pio::pio_asm!(
            ".wrap_target",
            "    pull block",
            "    set pins, 1",
            "    mov isr, osr",
            "    set pins, 0",
            "    push block",
            ".wrap",
        );
        let loaded = common.load_program(&prg.program);

        let mut cfg = Config::default();
        cfg.use_program(&loaded, &[]);
        cfg.set_set_pins(&[sync]);
        sm.set_config(&cfg);
        sm.set_pin_dirs(PioDirection::Out, &[sync]);
        sm.set_enable(true);

        Self { sm, block }
    }
}

impl<P: Instance, const SM: usize> LinePipeline for LineSync<'_, P, SM> {
    fn submit_line(&mut self, line: u16) {
        while !self.sm.tx().try_push(u32::from(line)) {}
    }

    fn has_results(&self) -> bool {
        !self.block.rx_is_empty(SM as u8)
    }

    fn take_result(&mut self) -> u32 {
        loop {
            if let Some(word) = self.sm.rx().try_pull() {
                return word;
            }
        }
    }
}
