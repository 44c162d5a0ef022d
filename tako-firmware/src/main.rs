//! TakoGPU - Sprite Graphics Co-processor Firmware
//!
//! Main firmware binary for RP2350-based graphics boards. The host CPU
//! writes commands over an 8-bit parallel bus; sprite patterns live in a
//! quad-SPI PSRAM and composed frames are streamed to an ST7789 panel.
//!
//! Core 1 runs the arrival context (host bus, command framing, replies).
//! Core 0 runs the frame loop (dispatch, compose, scan-out).

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{Executor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::{PIO0, PIO1, PIO2};
use embassy_rp::pio::{InterruptHandler, Pio};
use embassy_time::{block_for, Delay, Duration};
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use tako_core::display::{DisplayScanout, FrameBufferPair};
use tako_core::memory::MemoryController;
use tako_core::sprite::SpriteStore;
use tako_core::status::SharedStatus;
use tako_core::transfer::{HostLines, TransferPort};
use tako_drivers::st7789::{PanelPins, St7789};
use tako_hal::OutputPin;
use tako_hal_rp235x::dma::{PioFifoDma, PioScanoutDma};
use tako_hal_rp235x::engine::{PioEngine, QspiEngine};
use tako_hal_rp235x::gpio::{HostDataBus, RpInput, RpOutput};
use tako_hal_rp235x::pins::{SM_DISPLAY, SM_PSRAM};
use tako_hal_rp235x::pio::PioBlock;
use tako_hal_rp235x::pipeline::LineSync;

use crate::board::{BOARD, FRAME_PIXELS, PANEL_SPI_HZ, PSRAM_QSPI_HZ, QUEUE_ARENA};
use crate::hw::FirmwareQueue;
use crate::tasks::Foreground;

mod board;
mod channels;
mod hw;
mod tasks;

/// Boot ROM image definition
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: embassy_rp::block::ImageDef = embassy_rp::block::ImageDef::secure_exe();

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => InterruptHandler<PIO0>;
    PIO1_IRQ_0 => InterruptHandler<PIO1>;
    PIO2_IRQ_0 => InterruptHandler<PIO2>;
});

// Frame buffers are too large to pass through the stack
static FRAME_A: ConstStaticCell<[u16; FRAME_PIXELS]> = ConstStaticCell::new([0; FRAME_PIXELS]);
static FRAME_B: ConstStaticCell<[u16; FRAME_PIXELS]> = ConstStaticCell::new([0; FRAME_PIXELS]);
static COMMAND_BUF: ConstStaticCell<[u8; QUEUE_ARENA]> = ConstStaticCell::new([0; QUEUE_ARENA]);

static CORE1_STACK: ConstStaticCell<Stack<8192>> = ConstStaticCell::new(Stack::new());
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();

static QUEUE: StaticCell<FirmwareQueue> = StaticCell::new();
static STATUS: StaticCell<SharedStatus> = StaticCell::new();

/// Blink the status LED at 5 Hz forever
fn halt(led: &mut RpOutput<'_>) -> ! {
    loop {
        led.set_high();
        block_for(Duration::from_millis(100));
        led.set_low();
        block_for(Duration::from_millis(100));
    }
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("TakoGPU firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let mut led = RpOutput::new(Output::new(p.PIN_25, Level::High));

    if let Err(e) = BOARD.validate() {
        error!("Board configuration rejected: {}", e);
        halt(&mut led);
    }
    info!(
        "Board: {}x{} panel, {} byte PSRAM",
        BOARD.display.width, BOARD.display.height, BOARD.memory.size
    );

    let mut delay = Delay;

    let Pio {
        common: mut pio0,
        sm0: psram_sm,
        sm1: host_sm,
        ..
    } = Pio::new(p.PIO0, Irqs);
    let Pio {
        common: mut pio1,
        sm0: panel_sm,
        ..
    } = Pio::new(p.PIO1, Irqs);
    let Pio {
        common: mut pio2,
        sm0: sync_sm,
        ..
    } = Pio::new(p.PIO2, Irqs);

    // External memory
    info!("Initializing PSRAM...");
    let psram_sck = pio0.make_pio_pin(p.PIN_18);
    let psram_data = [
        pio0.make_pio_pin(p.PIN_19),
        pio0.make_pio_pin(p.PIN_20),
        pio0.make_pio_pin(p.PIN_21),
        pio0.make_pio_pin(p.PIN_22),
    ];
    let qspi = QspiEngine::new(
        &mut pio0,
        psram_sm,
        PioBlock::Pio0,
        &psram_sck,
        &psram_data,
        PSRAM_QSPI_HZ,
    );
    let psram_dma = PioFifoDma::new(p.DMA_CH0, PioBlock::Pio0, SM_PSRAM);
    let psram_cs = RpOutput::new(Output::new(p.PIN_23, Level::High));
    let mut memory = MemoryController::new(qspi, psram_dma, psram_cs, BOARD.memory, &mut delay);

    info!("Testing PSRAM...");
    let report = memory.self_test(&mut delay);
    if !report.passed {
        error!(
            "PSRAM test failed at address {=u32:#010x}: expected {=u8:#04x}, received {=u8:#04x}",
            report.failed_address, report.expected, report.received
        );
        halt(&mut led);
    }

    // Panel
    info!("Initializing display...");
    let mosi = pio1.make_pio_pin(p.PIN_12);
    let sck = pio1.make_pio_pin(p.PIN_13);
    let panel_engine = PioEngine::panel_spi(&mut pio1, panel_sm, PioBlock::Pio1, &mosi, &sck, PANEL_SPI_HZ);
    let panel_pins = PanelPins {
        dc: RpOutput::new(Output::new(p.PIN_15, Level::High)),
        cs: RpOutput::new(Output::new(p.PIN_14, Level::High)),
        rst: RpOutput::new(Output::new(p.PIN_16, Level::High)),
        bl: RpOutput::new(Output::new(p.PIN_17, Level::Low)),
    };
    let mut panel = St7789::new(panel_engine, panel_pins, &BOARD.display);
    panel.init(&mut delay);

    let status: &'static SharedStatus = STATUS.init(SharedStatus::new(BOARD.frame_rate));
    let buffers = match FrameBufferPair::new(FRAME_A.take(), FRAME_B.take()) {
        Ok(buffers) => buffers,
        Err(e) => {
            error!("Frame buffers rejected: {}", e);
            halt(&mut led);
        }
    };
    let scanout_dma = PioScanoutDma::new(p.DMA_CH1, PioBlock::Pio1, SM_DISPLAY);
    let scanout = match DisplayScanout::new(panel, scanout_dma, buffers, &BOARD.display, status) {
        Ok(scanout) => scanout,
        Err(e) => {
            error!("Display initialization failed: {}", e);
            halt(&mut led);
        }
    };

    // Sprite engine
    info!("Initializing sprite engine...");
    let sync_pin = pio2.make_pio_pin(p.PIN_26);
    let lines = LineSync::new(&mut pio2, sync_sm, PioBlock::Pio2, &sync_pin);
    let sprites = match SpriteStore::new(&BOARD.display) {
        Ok(sprites) => sprites,
        Err(e) => {
            error!("Sprite engine initialization failed: {}", e);
            halt(&mut led);
        }
    };

    info!("Initializing command queue...");
    let queue: &'static FirmwareQueue = QUEUE.init(FirmwareQueue::new());

    // Host bus
    info!("Initializing transfer system...");
    let host_data = [
        pio0.make_pio_pin(p.PIN_0),
        pio0.make_pio_pin(p.PIN_1),
        pio0.make_pio_pin(p.PIN_2),
        pio0.make_pio_pin(p.PIN_3),
        pio0.make_pio_pin(p.PIN_4),
        pio0.make_pio_pin(p.PIN_5),
        pio0.make_pio_pin(p.PIN_6),
        pio0.make_pio_pin(p.PIN_7),
    ];
    let host_engine = PioEngine::host_bus(&mut pio0, host_sm, PioBlock::Pio0, &host_data);
    let host_lines = HostLines {
        cs: RpInput::new(Input::new(p.PIN_8, Pull::Up)),
        rw: RpInput::new(Input::new(p.PIN_9, Pull::Up)),
    };
    let ready = RpOutput::new(Output::new(p.PIN_10, Level::Low));
    let port = TransferPort::new(host_engine, HostDataBus::new(), ready, host_lines);

    info!("Hardware initialization complete!");

    spawn_core1(p.CORE1, CORE1_STACK.take(), move || {
        let executor1 = EXECUTOR1.init(Executor::new());
        executor1.run(|spawner| {
            spawner
                .spawn(tasks::arrival_task(port, queue, status))
                .unwrap()
        });
    });

    led.set_low();

    tasks::foreground_loop(Foreground {
        memory,
        sprites,
        scanout,
        lines,
        queue,
        status,
        led,
        command: COMMAND_BUF.take(),
    })
    .await
}
