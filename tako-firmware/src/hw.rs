//! Concrete peripheral types of the board
//!
//! Embassy tasks cannot be generic, so the core types are pinned down here.

use embassy_rp::peripherals::{DMA_CH0, DMA_CH1, PIO0, PIO1, PIO2};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use tako_core::display::DisplayScanout;
use tako_core::memory::MemoryController;
use tako_core::queue::CommandQueue;
use tako_core::transfer::TransferPort;
use tako_drivers::st7789::St7789;
use tako_hal_rp235x::dma::{PioFifoDma, PioScanoutDma};
use tako_hal_rp235x::engine::{PioEngine, QspiEngine};
use tako_hal_rp235x::gpio::{HostDataBus, RpInput, RpOutput};
use tako_hal_rp235x::pipeline::LineSync;

use crate::board::{QUEUE_ARENA, QUEUE_SLOTS};

/// APS6404 on PIO0 SM0 with DMA channel 0
pub type Psram = MemoryController<
    QspiEngine<'static, PIO0, 0>,
    PioFifoDma<'static, DMA_CH0>,
    RpOutput<'static>,
>;

/// ST7789 on PIO1 SM0
pub type PanelDriver = St7789<
    PioEngine<'static, PIO1, 0>,
    RpOutput<'static>,
    RpOutput<'static>,
    RpOutput<'static>,
    RpOutput<'static>,
>;

/// Panel plus its scan-out DMA on channel 1
pub type Scanout = DisplayScanout<'static, PanelDriver, PioScanoutDma<'static, DMA_CH1>>;

/// Line sync on PIO2 SM0
pub type Lines = LineSync<'static, PIO2, 0>;

/// Host bus on PIO0 SM1
pub type HostPort = TransferPort<
    PioEngine<'static, PIO0, 1>,
    HostDataBus,
    RpOutput<'static>,
    RpInput<'static>,
    RpInput<'static>,
>;

/// Queue shared by both cores
pub type FirmwareQueue = CommandQueue<CriticalSectionRawMutex, QUEUE_SLOTS, QUEUE_ARENA>;
