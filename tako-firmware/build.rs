//! Build script for tako-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates board.toml at compile time
//! - Generates the `BoardConfig` constant from board.toml

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Panel limits of the per-line visibility table
const MAX_WIDTH: i64 = 480;
const MAX_HEIGHT: i64 = 320;

/// Two RGB565 frame buffers must fit next to everything else in SRAM
const MAX_FRAME_PIXELS: i64 = 102_400;

/// End of the fixed region map
const MAPPED_END: i64 = 0x20_0000;

/// 24-bit PSRAM addressing
const ADDRESS_SPACE_LIMIT: i64 = 1 << 24;

/// Bytes written by the boot self-test
const SELF_TEST_LEN: i64 = 8;

fn main() {
    setup_linker();
    let board = validate_config();
    generate_config(&board);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Values the firmware needs from board.toml
struct Board {
    width: i64,
    height: i64,
    rotation: &'static str,
    spi_hz: i64,
    backdrop: i64,
    memory_size: i64,
    test_address: i64,
    qspi_hz: i64,
    frame_rate: i64,
}

/// Validate board.toml configuration at compile time
fn validate_config() -> Board {
    println!("cargo:rerun-if-changed=board.toml");

    let config_path = Path::new("board.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: board.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a board.toml description file.            ║\n\
            ║  Please create one in the tako-firmware directory.               ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read board.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in board.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    validate_required_sections(&config);

    let mut errors = Vec::new();
    let display = validate_display(&config, &mut errors);
    let memory = validate_memory(&config, &mut errors);
    let frame_rate = validate_frame(&config, &mut errors);
    report("Invalid board configuration", &errors);

    let (width, height, rotation, spi_hz, backdrop) = display;
    let (memory_size, test_address, qspi_hz) = memory;
    let board = Board {
        width,
        height,
        rotation,
        spi_hz,
        backdrop,
        memory_size,
        test_address,
        qspi_hz,
        frame_rate,
    };

    println!("cargo:warning=board.toml validated successfully");
    board
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Abort the build listing every problem found
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Validate that required sections exist
fn validate_required_sections(config: &toml::Value) {
    let errors: Vec<String> = ["display", "memory", "frame"]
        .iter()
        .filter(|section| !matches!(config.get(**section), Some(toml::Value::Table(_))))
        .map(|section| format!("Missing [{}] section", section))
        .collect();

    report("Missing required sections in board.toml", &errors);
}

/// Integer field `key` of `[section]`, recording an error when absent
fn integer(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) -> i64 {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::Integer(value)) => *value,
        Some(_) => {
            errors.push(format!("[{}] '{}' must be an integer", section, key));
            0
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            0
        }
    }
}

fn validate_display(
    config: &toml::Value,
    errors: &mut Vec<String>,
) -> (i64, i64, &'static str, i64, i64) {
    let width = integer(config, "display", "width", errors);
    let height = integer(config, "display", "height", errors);
    let rotation = integer(config, "display", "rotation", errors);
    let spi_hz = integer(config, "display", "spi_hz", errors);
    let backdrop = integer(config, "display", "backdrop", errors);

    if !(1..=MAX_WIDTH).contains(&width) {
        errors.push(format!("[display] width must be 1-{}", MAX_WIDTH));
    }
    if !(1..=MAX_HEIGHT).contains(&height) {
        errors.push(format!("[display] height must be 1-{}", MAX_HEIGHT));
    }
    if width * height > MAX_FRAME_PIXELS {
        errors.push(format!(
            "[display] width x height must not exceed {} pixels",
            MAX_FRAME_PIXELS
        ));
    }

    let rotation = match rotation {
        0 => "Deg0",
        90 => "Deg90",
        180 => "Deg180",
        270 => "Deg270",
        _ => {
            errors.push("[display] rotation must be 0, 90, 180 or 270".to_string());
            "Deg0"
        }
    };

    if !(1..=150_000_000).contains(&spi_hz) {
        errors.push("[display] spi_hz must be 1-150000000".to_string());
    }
    if !(0..=0xFFFF).contains(&backdrop) {
        errors.push("[display] backdrop must be an RGB565 value".to_string());
    }

    (width, height, rotation, spi_hz, backdrop)
}

fn validate_memory(config: &toml::Value, errors: &mut Vec<String>) -> (i64, i64, i64) {
    let size = integer(config, "memory", "size", errors);
    let test_address = integer(config, "memory", "test_address", errors);
    let qspi_hz = integer(config, "memory", "qspi_hz", errors);

    if !(MAPPED_END..=ADDRESS_SPACE_LIMIT).contains(&size) {
        errors.push(format!(
            "[memory] size must be {:#x}-{:#x}",
            MAPPED_END, ADDRESS_SPACE_LIMIT
        ));
    }
    if test_address < MAPPED_END || test_address + SELF_TEST_LEN > size {
        errors.push("[memory] test_address must lie past the mapped regions".to_string());
    }
    // APS6404 quad fast read tops out at 133 MHz
    if !(1..=133_000_000).contains(&qspi_hz) {
        errors.push("[memory] qspi_hz must be 1-133000000".to_string());
    }

    (size, test_address, qspi_hz)
}

fn validate_frame(config: &toml::Value, errors: &mut Vec<String>) -> i64 {
    let rate = integer(config, "frame", "rate", errors);
    if !(1..=255).contains(&rate) {
        errors.push("[frame] rate must be 1-255".to_string());
    }
    rate
}

/// Write `board.rs` into OUT_DIR
fn generate_config(board: &Board) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let source = format!(
        "/// Board description from board.toml\n\
         pub const BOARD: BoardConfig = BoardConfig {{\n\
         \x20   display: DisplayConfig {{\n\
         \x20       width: {width},\n\
         \x20       height: {height},\n\
         \x20       rotation: Rotation::{rotation},\n\
         \x20   }},\n\
         \x20   memory: MemoryConfig {{\n\
         \x20       size: {size:#x},\n\
         \x20       test_address: {test_address:#x},\n\
         \x20   }},\n\
         \x20   frame_rate: {frame_rate},\n\
         }};\n\
         \n\
         /// Pixels in one frame buffer\n\
         pub const FRAME_PIXELS: usize = {pixels};\n\
         \n\
         /// Panel SPI clock in Hz\n\
         pub const PANEL_SPI_HZ: u32 = {spi_hz};\n\
         \n\
         /// PSRAM clock in Hz\n\
         pub const PSRAM_QSPI_HZ: u32 = {qspi_hz};\n\
         \n\
         /// Color behind all sprites\n\
         pub const BACKDROP: u16 = {backdrop:#06x};\n",
        width = board.width,
        height = board.height,
        rotation = board.rotation,
        size = board.memory_size,
        test_address = board.test_address,
        frame_rate = board.frame_rate,
        pixels = board.width * board.height,
        spi_hz = board.spi_hz,
        qspi_hz = board.qspi_hz,
        backdrop = board.backdrop,
    );

    let mut f = File::create(out_dir.join("board.rs")).unwrap();
    f.write_all(source.as_bytes()).unwrap();
}
