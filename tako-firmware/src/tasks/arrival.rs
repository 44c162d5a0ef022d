//! Arrival context (core 1)
//!
//! Owns the host bus. Bytes written by the host are framed into commands
//! and pushed onto the queue; replies produced on core 0 are sent back with
//! the Ready line held low for their duration.

use defmt::*;
use embassy_futures::yield_now;
use tako_core::queue::QueueError;
use tako_core::status::SharedStatus;
use tako_protocol::{busy, CommandAssembler, ErrorCode};

use crate::channels::RESPONSES;
use crate::hw::{FirmwareQueue, HostPort};

/// Send every reply core 0 has queued
fn forward_responses(port: &mut HostPort) {
    while let Ok(reply) = RESPONSES.try_receive() {
        if let Err(e) = port.send_response(&reply) {
            warn!("Reply of {} bytes dropped: {}", reply.len(), e);
        }
    }
}

#[embassy_executor::task]
pub async fn arrival_task(
    mut port: HostPort,
    queue: &'static FirmwareQueue,
    status: &'static SharedStatus,
) {
    info!("Arrival task started on core 1");

    let mut assembler = CommandAssembler::new();

    loop {
        forward_responses(&mut port);

        if !(port.host_selected() && port.host_writing()) {
            yield_now().await;
            continue;
        }

        let mut byte = [0u8];
        if let Err(e) = port.receive_data(&mut byte) {
            warn!("Host byte lost: {}", e);
            continue;
        }
        // One byte per strobe
        while port.host_selected() {}

        let Some(command) = assembler.feed(byte[0]) else {
            continue;
        };

        let needs_response = command.header.flags.needs_response();
        let response_len = command.response_len();
        trace!("Command {=u8:#x}, {} bytes", command.header.kind, command.bytes.len());

        let mut stalled = false;
        loop {
            match queue.push(command.bytes, needs_response, response_len) {
                Ok(()) => break,
                Err(QueueError::Full | QueueError::ArenaFull) => {
                    if !stalled {
                        warn!("Command queue full, holding host");
                        status.set_error(ErrorCode::MemoryFull);
                        status.set_busy(busy::QUEUE);
                        stalled = true;
                    }
                    forward_responses(&mut port);
                    yield_now().await;
                }
                Err(e) => {
                    warn!("Command dropped: {}", e);
                    break;
                }
            }
        }
        if stalled {
            status.clear_error();
            status.clear_busy(busy::QUEUE);
        }
    }
}
