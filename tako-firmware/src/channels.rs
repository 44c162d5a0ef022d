//! Inter-core communication
//!
//! Commands travel from core 1 to core 0 through the command queue; the
//! replies the host asked for travel back through [`RESPONSES`], since only
//! core 1 may touch the host bus.

use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use heapless::Vec;
use tako_core::traits::Responder;
use tako_protocol::STATUS_RECORD_LEN;

/// Channel capacity for pending responses
const RESPONSE_CHANNEL_SIZE: usize = 4;

/// Wire bytes of one reply
pub type ResponseBytes = Vec<u8, STATUS_RECORD_LEN>;

/// Replies waiting to be sent to the host
pub static RESPONSES: Channel<CriticalSectionRawMutex, ResponseBytes, RESPONSE_CHANNEL_SIZE> =
    Channel::new();

/// Dispatcher-side responder that hands replies to core 1
///
/// Blocks while the channel is full, like a direct bus transfer would.
pub struct ChannelResponder;

impl Responder for ChannelResponder {
    type Error = Infallible;

    fn respond(&mut self, bytes: &[u8]) -> Result<(), Infallible> {
        // Responses are at most one status record long
        let mut reply: ResponseBytes = bytes.iter().copied().take(STATUS_RECORD_LEN).collect();
        loop {
            match RESPONSES.try_send(reply) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(back)) => reply = back,
            }
        }
    }
}
