//! Command dispatcher
//!
//! Interprets one complete command buffer against the sprite store, the
//! external memory and the shared status. Holds no state between calls:
//! a failed command leaves nothing behind that could affect the next one.
//!
//! | Kind | Action | Response |
//! |---|---|---|
//! | NOP, INIT | none | ack `0` |
//! | LOAD_PATTERN | write bitmap to its pattern slot | `1` on success, `0` on failure |
//! | LOAD_PALETTE | replace one palette | boolean |
//! | UPDATE_SPRITE | replace one sprite | boolean |
//! | ENABLE_SPRITE / DISABLE_SPRITE | flip the enable bit | boolean |
//! | STATUS | snapshot status | 8-byte status record |
//! | RESET | clear the sprite store | ack `0` |
//! | SET_SCROLL, unknown | none | error `1` |

use heapless::Vec;
use tako_protocol::{
    busy, Command, CommandHeader, CommandKind, DecodeError, StatusRecord, HEADER_LEN,
    STATUS_RECORD_LEN,
};

use crate::sprite::{Sprite, SpriteError, SpriteStore};
use crate::status::SharedStatus;
use crate::traits::{ExternalMemory, Responder};

/// Ack byte for commands without a result
pub const ACK: u8 = 0;

/// Generic error byte
pub const ERROR: u8 = 1;

/// Reply to one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    Ack,
    Success(bool),
    Status(StatusRecord),
    Error,
}

impl Response {
    /// Wire bytes of this response
    pub fn to_bytes(&self) -> Vec<u8, STATUS_RECORD_LEN> {
        let byte = match self {
            Response::Ack => ACK,
            Response::Success(ok) => u8::from(*ok),
            Response::Error => ERROR,
            Response::Status(record) => {
                return Vec::from_slice(&record.to_bytes()).unwrap_or_default();
            }
        };
        let mut out = Vec::new();
        // Capacity is at least one byte
        let _ = out.push(byte);
        out
    }
}

/// Why a command failed, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    Decode(DecodeError),
    Sprite(SpriteError),
    Unsupported(u8),
}

/// Borrowed view of everything a command can touch
pub struct Dispatcher<'a, M: ExternalMemory> {
    sprites: &'a mut SpriteStore,
    memory: &'a mut M,
    status: &'a SharedStatus,
}

impl<'a, M: ExternalMemory> Dispatcher<'a, M> {
    pub fn new(sprites: &'a mut SpriteStore, memory: &'a mut M, status: &'a SharedStatus) -> Self {
        Self {
            sprites,
            memory,
            status,
        }
    }

    /// Execute `bytes` and build the reply the host asked for
    ///
    /// Returns `None` when the buffer is shorter than a header or the host
    /// did not request a response.
    pub fn dispatch(&mut self, bytes: &[u8]) -> Option<Response> {
        let header = CommandHeader::decode(bytes).ok()?;

        if header.flags.resets_state() {
            // Reserved: sprite-engine reset before processing is not wired yet
        }
        if header.flags.is_high_priority() {
            // Reserved: commands are always handled in arrival order
        }

        let response = match self.execute(header, &bytes[HEADER_LEN..]) {
            Ok(response) => response,
            Err(rejection) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("command {=u8:#x} rejected: {}", header.kind, rejection);
                match rejection {
                    Rejection::Unsupported(_) => Response::Error,
                    Rejection::Decode(_) | Rejection::Sprite(_) => Response::Success(false),
                }
            }
        };

        header.flags.needs_response().then_some(response)
    }

    /// Execute `bytes` and send any requested response through `responder`
    pub fn process<R: Responder>(&mut self, bytes: &[u8], responder: &mut R) -> Result<(), R::Error> {
        match self.dispatch(bytes) {
            Some(response) => responder.respond(&response.to_bytes()),
            None => Ok(()),
        }
    }

    fn execute(&mut self, header: CommandHeader, payload: &[u8]) -> Result<Response, Rejection> {
        let command = Command::decode_payload(header.kind, payload).map_err(Rejection::Decode)?;

        match command {
            Command::Nop | Command::Init => Ok(Response::Ack),
            Command::LoadPattern {
                pattern,
                size,
                bitmap,
            } => {
                let sprites = &mut *self.sprites;
                let memory = &mut *self.memory;
                self.status
                    .while_busy(busy::PATTERN | busy::DMA, || {
                        sprites.load_pattern(memory, pattern, bitmap, size)
                    })
                    .map_err(Rejection::Sprite)?;
                Ok(Response::Success(true))
            }
            Command::LoadPalette { palette, colors } => {
                let sprites = &mut *self.sprites;
                self.status
                    .while_busy(busy::PALETTE, || sprites.load_palette(palette, &colors))
                    .map_err(Rejection::Sprite)?;
                Ok(Response::Success(true))
            }
            Command::UpdateSprite(update) => {
                let sprite = Sprite {
                    x: update.x,
                    y: update.y,
                    pattern: u16::from(update.pattern),
                    attr: update.attr,
                    ctrl: update.ctrl,
                };
                let sprites = &mut *self.sprites;
                self.status
                    .while_busy(busy::SPRITE, || sprites.update_sprite(update.sprite, sprite))
                    .map_err(Rejection::Sprite)?;
                Ok(Response::Success(true))
            }
            Command::EnableSprite { sprite } => {
                let sprites = &mut *self.sprites;
                self.status
                    .while_busy(busy::SPRITE, || sprites.enable_sprite(sprite))
                    .map_err(Rejection::Sprite)?;
                Ok(Response::Success(true))
            }
            Command::DisableSprite { sprite } => {
                let sprites = &mut *self.sprites;
                self.status
                    .while_busy(busy::SPRITE, || sprites.disable_sprite(sprite))
                    .map_err(Rejection::Sprite)?;
                Ok(Response::Success(true))
            }
            Command::Status => {
                self.status.set_sprite_count(self.sprites.enabled_count());
                Ok(Response::Status(self.status.snapshot()))
            }
            Command::Reset => {
                self.sprites.reset();
                self.status.set_sprite_count(0);
                self.status.clear_error();
                Ok(Response::Ack)
            }
            Command::SetScroll { .. } => Err(Rejection::Unsupported(CommandKind::SetScroll.to_byte())),
            Command::Unknown(kind) => Err(Rejection::Unsupported(kind)),
        }
    }
}
