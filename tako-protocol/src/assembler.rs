//! Byte-at-a-time command assembly
//!
//! The host bus delivers one byte per strobe with no framing bytes; the
//! command length is implied by the kind byte (and, for LOAD_PATTERN, by the
//! size-class byte in its metadata). Unknown kinds complete after the header.
//! A LOAD_PATTERN whose size class is not recognized completes after its
//! metadata so the dispatcher can reject it; any bitmap bytes the host sends
//! after it cannot be framed and are read as the start of new commands.

use heapless::Vec;

use crate::command::{CommandKind, SizeClass, LOAD_PATTERN_META_LEN};
use crate::header::{CommandFlags, CommandHeader, HEADER_LEN};

/// Longest command on the wire: a 64×64 LOAD_PATTERN
pub const MAX_COMMAND_LEN: usize = HEADER_LEN + LOAD_PATTERN_META_LEN + SizeClass::MAX_PATTERN_BYTES;

/// A complete command, borrowed from the assembler buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssembledCommand<'a> {
    pub header: CommandHeader,
    /// Header and payload bytes
    pub bytes: &'a [u8],
}

impl AssembledCommand<'_> {
    /// Bytes the host will read back, zero when no response was requested
    pub fn response_len(&self) -> u16 {
        if !self.header.flags.needs_response() {
            return 0;
        }
        CommandKind::from_byte(self.header.kind)
            .map(CommandKind::response_len)
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssembleState {
    /// Waiting for kind byte
    Kind,
    /// Got kind, waiting for flags
    Flags,
    /// Reading until `remaining` more bytes arrive
    Payload { remaining: usize },
    /// Reading LOAD_PATTERN metadata
    PatternMeta,
    /// Last command handed out; buffer cleared on next byte
    Complete,
}

/// State machine turning a byte stream into whole commands
#[derive(Debug, Clone)]
pub struct CommandAssembler {
    state: AssembleState,
    buffer: Vec<u8, MAX_COMMAND_LEN>,
}

impl Default for CommandAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandAssembler {
    pub const fn new() -> Self {
        Self {
            state: AssembleState::Kind,
            buffer: Vec::new(),
        }
    }

    /// Drop any partial command
    pub fn reset(&mut self) {
        self.state = AssembleState::Kind;
        self.buffer.clear();
    }

    /// True when no partial command is buffered
    pub fn is_idle(&self) -> bool {
        matches!(self.state, AssembleState::Kind | AssembleState::Complete)
    }

    /// Feed one byte
    ///
    /// Returns the command this byte completes, if any
    pub fn feed(&mut self, byte: u8) -> Option<AssembledCommand<'_>> {
        if self.state == AssembleState::Complete {
            self.reset();
        }

        // Capacity is MAX_COMMAND_LEN and every state bounds its length
        let _ = self.buffer.push(byte);

        match self.state {
            AssembleState::Kind => {
                self.state = AssembleState::Flags;
                None
            }
            AssembleState::Flags => {
                let kind = self.buffer[0];
                match CommandKind::from_byte(kind) {
                    Some(CommandKind::LoadPattern) => {
                        self.state = AssembleState::PatternMeta;
                        None
                    }
                    Some(known) => match known.fixed_payload_len() {
                        Some(0) | None => Some(self.complete()),
                        Some(len) => {
                            self.state = AssembleState::Payload { remaining: len };
                            None
                        }
                    },
                    None => Some(self.complete()),
                }
            }
            AssembleState::PatternMeta => {
                if self.buffer.len() < HEADER_LEN + LOAD_PATTERN_META_LEN {
                    return None;
                }
                let bits = self.buffer[HEADER_LEN + 2];
                match SizeClass::from_bits(bits) {
                    Some(size) => {
                        self.state = AssembleState::Payload {
                            remaining: size.pattern_bytes(),
                        };
                        None
                    }
                    // Handed on whole so the host still gets its reply
                    None => Some(self.complete()),
                }
            }
            AssembleState::Payload { remaining } => {
                if remaining <= 1 {
                    Some(self.complete())
                } else {
                    self.state = AssembleState::Payload {
                        remaining: remaining - 1,
                    };
                    None
                }
            }
            AssembleState::Complete => None,
        }
    }

    fn complete(&mut self) -> AssembledCommand<'_> {
        self.state = AssembleState::Complete;
        AssembledCommand {
            header: CommandHeader::new(self.buffer[0], CommandFlags::from_bits(self.buffer[1])),
            bytes: &self.buffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, DecodeError, LOAD_PALETTE_LEN};
    use crate::header::FLAG_NEEDS_RESPONSE;

    fn feed_all(asm: &mut CommandAssembler, bytes: &[u8]) -> Option<usize> {
        let mut done_at = None;
        for (i, &b) in bytes.iter().enumerate() {
            if asm.feed(b).is_some() {
                done_at = Some(i);
            }
        }
        done_at
    }

    #[test]
    fn test_header_only_command() {
        let mut asm = CommandAssembler::new();
        assert!(asm.feed(0x08).is_none());
        let cmd = asm.feed(FLAG_NEEDS_RESPONSE).unwrap();
        assert_eq!(cmd.header.kind, 0x08);
        assert_eq!(cmd.bytes, &[0x08, 0x80]);
        assert_eq!(cmd.response_len(), 8);
    }

    #[test]
    fn test_palette_completes_on_last_byte() {
        let mut bytes = [0u8; HEADER_LEN + LOAD_PALETTE_LEN];
        bytes[0] = 0x03;
        let mut asm = CommandAssembler::new();
        assert_eq!(feed_all(&mut asm, &bytes), Some(bytes.len() - 1));
    }

    #[test]
    fn test_pattern_length_from_size_class() {
        let mut bytes = [0u8; HEADER_LEN + 3 + 128];
        bytes[0] = 0x02;
        bytes[4] = 1; // 16x16
        bytes[5] = 0x5A;

        let mut asm = CommandAssembler::new();
        for &b in &bytes[..bytes.len() - 1] {
            assert!(asm.feed(b).is_none());
        }
        let cmd = asm.feed(bytes[bytes.len() - 1]).unwrap();
        assert_eq!(cmd.bytes.len(), bytes.len());

        let (_, decoded) = Command::decode(cmd.bytes).unwrap();
        match decoded {
            Command::LoadPattern { size, bitmap, .. } => {
                assert_eq!(size, SizeClass::Size16);
                assert_eq!(bitmap[0], 0x5A);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_largest_pattern_fits() {
        let mut asm = CommandAssembler::new();
        let mut completed = 0;
        let header_and_meta = [0x02, 0x00, 0x00, 0x00, 3];
        for &b in &header_and_meta {
            assert!(asm.feed(b).is_none());
        }
        for _ in 0..SizeClass::MAX_PATTERN_BYTES {
            if let Some(cmd) = asm.feed(0x11) {
                assert_eq!(cmd.bytes.len(), MAX_COMMAND_LEN);
                completed += 1;
            }
        }
        assert_eq!(completed, 1);
    }

    #[test]
    fn test_invalid_size_class_completes_after_meta() {
        let mut asm = CommandAssembler::new();
        for &b in &[0x02, FLAG_NEEDS_RESPONSE, 0x00, 0x00] {
            assert!(asm.feed(b).is_none());
        }
        let cmd = asm.feed(7).unwrap();
        assert_eq!(cmd.header.kind, 0x02);
        assert_eq!(cmd.bytes, &[0x02, FLAG_NEEDS_RESPONSE, 0x00, 0x00, 7]);
        assert_eq!(cmd.response_len(), 1);
        assert_eq!(Command::decode(cmd.bytes), Err(DecodeError::InvalidSizeClass(7)));
        assert!(asm.is_idle());

        // Next bytes start a new command
        asm.feed(0x08);
        assert_eq!(asm.feed(0x80).unwrap().header.kind, 0x08);
    }

    #[test]
    fn test_unknown_kind_is_header_only() {
        let mut asm = CommandAssembler::new();
        asm.feed(0x42);
        let cmd = asm.feed(0x00).unwrap();
        assert_eq!(cmd.header.kind, 0x42);
        assert_eq!(cmd.response_len(), 0);
    }

    #[test]
    fn test_back_to_back_commands() {
        let stream = [
            0x05, 0x00, 3, // ENABLE_SPRITE 3
            0x06, 0x80, 4, // DISABLE_SPRITE 4
        ];
        let mut asm = CommandAssembler::new();
        let mut kinds = heapless::Vec::<u8, 4>::new();
        for &b in &stream {
            if let Some(cmd) = asm.feed(b) {
                kinds.push(cmd.header.kind).unwrap();
            }
        }
        assert_eq!(&kinds[..], &[0x05, 0x06]);
    }
}
