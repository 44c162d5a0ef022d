//! Command queue between the arrival and foreground contexts
//!
//! A fixed ring of command slots plus a byte arena holding each command's
//! bytes as one contiguous run. One producer calls [`CommandQueue::push`],
//! one consumer calls [`CommandQueue::pop`]. Every state access goes through
//! a single blocking mutex whose critical section is bounded by one copy of
//! at most `ARENA` bytes.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use portable_atomic::{AtomicU8, Ordering};
use tako_protocol::{CommandFlags, CommandHeader, ErrorCode};

/// Default number of command slots
pub const DEFAULT_SLOTS: usize = 32;

/// Default payload arena size in bytes
pub const DEFAULT_ARENA: usize = 2048;

/// Queue with the default geometry
pub type DefaultCommandQueue<M> = CommandQueue<M, DEFAULT_SLOTS, DEFAULT_ARENA>;

/// Reasons a push is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    /// Zero-length command
    Empty,
    /// Command longer than the whole arena
    TooLarge,
    /// All usable slots hold unread commands
    Full,
    /// Not enough contiguous arena room behind unread commands
    ArenaFull,
}

/// Metadata returned by a successful pop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PoppedCommand {
    pub header: CommandHeader,
    /// Bytes copied into the caller's buffer
    pub len: usize,
    pub needs_response: bool,
    pub response_len: u16,
}

#[derive(Debug, Clone, Copy)]
struct QueuedCommand {
    header: CommandHeader,
    offset: usize,
    len: usize,
    needs_response: bool,
    response_len: u16,
}

impl QueuedCommand {
    const EMPTY: Self = Self {
        header: CommandHeader::new(0, CommandFlags::NONE),
        offset: 0,
        len: 0,
        needs_response: false,
        response_len: 0,
    };
}

struct QueueState<const SLOTS: usize, const ARENA: usize> {
    slots: [QueuedCommand; SLOTS],
    arena: [u8; ARENA],
    read: usize,
    write: usize,
    arena_pos: usize,
}

impl<const SLOTS: usize, const ARENA: usize> QueueState<SLOTS, ARENA> {
    fn next(idx: usize) -> usize {
        (idx + 1) & (SLOTS - 1)
    }

    fn is_empty(&self) -> bool {
        self.read == self.write
    }

    fn is_full(&self) -> bool {
        Self::next(self.write) == self.read
    }

    fn count(&self) -> usize {
        self.write.wrapping_sub(self.read) & (SLOTS - 1)
    }
}

/// Bounded FIFO of variable-length host commands
///
/// `SLOTS` must be a power of two; one slot is always left unused to tell
/// full from empty, so at most `SLOTS - 1` commands are queued.
pub struct CommandQueue<M: RawMutex, const SLOTS: usize, const ARENA: usize> {
    state: Mutex<M, RefCell<QueueState<SLOTS, ARENA>>>,
    error: AtomicU8,
}

impl<M: RawMutex, const SLOTS: usize, const ARENA: usize> CommandQueue<M, SLOTS, ARENA> {
    const GEOMETRY_OK: () = assert!(
        SLOTS.is_power_of_two() && SLOTS >= 2 && ARENA > 0,
        "queue slots must be a power of two >= 2 and the arena non-empty"
    );

    /// Create an empty queue
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::GEOMETRY_OK;

        Self {
            state: Mutex::new(RefCell::new(QueueState {
                slots: [QueuedCommand::EMPTY; SLOTS],
                arena: [0; ARENA],
                read: 0,
                write: 0,
                arena_pos: 0,
            })),
            error: AtomicU8::new(ErrorCode::None.to_byte()),
        }
    }

    /// Arena capacity in bytes
    pub const fn arena_capacity(&self) -> usize {
        ARENA
    }

    /// Append a command
    ///
    /// `bytes` holds header and payload. When the arena has no room left at
    /// its end and the queue is empty, the arena cursor restarts at zero.
    pub fn push(
        &self,
        bytes: &[u8],
        needs_response: bool,
        response_len: u16,
    ) -> Result<(), QueueError> {
        if bytes.is_empty() {
            return Err(QueueError::Empty);
        }
        if bytes.len() > ARENA {
            return Err(QueueError::TooLarge);
        }

        let header = CommandHeader::decode(bytes)
            .unwrap_or(CommandHeader::new(bytes[0], CommandFlags::NONE));

        self.state.lock(|cell| {
            let mut state = cell.borrow_mut();

            if state.is_full() {
                return Err(QueueError::Full);
            }

            if state.arena_pos + bytes.len() > ARENA {
                if state.is_empty() {
                    state.arena_pos = 0;
                } else {
                    return Err(QueueError::ArenaFull);
                }
            }

            let offset = state.arena_pos;
            state.arena[offset..offset + bytes.len()].copy_from_slice(bytes);

            let write = state.write;
            state.slots[write] = QueuedCommand {
                header,
                offset,
                len: bytes.len(),
                needs_response,
                response_len,
            };
            state.arena_pos = offset + bytes.len();
            state.write = QueueState::<SLOTS, ARENA>::next(write);
            Ok(())
        })
    }

    /// Remove the oldest command, copying its bytes into `out`
    ///
    /// Returns `None` without touching any state when the queue is empty.
    pub fn pop(&self, out: &mut [u8; ARENA]) -> Option<PoppedCommand> {
        self.state.lock(|cell| {
            let mut state = cell.borrow_mut();

            if state.is_empty() {
                return None;
            }

            let read = state.read;
            let cmd = state.slots[read];
            out[..cmd.len].copy_from_slice(&state.arena[cmd.offset..cmd.offset + cmd.len]);
            state.read = QueueState::<SLOTS, ARENA>::next(read);

            Some(PoppedCommand {
                header: cmd.header,
                len: cmd.len,
                needs_response: cmd.needs_response,
                response_len: cmd.response_len,
            })
        })
    }

    pub fn is_full(&self) -> bool {
        self.state.lock(|cell| cell.borrow().is_full())
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock(|cell| cell.borrow().is_empty())
    }

    pub fn has_command(&self) -> bool {
        !self.is_empty()
    }

    /// Number of unread commands
    pub fn count(&self) -> usize {
        self.state.lock(|cell| cell.borrow().count())
    }

    /// Record a sticky error code
    ///
    /// Push and pop never set this themselves.
    pub fn set_error(&self, code: ErrorCode) {
        self.error.store(code.to_byte(), Ordering::Release);
    }

    pub fn error(&self) -> ErrorCode {
        ErrorCode::from_byte(self.error.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn clear_error(&self) {
        self.error.store(ErrorCode::None.to_byte(), Ordering::Release);
    }
}

impl<M: RawMutex, const SLOTS: usize, const ARENA: usize> Default
    for CommandQueue<M, SLOTS, ARENA>
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    type SmallQueue = CommandQueue<NoopRawMutex, 4, 16>;

    #[test]
    fn test_push_pop_fifo() {
        let queue = SmallQueue::new();
        queue.push(&[0x05, 0x00, 1], false, 0).unwrap();
        queue.push(&[0x08, 0x80], true, 8).unwrap();

        let mut out = [0u8; 16];
        let first = queue.pop(&mut out).unwrap();
        assert_eq!(first.len, 3);
        assert_eq!(&out[..3], &[0x05, 0x00, 1]);
        assert!(!first.needs_response);

        let second = queue.pop(&mut out).unwrap();
        assert_eq!(second.header.kind, 0x08);
        assert!(second.header.flags.needs_response());
        assert_eq!(second.response_len, 8);

        assert!(queue.pop(&mut out).is_none());
    }

    #[test]
    fn test_pop_empty_leaves_buffer() {
        let queue = SmallQueue::new();
        let mut out = [0xEEu8; 16];
        assert!(queue.pop(&mut out).is_none());
        assert_eq!(out, [0xEE; 16]);
        assert_eq!(queue.count(), 0);
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        let queue = SmallQueue::new();
        assert_eq!(queue.push(&[], false, 0), Err(QueueError::Empty));
        assert_eq!(queue.push(&[0; 17], false, 0), Err(QueueError::TooLarge));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_one_slot_sacrificed() {
        let queue = SmallQueue::new();
        for _ in 0..3 {
            queue.push(&[0, 0], false, 0).unwrap();
        }
        assert!(queue.is_full());
        assert_eq!(queue.count(), 3);
        assert_eq!(queue.push(&[0, 0], false, 0), Err(QueueError::Full));
    }

    #[test]
    fn test_arena_full_with_pending_command() {
        let queue = SmallQueue::new();
        queue.push(&[1; 10], false, 0).unwrap();
        assert_eq!(queue.push(&[2; 7], false, 0), Err(QueueError::ArenaFull));
        assert_eq!(queue.count(), 1);
    }

    #[test]
    fn test_arena_rewinds_when_empty() {
        let queue = SmallQueue::new();
        let mut out = [0u8; 16];

        queue.push(&[1; 10], false, 0).unwrap();
        queue.pop(&mut out).unwrap();

        // Would run past the arena end, but nothing is live
        queue.push(&[2; 12], false, 0).unwrap();
        let popped = queue.pop(&mut out).unwrap();
        assert_eq!(popped.len, 12);
        assert_eq!(&out[..12], &[2; 12]);
    }

    #[test]
    fn test_full_arena_command() {
        let queue = SmallQueue::new();
        let mut out = [0u8; 16];
        queue.push(&[7; 16], false, 0).unwrap();
        assert_eq!(queue.pop(&mut out).unwrap().len, 16);
    }

    #[test]
    fn test_count_wraps() {
        let queue = SmallQueue::new();
        let mut out = [0u8; 16];
        for round in 0..10u8 {
            queue.push(&[round, 0], false, 0).unwrap();
            queue.push(&[round, 1], false, 0).unwrap();
            assert_eq!(queue.count(), 2);
            assert_eq!(queue.pop(&mut out).unwrap().header.kind, round);
            assert_eq!(queue.pop(&mut out).unwrap().header.kind, round);
            assert_eq!(queue.count(), 0);
        }
    }

    #[test]
    fn test_single_byte_command_header() {
        let queue = SmallQueue::new();
        let mut out = [0u8; 16];
        queue.push(&[0x01], false, 0).unwrap();
        let popped = queue.pop(&mut out).unwrap();
        assert_eq!(popped.header.kind, 0x01);
        assert_eq!(popped.header.flags, CommandFlags::NONE);
    }

    #[test]
    fn test_sticky_error() {
        let queue = SmallQueue::new();
        queue.clear_error();
        assert_eq!(queue.error(), ErrorCode::None);

        queue.set_error(ErrorCode::MemoryFull);
        let _ = queue.push(&[], false, 0);
        assert_eq!(queue.error(), ErrorCode::MemoryFull);

        queue.clear_error();
        assert_eq!(queue.error(), ErrorCode::None);
    }

    #[test]
    fn test_failed_push_does_not_set_error() {
        let queue = SmallQueue::new();
        for _ in 0..3 {
            queue.push(&[0, 0], false, 0).unwrap();
        }
        assert!(queue.push(&[0, 0], false, 0).is_err());
        assert_eq!(queue.error(), ErrorCode::None);
    }
}
