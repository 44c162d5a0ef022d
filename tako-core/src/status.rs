//! Device status shared between contexts
//!
//! The whole record is packed into one 64-bit atomic and updated by
//! compare-and-swap, so a reader never sees a torn mix of two updates.
//! The status code is derived on every update: `Error` while an error code
//! is latched, otherwise `Busy` while any busy flag is set, otherwise `Ok`.

use portable_atomic::{AtomicU64, Ordering};
use tako_protocol::{ErrorCode, StatusCode, StatusRecord, STATUS_RECORD_LEN};

fn pack(record: StatusRecord) -> u64 {
    u64::from_le_bytes(record.to_bytes())
}

fn unpack(bits: u64) -> StatusRecord {
    let bytes: [u8; STATUS_RECORD_LEN] = bits.to_le_bytes();
    // Only ever holds bytes produced by `pack`
    StatusRecord::from_bytes(&bytes).unwrap_or_default()
}

fn derive_status(mut record: StatusRecord) -> StatusRecord {
    record.status = if record.error != ErrorCode::None {
        StatusCode::Error
    } else if record.busy_flags != 0 {
        StatusCode::Busy
    } else {
        StatusCode::Ok
    };
    record
}

/// Lock-free status record
pub struct SharedStatus {
    bits: AtomicU64,
}

impl SharedStatus {
    /// Idle status reporting `frame_rate`
    pub fn new(frame_rate: u8) -> Self {
        let record = StatusRecord {
            frame_rate,
            ..StatusRecord::default()
        };
        Self {
            bits: AtomicU64::new(pack(record)),
        }
    }

    /// Consistent copy of the current record
    pub fn snapshot(&self) -> StatusRecord {
        unpack(self.bits.load(Ordering::Acquire))
    }

    fn update(&self, f: impl Fn(StatusRecord) -> StatusRecord) {
        let _ = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some(pack(derive_status(f(unpack(bits)))))
            });
    }

    pub fn set_busy(&self, flags: u8) {
        self.update(|mut r| {
            r.busy_flags |= flags;
            r
        });
    }

    pub fn clear_busy(&self, flags: u8) {
        self.update(|mut r| {
            r.busy_flags &= !flags;
            r
        });
    }

    /// Latch an error code
    pub fn set_error(&self, error: ErrorCode) {
        self.update(|mut r| {
            r.error = error;
            r
        });
    }

    pub fn clear_error(&self) {
        self.set_error(ErrorCode::None);
    }

    pub fn set_sprite_count(&self, count: u8) {
        self.update(|mut r| {
            r.sprite_count = count;
            r
        });
    }

    pub fn set_frame_rate(&self, fps: u8) {
        self.update(|mut r| {
            r.frame_rate = fps;
            r
        });
    }

    /// Set `flags` for the duration of `f`
    pub fn while_busy<T>(&self, flags: u8, f: impl FnOnce() -> T) -> T {
        self.set_busy(flags);
        let result = f();
        self.clear_busy(flags);
        result
    }
}

impl Default for SharedStatus {
    fn default() -> Self {
        Self::new(tako_protocol::status::DEFAULT_FRAME_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tako_protocol::busy;

    #[test]
    fn test_idle_snapshot() {
        let status = SharedStatus::default();
        let record = status.snapshot();
        assert_eq!(record.status, StatusCode::Ok);
        assert_eq!(record.frame_rate, 60);
        assert_eq!(record.busy_flags, 0);
    }

    #[test]
    fn test_busy_flags_independent() {
        let status = SharedStatus::default();
        status.set_busy(busy::PATTERN);
        status.set_busy(busy::DMA);
        assert_eq!(status.snapshot().status, StatusCode::Busy);

        status.clear_busy(busy::PATTERN);
        let record = status.snapshot();
        assert_eq!(record.busy_flags, busy::DMA);
        assert_eq!(record.status, StatusCode::Busy);

        status.clear_busy(busy::DMA);
        assert_eq!(status.snapshot().status, StatusCode::Ok);
    }

    #[test]
    fn test_error_survives_busy_clear() {
        let status = SharedStatus::default();
        status.set_error(ErrorCode::MemoryFull);
        status.set_busy(busy::QUEUE);
        status.clear_busy(busy::QUEUE);

        let record = status.snapshot();
        assert_eq!(record.status, StatusCode::Error);
        assert_eq!(record.error, ErrorCode::MemoryFull);

        status.clear_error();
        assert_eq!(status.snapshot().status, StatusCode::Ok);
    }

    #[test]
    fn test_counters() {
        let status = SharedStatus::new(30);
        status.set_sprite_count(17);
        status.set_frame_rate(58);
        let record = status.snapshot();
        assert_eq!(record.sprite_count, 17);
        assert_eq!(record.frame_rate, 58);
    }

    #[test]
    fn test_while_busy() {
        let status = SharedStatus::default();
        let seen = status.while_busy(busy::SPRITE, || status.snapshot().busy_flags);
        assert_eq!(seen, busy::SPRITE);
        assert_eq!(status.snapshot().busy_flags, 0);
    }
}
