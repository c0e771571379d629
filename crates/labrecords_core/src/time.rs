//! Wall-clock abstraction for audit timestamps.
//!
//! Repositories never read the system clock directly; they ask a
//! `TimeSource`, which keeps timestamp behavior deterministic under test.

use crate::model::record::EpochMillis;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" in Unix epoch milliseconds.
pub trait TimeSource {
    fn now_epoch_ms(&self) -> EpochMillis;
}

/// Reads the operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_epoch_ms(&self) -> EpochMillis {
        // A clock set before 1970 reports the epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                EpochMillis::try_from(elapsed.as_millis()).unwrap_or(EpochMillis::MAX)
            })
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now_epoch_ms(&self) -> EpochMillis {
        (**self).now_epoch_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::{SystemTimeSource, TimeSource};

    #[test]
    fn system_time_is_after_2020() {
        assert!(SystemTimeSource.now_epoch_ms() > 1_577_836_800_000);
    }

    #[test]
    fn references_delegate_to_the_source() {
        let source = SystemTimeSource;
        let by_ref: &dyn TimeSource = &source;
        assert!(by_ref.now_epoch_ms() > 0);
    }
}
