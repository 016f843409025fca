use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::DecodeError;

/// Monotonic counters shared between the parser handle and its worker.
///
/// Counters only reset on start; per-datagram failures are counted here and
/// never surfaced as errors.
#[derive(Debug, Default)]
pub struct ParserStats {
    received: AtomicU64,
    delivered: AtomicU64,
    too_short: AtomicU64,
    bad_framing: AtomicU64,
    bad_checksum: AtomicU64,
    length_mismatch: AtomicU64,
    bad_bcd: AtomicU64,
    bad_body: AtomicU64,
    unknown_format: AtomicU64,
    filtered: AtomicU64,
    sink_panics: AtomicU64,
    transient_errors: AtomicU64,
}

/// Point-in-time, read-only view of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Datagrams read off the socket
    pub received: u64,
    /// Records handed to the sink
    pub delivered: u64,
    pub too_short: u64,
    pub bad_framing: u64,
    pub bad_checksum: u64,
    pub length_mismatch: u64,
    pub bad_bcd: u64,
    pub bad_body: u64,
    /// Valid frames with no typed decoder, dropped
    pub unknown_format: u64,
    /// Valid frames outside the configured allow-set
    pub filtered: u64,
    /// Sink invocations that panicked
    pub sink_panics: u64,
    /// Socket read errors that were retried
    pub transient_errors: u64,
}

impl ParserStats {
    pub(crate) fn bump_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn bump_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn bump_unknown_format(&self) {
        self.unknown_format.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn bump_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn bump_sink_panics(&self) {
        self.sink_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn bump_transient_errors(&self) {
        self.transient_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self, error: &DecodeError) {
        let counter = match error {
            DecodeError::TooShort(_) => &self.too_short,
            DecodeError::BadFraming => &self.bad_framing,
            DecodeError::BadChecksum { .. } => &self.bad_checksum,
            DecodeError::LengthMismatch { .. } => &self.length_mismatch,
            DecodeError::BadBcd(_) => &self.bad_bcd,
            DecodeError::BadBody(_) => &self.bad_body,
            DecodeError::UnknownFormat(_) => &self.unknown_format,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.received.store(0, Ordering::Relaxed);
        self.delivered.store(0, Ordering::Relaxed);
        self.too_short.store(0, Ordering::Relaxed);
        self.bad_framing.store(0, Ordering::Relaxed);
        self.bad_checksum.store(0, Ordering::Relaxed);
        self.length_mismatch.store(0, Ordering::Relaxed);
        self.bad_bcd.store(0, Ordering::Relaxed);
        self.bad_body.store(0, Ordering::Relaxed);
        self.unknown_format.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.sink_panics.store(0, Ordering::Relaxed);
        self.transient_errors.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            too_short: self.too_short.load(Ordering::Relaxed),
            bad_framing: self.bad_framing.load(Ordering::Relaxed),
            bad_checksum: self.bad_checksum.load(Ordering::Relaxed),
            length_mismatch: self.length_mismatch.load(Ordering::Relaxed),
            bad_bcd: self.bad_bcd.load(Ordering::Relaxed),
            bad_body: self.bad_body.load(Ordering::Relaxed),
            unknown_format: self.unknown_format.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            sink_panics: self.sink_panics.load(Ordering::Relaxed),
            transient_errors: self.transient_errors.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Sum of every per-datagram drop reason
    pub fn dropped(&self) -> u64 {
        self.too_short
            + self.bad_framing
            + self.bad_checksum
            + self.length_mismatch
            + self.bad_bcd
            + self.bad_body
            + self.unknown_format
            + self.filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_land_in_their_counter() {
        let stats = ParserStats::default();
        stats.record_error(&DecodeError::TooShort(4));
        stats.record_error(&DecodeError::BadChecksum {
            expected: 1,
            computed: 2,
        });
        stats.record_error(&DecodeError::BadChecksum {
            expected: 3,
            computed: 4,
        });
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.too_short, 1);
        assert_eq!(snapshot.bad_checksum, 2);
        assert_eq!(snapshot.dropped(), 3);
    }

    #[test]
    fn reset_clears_everything() {
        let stats = ParserStats::default();
        stats.bump_received();
        stats.bump_delivered();
        stats.record_error(&DecodeError::BadFraming);
        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }
}
