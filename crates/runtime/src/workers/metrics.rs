//! Mining throughput metrics.
//!
//! Tracks completed and aborted chunk jobs, hashes computed, and the recent
//! hash rate across all cores.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Completions kept for the rolling hash rate.
const RATE_WINDOW: usize = 32;

#[derive(Debug, Clone, Copy)]
struct Completion {
    finished_at: Instant,
    elapsed: Duration,
    hashes: u64,
}

/// Mining metrics tracked by the miner worker.
///
/// Counters are atomics for lock-free reads from the façade; only the
/// rolling rate window takes a short lock.
#[derive(Debug, Default)]
pub struct MiningMetrics {
    /// Chunks mined to completion
    chunks_mined: AtomicU64,

    /// Jobs cancelled by stop or a pattern switch
    chunks_aborted: AtomicU64,

    /// Hashes computed, including those of aborted jobs
    hashes: AtomicU64,

    /// Sum of completed job durations, in nanoseconds
    total_mining_time_nanos: AtomicU64,

    /// Jobs currently running
    in_flight: AtomicU64,

    /// Peak concurrent jobs observed
    peak_in_flight: AtomicU64,

    recent: Mutex<VecDeque<Completion>>,
}

impl MiningMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a chunk mined to completion.
    pub fn record_chunk(&self, hashes: u64, elapsed: Duration) {
        self.chunks_mined.fetch_add(1, Ordering::Relaxed);
        self.hashes.fetch_add(hashes, Ordering::Relaxed);
        self.total_mining_time_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);

        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        if recent.len() == RATE_WINDOW {
            recent.pop_front();
        }
        recent.push_back(Completion {
            finished_at: Instant::now(),
            elapsed,
            hashes,
        });
    }

    /// Records a job cancelled after `hashes` hashes.
    pub fn record_aborted(&self, hashes: u64) {
        self.chunks_aborted.fetch_add(1, Ordering::Relaxed);
        self.hashes.fetch_add(hashes, Ordering::Relaxed);
    }

    /// Updates the running job count and tracks the peak.
    pub fn set_in_flight(&self, jobs: u64) {
        self.in_flight.store(jobs, Ordering::Relaxed);
        self.peak_in_flight.fetch_max(jobs, Ordering::Relaxed);
    }

    pub fn chunks_mined(&self) -> u64 {
        self.chunks_mined.load(Ordering::Relaxed)
    }

    pub fn chunks_aborted(&self) -> u64 {
        self.chunks_aborted.load(Ordering::Relaxed)
    }

    pub fn hashes(&self) -> u64 {
        self.hashes.load(Ordering::Relaxed)
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn peak_in_flight(&self) -> u64 {
        self.peak_in_flight.load(Ordering::Relaxed)
    }

    /// Average wall time of one completed chunk job.
    pub fn avg_chunk_time(&self) -> Duration {
        let mined = self.chunks_mined();
        if mined == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_mining_time_nanos.load(Ordering::Relaxed) / mined)
        }
    }

    /// Aggregate hashes per second over the most recent completions.
    ///
    /// The span runs from the start of the oldest job in the window to the
    /// end of the newest, so parallel jobs add up.
    pub fn hashes_per_sec(&self) -> f64 {
        let recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        let (Some(first), Some(last)) = (recent.front(), recent.back()) else {
            return 0.0;
        };

        let started = recent
            .iter()
            .map(|c| c.finished_at.checked_sub(c.elapsed).unwrap_or(c.finished_at))
            .min()
            .unwrap_or(first.finished_at);
        let span = last.finished_at.saturating_duration_since(started);
        if span.is_zero() {
            return 0.0;
        }

        let hashes: u64 = recent.iter().map(|c| c.hashes).sum();
        hashes as f64 / span.as_secs_f64()
    }

    /// Reads every metric. Fields are individually atomic; the snapshot as a
    /// whole may straddle concurrent updates.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            chunks_mined: self.chunks_mined(),
            chunks_aborted: self.chunks_aborted(),
            hashes: self.hashes(),
            in_flight: self.in_flight(),
            peak_in_flight: self.peak_in_flight(),
            avg_chunk_time: self.avg_chunk_time(),
            hashes_per_sec: self.hashes_per_sec(),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub chunks_mined: u64,
    pub chunks_aborted: u64,
    pub hashes: u64,
    pub in_flight: u64,
    pub peak_in_flight: u64,
    pub avg_chunk_time: Duration,
    pub hashes_per_sec: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_metrics_report_zero() {
        let metrics = MiningMetrics::new();
        assert_eq!(metrics.avg_chunk_time(), Duration::ZERO);
        assert_eq!(metrics.hashes_per_sec(), 0.0);
    }

    #[test]
    fn aborted_jobs_count_hashes_but_not_chunks() {
        let metrics = MiningMetrics::new();
        metrics.record_chunk(256, Duration::from_millis(4));
        metrics.record_aborted(100);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.chunks_mined, 1);
        assert_eq!(snapshot.chunks_aborted, 1);
        assert_eq!(snapshot.hashes, 356);
        assert_eq!(snapshot.avg_chunk_time, Duration::from_millis(4));
        assert!(snapshot.hashes_per_sec > 0.0);
    }

    #[test]
    fn peak_in_flight_is_sticky() {
        let metrics = MiningMetrics::new();
        metrics.set_in_flight(3);
        metrics.set_in_flight(1);
        assert_eq!(metrics.in_flight(), 1);
        assert_eq!(metrics.peak_in_flight(), 3);
    }
}
