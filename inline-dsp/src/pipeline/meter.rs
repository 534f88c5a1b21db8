//! Limiter statistics exported from the audio task.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use atomic_float::AtomicF32;

use crate::stages::LimiterStats;

/// Lock-free snapshot of [`LimiterStats`], written once per block by the audio
/// task and read by the control task. Fields are independent diagnostics, so
/// a read may mix values from adjacent blocks.
pub struct LimiterMeter {
    peak_reduction_db: AtomicF32,
    envelope: AtomicF32,
    clips_prevented: AtomicU32,
    limiting: AtomicBool,
}

impl LimiterMeter {
    pub fn new() -> Self {
        LimiterMeter {
            peak_reduction_db: AtomicF32::new(0.0),
            envelope: AtomicF32::new(1.0),
            clips_prevented: AtomicU32::new(0),
            limiting: AtomicBool::new(false),
        }
    }

    pub fn store(&self, stats: &LimiterStats) {
        self.peak_reduction_db.store(stats.peak_reduction_db, Ordering::Relaxed);
        self.envelope.store(stats.envelope, Ordering::Relaxed);
        self.clips_prevented.store(stats.clips_prevented, Ordering::Relaxed);
        self.limiting.store(stats.limiting, Ordering::Relaxed);
    }

    pub fn load(&self) -> LimiterStats {
        LimiterStats {
            peak_reduction_db: self.peak_reduction_db.load(Ordering::Relaxed),
            clips_prevented: self.clips_prevented.load(Ordering::Relaxed),
            envelope: self.envelope.load(Ordering::Relaxed),
            limiting: self.limiting.load(Ordering::Relaxed),
        }
    }
}

impl Default for LimiterMeter {
    fn default() -> Self {
        Self::new()
    }
}
