//! Input level monitor.
//!
//! Accumulates min, max and sum of native 24-bit samples across blocks and
//! publishes a [`LevelReport`] once every `interval` blocks.

/// Level statistics over one reporting interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelReport {
    /// Mean sample value.
    pub dc_offset: i32,
    pub peak_to_peak: i64,
    pub min: i32,
    pub max: i32,
}

/// Min/max/DC accumulator.
///
/// # Example
/// ```ignore
/// let mut monitor = LevelMonitor::new(50);
/// monitor.update(&block);
/// if monitor.available() {
///     let report = monitor.read();
/// }
/// ```
pub struct LevelMonitor {
    min_val: i32,
    max_val: i32,
    sum: i64,
    count: u64,
    blocks: u32,
    interval: u32,
}

impl LevelMonitor {
    /// Blocks per report in the audio task (0.25 s at 5 ms blocks).
    pub const DEFAULT_INTERVAL: u32 = 50;

    pub const fn new(interval: u32) -> Self {
        LevelMonitor {
            min_val: i32::MAX,
            max_val: i32::MIN,
            sum: 0,
            count: 0,
            blocks: 0,
            interval: if interval == 0 { 1 } else { interval },
        }
    }

    /// Accumulate one block of native samples.
    pub fn update(&mut self, block: &[i32]) {
        let mut min = self.min_val;
        let mut max = self.max_val;
        let mut sum = self.sum;

        for &s in block {
            if s < min {
                min = s;
            }
            if s > max {
                max = s;
            }
            sum += s as i64;
        }

        self.min_val = min;
        self.max_val = max;
        self.sum = sum;
        self.count += block.len() as u64;
        self.blocks += 1;
    }

    /// Returns `true` once a full interval has been accumulated.
    pub fn available(&self) -> bool {
        self.blocks >= self.interval && self.count > 0
    }

    /// Take the report for the accumulated interval and start a new one.
    pub fn read(&mut self) -> LevelReport {
        let report = if self.count == 0 {
            LevelReport { dc_offset: 0, peak_to_peak: 0, min: 0, max: 0 }
        } else {
            LevelReport {
                dc_offset: (self.sum / self.count as i64) as i32,
                peak_to_peak: self.max_val as i64 - self.min_val as i64,
                min: self.min_val,
                max: self.max_val,
            }
        };
        *self = Self::new(self.interval);
        report
    }
}
