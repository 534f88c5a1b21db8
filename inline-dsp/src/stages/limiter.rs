//! Feed-forward look-ahead peak limiter.
//!
//! The undelayed input drives a peak detector and an asymmetric one-pole
//! envelope follower (fast attack, slow release). The gain is applied to the
//! signal delayed by the look-ahead line, so reduction is already in place when
//! a peak reaches the output. A final ceiling clamp holds the output at the
//! linear threshold while the envelope is still settling.
//!
//! Operates on native 24-bit samples: full scale is 2^23.

use crate::constants::{CHANNELS, FULL_SCALE, MAX_LOOKAHEAD_SAMPLES};
use crate::control::StageControl;
use crate::dsp::fixed::{clamp_reported, db_to_linear, linear_to_db, saturate_i32};
use crate::stage::AudioStage;

pub const MIN_THRESHOLD_DB: f32 = -12.0;
pub const MAX_THRESHOLD_DB: f32 = 0.0;
pub const DEFAULT_THRESHOLD_DB: f32 = -0.5;

pub const ATTACK_MS: f32 = 0.5;
pub const RELEASE_MS: f32 = 50.0;
pub const LOOKAHEAD_MS: f32 = 5.0;

/// Envelope floor; a non-finite or smaller envelope is forced here.
pub const MIN_ENVELOPE: f32 = 1e-8;

/// Envelope level below which the limiter counts as actively limiting.
pub const TRIGGER_LEVEL: f32 = 0.999;

/// Convert a time constant in milliseconds to a one-pole smoothing coefficient.
pub fn time_constant_coeff(ms: f32, sample_rate: u32) -> f32 {
    libm::expf(-1.0 / (ms / 1000.0 * sample_rate as f32))
}

/// Interleaved look-ahead length for `sample_rate`, rounded down to whole
/// frames and capped at the static buffer size.
pub fn lookahead_len(sample_rate: u32) -> usize {
    let len = (LOOKAHEAD_MS * sample_rate as f32 * CHANNELS as f32 / 1000.0) as usize;
    let len = len - len % CHANNELS;
    len.clamp(CHANNELS, MAX_LOOKAHEAD_SAMPLES)
}

/// Change of the limiting state over one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterTransition {
    NoChange,
    EnteredLimiting,
    ExitedLimiting,
    /// Entered and left limiting inside the same block.
    LimitedBriefly,
}

/// Diagnostic counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterStats {
    /// Deepest smoothed reduction seen, in dB (0.0 = none).
    pub peak_reduction_db: f32,
    /// Blocks in which the detector asked for reduction.
    pub clips_prevented: u32,
    /// Envelope at the end of the last block.
    pub envelope: f32,
    pub limiting: bool,
}

/// Control-side limiter parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterConfig {
    enabled: bool,
    threshold_db: f32,
    threshold_linear: f32,
    reset_epoch: u32,
    stats_epoch: u32,
}

impl LimiterConfig {
    /// Enabled at [`DEFAULT_THRESHOLD_DB`].
    pub fn new() -> Self {
        LimiterConfig {
            enabled: true,
            threshold_db: DEFAULT_THRESHOLD_DB,
            threshold_linear: db_to_linear(DEFAULT_THRESHOLD_DB),
            reset_epoch: 0,
            stats_epoch: 0,
        }
    }

    /// Set the threshold in dBFS, clamped to `MIN_THRESHOLD_DB..=MAX_THRESHOLD_DB`.
    ///
    /// Returns the threshold actually applied.
    pub fn set_threshold_db(&mut self, db: f32) -> f32 {
        let (db, clamped) = clamp_reported(db, MIN_THRESHOLD_DB, MAX_THRESHOLD_DB);
        if clamped {
            log::warn!("limiter: threshold clamped to {} dB", db);
        }
        self.threshold_db = db;
        self.threshold_linear = db_to_linear(db);
        log::info!("limiter: threshold {} dB (linear {})", db, self.threshold_linear);
        db
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    pub fn threshold_linear(&self) -> f32 {
        self.threshold_linear
    }

    /// Largest output magnitude the limiter lets through, in native samples.
    pub fn ceiling(&self) -> i32 {
        (self.threshold_linear * FULL_SCALE) as i32
    }

    /// Ask the audio side to clear peak reduction and the clip count.
    pub fn request_stats_reset(&mut self) {
        self.stats_epoch = self.stats_epoch.wrapping_add(1);
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StageControl for LimiterConfig {
    const NAME: &'static str = "limiter";

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        log::info!("limiter: {}", if enabled { "enabled" } else { "bypassed" });
    }

    fn request_reset(&mut self) {
        self.reset_epoch = self.reset_epoch.wrapping_add(1);
    }
}

/// Audio-side limiter state.
///
/// The look-ahead length is fixed at construction. While bypassed the delay
/// line is not advanced, so re-enabling first releases whatever was buffered
/// before the bypass.
pub struct Limiter {
    buffer: [i32; MAX_LOOKAHEAD_SAMPLES],
    lookahead_len: usize,
    write_index: usize,
    attack_coeff: f32,
    release_coeff: f32,
    /// Release completes to exactly 1.0 once the remaining gap is below
    /// this; the f32 recursion stalls a few hundred ulps short of unity.
    unity_snap: f32,
    envelope: f32,
    min_envelope: f32,
    peak_reduction_db: f32,
    clips_prevented: u32,
    triggered: bool,
    seen_reset_epoch: u32,
    seen_stats_epoch: u32,
}

impl Limiter {
    pub fn new(sample_rate: u32) -> Self {
        let release_coeff = time_constant_coeff(RELEASE_MS, sample_rate);
        let limiter = Limiter {
            buffer: [0; MAX_LOOKAHEAD_SAMPLES],
            lookahead_len: lookahead_len(sample_rate),
            write_index: 0,
            attack_coeff: time_constant_coeff(ATTACK_MS, sample_rate),
            release_coeff,
            unity_snap: f32::EPSILON / 2.0 / (1.0 - release_coeff),
            envelope: 1.0,
            min_envelope: 1.0,
            peak_reduction_db: 0.0,
            clips_prevented: 0,
            triggered: false,
            seen_reset_epoch: 0,
            seen_stats_epoch: 0,
        };
        log::info!(
            "limiter: look-ahead {} samples, attack coeff {}, release coeff {}",
            limiter.lookahead_len,
            limiter.attack_coeff,
            limiter.release_coeff
        );
        limiter
    }

    pub fn stats(&self) -> LimiterStats {
        LimiterStats {
            peak_reduction_db: self.peak_reduction_db,
            clips_prevented: self.clips_prevented,
            envelope: self.envelope,
            limiting: self.triggered,
        }
    }

    pub fn envelope(&self) -> f32 {
        self.envelope
    }

    pub fn lookahead_len(&self) -> usize {
        self.lookahead_len
    }

    pub fn attack_coeff(&self) -> f32 {
        self.attack_coeff
    }

    pub fn release_coeff(&self) -> f32 {
        self.release_coeff
    }

    /// Clear peak reduction and the clip count.
    pub fn reset_stats(&mut self) {
        self.peak_reduction_db = 0.0;
        self.clips_prevented = 0;
        // peak tracking restarts from the next reduction
        self.min_envelope = 1.0;
    }

    fn apply_requests(&mut self, config: &LimiterConfig) {
        if config.reset_epoch != self.seen_reset_epoch {
            self.reset();
            self.seen_reset_epoch = config.reset_epoch;
        }
        if config.stats_epoch != self.seen_stats_epoch {
            self.reset_stats();
            self.seen_stats_epoch = config.stats_epoch;
        }
    }
}

impl AudioStage for Limiter {
    type Config = LimiterConfig;
    type Report = LimiterTransition;

    fn process(&mut self, config: &LimiterConfig, block: &mut [i32]) -> LimiterTransition {
        let was_triggered = self.triggered;
        let mut entered = false;
        self.apply_requests(config);

        if !config.enabled {
            // a bypassed limiter is not limiting
            self.triggered = false;
        } else {
            let threshold = config.threshold_linear * FULL_SCALE;
            let ceiling = config.ceiling();
            let min_envelope_before = self.min_envelope;
            let mut reduced = false;

            for frame in block.chunks_exact_mut(CHANNELS) {
                let idx = self.write_index;
                let delayed = [self.buffer[idx], self.buffer[idx + 1]];
                self.buffer[idx] = frame[0];
                self.buffer[idx + 1] = frame[1];
                self.write_index = if idx + CHANNELS >= self.lookahead_len { 0 } else { idx + CHANNELS };

                let peak = frame[0].unsigned_abs().max(frame[1].unsigned_abs()) as f32;
                let mut desired = 1.0;
                if peak > threshold {
                    desired = (threshold / peak).max(MIN_ENVELOPE);
                    reduced = true;
                }

                let coeff = if desired < self.envelope { self.attack_coeff } else { self.release_coeff };
                // c*env + (1-c)*desired, written relative to the target
                self.envelope = desired + coeff * (self.envelope - desired);
                if desired == 1.0 && 1.0 - self.envelope < self.unity_snap {
                    self.envelope = 1.0;
                }
                if !self.envelope.is_finite() || self.envelope < MIN_ENVELOPE {
                    self.envelope = MIN_ENVELOPE;
                }
                if self.envelope < self.min_envelope {
                    self.min_envelope = self.envelope;
                }
                let now = self.envelope < TRIGGER_LEVEL;
                entered |= now && !self.triggered;
                self.triggered = now;

                // Q16 gain, rounded
                let gain = (self.envelope * 65536.0 + 0.5) as i64;
                for (out, d) in frame.iter_mut().zip(delayed) {
                    let y = saturate_i32((d as i64 * gain) >> 16);
                    *out = y.clamp(-ceiling, ceiling);
                }
            }

            if reduced {
                self.clips_prevented = self.clips_prevented.saturating_add(1);
            }
            if self.min_envelope < min_envelope_before {
                let db = linear_to_db(self.min_envelope);
                if db < self.peak_reduction_db {
                    self.peak_reduction_db = db;
                }
            }
        }

        match (was_triggered, self.triggered) {
            (false, true) => LimiterTransition::EnteredLimiting,
            (true, false) => LimiterTransition::ExitedLimiting,
            (false, false) if entered => LimiterTransition::LimitedBriefly,
            _ => LimiterTransition::NoChange,
        }
    }

    /// Clear the delay line and envelope. Statistics are kept.
    fn reset(&mut self) {
        self.buffer = [0; MAX_LOOKAHEAD_SAMPLES];
        self.write_index = 0;
        self.envelope = 1.0;
        self.min_envelope = 1.0;
        self.triggered = false;
    }
}
