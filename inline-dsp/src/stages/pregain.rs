//! Linear pre-gain: one Q24 multiply per sample, no filter state.
//!
//! Gain requests outside the accepted range are clamped, not rejected.

use crate::control::StageControl;
use crate::dsp::fixed::{clamp_reported, db_to_linear, mul_q24, to_q24, Q24_ONE};
use crate::stage::AudioStage;

pub const MIN_GAIN_DB: f32 = -12.0;
pub const MAX_GAIN_DB: f32 = 12.0;
pub const DEFAULT_GAIN_DB: f32 = 0.0;

/// Control-side pre-gain parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PregainConfig {
    enabled: bool,
    gain_db: f32,
    /// Linear gain in Q24. `Q24_ONE` = unity.
    multiplier: i32,
}

impl PregainConfig {
    /// Enabled at 0 dB.
    pub const fn new() -> Self {
        PregainConfig {
            enabled: true,
            gain_db: DEFAULT_GAIN_DB,
            multiplier: Q24_ONE,
        }
    }

    /// Set the gain in dB, clamped to `MIN_GAIN_DB..=MAX_GAIN_DB`.
    ///
    /// Returns the gain actually applied.
    pub fn set_gain_db(&mut self, db: f32) -> f32 {
        let (db, clamped) = clamp_reported(db, MIN_GAIN_DB, MAX_GAIN_DB);
        if clamped {
            log::warn!("pregain: gain clamped to {} dB", db);
        }
        self.gain_db = db;
        self.multiplier = to_q24(db_to_linear(db));
        log::info!("pregain: {} dB (linear {})", db, self.gain_linear());
        db
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    pub fn gain_linear(&self) -> f32 {
        self.multiplier as f32 / Q24_ONE as f32
    }
}

impl Default for PregainConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StageControl for PregainConfig {
    const NAME: &'static str = "pregain";

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        log::info!("pregain: {}", if enabled { "enabled" } else { "bypassed" });
    }
}

/// Audio-side pre-gain. Stateless.
#[derive(Debug, Default)]
pub struct Pregain;

impl Pregain {
    pub const fn new() -> Self {
        Pregain
    }
}

impl AudioStage for Pregain {
    type Config = PregainConfig;
    type Report = ();

    fn process(&mut self, config: &PregainConfig, block: &mut [i32]) {
        if !config.enabled || config.gain_db == 0.0 {
            return;
        }
        let mult = config.multiplier;
        for sample in block.iter_mut() {
            *sample = mul_q24(*sample, mult);
        }
    }

    fn reset(&mut self) {}
}
