//! Five-band peaking equalizer.
//!
//! Bands are cascaded in fixed frequency order. Each band's coefficients are
//! re-derived only when that band's gain changes. When every band sits at
//! exactly 0 dB and every band history has settled into the transparent
//! state, the cascade is skipped; the histories are still advanced as the
//! transparent filters would advance them. A tail left by earlier gains keeps
//! the cascade running until it has decayed.

use crate::constants::CHANNELS;
use crate::control::StageControl;
use crate::dsp::biquad::{BiquadCoefficients, BiquadState, FilterParams};
use crate::dsp::fixed::clamp_reported;
use crate::error::ConfigError;
use crate::stage::AudioStage;

/// Number of bands.
pub const BANDS: usize = 5;

/// Band center frequencies in Hz, low to high.
pub const BAND_FREQUENCIES: [f32; BANDS] = [60.0, 250.0, 1000.0, 4000.0, 12_000.0];

pub const MIN_GAIN_DB: f32 = -12.0;
pub const MAX_GAIN_DB: f32 = 12.0;

/// Named gain curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqPreset {
    Flat,
    Bass,
    Vocal,
    Rock,
    Jazz,
}

impl EqPreset {
    pub const ALL: [EqPreset; 5] = [
        EqPreset::Flat,
        EqPreset::Bass,
        EqPreset::Vocal,
        EqPreset::Rock,
        EqPreset::Jazz,
    ];

    /// Per-band gains in dB.
    pub fn gains(&self) -> [f32; BANDS] {
        match self {
            EqPreset::Flat => [0.0, 0.0, 0.0, 0.0, 0.0],
            EqPreset::Bass => [6.0, 4.0, 0.0, 0.0, 0.0],
            EqPreset::Vocal => [-2.0, 0.0, 3.0, 5.0, 2.0],
            EqPreset::Rock => [5.0, 3.0, -4.0, 2.0, 6.0],
            EqPreset::Jazz => [2.0, 1.0, 0.0, 1.0, 3.0],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EqPreset::Flat => "flat",
            EqPreset::Bass => "bass",
            EqPreset::Vocal => "vocal",
            EqPreset::Rock => "rock",
            EqPreset::Jazz => "jazz",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }
}

/// Control-side equalizer parameters with one derived coefficient set per band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqualizerConfig {
    enabled: bool,
    gains: [f32; BANDS],
    coeffs: [BiquadCoefficients; BANDS],
    sample_rate: u32,
    reset_epoch: u32,
}

impl EqualizerConfig {
    /// Enabled, all bands at 0 dB.
    pub fn new(sample_rate: u32) -> Self {
        let mut cfg = EqualizerConfig {
            enabled: true,
            gains: [0.0; BANDS],
            coeffs: [BiquadCoefficients::IDENTITY; BANDS],
            sample_rate,
            reset_epoch: 0,
        };
        for band in 0..BANDS {
            cfg.coeffs[band] = cfg.derive_band(band);
        }
        cfg
    }

    /// Set one band's gain, clamped to `MIN_GAIN_DB..=MAX_GAIN_DB`.
    ///
    /// Returns the gain actually applied. Only that band's coefficients change.
    pub fn set_band_gain(&mut self, band: usize, db: f32) -> Result<f32, ConfigError> {
        if band >= BANDS {
            log::warn!("eq: rejected band {}", band);
            return Err(ConfigError::BandOutOfRange { band, max: BANDS - 1 });
        }
        let (db, clamped) = clamp_reported(db, MIN_GAIN_DB, MAX_GAIN_DB);
        if clamped {
            log::warn!("eq: band {} gain clamped to {} dB", band, db);
        }
        self.gains[band] = db;
        self.coeffs[band] = self.derive_band(band);
        log::info!("eq: band {} ({} Hz) {} dB", band, BAND_FREQUENCIES[band], db);
        Ok(db)
    }

    /// Set every band from a preset.
    pub fn apply_preset(&mut self, preset: EqPreset) {
        for (band, db) in preset.gains().into_iter().enumerate() {
            self.gains[band] = db;
            self.coeffs[band] = self.derive_band(band);
        }
        log::info!("eq: preset {}", preset.name());
    }

    pub fn band_gain(&self, band: usize) -> Option<f32> {
        self.gains.get(band).copied()
    }

    pub fn gains(&self) -> &[f32; BANDS] {
        &self.gains
    }

    pub fn coefficients(&self) -> &[BiquadCoefficients; BANDS] {
        &self.coeffs
    }

    /// Every band at exactly 0 dB.
    pub fn is_flat(&self) -> bool {
        self.gains.iter().all(|&g| g == 0.0)
    }

    // A band above Nyquist (e.g. 12 kHz at a low sample rate) runs transparent.
    fn derive_band(&self, band: usize) -> BiquadCoefficients {
        let params = FilterParams::peaking(BAND_FREQUENCIES[band], self.gains[band]);
        BiquadCoefficients::derive(&params, self.sample_rate).unwrap_or_else(|e| {
            log::warn!("eq: band {}: {}; running transparent", band, e);
            BiquadCoefficients::IDENTITY
        })
    }
}

impl StageControl for EqualizerConfig {
    const NAME: &'static str = "eq";

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        log::info!("eq: {}", if enabled { "enabled" } else { "bypassed" });
    }

    fn request_reset(&mut self) {
        self.reset_epoch = self.reset_epoch.wrapping_add(1);
    }
}

/// Audio-side equalizer: one history per band and channel.
pub struct Equalizer {
    state: [[BiquadState; CHANNELS]; BANDS],
    seen_epoch: u32,
}

impl Equalizer {
    pub const fn new() -> Self {
        Equalizer {
            state: [[BiquadState::new(); CHANNELS]; BANDS],
            seen_epoch: 0,
        }
    }

    pub fn state(&self) -> &[[BiquadState; CHANNELS]; BANDS] {
        &self.state
    }

    /// Every band and channel history is what a transparent filter leaves.
    fn settled(&self) -> bool {
        self.state.iter().flatten().all(BiquadState::is_passthrough)
    }

    fn follow_flat(&mut self, block: &[i32]) {
        let frames = block.len() / CHANNELS;
        if frames == 0 {
            return;
        }
        for ch in 0..CHANNELS {
            let last = block[(frames - 1) * CHANNELS + ch];
            for band in self.state.iter_mut() {
                let st = &mut band[ch];
                let prev = if frames >= 2 {
                    block[(frames - 2) * CHANNELS + ch]
                } else {
                    st.x1
                };
                st.follow_passthrough(prev, last);
            }
        }
    }
}

impl Default for Equalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioStage for Equalizer {
    type Config = EqualizerConfig;
    type Report = ();

    fn process(&mut self, config: &EqualizerConfig, block: &mut [i32]) {
        if config.reset_epoch != self.seen_epoch {
            self.reset();
            self.seen_epoch = config.reset_epoch;
        }
        if !config.enabled {
            return;
        }
        if config.is_flat() && self.settled() {
            self.follow_flat(block);
            return;
        }

        for frame in block.chunks_exact_mut(CHANNELS) {
            for (ch, sample) in frame.iter_mut().enumerate() {
                let mut x = *sample;
                for (coeffs, band) in config.coeffs.iter().zip(self.state.iter_mut()) {
                    x = band[ch].process(coeffs, x);
                }
                *sample = x;
            }
        }
    }

    fn reset(&mut self) {
        for band in self.state.iter_mut() {
            for st in band.iter_mut() {
                st.reset();
            }
        }
    }
}
