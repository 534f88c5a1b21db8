//! Subsonic (rumble/DC) protection: one Butterworth high-pass biquad.
//!
//! Always first in the chain. The cutoff is restricted to a narrow window and
//! out-of-window requests are rejected rather than clamped.

use crate::constants::CHANNELS;
use crate::control::StageControl;
use crate::dsp::biquad::{process_interleaved, BiquadCoefficients, BiquadState, FilterParams};
use crate::error::ConfigError;
use crate::stage::AudioStage;

/// Lowest accepted cutoff in Hz.
pub const MIN_FREQ_HZ: f32 = 15.0;
/// Highest accepted cutoff in Hz.
pub const MAX_FREQ_HZ: f32 = 50.0;
/// Cutoff at startup.
pub const DEFAULT_FREQ_HZ: f32 = 25.0;

/// Control-side subsonic parameters with the derived coefficient set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubsonicConfig {
    enabled: bool,
    frequency: f32,
    sample_rate: u32,
    coeffs: BiquadCoefficients,
    reset_epoch: u32,
}

impl SubsonicConfig {
    /// Enabled at [`DEFAULT_FREQ_HZ`].
    pub fn new(sample_rate: u32) -> Self {
        let coeffs = BiquadCoefficients::derive(&FilterParams::high_pass(DEFAULT_FREQ_HZ), sample_rate)
            .unwrap_or_else(|e| {
                log::warn!("subsonic: {}; running transparent", e);
                BiquadCoefficients::IDENTITY
            });
        SubsonicConfig {
            enabled: true,
            frequency: DEFAULT_FREQ_HZ,
            sample_rate,
            coeffs,
            reset_epoch: 0,
        }
    }

    /// Set the cutoff frequency.
    ///
    /// Values outside `MIN_FREQ_HZ..=MAX_FREQ_HZ` are rejected and nothing
    /// changes. On success the coefficients are re-derived and the filter
    /// history is cleared on the next block.
    pub fn set_frequency(&mut self, hz: f32) -> Result<(), ConfigError> {
        if !(MIN_FREQ_HZ..=MAX_FREQ_HZ).contains(&hz) {
            log::warn!("subsonic: rejected cutoff {} Hz", hz);
            return Err(ConfigError::FrequencyOutOfRange { hz, min: MIN_FREQ_HZ, max: MAX_FREQ_HZ });
        }
        self.coeffs = BiquadCoefficients::derive(&FilterParams::high_pass(hz), self.sample_rate)?;
        self.frequency = hz;
        self.reset_epoch = self.reset_epoch.wrapping_add(1);
        log::info!("subsonic: cutoff {} Hz", hz);
        Ok(())
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn coefficients(&self) -> &BiquadCoefficients {
        &self.coeffs
    }
}

impl StageControl for SubsonicConfig {
    const NAME: &'static str = "subsonic";

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        log::info!("subsonic: {}", if enabled { "enabled" } else { "bypassed" });
    }

    fn request_reset(&mut self) {
        self.reset_epoch = self.reset_epoch.wrapping_add(1);
    }
}

/// Audio-side subsonic filter: per-channel history only.
pub struct Subsonic {
    state: [BiquadState; CHANNELS],
    seen_epoch: u32,
}

impl Subsonic {
    pub const fn new() -> Self {
        Subsonic {
            state: [BiquadState::new(); CHANNELS],
            seen_epoch: 0,
        }
    }

    pub fn state(&self) -> &[BiquadState; CHANNELS] {
        &self.state
    }
}

impl Default for Subsonic {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioStage for Subsonic {
    type Config = SubsonicConfig;
    type Report = ();

    fn process(&mut self, config: &SubsonicConfig, block: &mut [i32]) {
        if config.reset_epoch != self.seen_epoch {
            self.reset();
            self.seen_epoch = config.reset_epoch;
        }
        if !config.enabled {
            return;
        }
        process_interleaved(&config.coeffs, &mut self.state, block);
    }

    fn reset(&mut self) {
        for st in self.state.iter_mut() {
            st.reset();
        }
    }
}
