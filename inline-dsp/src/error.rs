//! Parameter rejection errors shared by the filter engine and the stages.

use thiserror::Error;

/// A stage parameter was rejected and the configuration left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// Subsonic cutoff outside its accepted window.
    #[error("frequency {hz} Hz outside accepted range {min}-{max} Hz")]
    FrequencyOutOfRange { hz: f32, min: f32, max: f32 },

    /// A filter frequency at or beyond Nyquist, or not strictly positive.
    #[error("frequency {hz} Hz must lie strictly between 0 and Nyquist at {sample_rate} Hz")]
    DegenerateFrequency { hz: f32, sample_rate: u32 },

    /// Equalizer band index outside `0..BANDS`.
    #[error("equalizer band {band} out of range (0-{max})")]
    BandOutOfRange { band: usize, max: usize },
}
