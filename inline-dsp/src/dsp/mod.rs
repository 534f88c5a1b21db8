//! DSP building blocks: Q24 arithmetic, the biquad engine, and the
//! monitoring/test-signal helpers used by the audio task.

pub mod fixed;
pub mod biquad;
pub mod level;
pub mod tone;

pub use biquad::{BiquadCoefficients, BiquadState, FilterKind, FilterParams};
pub use level::{LevelMonitor, LevelReport};
pub use tone::{ToneGenerator, Waveform};
