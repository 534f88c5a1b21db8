//! The four fixed processing stages, in chain order.
//!
//! Each stage is split into a `Copy` configuration record edited by the
//! control task and an audio-side processor that owns the filter state.

pub mod subsonic;
pub mod pregain;
pub mod equalizer;
pub mod limiter;

pub use subsonic::{Subsonic, SubsonicConfig};
pub use pregain::{Pregain, PregainConfig};
pub use equalizer::{EqPreset, Equalizer, EqualizerConfig, BANDS, BAND_FREQUENCIES};
pub use limiter::{Limiter, LimiterConfig, LimiterStats, LimiterTransition};
