//! The aggregate configuration record shared with the audio task.

use crate::control::StageControl;
use crate::stages::{EqualizerConfig, LimiterConfig, PregainConfig, SubsonicConfig};

/// Identifies one stage of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Subsonic,
    Pregain,
    Equalizer,
    Limiter,
}

impl Stage {
    /// Chain order.
    pub const ALL: [Stage; 4] = [Stage::Subsonic, Stage::Pregain, Stage::Equalizer, Stage::Limiter];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Subsonic => SubsonicConfig::NAME,
            Stage::Pregain => PregainConfig::NAME,
            Stage::Equalizer => EqualizerConfig::NAME,
            Stage::Limiter => LimiterConfig::NAME,
        }
    }
}

/// Every stage's parameters, published to the audio task as one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainConfig {
    pub sample_rate: u32,
    pub subsonic: SubsonicConfig,
    pub pregain: PregainConfig,
    pub eq: EqualizerConfig,
    pub limiter: LimiterConfig,
}

impl ChainConfig {
    /// Stage defaults at `sample_rate`: every stage enabled, flat settings.
    pub fn new(sample_rate: u32) -> Self {
        ChainConfig {
            sample_rate,
            subsonic: SubsonicConfig::new(sample_rate),
            pregain: PregainConfig::new(),
            eq: EqualizerConfig::new(sample_rate),
            limiter: LimiterConfig::new(),
        }
    }

    /// All four stages bypassed.
    pub fn bypassed(sample_rate: u32) -> Self {
        let mut cfg = Self::new(sample_rate);
        for stage in Stage::ALL {
            cfg.set_enabled(stage, false);
        }
        cfg
    }

    pub fn is_enabled(&self, stage: Stage) -> bool {
        match stage {
            Stage::Subsonic => self.subsonic.is_enabled(),
            Stage::Pregain => self.pregain.is_enabled(),
            Stage::Equalizer => self.eq.is_enabled(),
            Stage::Limiter => self.limiter.is_enabled(),
        }
    }

    pub fn set_enabled(&mut self, stage: Stage, enabled: bool) {
        match stage {
            Stage::Subsonic => self.subsonic.set_enabled(enabled),
            Stage::Pregain => self.pregain.set_enabled(enabled),
            Stage::Equalizer => self.eq.set_enabled(enabled),
            Stage::Limiter => self.limiter.set_enabled(enabled),
        }
    }

    pub fn request_reset(&mut self, stage: Stage) {
        match stage {
            Stage::Subsonic => self.subsonic.request_reset(),
            Stage::Pregain => self.pregain.request_reset(),
            Stage::Equalizer => self.eq.request_reset(),
            Stage::Limiter => self.limiter.request_reset(),
        }
    }
}
