//! Control-task side of the pipeline.
//!
//! The [`Controller`] owns the master [`ChainConfig`]. Every command edits
//! that record, publishes a whole copy to the audio task, and then persists
//! the affected stage. The console and the network channel both drive the
//! chain through [`Controller::execute`].

use crate::error::ConfigError;
use crate::stages::{EqPreset, LimiterStats};
use crate::store::{self, ConfigStore, StoreError};
use crate::sync::Publisher;

use super::config::{ChainConfig, Stage};
use super::meter::LimiterMeter;

/// One control-plane request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Enable(Stage),
    Disable(Stage),
    /// Clear the stage's audio-side state on the next block.
    Reset(Stage),
    /// Persist the stage's current settings without changing them.
    Save(Stage),
    SubsonicFrequency(f32),
    PregainGain(f32),
    EqBandGain { band: usize, db: f32 },
    EqPreset(EqPreset),
    LimiterThreshold(f32),
    LimiterResetStats,
}

impl Command {
    /// The stage the command acts on.
    pub fn stage(&self) -> Stage {
        match *self {
            Command::Enable(s) | Command::Disable(s) | Command::Reset(s) | Command::Save(s) => s,
            Command::SubsonicFrequency(_) => Stage::Subsonic,
            Command::PregainGain(_) => Stage::Pregain,
            Command::EqBandGain { .. } | Command::EqPreset(_) => Stage::Equalizer,
            Command::LimiterThreshold(_) | Command::LimiterResetStats => Stage::Limiter,
        }
    }

    /// Whether the command changes persisted settings.
    ///
    /// State resets are runtime-only.
    pub fn persists(&self) -> bool {
        !matches!(self, Command::Reset(_) | Command::LimiterResetStats)
    }
}

/// Result of a command that was accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub stage: Stage,
    /// The value applied, when it differs from the one requested.
    pub clamped: Option<f32>,
    /// Set when the configuration was applied but could not be persisted.
    pub store_error: Option<StoreError>,
}

impl Outcome {
    pub fn persisted(&self) -> bool {
        self.store_error.is_none()
    }
}

/// Owner of the master configuration, its publisher, and the backing store.
pub struct Controller<'a, S> {
    config: ChainConfig,
    publisher: Publisher<'a, ChainConfig>,
    store: S,
    meter: &'a LimiterMeter,
}

impl<'a, S: ConfigStore> Controller<'a, S> {
    /// Publish `config` as-is. Use [`Controller::load`] to restore persisted
    /// settings on top of it.
    pub fn new(config: ChainConfig, mut publisher: Publisher<'a, ChainConfig>, store: S, meter: &'a LimiterMeter) -> Self {
        publisher.publish(config);
        Controller { config, publisher, store, meter }
    }

    /// Restore every stage from the store, keeping the current value for
    /// anything missing, and publish the result.
    pub fn load(&mut self) {
        store::load_all(&self.store, &mut self.config);
        self.publisher.publish(self.config);
        log::info!(
            "controller: loaded config (subsonic {} Hz, pregain {} dB, limiter {} dB)",
            self.config.subsonic.frequency(),
            self.config.pregain.gain_db(),
            self.config.limiter.threshold_db()
        );
    }

    /// Apply `command`.
    ///
    /// A rejected parameter leaves the configuration untouched and nothing is
    /// published. A persistence failure is not an error: the change stays
    /// live and the failure is reported in [`Outcome::store_error`].
    pub fn execute(&mut self, command: Command) -> Result<Outcome, ConfigError> {
        let stage = command.stage();
        let mut clamped = None;

        match command {
            Command::Enable(s) => self.config.set_enabled(s, true),
            Command::Disable(s) => self.config.set_enabled(s, false),
            Command::Reset(s) => self.config.request_reset(s),
            Command::Save(_) => {}
            Command::SubsonicFrequency(hz) => self.config.subsonic.set_frequency(hz)?,
            Command::PregainGain(db) => {
                let applied = self.config.pregain.set_gain_db(db);
                clamped = differs(applied, db);
            }
            Command::EqBandGain { band, db } => {
                let applied = self.config.eq.set_band_gain(band, db)?;
                clamped = differs(applied, db);
            }
            Command::EqPreset(preset) => self.config.eq.apply_preset(preset),
            Command::LimiterThreshold(db) => {
                let applied = self.config.limiter.set_threshold_db(db);
                clamped = differs(applied, db);
            }
            Command::LimiterResetStats => self.config.limiter.request_stats_reset(),
        }

        if !matches!(command, Command::Save(_)) {
            self.publisher.publish(self.config);
        }

        let store_error = if command.persists() {
            store::save_stage(&mut self.store, &self.config, stage).err()
        } else {
            None
        };
        if let Some(e) = store_error {
            log::warn!("controller: {} applied but not saved: {}", stage.name(), e);
        }

        Ok(Outcome { stage, clamped, store_error })
    }

    /// The master configuration (what the audio task will see next block).
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Latest statistics exported by the audio task.
    pub fn limiter_stats(&self) -> LimiterStats {
        self.meter.load()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

fn differs(applied: f32, requested: f32) -> Option<f32> {
    if applied == requested {
        None
    } else {
        Some(applied)
    }
}
