//! Persistent configuration store.
//!
//! Each stage persists under its own namespace: the enabled flag as a `u8` and
//! every numeric parameter as an `i32` holding the value × 100, rounded to
//! nearest. A missing key means "keep the default" and is not an error.
//!
//! | Namespace | Keys |
//! |-----------|------|
//! | `subsonic_set` | `enabled`, `frequency` |
//! | `pregain_settings` | `enabled`, `gain` |
//! | `eq_settings` | `enabled`, `band0` … `band4` |
//! | `limiter_set` | `enabled`, `threshold` |

use thiserror::Error;

use crate::control::StageControl;
use crate::pipeline::{ChainConfig, Stage};
use crate::stages::equalizer::BANDS;

pub const SUBSONIC_NAMESPACE: &str = "subsonic_set";
pub const PREGAIN_NAMESPACE: &str = "pregain_settings";
pub const EQ_NAMESPACE: &str = "eq_settings";
pub const LIMITER_NAMESPACE: &str = "limiter_set";

const KEY_ENABLED: &str = "enabled";
const KEY_FREQUENCY: &str = "frequency";
const KEY_GAIN: &str = "gain";
const KEY_THRESHOLD: &str = "threshold";
const KEY_BANDS: [&str; BANDS] = ["band0", "band1", "band2", "band3", "band4"];

/// Scale applied to stored numeric parameters.
pub const FIXED_SCALE: f32 = 100.0;

/// Persistence failures. Never fatal: callers log and keep running on the
/// in-memory configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store has no room for {namespace}/{key}")]
    Full { namespace: &'static str, key: &'static str },

    #[error("{namespace}/{key} holds a value of another type")]
    TypeMismatch { namespace: &'static str, key: &'static str },

    #[error("write to {namespace} failed")]
    WriteFailed { namespace: &'static str },

    #[error("commit of {namespace} failed")]
    CommitFailed { namespace: &'static str },
}

/// Namespaced key/value backend (flash, EEPROM, or memory).
pub trait ConfigStore {
    fn get_u8(&self, namespace: &'static str, key: &'static str) -> Result<Option<u8>, StoreError>;
    fn get_i32(&self, namespace: &'static str, key: &'static str) -> Result<Option<i32>, StoreError>;
    fn set_u8(&mut self, namespace: &'static str, key: &'static str, value: u8) -> Result<(), StoreError>;
    fn set_i32(&mut self, namespace: &'static str, key: &'static str, value: i32) -> Result<(), StoreError>;
    /// Make the namespace's pending writes durable.
    fn commit(&mut self, namespace: &'static str) -> Result<(), StoreError>;
}

/// Encode a parameter as value × 100, rounded to nearest.
pub fn to_fixed(value: f32) -> i32 {
    libm::roundf(value * FIXED_SCALE) as i32
}

pub fn from_fixed(raw: i32) -> f32 {
    raw as f32 / FIXED_SCALE
}

/// Persist one stage's enabled flag and parameters.
pub fn save_stage<S: ConfigStore>(store: &mut S, config: &ChainConfig, stage: Stage) -> Result<(), StoreError> {
    let namespace = namespace(stage);
    store.set_u8(namespace, KEY_ENABLED, config.is_enabled(stage) as u8)?;
    match stage {
        Stage::Subsonic => store.set_i32(namespace, KEY_FREQUENCY, to_fixed(config.subsonic.frequency()))?,
        Stage::Pregain => store.set_i32(namespace, KEY_GAIN, to_fixed(config.pregain.gain_db()))?,
        Stage::Equalizer => {
            for (key, &gain) in KEY_BANDS.into_iter().zip(config.eq.gains().iter()) {
                store.set_i32(namespace, key, to_fixed(gain))?;
            }
        }
        Stage::Limiter => store.set_i32(namespace, KEY_THRESHOLD, to_fixed(config.limiter.threshold_db()))?,
    }
    store.commit(namespace)?;
    log::info!("{}: settings saved", stage.name());
    Ok(())
}

/// Persist every stage. Stops at the first failure.
pub fn save_all<S: ConfigStore>(store: &mut S, config: &ChainConfig) -> Result<(), StoreError> {
    for stage in Stage::ALL {
        save_stage(store, config, stage)?;
    }
    Ok(())
}

/// Overlay one stage's persisted values onto `config`.
///
/// Values go through the normal setters, so out-of-range stored values are
/// clamped (gains, threshold) or ignored (subsonic frequency).
pub fn load_stage<S: ConfigStore>(store: &S, config: &mut ChainConfig, stage: Stage) -> Result<(), StoreError> {
    let namespace = namespace(stage);
    if let Some(enabled) = store.get_u8(namespace, KEY_ENABLED)? {
        config.set_enabled(stage, enabled != 0);
    }
    match stage {
        Stage::Subsonic => {
            if let Some(raw) = store.get_i32(namespace, KEY_FREQUENCY)? {
                if let Err(e) = config.subsonic.set_frequency(from_fixed(raw)) {
                    log::warn!("subsonic: ignoring stored cutoff: {}", e);
                }
            }
        }
        Stage::Pregain => {
            if let Some(raw) = store.get_i32(namespace, KEY_GAIN)? {
                config.pregain.set_gain_db(from_fixed(raw));
            }
        }
        Stage::Equalizer => {
            for (band, key) in KEY_BANDS.into_iter().enumerate() {
                if let Some(raw) = store.get_i32(namespace, key)? {
                    // band index comes from KEY_BANDS, always in range
                    let _ = config.eq.set_band_gain(band, from_fixed(raw));
                }
            }
        }
        Stage::Limiter => {
            if let Some(raw) = store.get_i32(namespace, KEY_THRESHOLD)? {
                config.limiter.set_threshold_db(from_fixed(raw));
            }
        }
    }
    Ok(())
}

/// Overlay every stage's persisted values onto `config`.
///
/// A failing stage is logged and keeps its current values; the other stages
/// still load.
pub fn load_all<S: ConfigStore>(store: &S, config: &mut ChainConfig) {
    for stage in Stage::ALL {
        if let Err(e) = load_stage(store, config, stage) {
            log::warn!("{}: could not load settings: {}", stage.name(), e);
        }
    }
}

pub fn namespace(stage: Stage) -> &'static str {
    match stage {
        Stage::Subsonic => SUBSONIC_NAMESPACE,
        Stage::Pregain => PREGAIN_NAMESPACE,
        Stage::Equalizer => EQ_NAMESPACE,
        Stage::Limiter => LIMITER_NAMESPACE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoredValue {
    U8(u8),
    I32(i32),
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    namespace: &'static str,
    key: &'static str,
    value: StoredValue,
}

/// Fixed-capacity in-memory store for hosts and tests.
///
/// Survives a simulated reboot by being moved into the next controller.
pub struct MemoryStore<const N: usize> {
    entries: [Option<Entry>; N],
    commits: u32,
    fail_writes: bool,
}

impl<const N: usize> MemoryStore<N> {
    pub const fn new() -> Self {
        MemoryStore { entries: [None; N], commits: 0, fail_writes: false }
    }

    /// Number of successful commits.
    pub fn commits(&self) -> u32 {
        self.commits
    }

    /// Make every subsequent write and commit fail.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn find(&self, namespace: &str, key: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .flatten()
            .find(|e| e.namespace == namespace && e.key == key)
    }

    fn put(&mut self, namespace: &'static str, key: &'static str, value: StoredValue) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::WriteFailed { namespace });
        }
        let existing = self
            .entries
            .iter_mut()
            .flatten()
            .find(|e| e.namespace == namespace && e.key == key);
        if let Some(entry) = existing {
            entry.value = value;
            return Ok(());
        }
        match self.entries.iter_mut().find(|e| e.is_none()) {
            Some(slot) => {
                *slot = Some(Entry { namespace, key, value });
                Ok(())
            }
            None => Err(StoreError::Full { namespace, key }),
        }
    }
}

impl<const N: usize> Default for MemoryStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ConfigStore for MemoryStore<N> {
    fn get_u8(&self, namespace: &'static str, key: &'static str) -> Result<Option<u8>, StoreError> {
        match self.find(namespace, key).map(|e| e.value) {
            None => Ok(None),
            Some(StoredValue::U8(v)) => Ok(Some(v)),
            Some(_) => Err(StoreError::TypeMismatch { namespace, key }),
        }
    }

    fn get_i32(&self, namespace: &'static str, key: &'static str) -> Result<Option<i32>, StoreError> {
        match self.find(namespace, key).map(|e| e.value) {
            None => Ok(None),
            Some(StoredValue::I32(v)) => Ok(Some(v)),
            Some(_) => Err(StoreError::TypeMismatch { namespace, key }),
        }
    }

    fn set_u8(&mut self, namespace: &'static str, key: &'static str, value: u8) -> Result<(), StoreError> {
        self.put(namespace, key, StoredValue::U8(value))
    }

    fn set_i32(&mut self, namespace: &'static str, key: &'static str, value: i32) -> Result<(), StoreError> {
        self.put(namespace, key, StoredValue::I32(value))
    }

    fn commit(&mut self, namespace: &'static str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::CommitFailed { namespace });
        }
        self.commits += 1;
        Ok(())
    }
}
