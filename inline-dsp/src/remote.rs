//! Topic-based network control channel.
//!
//! Maps publish/subscribe topics under [`BASE_TOPIC`] onto controller
//! commands, and renders each stage's retained JSON state.
//!
//! | Topic | Payload | Effect |
//! |-------|---------|--------|
//! | `esp-dsp/subsonic/freq` | Hz | set cutoff |
//! | `esp-dsp/subsonic/enable` | `true`/`1` | enable or bypass |
//! | `esp-dsp/pregain/set` | dB | set gain |
//! | `esp-dsp/pregain/enable` | `true`/`1` | enable or bypass |
//! | `esp-dsp/eq/band/<n>` | dB | set band `n` |
//! | `esp-dsp/eq/enable` | `true`/`1` | enable or bypass |
//! | `esp-dsp/eq/preset` | name | apply preset |
//! | `esp-dsp/limiter/threshold` | dB | set threshold |
//! | `esp-dsp/limiter/enable` | `true`/`1` | enable or bypass |
//! | `esp-dsp/limiter/reset_stats` | any | clear clip count and peak |
//!
//! After a command is applied, the affected `<stage>/state` topic is
//! republished. `esp-dsp/status` carries the chain overview.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::CHANNELS;
use crate::control::StageControl;
use crate::error::ConfigError;
use crate::pipeline::{ChainConfig, Command, Controller, Stage};
use crate::stages::equalizer::BANDS;
use crate::stages::EqPreset;
use crate::store::ConfigStore;

pub const BASE_TOPIC: &str = "esp-dsp";
pub const STATUS_TOPIC: &str = "esp-dsp/status";

const EQ_BAND_PREFIX: &str = "esp-dsp/eq/band/";

/// Command topics to subscribe to.
pub const COMMAND_TOPICS: [&str; 14] = [
    "esp-dsp/subsonic/freq",
    "esp-dsp/subsonic/enable",
    "esp-dsp/pregain/set",
    "esp-dsp/pregain/enable",
    "esp-dsp/eq/band/0",
    "esp-dsp/eq/band/1",
    "esp-dsp/eq/band/2",
    "esp-dsp/eq/band/3",
    "esp-dsp/eq/band/4",
    "esp-dsp/eq/enable",
    "esp-dsp/eq/preset",
    "esp-dsp/limiter/threshold",
    "esp-dsp/limiter/enable",
    "esp-dsp/limiter/reset_stats",
];

/// Retained state topic of `stage`.
pub fn state_topic(stage: Stage) -> &'static str {
    match stage {
        Stage::Subsonic => "esp-dsp/subsonic/state",
        Stage::Pregain => "esp-dsp/pregain/state",
        Stage::Equalizer => "esp-dsp/eq/state",
        Stage::Limiter => "esp-dsp/limiter/state",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RemoteError {
    #[error("not a command topic")]
    UnknownTopic,

    #[error("payload is not a valid value for this topic")]
    InvalidPayload,

    #[error(transparent)]
    Rejected(#[from] ConfigError),

    #[error("state payload exceeds buffer")]
    Overflow,

    #[error("state payload could not be encoded")]
    Encode,

    #[error("publish failed")]
    Publish,
}

/// Outbound side of the channel (an MQTT client, a test recorder).
pub trait StatePublisher {
    fn publish(&mut self, topic: &'static str, payload: &str, retain: bool) -> Result<(), RemoteError>;
}

/// Translate one incoming message into a controller command.
pub fn parse_message(topic: &str, payload: &str) -> Result<Command, RemoteError> {
    let payload = payload.trim();

    if let Some(band) = topic.strip_prefix(EQ_BAND_PREFIX) {
        let band = band.parse::<usize>().map_err(|_| RemoteError::UnknownTopic)?;
        let db = number(payload)?;
        return Ok(Command::EqBandGain { band, db });
    }

    let Some((group, leaf)) = topic
        .strip_prefix(BASE_TOPIC)
        .and_then(|t| t.strip_prefix('/'))
        .and_then(|t| t.split_once('/')) else {
        return Err(RemoteError::UnknownTopic);
    };

    let command = match (group, leaf) {
        ("subsonic", "freq") => Command::SubsonicFrequency(number(payload)?),
        ("pregain", "set") => Command::PregainGain(number(payload)?),
        ("eq", "preset") => Command::EqPreset(EqPreset::from_name(payload).ok_or(RemoteError::InvalidPayload)?),
        ("limiter", "threshold") => Command::LimiterThreshold(number(payload)?),
        ("limiter", "reset_stats") => Command::LimiterResetStats,
        (group, "enable") => {
            let stage = match group {
                "subsonic" => Stage::Subsonic,
                "pregain" => Stage::Pregain,
                "eq" => Stage::Equalizer,
                "limiter" => Stage::Limiter,
                _ => return Err(RemoteError::UnknownTopic),
            };
            if flag(payload) {
                Command::Enable(stage)
            } else {
                Command::Disable(stage)
            }
        }
        _ => return Err(RemoteError::UnknownTopic),
    };
    Ok(command)
}

fn number(payload: &str) -> Result<f32, RemoteError> {
    payload.parse::<f32>().map_err(|_| RemoteError::InvalidPayload)
}

/// `true` and `1` enable; anything else bypasses.
fn flag(payload: &str) -> bool {
    payload == "true" || payload == "1"
}

/// Apply an incoming message and republish the affected stage's state.
///
/// Returns the stage that changed.
pub fn handle_message<S: ConfigStore, P: StatePublisher>(
    ctl: &mut Controller<'_, S>,
    publisher: &mut P,
    topic: &str,
    payload: &str,
) -> Result<Stage, RemoteError> {
    let command = parse_message(topic, payload).map_err(|e| {
        log::warn!("remote: {} <- {:?}: {}", topic, payload, e);
        e
    })?;
    let outcome = ctl.execute(command)?;
    log::info!("remote: {} <- {}", topic, payload);
    publish_state(ctl.config(), outcome.stage, publisher)?;
    Ok(outcome.stage)
}

/// Publish every stage's state plus the status summary (after connecting).
pub fn publish_all<P: StatePublisher>(config: &ChainConfig, publisher: &mut P) -> Result<(), RemoteError> {
    let mut buf = [0u8; PAYLOAD_CAPACITY];
    let payload = render(&ChainStatus::of(config), &mut buf)?;
    publisher.publish(STATUS_TOPIC, payload, true)?;
    for stage in Stage::ALL {
        publish_state(config, stage, publisher)?;
    }
    Ok(())
}

pub fn publish_state<P: StatePublisher>(config: &ChainConfig, stage: Stage, publisher: &mut P) -> Result<(), RemoteError> {
    let mut buf = [0u8; PAYLOAD_CAPACITY];
    let payload = render_state(config, stage, &mut buf)?;
    publisher.publish(state_topic(stage), payload, true)
}

pub const PAYLOAD_CAPACITY: usize = 160;

/// Retained state of the subsonic filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubsonicState {
    pub enabled: bool,
    pub freq: f32,
}

/// Retained state of the pre-gain stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PregainState {
    pub enabled: bool,
    pub gain: f32,
}

/// Retained state of the equalizer, band gains low to high.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqState {
    pub enabled: bool,
    pub bands: [f32; BANDS],
}

/// Retained state of the limiter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimiterState {
    pub enabled: bool,
    pub threshold: f32,
}

/// Chain overview on [`STATUS_TOPIC`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainStatus {
    pub sample_rate: u32,
    pub channels: u8,
    pub subsonic: bool,
    pub pregain: bool,
    pub eq: bool,
    pub limiter: bool,
}

impl ChainStatus {
    pub fn of(config: &ChainConfig) -> Self {
        ChainStatus {
            sample_rate: config.sample_rate,
            channels: CHANNELS as u8,
            subsonic: config.is_enabled(Stage::Subsonic),
            pregain: config.is_enabled(Stage::Pregain),
            eq: config.is_enabled(Stage::Equalizer),
            limiter: config.is_enabled(Stage::Limiter),
        }
    }
}

/// Render one stage's JSON state into `buf`.
pub fn render_state<'b>(config: &ChainConfig, stage: Stage, buf: &'b mut [u8]) -> Result<&'b str, RemoteError> {
    match stage {
        Stage::Subsonic => render(
            &SubsonicState { enabled: config.subsonic.is_enabled(), freq: config.subsonic.frequency() },
            buf,
        ),
        Stage::Pregain => render(
            &PregainState { enabled: config.pregain.is_enabled(), gain: config.pregain.gain_db() },
            buf,
        ),
        Stage::Equalizer => render(
            &EqState { enabled: config.eq.is_enabled(), bands: *config.eq.gains() },
            buf,
        ),
        Stage::Limiter => render(
            &LimiterState { enabled: config.limiter.is_enabled(), threshold: config.limiter.threshold_db() },
            buf,
        ),
    }
}

fn render<'b, T: Serialize>(value: &T, buf: &'b mut [u8]) -> Result<&'b str, RemoteError> {
    // a full buffer is the only way serialization of these records fails
    let len = serde_json_core::to_slice(value, buf).map_err(|_| RemoteError::Overflow)?;
    core::str::from_utf8(&buf[..len]).map_err(|_| RemoteError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SAMPLE_RATE;
    use crate::pipeline::LimiterMeter;
    use crate::store::MemoryStore;
    use crate::sync::ParamCell;
    use std::string::String;
    use std::vec::Vec;

    #[derive(Default)]
    struct Recorder {
        messages: Vec<(&'static str, String, bool)>,
    }

    impl StatePublisher for Recorder {
        fn publish(&mut self, topic: &'static str, payload: &str, retain: bool) -> Result<(), RemoteError> {
            self.messages.push((topic, String::from(payload), retain));
            Ok(())
        }
    }

    #[test]
    fn maps_topics_to_commands() {
        assert_eq!(parse_message("esp-dsp/subsonic/freq", "28"), Ok(Command::SubsonicFrequency(28.0)));
        assert_eq!(parse_message("esp-dsp/pregain/set", " -3.5 "), Ok(Command::PregainGain(-3.5)));
        assert_eq!(
            parse_message("esp-dsp/eq/band/3", "4"),
            Ok(Command::EqBandGain { band: 3, db: 4.0 })
        );
        assert_eq!(parse_message("esp-dsp/eq/preset", "rock"), Ok(Command::EqPreset(EqPreset::Rock)));
        assert_eq!(parse_message("esp-dsp/limiter/threshold", "-1"), Ok(Command::LimiterThreshold(-1.0)));
        assert_eq!(parse_message("esp-dsp/eq/enable", "1"), Ok(Command::Enable(Stage::Equalizer)));
        assert_eq!(parse_message("esp-dsp/limiter/enable", "true"), Ok(Command::Enable(Stage::Limiter)));
        assert_eq!(parse_message("esp-dsp/limiter/enable", "yes"), Ok(Command::Disable(Stage::Limiter)));
        assert_eq!(parse_message("esp-dsp/limiter/reset_stats", ""), Ok(Command::LimiterResetStats));
    }

    #[test]
    fn rejects_unknown_topics_and_bad_payloads() {
        assert_eq!(parse_message("esp-dsp/volume/set", "1"), Err(RemoteError::UnknownTopic));
        assert_eq!(parse_message("other/subsonic/freq", "28"), Err(RemoteError::UnknownTopic));
        assert_eq!(parse_message("esp-dsp/eq/band/x", "1"), Err(RemoteError::UnknownTopic));
        assert_eq!(parse_message("esp-dsp/pregain/set", "loud"), Err(RemoteError::InvalidPayload));
        assert_eq!(parse_message("esp-dsp/eq/preset", "disco"), Err(RemoteError::InvalidPayload));
    }

    #[test]
    fn every_command_topic_parses() {
        for topic in COMMAND_TOPICS {
            let payload = if topic.ends_with("preset") { "flat" } else { "1" };
            assert!(parse_message(topic, payload).is_ok(), "{}", topic);
        }
    }

    #[test]
    fn state_json() {
        let mut cfg = ChainConfig::new(SAMPLE_RATE);
        cfg.eq.apply_preset(EqPreset::Vocal);
        cfg.set_enabled(Stage::Limiter, false);
        let mut buf = [0u8; PAYLOAD_CAPACITY];

        let json = render_state(&cfg, Stage::Subsonic, &mut buf).unwrap();
        let (state, _): (SubsonicState, _) = serde_json_core::from_str(json).unwrap();
        assert_eq!(state, SubsonicState { enabled: true, freq: 25.0 });

        let json = render_state(&cfg, Stage::Equalizer, &mut buf).unwrap();
        assert!(json.starts_with(r#"{"enabled":true,"bands":["#), "{}", json);
        let (state, _): (EqState, _) = serde_json_core::from_str(json).unwrap();
        assert_eq!(state.bands, [-2.0, 0.0, 3.0, 5.0, 2.0]);

        let json = render_state(&cfg, Stage::Limiter, &mut buf).unwrap();
        let (state, _): (LimiterState, _) = serde_json_core::from_str(json).unwrap();
        assert_eq!(state, LimiterState { enabled: false, threshold: -0.5 });

        let json = render(&ChainStatus::of(&cfg), &mut buf).unwrap();
        assert_eq!(
            json,
            r#"{"sample_rate":48000,"channels":2,"subsonic":true,"pregain":true,"eq":true,"limiter":false}"#
        );
    }

    #[test]
    fn handled_message_republishes_state() {
        let cell = ParamCell::new(ChainConfig::new(SAMPLE_RATE));
        let (publisher, mut subscriber) = cell.split().unwrap();
        let meter = LimiterMeter::new();
        let mut ctl = Controller::new(ChainConfig::new(SAMPLE_RATE), publisher, MemoryStore::<16>::new(), &meter);
        let mut out = Recorder::default();

        let stage = handle_message(&mut ctl, &mut out, "esp-dsp/pregain/set", "20").unwrap();
        assert_eq!(stage, Stage::Pregain);
        assert_eq!(subscriber.read().pregain.gain_db(), 12.0);
        assert_eq!(ctl.store().commits(), 1);
        assert_eq!(out.messages.len(), 1);
        assert_eq!(out.messages[0].0, "esp-dsp/pregain/state");
        let (state, _): (PregainState, _) = serde_json_core::from_str(&out.messages[0].1).unwrap();
        assert_eq!(state, PregainState { enabled: true, gain: 12.0 });
        assert!(out.messages[0].2);

        let err = handle_message(&mut ctl, &mut out, "esp-dsp/subsonic/freq", "60").unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(ConfigError::FrequencyOutOfRange { .. })));
        assert_eq!(out.messages.len(), 1);
    }

    #[test]
    fn publish_all_covers_status_and_stages() {
        let cfg = ChainConfig::new(SAMPLE_RATE);
        let mut out = Recorder::default();
        publish_all(&cfg, &mut out).unwrap();
        let topics: Vec<_> = out.messages.iter().map(|m| m.0).collect();
        assert_eq!(
            topics,
            [
                STATUS_TOPIC,
                "esp-dsp/subsonic/state",
                "esp-dsp/pregain/state",
                "esp-dsp/eq/state",
                "esp-dsp/limiter/state"
            ]
        );
    }

    #[test]
    fn short_buffer_reports_overflow() {
        let cfg = ChainConfig::new(SAMPLE_RATE);
        let mut buf = [0u8; 16];
        assert_eq!(render_state(&cfg, Stage::Equalizer, &mut buf), Err(RemoteError::Overflow));

        let mut buf = [0u8; PAYLOAD_CAPACITY];
        for stage in Stage::ALL {
            assert!(render_state(&cfg, stage, &mut buf).is_ok(), "{:?}", stage);
        }
    }
}
