//! Line-oriented text console.
//!
//! [`parse`] turns one input line into a [`Request`]; [`run_line`] parses,
//! executes it on a [`Controller`], and writes a human-readable reply to any
//! [`core::fmt::Write`] sink (a UART, a USB CDC port, a `String` in tests).
//!
//! ```text
//! help | status
//! sub      show | freq <hz> | set <hz> | enable | disable | reset | save
//! gain     show | set <db> | enable | disable | save          (alias: pregain)
//! eq       show | set <band> <db> | enable | disable | reset | preset <name> | save
//! lim      show | threshold <db> | set <db> | enable | disable | reset | stats [reset] | save
//!                                                              (alias: limiter)
//! ```

use core::fmt::{self, Write};

use thiserror::Error;

use crate::constants::{AUDIO_BIT_DEPTH, BLOCK_SAMPLES, CHANNELS};
use crate::control::StageControl;
use crate::dsp::biquad::BUTTERWORTH_Q;
use crate::pipeline::{Command, Controller, Outcome, Stage};
use crate::stages::{equalizer, limiter, pregain, subsonic, EqPreset, BAND_FREQUENCIES};
use crate::store::ConfigStore;

/// A parsed console line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request {
    Help,
    Status,
    Show(Stage),
    LimiterStats,
    Execute(Command),
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command (try 'help')")]
    UnknownCommand,

    #[error("{group} needs a subcommand: {usage}")]
    MissingSubcommand { group: &'static str, usage: &'static str },

    #[error("unknown {group} subcommand, try: {usage}")]
    UnknownSubcommand { group: &'static str, usage: &'static str },

    #[error("usage: {usage}")]
    MissingArgument { usage: &'static str },

    #[error("not a number; usage: {usage}")]
    InvalidNumber { usage: &'static str },

    #[error("unknown preset; available: flat, bass, vocal, rock, jazz")]
    UnknownPreset,
}

const SUB_USAGE: &str = "sub show|freq|enable|disable|reset|save";
const GAIN_USAGE: &str = "gain show|set|enable|disable|save";
const EQ_USAGE: &str = "eq show|set|enable|disable|reset|preset|save";
const LIM_USAGE: &str = "lim show|threshold|enable|disable|reset|stats [reset]|save";

/// Parse one line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Request>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let (stage, group, usage) = match head {
        "help" => return Ok(Some(Request::Help)),
        "status" => return Ok(Some(Request::Status)),
        "sub" | "subsonic" => (Stage::Subsonic, "sub", SUB_USAGE),
        "gain" | "pregain" => (Stage::Pregain, "gain", GAIN_USAGE),
        "eq" => (Stage::Equalizer, "eq", EQ_USAGE),
        "lim" | "limiter" => (Stage::Limiter, "lim", LIM_USAGE),
        _ => return Err(ParseError::UnknownCommand),
    };

    let verb = words.next().ok_or(ParseError::MissingSubcommand { group, usage })?;
    let unknown = ParseError::UnknownSubcommand { group, usage };

    let request = match (stage, verb) {
        (_, "show") => Request::Show(stage),
        (_, "enable") => Request::Execute(Command::Enable(stage)),
        (_, "disable") => Request::Execute(Command::Disable(stage)),
        (_, "save") => Request::Execute(Command::Save(stage)),
        (Stage::Pregain, "reset") => return Err(unknown),
        (_, "reset") => Request::Execute(Command::Reset(stage)),

        (Stage::Subsonic, "freq" | "set") => {
            let hz = number(words.next(), "sub freq <hz>")?;
            Request::Execute(Command::SubsonicFrequency(hz))
        }
        (Stage::Pregain, "set") => {
            let db = number(words.next(), "gain set <db>")?;
            Request::Execute(Command::PregainGain(db))
        }
        (Stage::Equalizer, "set") => {
            const USAGE: &str = "eq set <band> <db>";
            let band = words
                .next()
                .ok_or(ParseError::MissingArgument { usage: USAGE })?
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidNumber { usage: USAGE })?;
            let db = number(words.next(), USAGE)?;
            Request::Execute(Command::EqBandGain { band, db })
        }
        (Stage::Equalizer, "preset") => {
            let name = words.next().ok_or(ParseError::MissingArgument { usage: "eq preset <name>" })?;
            let preset = EqPreset::from_name(name).ok_or(ParseError::UnknownPreset)?;
            Request::Execute(Command::EqPreset(preset))
        }
        (Stage::Limiter, "threshold" | "set") => {
            let db = number(words.next(), "lim threshold <db>")?;
            Request::Execute(Command::LimiterThreshold(db))
        }
        (Stage::Limiter, "stats") => match words.next() {
            None => Request::LimiterStats,
            Some("reset") => Request::Execute(Command::LimiterResetStats),
            Some(_) => return Err(unknown),
        },
        _ => return Err(unknown),
    };
    Ok(Some(request))
}

fn number(word: Option<&str>, usage: &'static str) -> Result<f32, ParseError> {
    word.ok_or(ParseError::MissingArgument { usage })?
        .parse::<f32>()
        .map_err(|_| ParseError::InvalidNumber { usage })
}

/// Parse and execute `line`, writing the reply to `out`.
///
/// Parse and parameter errors are reported to `out`; only a failing sink is
/// returned as an error.
pub fn run_line<S: ConfigStore, W: Write>(ctl: &mut Controller<'_, S>, line: &str, out: &mut W) -> fmt::Result {
    let request = match parse(line) {
        Ok(Some(r)) => r,
        Ok(None) => return Ok(()),
        Err(e) => return writeln!(out, "Error: {}", e),
    };

    match request {
        Request::Help => write_help(out),
        Request::Status => write_status(ctl, out),
        Request::Show(stage) => write_stage(ctl, stage, out),
        Request::LimiterStats => write_stats(ctl, out),
        Request::Execute(command) => match ctl.execute(command) {
            Ok(outcome) => write_outcome(ctl, command, &outcome, out),
            Err(e) => writeln!(out, "Error: {}", e),
        },
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "ENABLED"
    } else {
        "DISABLED (bypass)"
    }
}

fn write_help<W: Write>(out: &mut W) -> fmt::Result {
    writeln!(out, "Commands:")?;
    writeln!(out, "  help | status")?;
    writeln!(
        out,
        "  sub show | freq <hz> | enable | disable | reset | save   ({}-{} Hz)",
        subsonic::MIN_FREQ_HZ,
        subsonic::MAX_FREQ_HZ
    )?;
    writeln!(
        out,
        "  gain show | set <db> | enable | disable | save          ({} to {} dB)",
        pregain::MIN_GAIN_DB,
        pregain::MAX_GAIN_DB
    )?;
    writeln!(
        out,
        "  eq show | set <band> <db> | enable | disable | reset | preset <name> | save   ({} to {} dB)",
        equalizer::MIN_GAIN_DB,
        equalizer::MAX_GAIN_DB
    )?;
    writeln!(out, "     bands: 0=60Hz 1=250Hz 2=1kHz 3=4kHz 4=12kHz; presets: flat bass vocal rock jazz")?;
    writeln!(
        out,
        "  lim show | threshold <db> | enable | disable | reset | stats [reset] | save   ({} to {} dB)",
        limiter::MIN_THRESHOLD_DB,
        limiter::MAX_THRESHOLD_DB
    )?;
    writeln!(out, "Settings changes are saved automatically.")?;
    writeln!(out, "Chain: subsonic -> pre-gain -> equalizer -> limiter")
}

fn write_status<S: ConfigStore, W: Write>(ctl: &Controller<'_, S>, out: &mut W) -> fmt::Result {
    let cfg = ctl.config();
    let flag = |s: Stage| if cfg.is_enabled(s) { "ON" } else { "OFF" };
    writeln!(out, "Sample rate: {} Hz", cfg.sample_rate)?;
    writeln!(out, "Channels: {}", CHANNELS)?;
    writeln!(out, "Block: {} samples", BLOCK_SAMPLES)?;
    writeln!(out, "Bit depth: {}-bit", AUDIO_BIT_DEPTH)?;
    writeln!(out, "Chain:")?;
    writeln!(out, "  1. subsonic  {:<3} ({:.1} Hz HPF)", flag(Stage::Subsonic), cfg.subsonic.frequency())?;
    writeln!(out, "  2. pre-gain  {:<3} ({:+.1} dB)", flag(Stage::Pregain), cfg.pregain.gain_db())?;
    writeln!(out, "  3. equalizer {:<3} (5-band)", flag(Stage::Equalizer))?;
    writeln!(out, "  4. limiter   {:<3} ({:.1} dB)", flag(Stage::Limiter), cfg.limiter.threshold_db())
}

fn write_stage<S: ConfigStore, W: Write>(ctl: &Controller<'_, S>, stage: Stage, out: &mut W) -> fmt::Result {
    let cfg = ctl.config();
    match stage {
        Stage::Subsonic => {
            writeln!(out, "Subsonic filter: {}", on_off(cfg.subsonic.is_enabled()))?;
            writeln!(out, "  2nd-order Butterworth high-pass, Q {:.3}", BUTTERWORTH_Q)?;
            writeln!(out, "  Cutoff: {:.1} Hz", cfg.subsonic.frequency())
        }
        Stage::Pregain => {
            writeln!(out, "Pre-gain: {}", on_off(cfg.pregain.is_enabled()))?;
            writeln!(
                out,
                "  Gain: {:+.1} dB ({:.3}x linear)",
                cfg.pregain.gain_db(),
                cfg.pregain.gain_linear()
            )
        }
        Stage::Equalizer => {
            writeln!(out, "Equalizer: {}", on_off(cfg.eq.is_enabled()))?;
            writeln!(out, "  Band | Frequency | Gain")?;
            for (band, (hz, db)) in BAND_FREQUENCIES.iter().zip(cfg.eq.gains().iter()).enumerate() {
                writeln!(out, "  {:>4} | {:>7} Hz | {:+.1} dB", band, hz, db)?;
            }
            Ok(())
        }
        Stage::Limiter => {
            writeln!(out, "Limiter: {}", on_off(cfg.limiter.is_enabled()))?;
            writeln!(out, "  Threshold: {:.1} dB", cfg.limiter.threshold_db())?;
            writeln!(out, "  Attack: {:.1} ms", limiter::ATTACK_MS)?;
            writeln!(out, "  Release: {:.1} ms", limiter::RELEASE_MS)?;
            writeln!(out, "  Lookahead: {:.1} ms", limiter::LOOKAHEAD_MS)
        }
    }
}

fn write_stats<S: ConfigStore, W: Write>(ctl: &Controller<'_, S>, out: &mut W) -> fmt::Result {
    let stats = ctl.limiter_stats();
    writeln!(out, "Limiter statistics:")?;
    writeln!(out, "  Peak reduction: {:.2} dB", stats.peak_reduction_db)?;
    writeln!(out, "  Clips prevented: {}", stats.clips_prevented)?;
    writeln!(out, "  Limiting: {}", if stats.limiting { "yes" } else { "no" })
}

fn write_outcome<S: ConfigStore, W: Write>(
    ctl: &Controller<'_, S>,
    command: Command,
    outcome: &Outcome,
    out: &mut W,
) -> fmt::Result {
    let cfg = ctl.config();
    let name = outcome.stage.name();

    if let Some(applied) = outcome.clamped {
        writeln!(out, "Warning: value clamped to {:.1} dB", applied)?;
    }

    match command {
        Command::Enable(_) => writeln!(out, "{} enabled", name)?,
        Command::Disable(_) => writeln!(out, "{} disabled (bypass)", name)?,
        Command::Reset(_) => writeln!(out, "{} state reset", name)?,
        Command::LimiterResetStats => writeln!(out, "limiter statistics reset")?,
        Command::Save(_) => {
            return match outcome.store_error {
                None => writeln!(out, "{} settings saved", name),
                Some(e) => writeln!(out, "Error: {}", e),
            };
        }
        Command::SubsonicFrequency(_) => writeln!(out, "Subsonic cutoff set to {:.1} Hz", cfg.subsonic.frequency())?,
        Command::PregainGain(_) => writeln!(
            out,
            "Pre-gain set to {:+.1} dB ({:.3}x linear)",
            cfg.pregain.gain_db(),
            cfg.pregain.gain_linear()
        )?,
        Command::EqBandGain { band, .. } => {
            let db = cfg.eq.band_gain(band).unwrap_or(0.0);
            writeln!(out, "Band {} ({} Hz) set to {:+.1} dB", band, BAND_FREQUENCIES[band], db)?
        }
        Command::EqPreset(preset) => {
            writeln!(out, "Applied '{}' preset", preset.name())?;
            for (hz, db) in BAND_FREQUENCIES.iter().zip(cfg.eq.gains().iter()) {
                writeln!(out, "  {:>7} Hz: {:+.1} dB", hz, db)?;
            }
        }
        Command::LimiterThreshold(_) => writeln!(out, "Limiter threshold set to {:.1} dB", cfg.limiter.threshold_db())?,
    }

    if let Some(e) = outcome.store_error {
        writeln!(out, "Warning: not saved: {}", e)?;
    }
    Ok(())
}
