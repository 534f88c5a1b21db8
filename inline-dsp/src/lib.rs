//! # inline-dsp
//!
//! A `no_std`, zero-allocation corrective DSP chain for microcontroller audio
//! processors sitting inline between an ADC and a DAC. Four fixed stages run
//! on interleaved stereo blocks of native 24-bit samples in Q24 fixed point:
//!
//! ```text
//! ADC ─▶ subsonic HPF ─▶ pre-gain ─▶ 5-band EQ ─▶ look-ahead limiter ─▶ DAC
//! ```
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Trait | [`stage`] / [`control`] | `AudioStage` and `StageControl` traits |
//! | DSP | [`dsp`] | Q24 helpers, biquad engine, level monitor, tone generator |
//! | Stages | [`stages`] | Subsonic, pre-gain, equalizer, limiter |
//! | Handoff | [`sync`] | Lock-free triple buffer and event queue |
//! | Pipeline | [`pipeline`] | Fixed chain, shared config, controller, audio task |
//! | Persistence | [`store`] | Namespaced key/value settings |
//! | I/O | [`transport`] | Audio interface trait and container shift |
//! | Control | [`console`] / [`remote`] | Text console and topic channel (feature-gated) |
//!
//! ## Quick start
//!
//! ```ignore
//! use inline_dsp::constants::{BLOCK_SAMPLES, SAMPLE_RATE};
//! use inline_dsp::pipeline::{Chain, ChainConfig, Command, Controller, LimiterMeter, Pipeline};
//! use inline_dsp::store::MemoryStore;
//! use inline_dsp::sync::ParamCell;
//!
//! let config = ParamCell::new(ChainConfig::new(SAMPLE_RATE));
//! let meter = LimiterMeter::new();
//! let (publisher, subscriber) = config.split().unwrap();
//!
//! // Control task
//! let mut ctl = Controller::new(ChainConfig::new(SAMPLE_RATE), publisher, MemoryStore::<16>::new(), &meter);
//! ctl.load();
//! ctl.execute(Command::LimiterThreshold(-1.0))?;
//!
//! // Audio task
//! let mut pipeline = Pipeline::new(Chain::new(SAMPLE_RATE), subscriber, &meter);
//! let mut block = [0i32; BLOCK_SAMPLES];
//! pipeline.process_block(&mut block);
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `console` | yes | Line-oriented text console ([`console`]) |
//! | `remote` | yes | Topic-based network control channel ([`remote`]) |
//!
//! ## Audio parameters
//!
//! - **Block size:** 240 frames / 480 samples ([`constants::BLOCK_SAMPLES`])
//! - **Sample rate:** 48 000 Hz default ([`constants::SAMPLE_RATE`]), up to 192 kHz
//! - **Sample format:** `i32` holding native 24-bit, 32-bit containers at the transport
//! - **Coefficients:** Q24 signed fixed point

#![no_std]

#[cfg(test)]
extern crate std;

pub mod constants;
pub mod error;
pub mod stage;
pub mod control;
pub mod dsp;
pub mod stages;
pub mod sync;
pub mod pipeline;
pub mod store;
pub mod transport;

#[cfg(feature = "console")]
pub mod console;

#[cfg(feature = "remote")]
pub mod remote;

pub use error::ConfigError;
