//! The fixed processing chain and the two tasks that share it.
//!
//! ## Data flow
//!
//! ```text
//!  control task                              audio task
//!  ────────────                              ──────────
//!  Controller ── ParamCell<ChainConfig> ──▶  Pipeline ◀── AudioTask ◀─▶ transport
//!      ▲                                        │
//!      ├──────── LimiterMeter ◀─────────────────┤
//!      └──────── EventQueue<LimiterTransition> ◀┘
//! ```
//!
//! | Type | Task | Role |
//! |------|------|------|
//! | [`Controller`] | control | owns the master [`ChainConfig`], publishes and persists it |
//! | [`Pipeline`] | audio | runs [`Chain`] on the newest published config |
//! | [`AudioTask`] | audio | moves blocks between an [`AudioTransport`](crate::transport::AudioTransport) and the pipeline |
//! | [`LimiterMeter`] | both | limiter statistics, written by audio, read by control |

pub mod config;
pub mod meter;
pub mod chain;
pub mod controller;
pub mod task;

pub use config::{ChainConfig, Stage};
pub use meter::LimiterMeter;
pub use chain::{Chain, Pipeline, EVENT_SLOTS};
pub use controller::{Command, Controller, Outcome};
pub use task::AudioTask;
