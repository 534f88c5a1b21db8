//! Fixed stage ordering and the audio-side block processor.

use crate::sync::{EventSender, Subscriber};
use crate::stage::AudioStage;
use crate::stages::{Equalizer, Limiter, LimiterStats, LimiterTransition, Pregain, Subsonic};

use super::config::ChainConfig;
use super::meter::LimiterMeter;

/// Slots in the limiter transition queue (capacity is one less).
pub const EVENT_SLOTS: usize = 8;

/// The four stages in fixed order: subsonic → pre-gain → equalizer → limiter.
///
/// Each stage receives only its own sub-record of the [`ChainConfig`].
pub struct Chain {
    subsonic: Subsonic,
    pregain: Pregain,
    eq: Equalizer,
    limiter: Limiter,
}

impl Chain {
    pub fn new(sample_rate: u32) -> Self {
        Chain {
            subsonic: Subsonic::new(),
            pregain: Pregain::new(),
            eq: Equalizer::new(),
            limiter: Limiter::new(sample_rate),
        }
    }

    /// Run one interleaved block through all four stages in place.
    pub fn process(&mut self, config: &ChainConfig, block: &mut [i32]) -> LimiterTransition {
        self.subsonic.process(&config.subsonic, block);
        self.pregain.process(&config.pregain, block);
        self.eq.process(&config.eq, block);
        self.limiter.process(&config.limiter, block)
    }

    /// Clear every stage's audio-side state.
    pub fn reset(&mut self) {
        self.subsonic.reset();
        self.pregain.reset();
        self.eq.reset();
        self.limiter.reset();
    }

    pub fn limiter_stats(&self) -> LimiterStats {
        self.limiter.stats()
    }

    pub fn subsonic(&self) -> &Subsonic {
        &self.subsonic
    }

    pub fn eq(&self) -> &Equalizer {
        &self.eq
    }

    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }
}

/// Audio-task side of the pipeline: the chain plus its handoff handles.
///
/// Reads the newest published [`ChainConfig`] once per block, exports the
/// limiter statistics, and forwards limiter transitions to the control task.
pub struct Pipeline<'a> {
    chain: Chain,
    config: Subscriber<'a, ChainConfig>,
    meter: &'a LimiterMeter,
    events: Option<EventSender<'a, LimiterTransition, EVENT_SLOTS>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(chain: Chain, config: Subscriber<'a, ChainConfig>, meter: &'a LimiterMeter) -> Self {
        Pipeline { chain, config, meter, events: None }
    }

    /// Forward limiter transitions into `events`.
    pub fn with_events(mut self, events: EventSender<'a, LimiterTransition, EVENT_SLOTS>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn process_block(&mut self, block: &mut [i32]) -> LimiterTransition {
        let config = self.config.read();
        let transition = self.chain.process(config, block);
        self.meter.store(&self.chain.limiter_stats());

        if transition != LimiterTransition::NoChange {
            if let Some(events) = self.events.as_mut() {
                // a full queue drops the event; the meter still has the state
                let _ = events.push(transition);
            }
        }
        transition
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Currently applied configuration.
    pub fn config(&mut self) -> &ChainConfig {
        self.config.read()
    }
}
