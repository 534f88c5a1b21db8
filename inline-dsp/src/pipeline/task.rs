//! The audio task loop body.

use crate::constants::{BLOCK_SAMPLES, CHANNELS};
use crate::dsp::{LevelMonitor, ToneGenerator};
use crate::stages::LimiterTransition;
use crate::transport::{self, AudioTransport, TransportError};

use super::chain::Pipeline;

/// Moves blocks between the transport and the [`Pipeline`].
///
/// One call to [`AudioTask::run_once`] handles one block:
/// read → container shift → (tone) → level monitor → chain → shift back → write.
/// A failed read or write drops that block only; filter and limiter state
/// carry on untouched.
pub struct AudioTask<'a, T> {
    transport: T,
    pipeline: Pipeline<'a>,
    tone: ToneGenerator,
    level: LevelMonitor,
    block: [i32; BLOCK_SAMPLES],
    blocks: u32,
    dropped: u32,
}

impl<'a, T: AudioTransport> AudioTask<'a, T> {
    pub fn new(transport: T, pipeline: Pipeline<'a>, sample_rate: u32) -> Self {
        AudioTask {
            transport,
            pipeline,
            tone: ToneGenerator::new(sample_rate),
            level: LevelMonitor::new(LevelMonitor::DEFAULT_INTERVAL),
            block: [0; BLOCK_SAMPLES],
            blocks: 0,
            dropped: 0,
        }
    }

    /// Process one block.
    pub fn run_once(&mut self) -> Result<LimiterTransition, TransportError> {
        let read = match self.transport.read(&mut self.block) {
            Ok(n) => n.min(BLOCK_SAMPLES),
            Err(e) => return Err(self.drop_block("read", e)),
        };
        // whole frames only
        let len = read - read % CHANNELS;
        if len == 0 {
            return Err(self.drop_block("read", TransportError::Io));
        }
        let block = &mut self.block[..len];

        transport::from_container(block);
        if self.tone.is_enabled() {
            self.tone.generate(block);
        }

        self.level.update(block);
        if self.level.available() {
            let r = self.level.read();
            log::info!(
                "audio: DC {} P2P {} min {} max {}",
                r.dc_offset,
                r.peak_to_peak,
                r.min,
                r.max
            );
        }

        let transition = self.pipeline.process_block(block);
        transport::to_container(block);

        match self.transport.write(block) {
            Ok(n) if n == len => {}
            Ok(_) => return Err(self.drop_block("write", TransportError::Io)),
            Err(e) => return Err(self.drop_block("write", e)),
        }

        self.blocks = self.blocks.wrapping_add(1);
        Ok(transition)
    }

    fn drop_block(&mut self, op: &str, e: TransportError) -> TransportError {
        self.dropped = self.dropped.wrapping_add(1);
        log::warn!("audio: {} failed, block dropped: {}", op, e);
        e
    }

    /// Test-signal source used in place of the transport input when enabled.
    pub fn tone_mut(&mut self) -> &mut ToneGenerator {
        &mut self.tone
    }

    pub fn pipeline(&self) -> &Pipeline<'a> {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline<'a> {
        &mut self.pipeline
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Blocks written successfully.
    pub fn blocks(&self) -> u32 {
        self.blocks
    }

    /// Blocks lost to transport errors.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CONTAINER_SHIFT, SAMPLE_RATE};
    use crate::pipeline::{Chain, ChainConfig, LimiterMeter};
    use crate::sync::ParamCell;

    /// Loops a fixed input back and records the last block written.
    struct Loopback {
        input: [i32; BLOCK_SAMPLES],
        output: [i32; BLOCK_SAMPLES],
        written: usize,
        fail_next_read: bool,
    }

    impl Loopback {
        fn new(input: [i32; BLOCK_SAMPLES]) -> Self {
            Loopback { input, output: [0; BLOCK_SAMPLES], written: 0, fail_next_read: false }
        }
    }

    impl AudioTransport for Loopback {
        fn read(&mut self, block: &mut [i32]) -> Result<usize, TransportError> {
            if core::mem::take(&mut self.fail_next_read) {
                return Err(TransportError::Timeout);
            }
            block.copy_from_slice(&self.input);
            Ok(block.len())
        }

        fn write(&mut self, block: &[i32]) -> Result<usize, TransportError> {
            self.output[..block.len()].copy_from_slice(block);
            self.written = block.len();
            Ok(block.len())
        }
    }

    fn ramp() -> [i32; BLOCK_SAMPLES] {
        let mut input = [0i32; BLOCK_SAMPLES];
        for (i, s) in input.iter_mut().enumerate() {
            *s = ((i as i32 - 240) * 10_000) << CONTAINER_SHIFT;
        }
        input
    }

    #[test]
    fn bypassed_task_passes_container_samples_through() {
        let cell = ParamCell::new(ChainConfig::bypassed(SAMPLE_RATE));
        let (_publisher, subscriber) = cell.split().unwrap();
        let meter = LimiterMeter::new();
        let pipeline = Pipeline::new(Chain::new(SAMPLE_RATE), subscriber, &meter);
        let input = ramp();
        let mut task = AudioTask::new(Loopback::new(input), pipeline, SAMPLE_RATE);

        for _ in 0..3 {
            assert_eq!(task.run_once(), Ok(LimiterTransition::NoChange));
            assert_eq!(task.transport().output, input);
            assert_eq!(task.transport().written, BLOCK_SAMPLES);
        }
        assert_eq!(task.blocks(), 3);
    }

    #[test]
    fn read_error_drops_only_that_block() {
        let cell = ParamCell::new(ChainConfig::new(SAMPLE_RATE));
        let (_publisher, subscriber) = cell.split().unwrap();
        let meter = LimiterMeter::new();
        let pipeline = Pipeline::new(Chain::new(SAMPLE_RATE), subscriber, &meter);
        let mut task = AudioTask::new(Loopback::new(ramp()), pipeline, SAMPLE_RATE);

        task.run_once().unwrap();
        let envelope = task.pipeline().chain().limiter().envelope();
        task.transport_mut().fail_next_read = true;
        assert_eq!(task.run_once(), Err(TransportError::Timeout));
        assert_eq!(task.dropped(), 1);
        assert_eq!(task.blocks(), 1);
        // nothing was processed for the dropped block
        assert_eq!(task.pipeline().chain().limiter().envelope(), envelope);
        task.run_once().unwrap();
        assert_eq!(task.blocks(), 2);
    }

    #[test]
    fn tone_replaces_transport_input() {
        let cell = ParamCell::new(ChainConfig::bypassed(SAMPLE_RATE));
        let (_publisher, subscriber) = cell.split().unwrap();
        let meter = LimiterMeter::new();
        let pipeline = Pipeline::new(Chain::new(SAMPLE_RATE), subscriber, &meter);
        let mut task = AudioTask::new(Loopback::new([0; BLOCK_SAMPLES]), pipeline, SAMPLE_RATE);
        task.tone_mut().set_frequency(1000.0);
        task.tone_mut().set_amplitude(0.5);
        task.tone_mut().set_enabled(true);

        task.run_once().unwrap();
        let out = task.transport().output;
        assert!(out.iter().any(|&s| s != 0));
        for frame in out.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }
}
