//! Test-signal generator (sine, square, triangle, sawtooth).
//!
//! Phase-accumulator oscillator: a `u32` phase wraps naturally at 2^32 = one
//! cycle. Output is written identically to both channels of an interleaved
//! block at native 24-bit scale.

use core::f32::consts::PI;

use crate::constants::{CHANNELS, NATIVE_MAX};

/// Waveform shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sine" => Some(Waveform::Sine),
            "square" => Some(Waveform::Square),
            "triangle" => Some(Waveform::Triangle),
            "saw" | "sawtooth" => Some(Waveform::Sawtooth),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
        }
    }
}

/// Phase-accumulator tone generator. Starts disabled at 440 Hz, amplitude 0.5.
pub struct ToneGenerator {
    sample_rate: u32,
    frequency: f32,
    amplitude: f32,
    waveform: Waveform,
    enabled: bool,
    /// Wraps at 2^32 = 360°.
    phase_accumulator: u32,
    /// `freq / sample_rate * 2^32`.
    phase_increment: u32,
}

impl ToneGenerator {
    pub fn new(sample_rate: u32) -> Self {
        let mut gen = ToneGenerator {
            sample_rate,
            frequency: 0.0,
            amplitude: 0.5,
            waveform: Waveform::Sine,
            enabled: false,
            phase_accumulator: 0,
            phase_increment: 0,
        };
        gen.set_frequency(440.0);
        gen
    }

    /// Set the frequency in Hz. Restarts the waveform at phase 0.
    pub fn set_frequency(&mut self, hz: f32) {
        let nyquist = self.sample_rate as f32 / 2.0;
        let hz = if hz.is_nan() { 0.0 } else { hz.clamp(0.0, nyquist) };
        self.frequency = hz;
        self.phase_increment = (hz as f64 * 4_294_967_296.0 / self.sample_rate as f64) as u32;
        self.phase_accumulator = 0;
    }

    /// Set the amplitude (0.0 = silent, 1.0 = full scale), clamped.
    pub fn set_amplitude(&mut self, level: f32) {
        self.amplitude = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
    }

    /// Select the waveform. Restarts at phase 0.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
        self.phase_accumulator = 0;
    }

    /// Enabling restarts at phase 0.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled && !self.enabled {
            self.phase_accumulator = 0;
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Fill an interleaved block with the tone (L = R).
    pub fn generate(&mut self, block: &mut [i32]) {
        let scale = self.amplitude * NATIVE_MAX as f32;
        let mut ph = self.phase_accumulator;
        let inc = self.phase_increment;

        for frame in block.chunks_exact_mut(CHANNELS) {
            let value = (self.shape(ph) * scale) as i32;
            frame.fill(value);
            ph = ph.wrapping_add(inc);
        }

        self.phase_accumulator = ph;
    }

    /// Unit-amplitude waveform value at `phase`.
    fn shape(&self, phase: u32) -> f32 {
        // position within the cycle, [0, 1)
        let p = phase as f32 / 4_294_967_296.0;
        match self.waveform {
            Waveform::Sine => libm::sinf(2.0 * PI * p),
            Waveform::Square => {
                if phase < 0x8000_0000 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => {
                if p < 0.5 {
                    -1.0 + 4.0 * p
                } else {
                    3.0 - 4.0 * p
                }
            }
            Waveform::Sawtooth => -1.0 + 2.0 * p,
        }
    }
}
