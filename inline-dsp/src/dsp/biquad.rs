//! Fixed-point biquad engine.
//!
//! Coefficient derivation runs in `f32` off the audio path (RBJ cookbook
//! bilinear-transform prototypes) and produces an immutable
//! [`BiquadCoefficients`] record in Q24. Per-sample evaluation is integer
//! only:
//!
//! ```text
//! y = (b0·x + b1·x1 + b2·x2 − a1·y1 − a2·y2) >> 24
//! ```
//!
//! accumulated in `i64` and saturated to `i32`. Each channel keeps its own
//! [`BiquadState`]; state is never shared across channels or stages.

use core::f32::consts::PI;

use crate::constants::CHANNELS;
use crate::dsp::fixed::{saturate_i32, to_q24, Q24_ONE, Q24_SHIFT};
use crate::error::ConfigError;

/// Butterworth Q used by every shipped stage.
pub const BUTTERWORTH_Q: f32 = 0.707;

/// Filter prototype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Peaking (bell) filter; uses `gain_db`.
    Peaking,
    /// Second-order high-pass; `gain_db` is ignored.
    HighPass,
}

/// Parameters a coefficient set is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub kind: FilterKind,
    pub freq_hz: f32,
    pub gain_db: f32,
    pub q: f32,
}

impl FilterParams {
    pub const fn peaking(freq_hz: f32, gain_db: f32) -> Self {
        FilterParams { kind: FilterKind::Peaking, freq_hz, gain_db, q: BUTTERWORTH_Q }
    }

    pub const fn high_pass(freq_hz: f32) -> Self {
        FilterParams { kind: FilterKind::HighPass, freq_hz, gain_db: 0.0, q: BUTTERWORTH_Q }
    }
}

/// Q24 coefficient set, normalized so that `a0 == 1`.
///
/// Replaced as a whole record, never field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiquadCoefficients {
    pub b0: i32,
    pub b1: i32,
    pub b2: i32,
    pub a1: i32,
    pub a2: i32,
}

impl BiquadCoefficients {
    /// Pass-through coefficients (`y = x`).
    pub const IDENTITY: Self = BiquadCoefficients { b0: Q24_ONE, b1: 0, b2: 0, a1: 0, a2: 0 };

    /// Derive Q24 coefficients for `params` at `sample_rate`.
    ///
    /// Fails with [`ConfigError::DegenerateFrequency`] when the frequency is
    /// not strictly between 0 and Nyquist.
    pub fn derive(params: &FilterParams, sample_rate: u32) -> Result<Self, ConfigError> {
        let fs = sample_rate as f32;
        let f = params.freq_hz;
        if !(f > 0.0 && f < fs / 2.0) {
            return Err(ConfigError::DegenerateFrequency { hz: f, sample_rate });
        }

        let w0 = 2.0 * PI * f / fs;
        let cos_w0 = libm::cosf(w0);
        let alpha = libm::sinf(w0) / (2.0 * params.q);

        let (b0, b1, b2, a0, a1, a2) = match params.kind {
            FilterKind::Peaking => {
                let a = libm::powf(10.0, params.gain_db / 40.0);
                (
                    1.0 + alpha * a,
                    -2.0 * cos_w0,
                    1.0 - alpha * a,
                    1.0 + alpha / a,
                    -2.0 * cos_w0,
                    1.0 - alpha / a,
                )
            }
            FilterKind::HighPass => (
                (1.0 + cos_w0) / 2.0,
                -(1.0 + cos_w0),
                (1.0 + cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
        };

        let coeffs = BiquadCoefficients {
            b0: to_q24(b0 / a0),
            b1: to_q24(b1 / a0),
            b2: to_q24(b2 / a0),
            a1: to_q24(a1 / a0),
            a2: to_q24(a2 / a0),
        };
        log::debug!(
            "biquad {:?} {} Hz {} dB Q{} @ {} Hz -> {:?}",
            params.kind, f, params.gain_db, params.q, sample_rate, coeffs
        );
        Ok(coeffs)
    }

    /// True when these coefficients reproduce the input exactly
    /// (unit `b0` with numerator and denominator cancelling).
    pub fn is_transparent(&self) -> bool {
        self.b0 == Q24_ONE && self.b1 == self.a1 && self.b2 == self.a2
    }
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Per-channel filter history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BiquadState {
    pub x1: i32,
    pub x2: i32,
    pub y1: i32,
    pub y2: i32,
}

impl BiquadState {
    pub const fn new() -> Self {
        BiquadState { x1: 0, x2: 0, y1: 0, y2: 0 }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Evaluate one sample and shift the history.
    #[inline(always)]
    pub fn process(&mut self, c: &BiquadCoefficients, x: i32) -> i32 {
        let acc = c.b0 as i64 * x as i64
            + c.b1 as i64 * self.x1 as i64
            + c.b2 as i64 * self.x2 as i64
            - c.a1 as i64 * self.y1 as i64
            - c.a2 as i64 * self.y2 as i64;
        let y = saturate_i32(acc >> Q24_SHIFT);

        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    /// Output history equals input history. A transparent filter keeps
    /// this true; any tail left by earlier coefficients breaks it.
    #[inline]
    pub fn is_passthrough(&self) -> bool {
        self.x1 == self.y1 && self.x2 == self.y2
    }

    /// Advance the history as a transparent filter would, without the
    /// multiply-accumulate. `prev` and `last` are the final two inputs.
    #[inline]
    pub fn follow_passthrough(&mut self, prev: i32, last: i32) {
        self.x2 = prev;
        self.y2 = prev;
        self.x1 = last;
        self.y1 = last;
    }
}

/// Run one coefficient set over an interleaved stereo block in place,
/// with separate state per channel.
pub fn process_interleaved(
    coeffs: &BiquadCoefficients,
    state: &mut [BiquadState; CHANNELS],
    block: &mut [i32],
) {
    for frame in block.chunks_exact_mut(CHANNELS) {
        for (sample, st) in frame.iter_mut().zip(state.iter_mut()) {
            *sample = st.process(coeffs, *sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SAMPLE_RATE;

    fn sine(freq: f32, amplitude: f32, n: usize) -> impl Iterator<Item = i32> {
        (0..n).map(move |i| {
            (amplitude * libm::sinf(2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32)) as i32
        })
    }

    fn peak_after(coeffs: &BiquadCoefficients, freq: f32, amplitude: f32, skip: usize, n: usize) -> i32 {
        let mut st = BiquadState::new();
        sine(freq, amplitude, n)
            .map(|x| st.process(coeffs, x))
            .skip(skip)
            .map(|y| y.abs())
            .max()
            .unwrap()
    }

    #[test]
    fn derive_rejects_degenerate_frequencies() {
        for f in [0.0, -10.0, 24_000.0, 30_000.0, f32::NAN] {
            let err = BiquadCoefficients::derive(&FilterParams::high_pass(f), SAMPLE_RATE);
            assert!(
                matches!(err, Err(ConfigError::DegenerateFrequency { .. })),
                "{} Hz should be rejected, got {:?}",
                f,
                err
            );
        }
        assert!(BiquadCoefficients::derive(&FilterParams::peaking(23_999.0, 3.0), SAMPLE_RATE).is_ok());
    }

    #[test]
    fn zero_db_peaking_is_transparent() {
        for f in [60.0, 250.0, 1000.0, 4000.0, 12_000.0] {
            let c = BiquadCoefficients::derive(&FilterParams::peaking(f, 0.0), SAMPLE_RATE).unwrap();
            assert!(c.is_transparent(), "{} Hz at 0 dB: {:?}", f, c);
        }
    }

    #[test]
    fn zero_db_peaking_output_is_bit_exact() {
        let c = BiquadCoefficients::derive(&FilterParams::peaking(1000.0, 0.0), SAMPLE_RATE).unwrap();
        let mut st = BiquadState::new();
        let mut seed: u32 = 0x1234_5678;
        for _ in 0..4096 {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let x = (seed as i32) >> 8;
            assert_eq!(st.process(&c, x), x);
        }
    }

    #[test]
    fn identity_passes_through() {
        let mut st = BiquadState::new();
        for x in [0, 1, -1, 8_388_607, -8_388_608, i32::MAX, i32::MIN] {
            assert_eq!(st.process(&BiquadCoefficients::IDENTITY, x), x);
        }
    }

    #[test]
    fn high_pass_coefficients_are_symmetric() {
        let c = BiquadCoefficients::derive(&FilterParams::high_pass(25.0), SAMPLE_RATE).unwrap();
        assert_eq!(c.b0, c.b2);
        assert!(c.b1 < 0);
        assert!((c.b1 + 2 * c.b0).abs() <= 1, "b1 should be -2*b0: {:?}", c);
    }

    #[test]
    fn high_pass_rejects_rumble_and_passes_audio() {
        let c = BiquadCoefficients::derive(&FilterParams::high_pass(25.0), SAMPLE_RATE).unwrap();
        let amp = 4_000_000.0;

        let rumble = peak_after(&c, 5.0, amp, 48_000, 96_000);
        assert!(rumble < (amp * 0.1) as i32, "5 Hz should be strongly attenuated, peak {}", rumble);

        let tone = peak_after(&c, 1000.0, amp, 4800, 9600);
        let ratio = tone as f32 / amp;
        assert!((ratio - 1.0).abs() < 0.05, "1 kHz should pass, ratio {}", ratio);
    }

    #[test]
    fn peaking_boosts_at_center() {
        let c = BiquadCoefficients::derive(&FilterParams::peaking(1000.0, 6.0), SAMPLE_RATE).unwrap();
        let amp = 1_000_000.0;
        let peak = peak_after(&c, 1000.0, amp, 4800, 9600);
        let ratio = peak as f32 / amp;
        assert!((ratio - 1.995).abs() < 0.05, "+6 dB at center, ratio {}", ratio);

        let far = peak_after(&c, 10_000.0, amp, 4800, 9600);
        let far_ratio = far as f32 / amp;
        assert!(far_ratio < 1.1, "far from center should be near unity, ratio {}", far_ratio);
    }

    #[test]
    fn channels_keep_separate_state() {
        let c = BiquadCoefficients::derive(&FilterParams::peaking(250.0, 6.0), SAMPLE_RATE).unwrap();
        let mut state = [BiquadState::new(); CHANNELS];
        let mut block = [0i32; 64];
        for frame in block.chunks_exact_mut(2) {
            frame[0] = 100_000;
        }
        process_interleaved(&c, &mut state, &mut block);
        assert!(block.iter().skip(1).step_by(2).all(|&s| s == 0), "silent right channel must stay silent");
        assert_ne!(state[0], BiquadState::new());
        assert_eq!(state[1], BiquadState::new());
    }

    #[test]
    fn follow_passthrough_matches_running_identity() {
        let c = BiquadCoefficients::derive(&FilterParams::peaking(4000.0, 0.0), SAMPLE_RATE).unwrap();
        let mut run = BiquadState::new();
        for x in [5, -7, 11, 13] {
            run.process(&c, x);
        }
        let mut skipped = BiquadState::new();
        skipped.follow_passthrough(11, 13);
        assert_eq!(run, skipped);
        assert!(skipped.is_passthrough());
    }

    #[test]
    fn boosted_history_is_not_passthrough() {
        let c = BiquadCoefficients::derive(&FilterParams::peaking(1000.0, 6.0), SAMPLE_RATE).unwrap();
        let mut st = BiquadState::new();
        assert!(st.is_passthrough());
        for x in [1 << 20, -(1 << 19), 1 << 18] {
            st.process(&c, x);
        }
        assert!(!st.is_passthrough());
    }
}
