//! Behavioural scenarios for the individual stages and the fixed chain.

use inline_dsp::constants::{BLOCK_SAMPLES, CHANNELS, NATIVE_MAX, SAMPLE_RATE};
use inline_dsp::control::StageControl;
use inline_dsp::dsp::biquad::process_interleaved;
use inline_dsp::dsp::{BiquadState, ToneGenerator, Waveform};
use inline_dsp::pipeline::{Chain, ChainConfig, Stage};
use inline_dsp::stage::AudioStage;
use inline_dsp::stages::{
    limiter, Equalizer, EqualizerConfig, Limiter, LimiterConfig, Pregain, PregainConfig, Subsonic, SubsonicConfig,
};
use inline_dsp::ConfigError;

fn sine(amplitude: f32, freq: f32) -> ToneGenerator {
    let mut t = ToneGenerator::new(SAMPLE_RATE);
    t.set_waveform(Waveform::Sine);
    t.set_frequency(freq);
    t.set_amplitude(amplitude);
    t.set_enabled(true);
    t
}

fn noise_block(seed: u32) -> [i32; BLOCK_SAMPLES] {
    let mut x = seed | 1;
    let mut block = [0i32; BLOCK_SAMPLES];
    for s in block.iter_mut() {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        *s = (x as i32) >> 8;
    }
    block
}

// ── Setter policy ─────────────────────────────────────────────────────

#[test]
fn subsonic_10_hz_is_rejected() {
    let mut cfg = SubsonicConfig::new(SAMPLE_RATE);
    let before = cfg;
    let err = cfg.set_frequency(10.0).unwrap_err();
    assert!(matches!(err, ConfigError::FrequencyOutOfRange { .. }));
    assert_eq!(cfg, before);

    assert!(cfg.set_frequency(60.0).is_err());
    assert!(cfg.set_frequency(15.0).is_ok());
    assert!(cfg.set_frequency(50.0).is_ok());
    assert_eq!(cfg.frequency(), 50.0);
}

#[test]
fn eq_band_20_db_is_clamped_to_12() {
    let mut cfg = EqualizerConfig::new(SAMPLE_RATE);
    assert_eq!(cfg.set_band_gain(1, 20.0), Ok(12.0));
    assert_eq!(cfg.set_band_gain(1, -30.0), Ok(-12.0));
    assert_eq!(cfg.band_gain(1), Some(-12.0));
    assert!(matches!(cfg.set_band_gain(5, 0.0), Err(ConfigError::BandOutOfRange { band: 5, .. })));
}

#[test]
fn pregain_and_threshold_clamp() {
    let mut gain = PregainConfig::new();
    assert_eq!(gain.set_gain_db(15.0), 12.0);
    assert_eq!(gain.set_gain_db(-15.0), -12.0);

    let mut lim = LimiterConfig::new();
    assert_eq!(lim.set_threshold_db(1.0), 0.0);
    assert_eq!(lim.set_threshold_db(-20.0), -12.0);
}

// ── Bypass and transparency ───────────────────────────────────────────

#[test]
fn every_disabled_stage_is_bit_exact() {
    let input = noise_block(7);

    let mut sub_cfg = SubsonicConfig::new(SAMPLE_RATE);
    sub_cfg.set_enabled(false);
    let mut block = input;
    Subsonic::new().process(&sub_cfg, &mut block);
    assert_eq!(block, input);

    let mut gain_cfg = PregainConfig::new();
    gain_cfg.set_gain_db(9.0);
    gain_cfg.set_enabled(false);
    let mut block = input;
    Pregain::new().process(&gain_cfg, &mut block);
    assert_eq!(block, input);

    let mut eq_cfg = EqualizerConfig::new(SAMPLE_RATE);
    eq_cfg.set_band_gain(2, 6.0).unwrap();
    eq_cfg.set_enabled(false);
    let mut block = input;
    Equalizer::new().process(&eq_cfg, &mut block);
    assert_eq!(block, input);

    let mut lim_cfg = LimiterConfig::new();
    lim_cfg.set_enabled(false);
    let mut block = input;
    Limiter::new(SAMPLE_RATE).process(&lim_cfg, &mut block);
    assert_eq!(block, input);
}

#[test]
fn all_off_chain_is_bit_identical() {
    let mut cfg = ChainConfig::bypassed(SAMPLE_RATE);
    // flat EQ, even when enabled
    cfg.set_enabled(Stage::Equalizer, true);
    let mut chain = Chain::new(SAMPLE_RATE);
    for seed in 1..20 {
        let input = noise_block(seed);
        let mut block = input;
        chain.process(&cfg, &mut block);
        assert_eq!(block, input);
    }
}

#[test]
fn zero_db_band_is_exact_through_the_cascade() {
    // one band boosted forces the full cascade; the 0 dB bands must add nothing
    let mut boosted = EqualizerConfig::new(SAMPLE_RATE);
    boosted.set_band_gain(4, 3.0).unwrap();
    let mut eq = Equalizer::new();

    let input = noise_block(99);
    let mut a = input;
    eq.process(&boosted, &mut a);

    // same input through a single section with the band-4 coefficients
    let c = boosted.coefficients()[4];
    let mut state = [BiquadState::new(); CHANNELS];
    let mut b = input;
    process_interleaved(&c, &mut state, &mut b);
    assert_eq!(a, b);
}

// ── Limiter dynamics ──────────────────────────────────────────────────

#[test]
fn attack_reaches_within_one_over_e_in_one_time_constant() {
    let cfg = LimiterConfig::new();
    let mut lim = Limiter::new(SAMPLE_RATE);
    let frames = (limiter::ATTACK_MS / 1000.0 * SAMPLE_RATE as f32).round() as usize;
    let desired = cfg.threshold_linear() * inline_dsp::constants::FULL_SCALE / NATIVE_MAX as f32;

    let mut block = vec![NATIVE_MAX; frames * CHANNELS];
    lim.process(&cfg, &mut block);

    let remaining = lim.envelope() - desired;
    let bound = (1.0 - desired) * (-1.0f32).exp();
    assert!(lim.envelope() < 1.0);
    assert!(remaining <= bound * 1.01, "remaining {} bound {}", remaining, bound);
}

#[test]
fn release_recovers_within_one_time_constant() {
    let cfg = LimiterConfig::new();
    let mut lim = Limiter::new(SAMPLE_RATE);
    let mut loud = [NATIVE_MAX; BLOCK_SAMPLES];
    lim.process(&cfg, &mut loud);
    let start = lim.envelope();
    assert!(start < 0.95);

    let frames = (limiter::RELEASE_MS / 1000.0 * SAMPLE_RATE as f32).round() as usize;
    let mut quiet = vec![0i32; frames * CHANNELS];
    lim.process(&cfg, &mut quiet);

    let gap = 1.0 - lim.envelope();
    let bound = (1.0 - start) * (-1.0f32).exp();
    assert!(gap > 0.0);
    assert!(gap <= bound * 1.01, "gap {} bound {}", gap, bound);
}

#[test]
fn sustained_full_scale_tone_stays_under_ceiling() {
    for threshold in [-0.5, -3.0, -12.0] {
        let mut cfg = LimiterConfig::new();
        cfg.set_threshold_db(threshold);
        let ceiling = cfg.ceiling();
        let mut lim = Limiter::new(SAMPLE_RATE);
        let mut gen = sine(1.0, 1000.0);
        for _ in 0..30 {
            let mut block = [0i32; BLOCK_SAMPLES];
            gen.generate(&mut block);
            lim.process(&cfg, &mut block);
            let peak = block.iter().map(|s| s.abs()).max().unwrap();
            assert!(peak <= ceiling + 1, "threshold {} peak {} ceiling {}", threshold, peak, ceiling);
        }
    }
}

#[test]
fn look_ahead_follows_sample_rate() {
    assert_eq!(Limiter::new(48_000).lookahead_len(), 480);
    assert_eq!(Limiter::new(44_100).lookahead_len(), 440);
    assert_eq!(Limiter::new(192_000).lookahead_len(), 1920);
}

#[test]
fn eq_band_above_nyquist_runs_transparent() {
    // 12 kHz is beyond Nyquist at 22.05 kHz
    let mut cfg = EqualizerConfig::new(22_050);
    cfg.set_band_gain(4, 6.0).unwrap();
    assert!(cfg.coefficients()[4].is_transparent());
}
