/// Default audio sample rate in Hz.
pub const SAMPLE_RATE: u32 = 48_000;

/// Highest sample rate the statically sized buffers are dimensioned for.
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// Interleaved channels per frame (L, R).
pub const CHANNELS: usize = 2;

/// Stereo frames per audio block (5 ms at 48 kHz).
pub const BLOCK_FRAMES: usize = 240;

/// Interleaved `i32` samples per audio block.
pub const BLOCK_SAMPLES: usize = BLOCK_FRAMES * CHANNELS;

/// Native processing bit depth of the stages.
pub const AUDIO_BIT_DEPTH: u32 = 24;

/// Bits of padding below the native sample in the transport's 32-bit container.
pub const CONTAINER_SHIFT: u32 = 32 - AUDIO_BIT_DEPTH;

/// Full-scale magnitude at the native bit depth (2^23).
pub const FULL_SCALE: f32 = (1u32 << (AUDIO_BIT_DEPTH - 1)) as f32;

/// Largest positive native sample.
pub const NATIVE_MAX: i32 = (1 << (AUDIO_BIT_DEPTH - 1)) - 1;

/// Smallest negative native sample.
pub const NATIVE_MIN: i32 = -(1 << (AUDIO_BIT_DEPTH - 1));

/// Look-ahead delay line capacity: 5 ms of interleaved stereo at [`MAX_SAMPLE_RATE`].
pub const MAX_LOOKAHEAD_SAMPLES: usize = (MAX_SAMPLE_RATE as usize * 5 / 1000) * CHANNELS;
