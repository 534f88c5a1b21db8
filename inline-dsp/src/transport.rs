//! Audio interface boundary.
//!
//! The chain works on native 24-bit samples. Serial audio peripherals carry
//! them left-justified in 32-bit containers, so every block is shifted down
//! on the way in and saturated then shifted up on the way out.

use thiserror::Error;

use crate::constants::CONTAINER_SHIFT;
use crate::dsp::fixed::saturate24;

/// Why a block could not be moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport timed out")]
    Timeout,

    #[error("transport I/O error")]
    Io,
}

/// Blocking, interleaved, 32-bit container I/O.
///
/// Both calls return the number of samples moved. A short count is treated
/// like an error by the audio task.
pub trait AudioTransport {
    fn read(&mut self, block: &mut [i32]) -> Result<usize, TransportError>;
    fn write(&mut self, block: &[i32]) -> Result<usize, TransportError>;
}

/// Container samples → native 24-bit, in place.
pub fn from_container(block: &mut [i32]) {
    for s in block.iter_mut() {
        *s >>= CONTAINER_SHIFT;
    }
}

/// Native samples → container, in place. Saturates to 24 bits first.
pub fn to_container(block: &mut [i32]) {
    for s in block.iter_mut() {
        *s = saturate24(*s) << CONTAINER_SHIFT;
    }
}
