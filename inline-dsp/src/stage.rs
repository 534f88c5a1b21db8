/// Core trait for the fixed processing stages.
///
/// A stage owns its audio-side state (filter history, look-ahead buffer)
/// and is handed its own configuration record once per block. It never
/// sees another stage's configuration or state.
pub trait AudioStage {
    /// Control-side parameter record, published as a whole between blocks.
    type Config: Copy;

    /// Per-block outcome handed back to the pipeline.
    type Report;

    /// Process one interleaved stereo block in place.
    ///
    /// `block` holds native 24-bit samples, `CHANNELS` per frame. A disabled
    /// stage must leave it untouched.
    fn process(&mut self, config: &Self::Config, block: &mut [i32]) -> Self::Report;

    /// Clear all audio-side state.
    fn reset(&mut self);
}
