/// Control-side operations shared by every stage configuration record.
///
/// Implementors are plain `Copy` records edited by the control task and then
/// published to the audio task as a whole.
pub trait StageControl {
    /// Short name used in logs and console output.
    const NAME: &'static str;

    /// Whether the stage processes audio (`false` = bit-exact bypass).
    fn is_enabled(&self) -> bool;

    /// Enable or bypass the stage.
    fn set_enabled(&mut self, enabled: bool);

    /// Ask the audio side to clear the stage's state on its next block.
    ///
    /// Stateless stages ignore this.
    fn request_reset(&mut self) {}
}
