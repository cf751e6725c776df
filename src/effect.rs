/// A bypassable single-sample processor.
///
/// Implementors keep their enabled flag behind [`Effect::is_enabled`] and
/// [`Effect::toggle`]; the default `process` passes audio through untouched.
pub trait Effect {
    fn is_enabled(&self) -> bool;

    fn toggle(&mut self, enabled: bool);

    fn enable(&mut self) {
        self.toggle(true);
    }

    fn disable(&mut self) {
        self.toggle(false);
    }

    fn process(&mut self, input: f32) -> f32 {
        input
    }
}
