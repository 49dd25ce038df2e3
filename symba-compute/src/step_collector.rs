/// A type that collects the steps of an algorithm.
///
/// The rewrite search engine reports a [`crate::simplify::SearchEvent`] for
/// every rule application it enqueues, replacing per-rule debug hooks wired
/// into the rules themselves.
///
/// [`StepCollector`] is also implemented for the unit type `()`. This is
/// useful when you don't care about the steps taken by an algorithm, and it
/// keeps observation entirely out of the hot path.
pub trait StepCollector<S> {
    /// Adds a step to the collector.
    fn push(&mut self, step: S);
}

impl<S> StepCollector<S> for () {
    #[inline]
    fn push(&mut self, _: S) {}
}

impl<S> StepCollector<S> for Vec<S> {
    #[inline]
    fn push(&mut self, step: S) {
        self.push(step);
    }
}
