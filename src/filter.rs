use alloc::boxed::Box;

use crate::delay::DelayLine;
use crate::synthesis::{Oscillator, WaveType};
use crate::{clip, flush_denormal};

/// Ceiling for every feedback coefficient inside a filter; keeps each loop BIBO stable.
pub const MAX_FEEDBACK_GAIN: f32 = 0.999;

/// Samples of extra delay the all-pass LFO sweeps over, on top of the base delay.
pub const LFO_DEPTH: f32 = 10.0;

/// Default modulation rate of the all-pass LFOs.
pub const DEFAULT_LFO_FREQUENCY: f32 = 0.5;

/// One-pole lowpass used to damp high frequencies inside feedback paths.
///
/// `y[n] = a0 * x[n] + b1 * y[n-1]` where `b1` is the feedback gain. A
/// normalized filter uses `a0 = 1 - b1` (unity DC gain); a leaky integrator
/// keeps `a0 = 1`.
#[derive(Clone, Debug)]
pub struct OnePoleLowPass {
    normalized: bool,
    a0: f32,
    b1: f32,
    z1: f32,
}

impl OnePoleLowPass {
    /// Unity DC gain: `y = x * (1 - g) + g * y[n-1]`.
    pub fn normalized() -> Self {
        Self {
            normalized: true,
            a0: 1.0,
            b1: 0.0,
            z1: 0.0,
        }
    }

    /// Leaky integrator: `y = x + g * y[n-1]`.
    pub fn leaky() -> Self {
        Self {
            normalized: false,
            a0: 1.0,
            b1: 0.0,
            z1: 0.0,
        }
    }

    /// Set the feedback gain, clamped to [0.0, MAX_FEEDBACK_GAIN].
    pub fn set_feedback_gain(&mut self, gain: f32) {
        self.b1 = clip(gain, 0.0, MAX_FEEDBACK_GAIN);
        self.a0 = if self.normalized { 1.0 - self.b1 } else { 1.0 };
    }

    pub fn feedback_gain(&self) -> f32 {
        self.b1
    }

    /// Last output, which is also the filter state.
    pub fn state(&self) -> f32 {
        self.z1
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.z1 = flush_denormal(input * self.a0 + self.z1 * self.b1);
        self.z1
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
    }
}

/// Feedback comb filter with a lowpass tap on its feedback path.
///
/// The output is the delayed signal, optionally phase inverted. The delayed
/// signal is damped and fed back into the line scaled by the comb gain, so
/// high frequencies lose more energy per pass than low ones.
#[derive(Clone, Debug)]
pub struct CombFilter {
    delay_line: DelayLine,
    delay_index: f32,
    comb_feedback_gain: f32,
    negate: bool,
    damping: OnePoleLowPass,
}

impl CombFilter {
    /// `capacity` bounds the longest usable delay to `capacity - 2` samples.
    pub fn new(capacity: usize, negate: bool) -> CombFilter {
        CombFilter {
            delay_line: DelayLine::new(capacity),
            delay_index: 0.0,
            comb_feedback_gain: 0.0,
            negate,
            damping: OnePoleLowPass::leaky(),
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mut yn = self.delay_line.read_interpolated(self.delay_index);
        if self.negate {
            yn = -yn;
        }
        let filtered = self.damping.process(yn);
        self.delay_line
            .write(flush_denormal(input + filtered * self.comb_feedback_gain));
        yn
    }

    pub fn max_delay_index(&self) -> f32 {
        (self.delay_line.len() - 2) as f32
    }

    /// Set the delay in samples, clamped to [0.0, max_delay_index()].
    pub fn set_delay_index(&mut self, delay_index: f32) {
        self.delay_index = clip(delay_index, 0.0, self.max_delay_index());
    }

    pub fn delay_index(&self) -> f32 {
        self.delay_index
    }

    /// Set the signed comb gain, clamped to [-MAX_FEEDBACK_GAIN, MAX_FEEDBACK_GAIN].
    pub fn set_comb_feedback_gain(&mut self, gain: f32) {
        self.comb_feedback_gain = clip(gain, -MAX_FEEDBACK_GAIN, MAX_FEEDBACK_GAIN);
    }

    pub fn comb_feedback_gain(&self) -> f32 {
        self.comb_feedback_gain
    }

    /// Set the damping gain, clamped to [0.0, MAX_FEEDBACK_GAIN].
    pub fn set_lpf_feedback_gain(&mut self, gain: f32) {
        self.damping.set_feedback_gain(gain);
    }

    pub fn lpf_feedback_gain(&self) -> f32 {
        self.damping.feedback_gain()
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    pub fn clear(&mut self) {
        self.delay_line.clear();
        self.damping.reset();
    }
}

/// All-pass diffuser whose feedback path runs through another all-pass.
///
/// Each node reads its delay line at `delay + LFO_DEPTH * (lfo + 1) / 2`
/// samples, damps the result, and either writes the all-pass sum straight
/// back or routes it through its inner node first. Inner nodes run at a
/// quarter of the parent's delay and APF gain.
#[derive(Clone, Debug)]
pub struct NestedAllPass {
    delay_line: DelayLine,
    delay_samples: f32,
    apf_feedback_gain: f32,
    damping: OnePoleLowPass,
    lfo: Oscillator,
    inner: Option<Box<NestedAllPass>>,
}

impl NestedAllPass {
    /// Builds a chain of `nesting_depth + 1` nodes. The outermost node can hold
    /// `max_delay` samples plus modulation, each inner node a quarter of its parent.
    pub fn new(sample_rate: f32, max_delay: f32, nesting_depth: usize) -> NestedAllPass {
        let leaf_max_delay = (0..nesting_depth).fold(max_delay, |delay, _| delay / 4.0);
        let mut node = Self::node(sample_rate, leaf_max_delay, None);
        for depth in (0..nesting_depth).rev() {
            let node_max_delay = (0..depth).fold(max_delay, |delay, _| delay / 4.0);
            node = Self::node(sample_rate, node_max_delay, Some(Box::new(node)));
        }
        node
    }

    fn node(
        sample_rate: f32,
        max_delay: f32,
        inner: Option<Box<NestedAllPass>>,
    ) -> NestedAllPass {
        let capacity = max_delay.max(0.0) as usize + LFO_DEPTH as usize + 3;
        NestedAllPass {
            delay_line: DelayLine::new(capacity),
            delay_samples: 0.0,
            apf_feedback_gain: 0.0,
            damping: OnePoleLowPass::normalized(),
            lfo: Oscillator::new(WaveType::Triangle, sample_rate, DEFAULT_LFO_FREQUENCY),
            inner,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        // Unipolar LFO: only ever lengthens the delay
        let modulation = (self.lfo.process() + 1.0) * 0.5 * LFO_DEPTH;
        let delayed = self
            .damping
            .process(self.delay_line.read_interpolated(self.delay_samples + modulation));

        let w = input + self.apf_feedback_gain * delayed;
        let feedback = match self.inner.as_mut() {
            Some(inner) => inner.process(w),
            None => w,
        };
        self.delay_line.write(flush_denormal(feedback));

        delayed - self.apf_feedback_gain * w
    }

    /// Longest base delay this node accepts, leaving room for the LFO sweep.
    pub fn max_delay_samples(&self) -> f32 {
        (self.delay_line.len() - 2) as f32 - LFO_DEPTH
    }

    /// Set this node's delay; inner nodes get a quarter per level.
    pub fn set_delay_samples(&mut self, delay_samples: f32) {
        self.delay_samples = clip(delay_samples, 0.0, self.max_delay_samples());
        if let Some(inner) = self.inner.as_mut() {
            inner.set_delay_samples(delay_samples / 4.0);
        }
    }

    pub fn delay_samples(&self) -> f32 {
        self.delay_samples
    }

    /// Set this node's APF gain; inner nodes get a quarter per level.
    pub fn set_apf_feedback_gain(&mut self, gain: f32) {
        self.apf_feedback_gain = clip(gain, -MAX_FEEDBACK_GAIN, MAX_FEEDBACK_GAIN);
        if let Some(inner) = self.inner.as_mut() {
            inner.set_apf_feedback_gain(gain / 4.0);
        }
    }

    pub fn apf_feedback_gain(&self) -> f32 {
        self.apf_feedback_gain
    }

    /// Set the damping gain of this node and every inner node.
    pub fn set_lpf_feedback_gain(&mut self, gain: f32) {
        self.damping.set_feedback_gain(gain);
        if let Some(inner) = self.inner.as_mut() {
            inner.set_lpf_feedback_gain(gain);
        }
    }

    pub fn lpf_feedback_gain(&self) -> f32 {
        self.damping.feedback_gain()
    }

    /// Set the LFO rate in Hz of this node and every inner node.
    pub fn set_lfo_frequency(&mut self, frequency: f32) {
        self.lfo.set_freq(frequency);
        if let Some(inner) = self.inner.as_mut() {
            inner.set_lfo_frequency(frequency);
        }
    }

    pub fn lfo_frequency(&self) -> f32 {
        self.lfo.freq()
    }

    pub fn inner(&self) -> Option<&NestedAllPass> {
        self.inner.as_deref()
    }

    /// Number of nodes nested below this one.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self.inner();
        while let Some(inner) = node {
            depth += 1;
            node = inner.inner();
        }
        depth
    }

    /// Zeroes the delay lines and damping state of the whole chain.
    pub fn clear(&mut self) {
        self.delay_line.clear();
        self.damping.reset();
        if let Some(inner) = self.inner.as_mut() {
            inner.clear();
        }
    }
}
