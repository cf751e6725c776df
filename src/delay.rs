use alloc::boxed::Box;
use alloc::vec;
use micromath::F32Ext;

/// Smallest capacity that still leaves room for an interpolated read.
pub const MIN_CAPACITY: usize = 2;

/// Fixed capacity ring buffer. `read(0)` is the most recently written sample.
#[derive(Clone, Debug)]
pub struct DelayLine {
    inner: Box<[f32]>,
    index: usize,
}

impl DelayLine {
    /// Allocates a zero-filled line. Capacities below [`MIN_CAPACITY`] are raised to it.
    pub fn new(capacity: usize) -> DelayLine {
        let capacity = capacity.max(MIN_CAPACITY);
        DelayLine {
            inner: vec![0.0; capacity].into_boxed_slice(),
            index: 0,
        }
    }

    /// Reads the sample written `delay` writes ago, clamped to the oldest stored sample.
    #[inline]
    pub fn read(&self, delay: usize) -> f32 {
        let len = self.inner.len();
        let delay = delay.min(len - 1);
        self.inner[(self.index + len - delay) % len]
    }

    /// Linear interpolation between `read(floor(delay))` and `read(floor(delay) + 1)`.
    #[inline]
    pub fn read_interpolated(&self, delay: f32) -> f32 {
        // NaN and negative delays read the newest sample
        let oldest = (self.inner.len() - 1) as f32;
        let delay = if delay > 0.0 { delay.min(oldest) } else { 0.0 };
        let whole = delay.floor();
        let frac = delay - whole;
        let whole = whole as usize;

        let a = self.read(whole);
        if frac == 0.0 {
            return a;
        }
        let b = self.read(whole + 1);
        a + frac * (b - a)
    }

    #[inline]
    pub fn write(&mut self, input: f32) {
        self.index = (self.index + 1) % self.inner.len();
        self.inner[self.index] = input;
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Zeroes the history, keeping the capacity.
    pub fn clear(&mut self) {
        self.inner.iter_mut().for_each(|x| *x = 0.0);
        self.index = 0;
    }
}
