use core::f32::consts::PI;
use micromath::F32Ext;

const TWO_PI: f32 = PI * 2.0;
const TWO_PI_RECIP: f32 = 1.0 / TWO_PI;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveType {
    Sine,
    Triangle,
}

/// Bipolar oscillator used as the delay modulation source.
///
/// Implemented based on code from
/// https://github.com/electro-smith/DaisySP/blob/master/Source/Synthesis/oscillator.h
#[derive(Clone, Debug)]
pub struct Oscillator {
    wave_type: WaveType,
    sample_rate: f32,
    amplitude: f32,
    frequency: f32,
    phase: f32,
    phase_inc: f32,
}

impl Oscillator {
    pub fn new(wave_type: WaveType, sample_rate: f32, frequency: f32) -> Self {
        let mut osc = Self {
            wave_type,
            sample_rate,
            amplitude: 1.0,
            frequency,
            phase: 0.0,
            phase_inc: 0.0,
        };
        osc.calc_phase_inc();
        osc
    }

    /// Returns one sample in [-amplitude, amplitude] and advances the phase.
    /// This should be called once per sample period.
    #[inline]
    pub fn process(&mut self) -> f32 {
        let out = match self.wave_type {
            WaveType::Sine => self.phase.sin(),
            WaveType::Triangle => {
                let t = (self.phase * TWO_PI_RECIP * 2.0) - 1.0;
                2.0 * (t.abs() - 0.5)
            }
        };
        self.phase += self.phase_inc;
        if self.phase >= TWO_PI {
            self.phase -= TWO_PI;
        }
        out * self.amplitude
    }

    fn calc_phase_inc(&mut self) {
        // Negative rates run the same waveform; the phase only ever moves forward.
        self.phase_inc = (TWO_PI * self.frequency / self.sample_rate).abs() % TWO_PI;
    }

    /// Set the frequency in Hz.
    pub fn set_freq(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.calc_phase_inc();
    }

    pub fn freq(&self) -> f32 {
        self.frequency
    }

    /// Set the amplitude.
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude;
    }

    /// Set the phase to value, clamped to 0.0-1.0.
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase.clamp(0.0, 1.0) * TWO_PI;
        if self.phase >= TWO_PI {
            self.phase -= TWO_PI;
        }
    }
}
