//! Schroeder/Moorer reverb: a bank of parallel damped combs between two
//! serial chains of nested all-pass diffusers.
//!
//! ```text
//! in -> [APF]..[APF] -+-> comb 0 --+-> / N -> [APF]..[APF] -> out
//!                     +-> comb 1 --+
//!                     +-> ...    --+
//! ```
//!
//! Parameters are derived in a fixed order: `time` places every delay,
//! `regen` sets the comb damping, the room sets the feedback gains from its
//! RT60 and the delays already placed, and `damping` sets the all-pass
//! lowpasses. [`Reverb::set_params`] always runs that order.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::min;
use core::f32::consts::FRAC_PI_4;
use log::{debug, trace, warn};
use micromath::F32Ext;
use ordered_float::OrderedFloat;

use crate::clip;
use crate::effect::Effect;
use crate::error::ReverbError;
use crate::filter::{CombFilter, NestedAllPass};
use crate::room::{CustomRoom, RoomType};

pub const DEFAULT_NUM_BEFORE_APF: usize = 2;
pub const DEFAULT_NUM_COMB_UNITS: usize = 20;
pub const DEFAULT_NUM_AFTER_APF: usize = 2;
pub const DEFAULT_NESTING_DEPTH: usize = 2;
/// Longest `time` a default reverb can hold, in seconds.
pub const DEFAULT_MAX_TIME: f32 = 1.0;

pub const MAX_REGEN: f32 = 0.999;
pub const MAX_DAMPING: f32 = 0.97;
pub const MAX_COMB_GAIN: f32 = 0.75;

/// Ratio between the longest and shortest delay of a bank.
pub const DELAY_SPREAD: f32 = 1.5;

/// All-pass delays are seeded from a third of the comb maximum.
const APF_DELAY_DIVISOR: f32 = 3.0;

/// Construction-time shape of a [`Reverb`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReverbConfig {
    pub sample_rate: f32,
    pub num_before_apf: usize,
    pub num_comb_units: usize,
    pub num_after_apf: usize,
    pub nesting_depth: usize,
    /// Upper bound for `time` in seconds; sizes every delay line.
    pub max_time: f32,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            num_before_apf: DEFAULT_NUM_BEFORE_APF,
            num_comb_units: DEFAULT_NUM_COMB_UNITS,
            num_after_apf: DEFAULT_NUM_AFTER_APF,
            nesting_depth: DEFAULT_NESTING_DEPTH,
            max_time: DEFAULT_MAX_TIME,
        }
    }
}

/// User-facing parameter set, as last applied (after clamping).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReverbParams {
    /// Longest comb delay in seconds.
    pub time: f32,
    /// [0, 1): share of leftover comb gain spent on damping.
    pub regen: f32,
    /// [0, 1): all-pass lowpass feedback.
    pub damping: f32,
    /// Side or radius of the room, in the same unit for every shape.
    pub room_length: f32,
    /// [0, 1]: 0 reflects everything, 1 absorbs everything.
    pub absorption: f32,
    pub room_type: RoomType,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            time: 0.0,
            regen: 0.0,
            damping: 0.0,
            room_length: 1.0,
            absorption: 0.75,
            room_type: RoomType::Sphere,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Reverb {
    sample_rate: f32,
    max_time: f32,
    enabled: bool,
    params: ReverbParams,
    rt60: f32,
    comb_filters: Box<[CombFilter]>,
    before_apfs: Box<[NestedAllPass]>,
    after_apfs: Box<[NestedAllPass]>,
}

impl Reverb {
    /// Default topology: 2 all-passes before, 20 combs, 2 all-passes after, nesting depth 2.
    pub fn new(sample_rate: f32) -> Result<Reverb, ReverbError> {
        Self::from_config(&ReverbConfig {
            sample_rate,
            ..ReverbConfig::default()
        })
    }

    pub fn with_topology(
        sample_rate: f32,
        num_before_apf: usize,
        num_comb_units: usize,
        num_after_apf: usize,
        nesting_depth: usize,
    ) -> Result<Reverb, ReverbError> {
        Self::from_config(&ReverbConfig {
            sample_rate,
            num_before_apf,
            num_comb_units,
            num_after_apf,
            nesting_depth,
            max_time: DEFAULT_MAX_TIME,
        })
    }

    /// Allocates every delay line and all-pass node up front.
    pub fn from_config(config: &ReverbConfig) -> Result<Reverb, ReverbError> {
        let sample_rate = config.sample_rate;
        if !(sample_rate > 0.0 && sample_rate.is_finite()) {
            return Err(ReverbError::InvalidSampleRate(sample_rate));
        }
        if !(config.max_time > 0.0 && config.max_time.is_finite()) {
            return Err(ReverbError::InvalidMaxTime(config.max_time));
        }
        if config.num_comb_units == 0 {
            return Err(ReverbError::NoCombUnits);
        }

        let max_delay = sample_rate * config.max_time;
        let comb_capacity = max_delay as usize + 3;
        let apf_max_delay = max_delay / APF_DELAY_DIVISOR;

        // Odd units run phase inverted
        let comb_filters = (0..config.num_comb_units)
            .map(|i| CombFilter::new(comb_capacity, i % 2 == 1))
            .collect();
        let before_apfs = (0..config.num_before_apf)
            .map(|_| NestedAllPass::new(sample_rate, apf_max_delay, config.nesting_depth))
            .collect();
        let after_apfs = (0..config.num_after_apf)
            .map(|_| NestedAllPass::new(sample_rate, apf_max_delay, config.nesting_depth))
            .collect();

        debug!(
            "reverb at {} Hz: {} all-passes, {} combs, {} all-passes, nesting depth {}, up to {} s",
            sample_rate,
            config.num_before_apf,
            config.num_comb_units,
            config.num_after_apf,
            config.nesting_depth,
            config.max_time
        );

        Ok(Reverb {
            sample_rate,
            max_time: config.max_time,
            enabled: true,
            params: ReverbParams::default(),
            rt60: 0.0,
            comb_filters,
            before_apfs,
            after_apfs,
        })
    }

    /// Sets every parameter in dependency order: time, regen, room, damping.
    pub fn set_params(
        &mut self,
        time: f32,
        regen: f32,
        damping: f32,
        room_length: f32,
        absorption: f32,
        room_type: RoomType,
    ) {
        self.set_time(time);
        self.set_regen(regen);
        self.set_room(room_length, absorption, room_type);
        self.set_damping(damping);
    }

    /// [`Reverb::set_params`] with a caller-described room.
    pub fn set_params_custom(
        &mut self,
        time: f32,
        regen: f32,
        damping: f32,
        room: &dyn CustomRoom,
    ) {
        self.set_time(time);
        self.set_regen(regen);
        self.set_custom_room(room);
        self.set_damping(damping);
    }

    pub fn apply(&mut self, params: &ReverbParams) {
        self.set_params(
            params.time,
            params.regen,
            params.damping,
            params.room_length,
            params.absorption,
            params.room_type,
        );
    }

    /// Places the comb delays between `time` and `time / 1.5` seconds and the
    /// all-pass delays a third of that. Room gains must be recomputed afterwards.
    pub fn set_time(&mut self, time: f32) {
        let time = clamp_param("time", time, 0.0, self.max_time);
        self.params.time = time;

        let max_delay = self.sample_rate * time;
        let comb_delays = tangent_spread(max_delay, self.comb_filters.len());
        for (i, (comb, delay)) in self.comb_filters.iter_mut().zip(comb_delays).enumerate() {
            comb.set_delay_index(delay);
            trace!("comb {} delay {} samples", i, comb.delay_index());
        }

        let num_apfs = self.before_apfs.len() + self.after_apfs.len();
        let apf_delays = tangent_spread(max_delay / APF_DELAY_DIVISOR, num_apfs);
        for (i, (apf, delay)) in self
            .before_apfs
            .iter_mut()
            .chain(self.after_apfs.iter_mut())
            .zip(apf_delays)
            .enumerate()
        {
            apf.set_delay_samples(delay);
            trace!("all-pass {} delay {} samples", i, apf.delay_samples());
        }

        debug!("time {} s: longest comb delay {} samples", time, max_delay);
    }

    /// Comb damping is `regen * (1 - |comb gain|)`: the gain a comb has left
    /// over goes into its lowpass.
    pub fn set_regen(&mut self, regen: f32) {
        self.params.regen = clamp_param("regen", regen, 0.0, MAX_REGEN);
        self.apply_regen();
        debug!("regen {}", self.params.regen);
    }

    fn apply_regen(&mut self) {
        let regen = self.params.regen;
        for comb in self.comb_filters.iter_mut() {
            let gain = regen * (1.0 - comb.comb_feedback_gain().abs());
            comb.set_lpf_feedback_gain(gain);
        }
    }

    /// Sets the lowpass feedback of every all-pass node at every depth.
    pub fn set_damping(&mut self, damping: f32) {
        let damping = clamp_param("damping", damping, 0.0, MAX_DAMPING);
        self.params.damping = damping;
        for apf in self.before_apfs.iter_mut().chain(self.after_apfs.iter_mut()) {
            apf.set_lpf_feedback_gain(damping);
        }
        debug!("damping {}", damping);
    }

    /// Derives feedback gains from a preset room. Reads the delays placed by
    /// [`Reverb::set_time`].
    pub fn set_room(&mut self, length: f32, absorption: f32, room_type: RoomType) {
        let length = clamp_param("room length", length, 0.0, f32::INFINITY);
        let absorption = clamp_param("absorption", absorption, 0.0, 1.0);
        self.params.room_length = length;
        self.params.absorption = absorption;
        self.params.room_type = room_type;
        self.set_rt60(room_type.rt60(length, absorption));
    }

    /// Derives feedback gains from a room given by volume and surface area.
    /// [`Reverb::params`] keeps reporting the last preset room.
    pub fn set_custom_room(&mut self, room: &dyn CustomRoom) {
        self.set_rt60(room.rt60());
    }

    fn set_rt60(&mut self, rt60: f32) {
        self.rt60 = rt60;
        let sample_rate = self.sample_rate;

        for (i, comb) in self.comb_filters.iter_mut().enumerate() {
            let gain = min(
                OrderedFloat(decay_gain(comb.delay_index(), rt60, sample_rate)),
                OrderedFloat(MAX_COMB_GAIN),
            )
            .0;
            // Alternate phase between neighbouring combs
            comb.set_comb_feedback_gain(if i % 2 == 0 { gain } else { -gain });
            trace!("comb {} gain {}", i, comb.comb_feedback_gain());
        }

        for (i, apf) in self
            .before_apfs
            .iter_mut()
            .chain(self.after_apfs.iter_mut())
            .enumerate()
        {
            let gain = decay_gain(apf.delay_samples(), rt60, sample_rate) / 2.0;
            apf.set_apf_feedback_gain(-gain);
            trace!("all-pass {} gain {}", i, apf.apf_feedback_gain());
        }

        // Damping depends on the comb gains just replaced
        self.apply_regen();

        debug!("rt60 {} s", rt60);
    }

    /// Runs one sample through the whole network. A disabled reverb still
    /// advances every delay line but returns its input.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mut signal = input;
        for apf in self.before_apfs.iter_mut() {
            signal = apf.process(signal);
        }

        let mut sum = 0.0;
        for comb in self.comb_filters.iter_mut() {
            sum += comb.process(signal);
        }
        let mut out = sum / self.comb_filters.len() as f32;

        for apf in self.after_apfs.iter_mut() {
            out = apf.process(out);
        }

        if self.enabled {
            out
        } else {
            input
        }
    }

    /// Processes `buffer` in place.
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Silences every delay line and filter state; coefficients are kept.
    pub fn clear(&mut self) {
        self.comb_filters.iter_mut().for_each(CombFilter::clear);
        self.before_apfs.iter_mut().for_each(NestedAllPass::clear);
        self.after_apfs.iter_mut().for_each(NestedAllPass::clear);
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_time(&self) -> f32 {
        self.max_time
    }

    pub fn params(&self) -> ReverbParams {
        self.params
    }

    /// Decay time behind the current feedback gains, in seconds.
    pub fn rt60(&self) -> f32 {
        self.rt60
    }

    pub fn comb_filters(&self) -> &[CombFilter] {
        &self.comb_filters
    }

    pub fn before_apfs(&self) -> &[NestedAllPass] {
        &self.before_apfs
    }

    pub fn after_apfs(&self) -> &[NestedAllPass] {
        &self.after_apfs
    }

    /// Sets the modulation rate of every all-pass node.
    pub fn set_lfo_frequency(&mut self, frequency: f32) {
        for apf in self.before_apfs.iter_mut().chain(self.after_apfs.iter_mut()) {
            apf.set_lfo_frequency(frequency);
        }
        debug!("all-pass lfo {} Hz", frequency);
    }
}

impl Effect for Reverb {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn toggle(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn process(&mut self, input: f32) -> f32 {
        Reverb::process(self, input)
    }
}

/// Spreads `count` delays over `[max_delay / 1.5, max_delay]`.
///
/// The first entry is the maximum and the last the minimum. Entries in between
/// follow `max_delay * (tan(i * (pi/4) / (count - 1)) + 2) / 3`, which spaces
/// them more evenly than a sine ramp and keeps neighbouring ratios irregular.
pub fn tangent_spread(max_delay: f32, count: usize) -> Vec<f32> {
    let mut delays = vec![max_delay; count];
    if count > 1 {
        let division = FRAC_PI_4 / (count - 1) as f32;
        for (i, delay) in delays.iter_mut().enumerate().take(count - 1).skip(1) {
            *delay = max_delay * ((i as f32 * division).tan() + 2.0) / 3.0;
        }
        delays[count - 1] = max_delay / DELAY_SPREAD;
    }
    delays
}

/// Feedback gain that makes a loop of `delay_samples` decay 60 dB in `rt60` seconds:
/// `10^(-3 * delay / (rt60 * sample_rate))`.
pub fn decay_gain(delay_samples: f32, rt60: f32, sample_rate: f32) -> f32 {
    if !(rt60 > 0.0) {
        return 0.0;
    }
    if rt60.is_infinite() || delay_samples <= 0.0 {
        return 1.0;
    }
    let exponent = -3.0 * delay_samples / (rt60 * sample_rate);
    // below f32 resolution of any useful gain
    if exponent < -30.0 {
        return 0.0;
    }
    clip(10.0f32.powf(exponent), 0.0, 1.0)
}

fn clamp_param(name: &str, value: f32, low: f32, high: f32) -> f32 {
    let clamped = clip(value, low, high);
    if clamped != value {
        warn!("{} {} clamped to {}", name, value, clamped);
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::RoomDimensions;
    use rand::distributions::{Distribution, Uniform};

    const SAMPLE_RATE: f32 = 48_000.0;

    fn small_reverb() -> Reverb {
        Reverb::from_config(&ReverbConfig {
            sample_rate: SAMPLE_RATE,
            max_time: 0.1,
            ..ReverbConfig::default()
        })
        .unwrap()
    }

    fn assert_stable(reverb: &Reverb) {
        for comb in reverb.comb_filters() {
            assert!(comb.comb_feedback_gain().abs() < 1.0);
            assert!((0.0..1.0).contains(&comb.lpf_feedback_gain()));
        }
        for root in reverb.before_apfs().iter().chain(reverb.after_apfs()) {
            let mut node = Some(root);
            while let Some(apf) = node {
                assert!(apf.apf_feedback_gain().abs() < 1.0);
                assert!((0.0..1.0).contains(&apf.lpf_feedback_gain()));
                node = apf.inner();
            }
        }
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(
            Reverb::with_topology(SAMPLE_RATE, 2, 0, 2, 2).unwrap_err(),
            ReverbError::NoCombUnits
        );
        assert_eq!(
            Reverb::new(0.0).unwrap_err(),
            ReverbError::InvalidSampleRate(0.0)
        );
        assert!(matches!(
            Reverb::new(f32::NAN),
            Err(ReverbError::InvalidSampleRate(_))
        ));
        let config = ReverbConfig {
            max_time: -1.0,
            ..ReverbConfig::default()
        };
        assert_eq!(
            Reverb::from_config(&config).unwrap_err(),
            ReverbError::InvalidMaxTime(-1.0)
        );
    }

    #[test]
    fn test_topology() {
        let reverb = Reverb::with_topology(8_000.0, 3, 5, 1, 4).unwrap();
        assert_eq!(reverb.before_apfs().len(), 3);
        assert_eq!(reverb.comb_filters().len(), 5);
        assert_eq!(reverb.after_apfs().len(), 1);
        assert!(reverb
            .before_apfs()
            .iter()
            .chain(reverb.after_apfs())
            .all(|apf| apf.depth() == 4));
        let negated: Vec<bool> = reverb.comb_filters().iter().map(|c| c.is_negated()).collect();
        assert_eq!(negated, vec![false, true, false, true, false]);
        assert!(reverb.is_enabled());
    }

    #[test]
    fn test_tangent_spread() {
        let delays = tangent_spread(960.0, 20);
        assert_eq!(delays.len(), 20);
        assert_eq!(delays[0], 960.0);
        assert_eq!(delays[19], 640.0);
        // Interior entries rise from just above the minimum toward the maximum
        assert!(delays[1..19].windows(2).all(|w| w[0] < w[1]));
        assert!(delays[1] > 640.0 && delays[18] < 960.0);

        assert_eq!(tangent_spread(300.0, 1), vec![300.0]);
        assert_eq!(tangent_spread(300.0, 2), vec![300.0, 200.0]);
        assert!(tangent_spread(300.0, 0).is_empty());
    }

    #[test]
    fn test_decay_gain() {
        // one pass of an RT60-long loop loses exactly 60 dB
        assert!((decay_gain(SAMPLE_RATE, 1.0, SAMPLE_RATE) - 0.001).abs() < 1e-6);
        assert_eq!(decay_gain(100.0, 0.0, SAMPLE_RATE), 0.0);
        assert_eq!(decay_gain(100.0, f32::INFINITY, SAMPLE_RATE), 1.0);
        assert_eq!(decay_gain(100.0, f32::NAN, SAMPLE_RATE), 0.0);
        assert_eq!(decay_gain(1e9, 1e-6, SAMPLE_RATE), 0.0);
        let short = decay_gain(500.0, 0.5, SAMPLE_RATE);
        let long = decay_gain(500.0, 2.0, SAMPLE_RATE);
        assert!(short < long && long < 1.0);
    }

    #[test]
    fn test_set_time_places_delays() {
        let mut reverb = small_reverb();
        reverb.set_time(0.02);
        let delays: Vec<f32> = reverb.comb_filters().iter().map(|c| c.delay_index()).collect();
        let max_delay = SAMPLE_RATE * 0.02;
        assert_eq!(delays, tangent_spread(max_delay, 20));

        let apfs: Vec<f32> = reverb
            .before_apfs()
            .iter()
            .chain(reverb.after_apfs())
            .map(|apf| apf.delay_samples())
            .collect();
        assert_eq!(apfs, tangent_spread(max_delay / 3.0, 4));
        assert_eq!(
            reverb.before_apfs()[0].inner().unwrap().delay_samples(),
            apfs[0] / 4.0
        );
    }

    #[test]
    fn test_time_clamped_to_capacity() {
        let mut reverb = small_reverb();
        reverb.set_time(5.0);
        assert_eq!(reverb.params().time, 0.1);
        assert_eq!(reverb.comb_filters()[0].delay_index(), 4800.0);
        reverb.set_time(-1.0);
        assert_eq!(reverb.params().time, 0.0);
        assert!(reverb.comb_filters().iter().all(|c| c.delay_index() == 0.0));
    }

    #[test]
    fn test_room_gains() {
        let mut reverb = small_reverb();
        reverb.set_time(0.02);
        reverb.set_regen(0.5);
        reverb.set_room(3.0, 0.75, RoomType::Cube);
        let rt60 = 3.0 / (12.0 * 0.75);
        assert!((reverb.rt60() - rt60).abs() < 1e-6);

        for (i, comb) in reverb.comb_filters().iter().enumerate() {
            let expected = decay_gain(comb.delay_index(), rt60, SAMPLE_RATE).min(MAX_COMB_GAIN);
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            assert!((comb.comb_feedback_gain() - sign * expected).abs() < 1e-6);
            // damping follows the new comb gain
            let damping = 0.5 * (1.0 - expected);
            assert!((comb.lpf_feedback_gain() - damping).abs() < 1e-6);
        }
        for apf in reverb.before_apfs().iter().chain(reverb.after_apfs()) {
            let expected = decay_gain(apf.delay_samples(), rt60, SAMPLE_RATE) / 2.0;
            assert!((apf.apf_feedback_gain() + expected).abs() < 1e-6);
            assert!(apf.apf_feedback_gain() < 0.0);
        }
    }

    #[test]
    fn test_comb_gain_clamped() {
        let mut reverb = small_reverb();
        reverb.set_params(0.02, 0.6, 0.75, 100.0, 0.75, RoomType::Sphere);
        for comb in reverb.comb_filters() {
            assert_eq!(comb.comb_feedback_gain().abs(), MAX_COMB_GAIN);
            assert!((comb.lpf_feedback_gain() - 0.6 * (1.0 - MAX_COMB_GAIN)).abs() < 1e-6);
        }
        let params = reverb.params();
        assert_eq!(params.time, 0.02);
        assert_eq!(params.regen, 0.6);
        assert_eq!(params.damping, 0.75);
        assert_eq!(params.room_type, RoomType::Sphere);
    }

    #[test]
    fn test_regen_uses_current_comb_gain() {
        let mut reverb = small_reverb();
        reverb.set_time(0.02);
        reverb.set_room(1.0, 0.75, RoomType::Sphere);
        reverb.set_regen(0.8);
        for comb in reverb.comb_filters() {
            let expected = 0.8 * (1.0 - comb.comb_feedback_gain().abs());
            assert!((comb.lpf_feedback_gain() - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_damping_reaches_every_depth() {
        let mut reverb = small_reverb();
        reverb.set_damping(0.5);
        for root in reverb.before_apfs().iter().chain(reverb.after_apfs()) {
            assert_eq!(root.lpf_feedback_gain(), 0.5);
            assert_eq!(root.inner().unwrap().lpf_feedback_gain(), 0.5);
            assert_eq!(root.inner().unwrap().inner().unwrap().lpf_feedback_gain(), 0.5);
        }
        reverb.set_damping(1.0);
        assert_eq!(reverb.params().damping, MAX_DAMPING);
    }

    #[test]
    fn test_custom_room() {
        let mut reverb = small_reverb();
        let room = RoomDimensions {
            volume: 200.0,
            surface_area: 100.0,
            absorption: 0.5,
        };
        reverb.set_params_custom(0.03, 0.3, 0.2, &room);
        assert!((reverb.rt60() - 2.0).abs() < 1e-6);
        let expected = decay_gain(reverb.comb_filters()[0].delay_index(), 2.0, SAMPLE_RATE);
        assert!((reverb.comb_filters()[0].comb_feedback_gain() - expected.min(MAX_COMB_GAIN)).abs() < 1e-6);
    }

    #[test]
    fn test_parameter_sweep_is_stable() {
        let mut reverb = small_reverb();
        let rooms = [
            RoomType::Sphere,
            RoomType::Cube,
            RoomType::SquarePyramid,
            RoomType::Cylinder,
        ];
        let values = [-1.0, 0.0, 0.3, 0.97, 0.999, 1.0, 2.0, f32::NAN];
        for &room in rooms.iter() {
            for &regen in values.iter() {
                for &damping in values.iter() {
                    for &absorption in values.iter() {
                        for &length in [-5.0, 0.0, 1.0, 50.0, 1e6, f32::INFINITY].iter() {
                            reverb.set_params(0.05, regen, damping, length, absorption, room);
                            assert_stable(&reverb);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_output_bounded_under_noise() {
        let between = Uniform::new_inclusive(-1.0f32, 1.0);
        let mut rng = rand::thread_rng();
        let mut reverb = small_reverb();
        reverb.set_params(0.05, 0.9, 0.0, 1e6, 0.0, RoomType::Cube);

        let mut peak = 0.0f32;
        for _ in 0..(SAMPLE_RATE as usize) {
            let out = reverb.process(between.sample(&mut rng));
            assert!(out.is_finite());
            peak = peak.max(out.abs());
        }
        assert!(peak < 100.0, "peak {}", peak);
    }

    #[test]
    fn test_bypass_returns_input() {
        let mut reverb = small_reverb();
        reverb.set_params(0.02, 0.6, 0.5, 10.0, 0.5, RoomType::Sphere);
        reverb.disable();
        for n in 0..1000 {
            let x = ((n as f32) * 0.05).sin();
            assert_eq!(Effect::process(&mut reverb, x), x);
        }
    }

    #[test]
    fn test_block_matches_samples() {
        let mut a = small_reverb();
        a.set_params(0.02, 0.6, 0.5, 10.0, 0.5, RoomType::Cylinder);
        let mut b = a.clone();

        let mut block: Vec<f32> = (0..512).map(|n| if n == 0 { 1.0 } else { 0.0 }).collect();
        a.process_block(&mut block);
        let single: Vec<f32> = (0..512)
            .map(|n| b.process(if n == 0 { 1.0 } else { 0.0 }))
            .collect();
        assert_eq!(block, single);
    }

    #[test]
    fn test_clear_silences_tail() {
        let mut reverb = small_reverb();
        reverb.set_params(0.02, 0.6, 0.5, 10.0, 0.5, RoomType::Sphere);
        for _ in 0..2000 {
            reverb.process(1.0);
        }
        reverb.clear();
        assert!((0..2000).all(|_| reverb.process(0.0) == 0.0));
    }

    #[test]
    fn test_lfo_frequency_reaches_every_node() {
        let mut reverb = small_reverb();
        reverb.set_lfo_frequency(1.25);
        for root in reverb.before_apfs().iter().chain(reverb.after_apfs()) {
            assert_eq!(root.lfo_frequency(), 1.25);
            assert_eq!(root.inner().unwrap().inner().unwrap().lfo_frequency(), 1.25);
        }
    }
}
