#![cfg_attr(not(test), no_std)]
#![allow(unused_imports)]
extern crate alloc;

use core::cmp::{max, min};
use micromath::F32Ext;
use ordered_float::OrderedFloat;

pub mod delay;
pub mod effect;
pub mod error;
pub mod filter;
pub mod reverb;
pub mod room;
pub mod synthesis;

pub use effect::Effect;
pub use error::ReverbError;
pub use reverb::{Reverb, ReverbConfig, ReverbParams};
pub use room::{CustomRoom, RoomDimensions, RoomType};

const DENORMAL_THRESHOLD: f32 = 1e-20;

/// Zeroes values small enough to fall into subnormal range inside a feedback loop.
#[inline]
pub(crate) fn flush_denormal(x: f32) -> f32 {
    if x.abs() < DENORMAL_THRESHOLD {
        0.0
    } else {
        x
    }
}

/// Clamps `value` into [low, high]; NaN maps to the bound nearest zero.
pub(crate) fn clip(value: f32, low: f32, high: f32) -> f32 {
    if value.is_nan() {
        return low.max(0.0).min(high);
    }
    max(min(OrderedFloat(value), OrderedFloat(high)), OrderedFloat(low)).0
}
