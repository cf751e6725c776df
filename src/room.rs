//! Room acoustics reduced to a single decay time.
//!
//! Decay follows the Sabine-style estimate `RT60 = V / (2 * SA * a)` where `V`
//! is the room volume, `SA` its surface area and `a` the mean absorption
//! coefficient of its surfaces (0 reflects everything, 1 absorbs everything).
//! The preset shapes collapse `V / SA` to a function of one length:
//!
//! | shape          | V            | SA                         | RT60              |
//! |----------------|--------------|----------------------------|-------------------|
//! | sphere         | 4/3 pi r^3   | 4 pi r^2                   | r / (6a)          |
//! | cube           | s^3          | 6 s^2                      | s / (12a)         |
//! | square pyramid | 1/3 s^2 h    | s^2 + 2s sqrt(s^2/4 + h^2) | s / (6(1+√5)a)    |
//! | cylinder       | 1/3 pi r^2 h | 2 pi r h + 2 pi r^2        | r / (8a)          |
//!
//! with `h = s` (or `h = r`).

use log::warn;
use micromath::F32Ext;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoomType {
    Sphere,
    Cube,
    SquarePyramid,
    Cylinder,
}

impl Default for RoomType {
    fn default() -> Self {
        RoomType::Sphere
    }
}

impl RoomType {
    /// Decay time for a room of this shape whose characteristic length is `length`.
    pub fn rt60(self, length: f32, absorption: f32) -> f32 {
        let length = non_negative("room length", length);
        let absorption = absorption_coefficient(absorption);
        let shape = match self {
            RoomType::Sphere => 6.0,
            RoomType::Cube => 12.0,
            RoomType::SquarePyramid => 6.0 * (1.0 + 5.0f32.sqrt()),
            RoomType::Cylinder => 8.0,
        };
        ratio(length, shape * absorption)
    }
}

/// A room described directly by its volume and surface area.
pub trait CustomRoom {
    fn volume(&self) -> f32;

    fn surface_area(&self) -> f32;

    fn absorption_coefficient(&self) -> f32;

    fn rt60(&self) -> f32 {
        rt60(
            self.volume(),
            self.surface_area(),
            self.absorption_coefficient(),
        )
    }
}

/// Plain-data [`CustomRoom`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoomDimensions {
    pub volume: f32,
    pub surface_area: f32,
    pub absorption: f32,
}

impl CustomRoom for RoomDimensions {
    fn volume(&self) -> f32 {
        self.volume
    }

    fn surface_area(&self) -> f32 {
        self.surface_area
    }

    fn absorption_coefficient(&self) -> f32 {
        self.absorption
    }
}

/// `V / (2 * SA * a)` with all inputs clamped to their physical ranges.
///
/// Zero absorption or surface area never decays (`f32::INFINITY`), an empty
/// room decays instantly (`0.0`).
pub fn rt60(volume: f32, surface_area: f32, absorption: f32) -> f32 {
    let volume = non_negative("room volume", volume);
    let surface_area = non_negative("room surface area", surface_area);
    let absorption = absorption_coefficient(absorption);
    ratio(volume, 2.0 * surface_area * absorption)
}

fn ratio(numerator: f32, denominator: f32) -> f32 {
    if numerator == 0.0 {
        0.0
    } else if denominator == 0.0 {
        f32::INFINITY
    } else {
        numerator / denominator
    }
}

fn non_negative(what: &str, value: f32) -> f32 {
    if value >= 0.0 {
        value
    } else {
        warn!("{} {} clamped to 0", what, value);
        0.0
    }
}

pub(crate) fn absorption_coefficient(absorption: f32) -> f32 {
    if (0.0..=1.0).contains(&absorption) {
        absorption
    } else {
        let clamped = if absorption > 1.0 { 1.0 } else { 0.0 };
        warn!("absorption coefficient {} clamped to {}", absorption, clamped);
        clamped
    }
}
