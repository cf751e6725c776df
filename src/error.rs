use thiserror::Error;

/// Construction-time rejections. Everything after construction clamps instead.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ReverbError {
    #[error("a reverb needs at least one comb filter")]
    NoCombUnits,

    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),

    #[error("maximum reverb time must be positive and finite, got {0}")]
    InvalidMaxTime(f32),
}
