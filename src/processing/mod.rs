//! 样本处理模块
//!
//! 解码之后的样本级处理，严格按顺序执行：解码 → 下混 → 重采样。

pub mod channel_mixer;
pub mod resampler;
pub mod sample_conversion;

pub use channel_mixer::downmix_to_mono;
pub use resampler::resample_linear;
pub use sample_conversion::SampleConverter;

/// 解码后的交错样本统一后处理：下混为单声道，再重采样到目标采样率
pub fn normalize_interleaved(
    samples: Vec<f32>,
    channels: usize,
    src_rate: u32,
    dst_rate: u32,
) -> Vec<f32> {
    let mono = downmix_to_mono(samples, channels);
    resample_linear(mono, src_rate, dst_rate)
}
