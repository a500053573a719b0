//! 声道下混模块
//!
//! 把任意声道数的交错样本降为单声道：每帧取各声道的算术平均。
//! 不做抖动、不做加权。

/// 交错多声道样本下混为单声道
///
/// - `channels <= 1` 时原样返回
/// - 尾部不足一帧的残余样本被丢弃
pub fn downmix_to_mono(samples: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples;
    }

    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}
