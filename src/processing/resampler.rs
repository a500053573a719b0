//! 重采样模块
//!
//! 简单线性插值重采样，近似实现，不是带限（sinc/多相）重采样器。
//!
//! # 精度
//!
//! - 输出长度为 `floor(len / (src/dst))`
//! - 当插值位置到达倒数第二个样本之后即停止，尾部剩余位置保持0.0
//! - 对低于目标奈奎斯特频率的信号，插值误差随频率升高而增大；
//!   测试中以 1kHz 正弦 48k→16k 的最大绝对误差 < 0.01 作为验收界限

/// 线性插值重采样（单声道）
///
/// `src_rate == dst_rate` 时原样返回。任一采样率为0时返回空缓冲。
pub fn resample_linear(samples: Vec<f32>, src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if src_rate == dst_rate {
        return samples;
    }
    if src_rate == 0 || dst_rate == 0 || samples.is_empty() {
        return Vec::new();
    }

    let ratio = src_rate as f64 / dst_rate as f64;
    let mut resampled = vec![0.0f32; expected_len(samples.len(), src_rate, dst_rate)];

    for (i, out) in resampled.iter_mut().enumerate() {
        let pos = i as f64 * ratio;
        let idx = pos as usize;
        if idx + 1 >= samples.len() {
            break;
        }
        let frac = (pos - idx as f64) as f32;
        *out = samples[idx] * (1.0 - frac) + samples[idx + 1] * frac;
    }

    resampled
}

/// 重采样后的期望长度 `floor(len × dst / src)`
///
/// 先乘后除，整数倍关系下不受 `src/dst` 浮点舍入影响。
#[inline]
pub fn expected_len(input_len: usize, src_rate: u32, dst_rate: u32) -> usize {
    if src_rate == dst_rate {
        return input_len;
    }
    if src_rate == 0 || dst_rate == 0 {
        return 0;
    }
    (input_len as f64 * dst_rate as f64 / src_rate as f64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_identity_is_noop() {
        let samples = sine(440.0, 16000, 1000);
        assert_eq!(resample_linear(samples.clone(), 16000, 16000), samples);
    }

    #[test]
    fn test_output_length_within_one_sample() {
        let cases = [(48000, 16000), (44100, 16000), (8000, 16000), (22050, 16000), (16000, 44100)];
        for (src, dst) in cases {
            let input = vec![0.0f32; 12345];
            let out = resample_linear(input, src, dst);
            let ideal = 12345.0 * dst as f64 / src as f64;
            assert!(
                (out.len() as f64 - ideal).abs() <= 1.0,
                "{src}->{dst}: {} vs {ideal}",
                out.len()
            );
            assert_eq!(out.len(), expected_len(12345, src, dst));
        }
    }

    #[test]
    fn test_exact_ratio_length_has_no_rounding_loss() {
        // 2秒44.1kHz → 恰好32000个16kHz样本
        let out = resample_linear(vec![0.0f32; 88200], 44100, 16000);
        assert_eq!(out.len(), 32000);
        let out = resample_linear(vec![0.0f32; 48000], 48000, 16000);
        assert_eq!(out.len(), 16000);
    }

    #[test]
    fn test_downsample_sine_error_bound() {
        let input = sine(1000.0, 48000, 48000);
        let out = resample_linear(input, 48000, 16000);
        let reference = sine(1000.0, 16000, out.len());
        // 最后一个位置可能因边界截断保持为0，跳过
        let max_err = out[..out.len() - 1]
            .iter()
            .zip(&reference)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_err < 0.01, "最大误差 {max_err}");
    }

    #[test]
    fn test_upsample_interpolates_midpoints() {
        let out = resample_linear(vec![0.0, 1.0, 0.0, -1.0], 1, 2);
        assert_eq!(out.len(), 8);
        assert_eq!(&out[..6], &[0.0, 0.5, 1.0, 0.5, 0.0, -0.5]);
        // 越过倒数第二个样本后停止，尾部保持0
        assert_eq!(&out[6..], &[0.0, 0.0]);
    }

    #[test]
    fn test_stays_in_normalized_range() {
        let input: Vec<f32> = (0..1000).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let out = resample_linear(input, 44100, 16000);
        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_degenerate_rates() {
        assert!(resample_linear(vec![0.5; 10], 0, 16000).is_empty());
        assert!(resample_linear(Vec::new(), 48000, 16000).is_empty());
    }
}
