//! 样本转换模块
//!
//! 把symphonia/songbird解码输出的各种样本类型统一转换为交错f32，
//! 并提供整数PCM到归一化浮点的缩放工具。

use symphonia::core::audio::{AudioBufferRef, SampleBuffer};

/// 16位PCM的固定缩放系数 (1/32768)
pub const I16_SCALE: f32 = 1.0 / 32768.0;

/// 按位深计算整数样本缩放系数 `1 / 2^(bits-1)`
#[inline]
pub fn int_scale(bits_per_sample: u32) -> f32 {
    let bits = bits_per_sample.clamp(1, 32);
    (1.0f64 / (1u64 << (bits - 1)) as f64) as f32
}

/// 限制到归一化区间 [-1.0, 1.0]
///
/// 负满量程 `-2^(bits-1)` 缩放后恰为-1.0，正向最大值略小于1.0；
/// 浮点解码器（Vorbis/Opus/MP3）偶有轻微过冲，这里统一截断。
#[inline]
pub fn clamp_normalized(sample: f32) -> f32 {
    if sample.is_nan() {
        0.0
    } else {
        sample.clamp(-1.0, 1.0)
    }
}

/// 🚀 样本转换器
///
/// 复用内部的 `SampleBuffer`，避免每个解码包都重新分配。
#[derive(Default)]
pub struct SampleConverter {
    buffer: Option<SampleBuffer<f32>>,
}

impl SampleConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 转换解码缓冲为交错f32并追加到 `output`，返回本次追加的帧数
    pub fn append_interleaved(&mut self, decoded: AudioBufferRef<'_>, output: &mut Vec<f32>) -> usize {
        let frames = decoded.frames();
        if frames == 0 {
            return 0;
        }

        let spec = *decoded.spec();
        let needed = decoded.capacity() * spec.channels.count();
        let reuse = self
            .buffer
            .as_ref()
            .is_some_and(|buf| buf.capacity() >= needed);
        if !reuse {
            self.buffer = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(buf) = self.buffer.as_mut() {
            buf.copy_interleaved_ref(decoded);
            output.reserve(buf.samples().len());
            output.extend(buf.samples().iter().copied().map(clamp_normalized));
        }

        frames
    }
}
