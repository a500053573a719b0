//! FLAC处理器
//!
//! 基于claxon逐块解码。各声道子帧的整数样本在同一遍循环中
//! 直接求平均并缩放，不经过通用下混器。

use super::format::{AudioMetadata, Codec, ContainerFormat, DurationAccuracy};
use crate::error::{AudioError, AudioResult};
use crate::processing::resample_linear;
use crate::processing::sample_conversion::{clamp_normalized, int_scale};
use std::fs::File;
use std::io::{Seek, SeekFrom};

fn open_reader(file: &mut File) -> AudioResult<claxon::FlacReader<&mut File>> {
    file.seek(SeekFrom::Start(0))?;
    let reader = claxon::FlacReader::new(file)?;

    let info = reader.streaminfo();
    if info.sample_rate == 0 || info.channels == 0 {
        return Err(AudioError::DecodingError(format!(
            "无效的FLAC STREAMINFO: {}Hz, {}声道",
            info.sample_rate, info.channels
        )));
    }
    Ok(reader)
}

/// 遍历全部块统计每声道帧数（STREAMINFO未声明总样本数时使用）
fn count_frames(reader: &mut claxon::FlacReader<&mut File>) -> AudioResult<u64> {
    let mut frames = 0u64;
    let mut blocks = reader.blocks();
    let mut buffer = Vec::new();
    while let Some(block) = blocks.read_next_or_eof(buffer)? {
        frames += block.duration() as u64;
        buffer = block.into_buffer();
    }
    Ok(frames)
}

/// 提取FLAC元数据，时长 = 总样本数 ÷ 采样率（精确值）
pub fn metadata(file: &mut File, file_size: u64) -> AudioResult<AudioMetadata> {
    let mut reader = open_reader(file)?;
    let info = reader.streaminfo();

    let frames = match info.samples {
        Some(samples) if samples > 0 => samples,
        _ => {
            tracing::debug!("STREAMINFO未声明总样本数，逐块统计");
            count_frames(&mut reader)?
        }
    };

    Ok(AudioMetadata::new(
        ContainerFormat::Flac,
        Codec::Flac,
        info.sample_rate,
        info.channels as u16,
        info.bits_per_sample as u16,
        frames as f64 / info.sample_rate as f64,
        DurationAccuracy::Exact,
        file_size,
    ))
}

/// 解码FLAC为单声道目标采样率样本
///
/// 每个样本位置上对所有声道取平均，再乘以 `1 / 2^(bit_depth-1)`。
pub fn convert(file: &mut File, target_rate: u32) -> AudioResult<Vec<f32>> {
    let mut reader = open_reader(file)?;
    let info = reader.streaminfo();
    let scale = int_scale(info.bits_per_sample) as f64;

    // STREAMINFO的总样本数来自输入文件，不据此预分配
    let mut mono = Vec::new();
    let mut blocks = reader.blocks();
    let mut buffer = Vec::new();

    while let Some(block) = blocks.read_next_or_eof(buffer)? {
        let channels = block.channels();
        for i in 0..block.duration() {
            let sum: i64 = (0..channels).map(|ch| block.sample(ch, i) as i64).sum();
            let average = sum as f64 / channels as f64;
            mono.push(clamp_normalized((average * scale) as f32));
        }
        buffer = block.into_buffer();
    }

    if mono.is_empty() {
        return Err(AudioError::DecodingError("FLAC码流中没有音频帧".to_string()));
    }

    Ok(resample_linear(mono, info.sample_rate, target_rate))
}
