//! OGG/Vorbis处理器
//!
//! 基于symphonia的OGG解复用与Vorbis解码，按16384样本的块流式读取。

use super::format::{AudioMetadata, Codec, ContainerFormat, DurationAccuracy};
use super::streaming::{StreamingDecoder, SymphoniaTrack};
use crate::error::{AudioError, AudioResult};
use crate::processing::normalize_interleaved;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use symphonia::core::codecs::CODEC_TYPE_VORBIS;

/// 流式读取块大小（样本数）
pub const CHUNK_SAMPLES: usize = 16384;

/// 时长估算时假定的每样本字节数
const ESTIMATE_BYTES_PER_SAMPLE: f64 = 2.0;

fn open_track(file: &mut File) -> AudioResult<SymphoniaTrack> {
    file.seek(SeekFrom::Start(0))?;
    SymphoniaTrack::open(file.try_clone()?, "ogg", CODEC_TYPE_VORBIS)
}

/// 由文件大小粗略估算时长：`文件字节 ÷ (采样率 × 声道数 × 2)`
///
/// 压缩码流的文件大小远小于等长PCM，此值明显偏短，仅作元数据展示。
pub fn estimate_duration(file_size: u64, sample_rate: u32, channels: u16) -> f64 {
    let denominator = sample_rate as f64 * channels as f64 * ESTIMATE_BYTES_PER_SAMPLE;
    if denominator > 0.0 {
        file_size as f64 / denominator
    } else {
        0.0
    }
}

/// 提取Vorbis元数据（采样率与声道数直接取自解码器参数）
pub fn metadata(file: &mut File, file_size: u64) -> AudioResult<AudioMetadata> {
    let track = open_track(file)?;
    let sample_rate = track.sample_rate()?;
    let channels = u16::try_from(track.channels()?)
        .map_err(|_| AudioError::DecodingError("Vorbis声道数超出范围".to_string()))?;
    let bit_depth = track
        .codec_params()
        .bits_per_sample
        .map_or(16, |bits| bits as u16);

    Ok(AudioMetadata::new(
        ContainerFormat::Ogg,
        Codec::Vorbis,
        sample_rate,
        channels,
        bit_depth,
        estimate_duration(file_size, sample_rate, channels),
        DurationAccuracy::Estimated,
        file_size,
    ))
}

/// 不超过 [`CHUNK_SAMPLES`] 且对齐到整帧的块大小
fn aligned_chunk(channels: usize) -> usize {
    let channels = channels.max(1);
    (CHUNK_SAMPLES / channels).max(1) * channels
}

/// 整条码流没有解码出任何帧时报错
fn ensure_frames_decoded(frames_decoded: u64, skipped_packets: usize) -> AudioResult<()> {
    if frames_decoded == 0 {
        return Err(AudioError::DecodingError(format!(
            "Vorbis码流中没有可解码的包（跳过 {skipped_packets} 个损坏包）"
        )));
    }
    Ok(())
}

/// 解码Vorbis为单声道目标采样率样本
pub fn convert(file: &mut File, target_rate: u32) -> AudioResult<Vec<f32>> {
    let track = open_track(file)?;
    let channels = track.channels()?;
    let mut stream = track.into_stream(aligned_chunk(channels))?;

    let samples = stream.read_to_end()?;
    ensure_frames_decoded(stream.frames_decoded(), stream.skipped_packets())?;

    tracing::debug!(
        channels,
        sample_rate = stream.sample_rate(),
        frames = stream.frames_decoded(),
        "Vorbis解码完成"
    );

    Ok(normalize_interleaved(
        samples,
        channels,
        stream.sample_rate(),
        target_rate,
    ))
}
