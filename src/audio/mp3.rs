//! MP3处理器
//!
//! 基于symphonia逐帧流式解码。声道策略：一律按立体声处理，
//! 单声道码流在解码时复制为左右两路，之后再统一下混。

use super::format::{AudioMetadata, Codec, ContainerFormat, DurationAccuracy};
use super::streaming::{StreamingDecoder, SymphoniaTrack};
use crate::error::{AudioError, AudioResult};
use crate::processing::normalize_interleaved;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use symphonia::core::codecs::CODEC_TYPE_MP3;

/// 假定的声道数（立体声策略）
pub const ASSUMED_CHANNELS: u16 = 2;

/// 假定的位深
pub const ASSUMED_BIT_DEPTH: u16 = 16;

/// 每帧解码字节数：2声道 × 2字节
pub const BYTES_PER_STEREO_FRAME: u64 = 4;

/// 流式读取块：4096字节的16位立体声PCM
pub const CHUNK_BYTES: usize = 4096;

const CHUNK_SAMPLES: usize = CHUNK_BYTES / 2;

fn open_track(file: &mut File) -> AudioResult<SymphoniaTrack> {
    file.seek(SeekFrom::Start(0))?;
    SymphoniaTrack::open(file.try_clone()?, "mp3", CODEC_TYPE_MP3)
}

/// 把任意声道数的交错样本整理成立体声
fn to_stereo(samples: Vec<f32>, channels: usize) -> Vec<f32> {
    match channels {
        2 => samples,
        1 => samples.iter().flat_map(|&s| [s, s]).collect(),
        _ => samples
            .chunks_exact(channels)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    }
}

/// 每声道帧数折算为按立体声16位解码字节计的时长
fn duration_from_frames(frames: u64, sample_rate: u32) -> f64 {
    let decoded_bytes = frames * BYTES_PER_STEREO_FRAME;
    decoded_bytes as f64 / (sample_rate as f64 * BYTES_PER_STEREO_FRAME as f64)
}

/// 提取MP3元数据
///
/// 时长 = 解码字节数 ÷ (采样率 × 4)，解码字节数按立体声16位计
/// （每帧4字节），因此等价于每声道帧数 ÷ 采样率。属估算值。
///
/// symphonia的 `n_frames` 与包 `dur` 都是每声道帧数，已不含声道因子，
/// 这里不能再乘声道数。
pub fn metadata(file: &mut File, file_size: u64) -> AudioResult<AudioMetadata> {
    let track = open_track(file)?;
    let sample_rate = track.sample_rate()?;
    let frames = track.count_frames()?;

    let duration = duration_from_frames(frames, sample_rate);

    tracing::debug!(sample_rate, frames, "MP3帧统计完成");

    Ok(AudioMetadata::new(
        ContainerFormat::Mp3,
        Codec::Mp3,
        sample_rate,
        ASSUMED_CHANNELS,
        ASSUMED_BIT_DEPTH,
        duration,
        DurationAccuracy::Estimated,
        file_size,
    ))
}

/// 解码MP3为单声道目标采样率样本
pub fn convert(file: &mut File, target_rate: u32) -> AudioResult<Vec<f32>> {
    let mut stream = open_track(file)?.into_stream(CHUNK_SAMPLES)?;
    let source_channels = stream.channels();
    let sample_rate = stream.sample_rate();

    let mut stereo = Vec::new();
    while let Some(chunk) = stream.next_chunk()? {
        stereo.extend(to_stereo(chunk, source_channels));
    }

    if stream.frames_decoded() == 0 {
        return Err(AudioError::DecodingError(format!(
            "MP3码流中没有可解码的帧（跳过 {} 个损坏包）",
            stream.skipped_packets()
        )));
    }

    Ok(normalize_interleaved(
        stereo,
        ASSUMED_CHANNELS as usize,
        sample_rate,
        target_rate,
    ))
}
