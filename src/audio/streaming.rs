//! 流式解码接口模块
//!
//! 基于symphonia的逐包解码器，按固定块大小向调用方交付交错f32样本。
//! 仅供MP3与Vorbis处理器使用（FLAC走claxon，Opus手工解析OGG页）。

use crate::error::{self, AudioError, AudioResult};
use crate::processing::SampleConverter;
use std::fs::File;
use symphonia::core::codecs::{CODEC_TYPE_NULL, CodecParameters, CodecType, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// 流式解码器trait
///
/// - **交错样本**：返回的音频数据均为交错格式 `[L0, R0, L1, R1, ...]`
/// - **定长块**：除最后一块外，每块恰好为构造时指定的样本数
/// - **EOF 语义**：返回 `None` 后再次调用继续返回 `None`
pub trait StreamingDecoder {
    /// 获取下一个音频块
    fn next_chunk(&mut self) -> AudioResult<Option<Vec<f32>>>;

    /// 交错流的声道数
    fn channels(&self) -> usize;

    /// 采样率 (Hz)
    fn sample_rate(&self) -> u32;

    /// 把剩余数据全部读出
    fn read_to_end(&mut self) -> AudioResult<Vec<f32>> {
        let mut samples = Vec::new();
        while let Some(chunk) = self.next_chunk()? {
            samples.extend_from_slice(&chunk);
        }
        Ok(samples)
    }
}

/// 已打开的symphonia音轨
pub struct SymphoniaTrack {
    format: Box<dyn FormatReader>,
    track_id: u32,
    codec_params: CodecParameters,
}

impl SymphoniaTrack {
    /// 从文件句柄打开音轨（调用方保证句柄位于流开头）
    ///
    /// `expected_codec` 用于拒绝容器中承载的其他编解码器，避免错误的处理器静默工作。
    pub fn open(file: File, extension: &str, expected_codec: CodecType) -> AudioResult<Self> {
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(extension);

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| error::decoding_error("格式探测失败", e))?;

        let format = probed.format;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::DecodingError("未找到音频轨道".to_string()))?;

        if track.codec_params.codec != expected_codec {
            return Err(error::decoding_error(
                "编解码器类型不匹配",
                format!(
                    "预期 {expected_codec:?}，但找到: {:?}",
                    track.codec_params.codec
                ),
            ));
        }

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        Ok(Self {
            format,
            track_id,
            codec_params,
        })
    }

    pub fn codec_params(&self) -> &CodecParameters {
        &self.codec_params
    }

    pub fn sample_rate(&self) -> AudioResult<u32> {
        self.codec_params
            .sample_rate
            .filter(|&rate| rate > 0)
            .ok_or_else(|| AudioError::DecodingError("无法获取采样率信息".to_string()))
    }

    pub fn channels(&self) -> AudioResult<usize> {
        self.codec_params
            .channels
            .map(|ch| ch.count())
            .filter(|&count| count > 0)
            .ok_or_else(|| AudioError::DecodingError("无法获取声道数信息".to_string()))
    }

    /// 不解码、仅遍历包头统计每声道帧数
    ///
    /// 容器已给出 `n_frames` 时直接使用。
    pub fn count_frames(mut self) -> AudioResult<u64> {
        if let Some(n_frames) = self.codec_params.n_frames {
            return Ok(n_frames);
        }

        let mut frames = 0u64;
        loop {
            match self.format.next_packet() {
                Ok(packet) => {
                    if packet.track_id() == self.track_id {
                        frames += packet.dur();
                    }
                }
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => continue,
                Err(e) => return Err(error::decoding_error("读取包失败", e)),
            }
        }
        Ok(frames)
    }

    /// 创建定长块的流式解码器
    pub fn into_stream(self, chunk_samples: usize) -> AudioResult<SymphoniaStream> {
        let decoder = symphonia::default::get_codecs()
            .make(&self.codec_params, &DecoderOptions::default())
            .map_err(|e| error::decoding_error("创建解码器失败", e))?;

        let sample_rate = self.sample_rate()?;
        let channels = self.channels()?;

        Ok(SymphoniaStream {
            track: self,
            decoder,
            converter: SampleConverter::new(),
            pending: Vec::new(),
            chunk_samples: chunk_samples.max(1),
            sample_rate,
            channels,
            frames_decoded: 0,
            skipped_packets: 0,
            is_finished: false,
        })
    }
}

/// 🎵 symphonia流式解码器
pub struct SymphoniaStream {
    track: SymphoniaTrack,
    decoder: Box<dyn Decoder>,
    converter: SampleConverter,
    pending: Vec<f32>,
    chunk_samples: usize,
    sample_rate: u32,
    channels: usize,
    frames_decoded: u64,
    skipped_packets: usize,
    is_finished: bool,
}

impl SymphoniaStream {
    /// 已解码的每声道帧数
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// 因解码错误被跳过的包数量
    pub fn skipped_packets(&self) -> usize {
        self.skipped_packets
    }

    /// 解码下一个包并追加到pending缓冲，EOF时返回false
    fn decode_next_packet(&mut self) -> AudioResult<bool> {
        let packet = match self.track.format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                self.decoder.reset();
                return Ok(true);
            }
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                return Ok(false);
            }
            Err(e) => return Err(error::decoding_error("读取包失败", e)),
        };

        if packet.track_id() != self.track.track_id {
            return Ok(true);
        }

        match self.decoder.decode(&packet) {
            Ok(audio_buf) => {
                let frames = self.converter.append_interleaved(audio_buf, &mut self.pending);
                self.frames_decoded += frames as u64;
            }
            Err(SymphoniaError::DecodeError(e)) => {
                self.skipped_packets += 1;
                tracing::warn!(ts = packet.ts(), error = e, "跳过无法解码的音频包");
            }
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                return Ok(false);
            }
            Err(e) => return Err(error::decoding_error("解码失败", e)),
        }

        Ok(true)
    }
}

impl StreamingDecoder for SymphoniaStream {
    fn next_chunk(&mut self) -> AudioResult<Option<Vec<f32>>> {
        while !self.is_finished && self.pending.len() < self.chunk_samples {
            if !self.decode_next_packet()? {
                self.is_finished = true;
            }
        }

        if self.pending.is_empty() {
            return Ok(None);
        }

        let take = self.chunk_samples.min(self.pending.len());
        let rest = self.pending.split_off(take);
        Ok(Some(std::mem::replace(&mut self.pending, rest)))
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
