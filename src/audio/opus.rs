//! OGG/Opus处理器
//!
//! 手工解析OGG页并按lacing重组包，逐包交给songbird注册表中的libopus解码器。
//! 源采样率一律按48kHz处理，与容器中声明的原始输入采样率无关。
//!
//! 解码流程中的两个跳过步骤：
//! 1. 跳过首页（OpusHead标识头页），仅从中读取声道数与pre-skip
//! 2. 跳过其后的首个非空包（见 [`PRIMING_PACKETS`]）

use super::format::{AudioMetadata, Codec, ContainerFormat, DurationAccuracy};
use super::ogg::{self, PacketAssembler};
use super::probe::OPUS_SIGNATURE;
use crate::error::{AudioError, AudioResult};
use crate::processing::{SampleConverter, normalize_interleaved};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use symphonia::core::audio::{Channels, Layout};
use symphonia::core::codecs::{CODEC_TYPE_OPUS, CodecParameters, Decoder, DecoderOptions};
use symphonia::core::formats::Packet;

/// Opus解码输出采样率
pub const OPUS_SAMPLE_RATE: u32 = 48000;

/// 标准帧长：20ms @ 48kHz
pub const FRAME_SAMPLES: u64 = 960;

/// 元数据上报的位深
pub const REPORTED_BIT_DEPTH: u16 = 16;

/// 无granule可用时的时长估算：平均每个20ms帧约120字节
const ESTIMATED_BYTES_PER_FRAME: f64 = 120.0;

/// 首页之后额外跳过的包数量
///
/// 兼容性步骤而非协议要求：观察到的编码器在标识头页之后还会输出一个
/// 非音频包（标准流中即OpusTags注释头）。对把OpusTags与OpusHead放在
/// 同一页的非常规生产者，这一步会多丢掉一个20ms音频帧。
pub const PRIMING_PACKETS: usize = 1;

/// OpusHead标识头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpusHead {
    pub version: u8,
    pub channels: u8,
    pub pre_skip: u16,
    pub input_sample_rate: u32,
    pub mapping_family: u8,
}

impl OpusHead {
    const MIN_LEN: usize = 19;

    /// 解析OpusHead包，魔数或长度不符时返回None
    pub fn parse(packet: &[u8]) -> Option<Self> {
        if packet.len() < Self::MIN_LEN || !packet.starts_with(OPUS_SIGNATURE) {
            return None;
        }
        Some(Self {
            version: packet[8],
            channels: packet[9],
            pre_skip: u16::from_le_bytes([packet[10], packet[11]]),
            input_sample_rate: u32::from_le_bytes([packet[12], packet[13], packet[14], packet[15]]),
            mapping_family: packet[18],
        })
    }
}

/// Opus音频包读取器
///
/// 负责首页跳过、lacing重组、空包过滤与priming包跳过，只向外交付音频包。
pub struct OpusPacketReader<R: Read> {
    reader: R,
    assembler: PacketAssembler,
    queue: VecDeque<Vec<u8>>,
    head: Option<OpusHead>,
    serial: u32,
    priming_remaining: usize,
    finished: bool,
}

impl<R: Read> OpusPacketReader<R> {
    /// 读取并跳过首页
    pub fn new(mut reader: R) -> AudioResult<Self> {
        let first_page = ogg::read_page(&mut reader)?
            .ok_or_else(|| AudioError::MalformedContainer("空文件，没有OGG页".to_string()))?;

        let head = OpusHead::parse(&first_page.payload);
        match head {
            Some(head) => tracing::debug!(?head, "已跳过OpusHead页"),
            None => tracing::warn!("首页不是OpusHead，按立体声解码"),
        }

        Ok(Self {
            reader,
            assembler: PacketAssembler::new(),
            queue: VecDeque::new(),
            head,
            serial: first_page.header.serial_number,
            priming_remaining: PRIMING_PACKETS,
            finished: false,
        })
    }

    pub fn head(&self) -> Option<&OpusHead> {
        self.head.as_ref()
    }

    /// 下一个音频包，流结束时返回None
    pub fn next_packet(&mut self) -> AudioResult<Option<Vec<u8>>> {
        loop {
            while let Some(packet) = self.queue.pop_front() {
                if packet.is_empty() {
                    continue;
                }
                if self.priming_remaining > 0 {
                    self.priming_remaining -= 1;
                    tracing::debug!(bytes = packet.len(), "跳过priming包");
                    continue;
                }
                return Ok(Some(packet));
            }

            if self.finished {
                return Ok(None);
            }

            match ogg::read_page(&mut self.reader)? {
                Some(page) => {
                    // 多路复用流中只取首个逻辑流
                    if page.header.serial_number != self.serial {
                        continue;
                    }
                    self.queue.extend(self.assembler.push_page(&page)?);
                }
                None => {
                    if self.assembler.has_partial() {
                        tracing::warn!("流末尾存在未完成的OGG包，已丢弃");
                    }
                    self.finished = true;
                }
            }
        }
    }
}

/// 从songbird编解码器注册表创建libopus解码器
fn make_decoder(channels: usize) -> AudioResult<Box<dyn Decoder>> {
    let (layout, channel_mask) = if channels == 1 {
        (Layout::Mono, Channels::FRONT_LEFT)
    } else {
        (Layout::Stereo, Channels::FRONT_LEFT | Channels::FRONT_RIGHT)
    };

    // 解码器按 `channels` 决定单/立体声输出
    let mut params = CodecParameters::new();
    params
        .for_codec(CODEC_TYPE_OPUS)
        .with_sample_rate(OPUS_SAMPLE_RATE)
        .with_channels(channel_mask)
        .with_channel_layout(layout);

    songbird::input::codecs::CODEC_REGISTRY
        .make(&params, &DecoderOptions::default())
        .map_err(|e| AudioError::DecodingError(format!("创建Opus解码器失败: {e}")))
}

/// 解码结果
#[derive(Debug, Clone, Default)]
pub struct DecodedOpus {
    /// 交错样本 (48kHz)
    pub samples: Vec<f32>,
    pub channels: usize,
    pub frames_decoded: usize,
    pub frames_skipped: usize,
}

/// 解码OGG/Opus流为交错48kHz样本
///
/// 单帧解码失败记录告警后跳过；一帧都没有解出时返回 `NoFramesDecoded`。
pub fn decode_stream<R: Read>(reader: R) -> AudioResult<DecodedOpus> {
    let mut packets = OpusPacketReader::new(reader)?;
    let channels = match packets.head().map(|h| h.channels) {
        Some(1) => 1,
        _ => 2,
    };

    let mut decoder = make_decoder(channels)?;
    let mut converter = SampleConverter::new();
    let mut decoded = DecodedOpus {
        channels,
        ..Default::default()
    };

    let mut ts = 0u64;
    let mut index = 0usize;
    while let Some(data) = packets.next_packet()? {
        let packet = Packet::new_from_slice(0, ts, FRAME_SAMPLES, &data);
        match decoder.decode(&packet) {
            Ok(audio_buf) => {
                let frames = converter.append_interleaved(audio_buf, &mut decoded.samples);
                ts += frames as u64;
                decoded.frames_decoded += 1;
            }
            Err(e) => {
                decoded.frames_skipped += 1;
                tracing::warn!(packet = index, bytes = data.len(), error = %e, "Opus帧解码失败，已跳过");
            }
        }
        index += 1;
    }

    if decoded.frames_decoded == 0 {
        return Err(AudioError::NoFramesDecoded(format!(
            "共{index}个音频包，全部解码失败或不存在"
        )));
    }

    tracing::debug!(
        frames = decoded.frames_decoded,
        skipped = decoded.frames_skipped,
        channels,
        "Opus解码完成"
    );
    Ok(decoded)
}

/// 解码OGG/Opus为单声道目标采样率样本
pub fn convert(file: &mut File, target_rate: u32) -> AudioResult<Vec<f32>> {
    file.seek(SeekFrom::Start(0))?;
    let decoded = decode_stream(BufReader::new(&mut *file))?;
    Ok(normalize_interleaved(
        decoded.samples,
        decoded.channels,
        OPUS_SAMPLE_RATE,
        target_rate,
    ))
}

/// 按文件大小估算时长（每20ms帧约120字节）
pub fn estimate_duration_from_size(file_size: u64) -> f64 {
    let frames = file_size as f64 / ESTIMATED_BYTES_PER_FRAME;
    frames * FRAME_SAMPLES as f64 / OPUS_SAMPLE_RATE as f64
}

/// 扫描所有页头，返回首个逻辑流的最后一个有效granule position
fn last_granule<R: Read + Seek>(reader: &mut R, serial: u32) -> AudioResult<Option<u64>> {
    let mut last = None;
    ogg::scan_page_headers(reader, |header| {
        if header.serial_number == serial
            && let Some(granule) = header.granule()
        {
            last = Some(granule);
        }
    })?;
    Ok(last)
}

/// 提取Opus元数据
///
/// 声道数与pre-skip取自OpusHead；时长 = (末页granule - pre_skip) ÷ 48000，
/// 找不到granule时退回文件大小估算。两种情况都标记为估算值。
pub fn metadata(file: &mut File, file_size: u64) -> AudioResult<AudioMetadata> {
    file.seek(SeekFrom::Start(0))?;
    let mut reader = BufReader::new(&mut *file);

    let first_page = ogg::read_page(&mut reader)?
        .ok_or_else(|| AudioError::MalformedContainer("空文件，没有OGG页".to_string()))?;
    let head = OpusHead::parse(&first_page.payload).ok_or_else(|| {
        AudioError::DecodingError("首页缺少有效的OpusHead标识头".to_string())
    })?;

    let granule = last_granule(&mut reader, first_page.header.serial_number)?;
    let duration = match granule {
        Some(g) if g > head.pre_skip as u64 => {
            (g - head.pre_skip as u64) as f64 / OPUS_SAMPLE_RATE as f64
        }
        _ => {
            tracing::debug!(file_size, "没有可用的granule position，按文件大小估算时长");
            estimate_duration_from_size(file_size)
        }
    };

    Ok(AudioMetadata::new(
        ContainerFormat::Opus,
        Codec::Opus,
        OPUS_SAMPLE_RATE,
        head.channels.max(1) as u16,
        REPORTED_BIT_DEPTH,
        duration,
        DurationAccuracy::Estimated,
        file_size,
    ))
}
