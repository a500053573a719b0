//! AAC处理器（仅元数据）
//!
//! 解析首个ADTS帧头得到采样率、声道配置与profile。
//! 样本转换明确不支持，始终返回固定的 `NotImplemented` 错误。

use super::format::{AacProfile, AudioMetadata, Codec, ContainerFormat, DurationAccuracy};
use crate::error::{AudioError, AudioResult};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

/// 样本转换的固定诊断信息
pub const NOT_IMPLEMENTED_MESSAGE: &str =
    "AAC audio decoding is not fully implemented: only ADTS header parsing is available";

/// ADTS帧头长度（无CRC）
pub const ADTS_HEADER_LEN: usize = 7;

/// 每个原始数据块的样本数
pub const SAMPLES_PER_RAW_BLOCK: u32 = 1024;

/// 查找同步字的最大搜索窗口
const SYNC_SEARCH_WINDOW: u64 = 64 * 1024;

/// ADTS采样率索引表
const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// ADTS固定+可变帧头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeader {
    pub mpeg_version: u8,
    pub protection_absent: bool,
    pub profile: AacProfile,
    pub sample_rate: u32,
    pub channel_config: u8,
    pub frame_length: usize,
    pub raw_blocks: u8,
}

impl AdtsHeader {
    /// 解析7字节ADTS帧头
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let h = bytes.get(..ADTS_HEADER_LEN)?;

        if h[0] != 0xFF || h[1] & 0xF0 != 0xF0 {
            return None;
        }
        // layer 必须为0
        if h[1] & 0x06 != 0 {
            return None;
        }

        let sf_index = (h[2] >> 2) & 0x0F;
        let sample_rate = *SAMPLE_RATES.get(sf_index as usize)?;

        let protection_absent = h[1] & 0x01 != 0;
        let frame_length =
            (((h[3] & 0x03) as usize) << 11) | ((h[4] as usize) << 3) | ((h[5] as usize) >> 5);
        let min_len = if protection_absent {
            ADTS_HEADER_LEN
        } else {
            ADTS_HEADER_LEN + 2
        };
        if frame_length < min_len {
            return None;
        }

        Some(Self {
            mpeg_version: if h[1] & 0x08 != 0 { 2 } else { 4 },
            protection_absent,
            profile: AacProfile::from_adts_bits(h[2] >> 6),
            sample_rate,
            channel_config: ((h[2] & 0x01) << 2) | (h[3] >> 6),
            frame_length,
            raw_blocks: (h[6] & 0x03) + 1,
        })
    }

    /// 声道数（声道配置为0时按单声道处理）
    pub fn channels(&self) -> u16 {
        match self.channel_config {
            0 => 1,
            7 => 8,
            n => n as u16,
        }
    }

    /// 由首帧长度推算的比特率 (bps)
    pub fn bitrate_bps(&self) -> f64 {
        let samples = SAMPLES_PER_RAW_BLOCK as f64 * self.raw_blocks as f64;
        self.frame_length as f64 * 8.0 * self.sample_rate as f64 / samples
    }
}

/// ID3v2标签头长度
const ID3V2_HEADER_LEN: usize = 10;

/// ID3v2标签总长度（不存在时为0）
fn id3v2_len(bytes: &[u8]) -> usize {
    if bytes.len() < ID3V2_HEADER_LEN || &bytes[..3] != b"ID3" {
        return 0;
    }
    let size = bytes[6..10]
        .iter()
        .fold(0usize, |acc, &b| (acc << 7) | (b & 0x7F) as usize);
    let footer = if bytes[5] & 0x10 != 0 { 10 } else { 0 };
    ID3V2_HEADER_LEN + size + footer
}

/// 在缓冲区中查找首个有效ADTS帧，返回(偏移, 帧头)
///
/// 若后续字节足够容纳下一帧头，还要求下一帧同样能解析，以排除负载中的伪同步字。
pub fn find_first_frame(bytes: &[u8]) -> Option<(usize, AdtsHeader)> {
    let mut offset = 0;
    while offset + ADTS_HEADER_LEN <= bytes.len() {
        if let Some(header) = AdtsHeader::parse(&bytes[offset..]) {
            let next = offset + header.frame_length;
            let confirmed = match bytes.get(next..next + ADTS_HEADER_LEN) {
                Some(next_header) => AdtsHeader::parse(next_header).is_some(),
                None => true,
            };
            if confirmed {
                return Some((offset, header));
            }
        }
        offset += 1;
    }
    None
}

/// 定位并解析首个ADTS帧头
///
/// 单次 `read` 可能只返回部分字节，前缀与搜索窗口都读到满或EOF为止。
fn read_first_header<R: Read + Seek>(reader: &mut R) -> AudioResult<AdtsHeader> {
    reader.seek(SeekFrom::Start(0))?;
    let mut prefix = Vec::with_capacity(ID3V2_HEADER_LEN);
    (&mut *reader)
        .take(ID3V2_HEADER_LEN as u64)
        .read_to_end(&mut prefix)?;
    let skip = id3v2_len(&prefix) as u64;

    reader.seek(SeekFrom::Start(skip))?;
    let mut window = Vec::new();
    (&mut *reader)
        .take(SYNC_SEARCH_WINDOW)
        .read_to_end(&mut window)?;

    let (offset, header) = find_first_frame(&window).ok_or_else(|| {
        AudioError::DecodingError(format!(
            "前{}字节内未找到有效的ADTS帧头",
            skip + window.len() as u64
        ))
    })?;
    if offset > 0 {
        tracing::warn!(offset = skip + offset as u64, "ADTS同步字前存在无法识别的字节");
    }
    Ok(header)
}

/// 提取AAC元数据
///
/// 时长 = 文件字节 × 8 ÷ 首帧推算的比特率，属估算值。
pub fn metadata(file: &mut File, file_size: u64) -> AudioResult<AudioMetadata> {
    let header = read_first_header(file)?;
    let bitrate = header.bitrate_bps();
    let duration = if bitrate > 0.0 {
        file_size as f64 * 8.0 / bitrate
    } else {
        0.0
    };

    tracing::debug!(?header, bitrate, "ADTS帧头解析完成");

    Ok(AudioMetadata::new(
        ContainerFormat::Aac,
        Codec::Aac(header.profile),
        header.sample_rate,
        header.channels(),
        16,
        duration,
        DurationAccuracy::Estimated,
        file_size,
    )
    .with_bitrate_kbps(Some((bitrate / 1000.0).round() as u32)))
}

/// AAC样本转换：始终失败
pub fn convert(_file: &mut File, _target_rate: u32) -> AudioResult<Vec<f32>> {
    Err(AudioError::NotImplemented(NOT_IMPLEMENTED_MESSAGE.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 构造ADTS帧头：MPEG-4, 无CRC
    fn header(profile: u8, sf_index: u8, channel_config: u8, frame_length: usize) -> [u8; 7] {
        [
            0xFF,
            0xF1,
            (profile << 6) | (sf_index << 2) | (channel_config >> 2),
            ((channel_config & 0x03) << 6) | ((frame_length >> 11) as u8 & 0x03),
            (frame_length >> 3) as u8,
            (((frame_length & 0x07) as u8) << 5) | 0x1F,
            0xFC,
        ]
    }

    #[test]
    fn test_parse_lc_stereo_44100() {
        let h = AdtsHeader::parse(&header(1, 4, 2, 371)).unwrap();
        assert_eq!(h.profile, AacProfile::Lc);
        assert_eq!(h.sample_rate, 44100);
        assert_eq!(h.channels(), 2);
        assert_eq!(h.frame_length, 371);
        assert_eq!(h.raw_blocks, 1);
        assert_eq!(h.mpeg_version, 4);
        assert!(h.protection_absent);
        // 371 × 8 × 44100 / 1024 ≈ 127.8 kbps
        assert!((h.bitrate_bps() - 127_821.09).abs() < 1.0);
    }

    #[test]
    fn test_zero_channel_config_is_mono() {
        let h = AdtsHeader::parse(&header(1, 8, 0, 100)).unwrap();
        assert_eq!(h.channels(), 1);
        assert_eq!(h.sample_rate, 16000);
    }

    #[test]
    fn test_rejects_invalid_headers() {
        assert!(AdtsHeader::parse(&header(1, 13, 2, 100)).is_none());
        assert!(AdtsHeader::parse(&header(1, 4, 2, 3)).is_none());
        let mut bad_layer = header(1, 4, 2, 100);
        bad_layer[1] = 0xF3;
        assert!(AdtsHeader::parse(&bad_layer).is_none());
        assert!(AdtsHeader::parse(&[0xFF, 0xF1]).is_none());
    }

    #[test]
    fn test_find_frame_after_junk() {
        let mut bytes = vec![0x00, 0xFF, 0x12, 0x34];
        let frame = header(1, 3, 1, 20);
        bytes.extend_from_slice(&frame);
        bytes.extend_from_slice(&[0u8; 13]);
        bytes.extend_from_slice(&frame);

        let (offset, h) = find_first_frame(&bytes).unwrap();
        assert_eq!(offset, 4);
        assert_eq!(h.sample_rate, 48000);
        assert_eq!(h.channels(), 1);
    }

    /// 每次最多返回3字节的读取器
    struct TrickleReader(std::io::Cursor<Vec<u8>>);

    impl Read for TrickleReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = buf.len().min(3);
            self.0.read(&mut buf[..n])
        }
    }

    impl Seek for TrickleReader {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.0.seek(pos)
        }
    }

    #[test]
    fn test_short_reads_still_skip_large_id3_tag() {
        // 70000字节的ID3v2标签，超出同步字搜索窗口
        let mut bytes = vec![b'I', b'D', b'3', 4, 0, 0, 0, 4, 34, 112];
        bytes.resize(10 + 70_000, 0);
        let frame = header(1, 4, 2, 20);
        for _ in 0..3 {
            bytes.extend_from_slice(&frame);
            bytes.extend_from_slice(&[0u8; 13]);
        }

        let mut reader = TrickleReader(std::io::Cursor::new(bytes));
        let h = read_first_header(&mut reader).unwrap();
        assert_eq!(h.sample_rate, 44100);
        assert_eq!(h.channels(), 2);
        assert_eq!(h.frame_length, 20);
    }

    #[test]
    fn test_id3_length() {
        let tag = [b'I', b'D', b'3', 4, 0, 0, 0, 0, 0x01, 0x00];
        assert_eq!(id3v2_len(&tag), 10 + 128);
        assert_eq!(id3v2_len(b"\xFF\xF1"), 0);
    }
}
