//! 音频元数据模块
//!
//! 定义每次接入请求返回给调用方的统一描述记录。
//! 容器与编解码器成对上报，保证OGG文件不会对Vorbis/Opus产生歧义。

use serde::{Serialize, Serializer};
use std::fmt;

/// 容器（外层封装）格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    Wav,
    Ogg,
    Mp3,
    Flac,
    Opus,
    Aac,
}

impl ContainerFormat {
    /// 对外展示的容器标签
    pub fn label(&self) -> &'static str {
        match self {
            Self::Wav => "WAV",
            Self::Ogg => "OGG",
            Self::Mp3 => "MP3",
            Self::Flac => "FLAC",
            Self::Opus => "OPUS",
            Self::Aac => "AAC",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ContainerFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// AAC配置文件（ADTS头中的2位profile字段）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AacProfile {
    Main,
    Lc,
    Ssr,
    Ltp,
}

impl AacProfile {
    /// 从ADTS profile字段（object type - 1）构造
    pub fn from_adts_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Main,
            1 => Self::Lc,
            2 => Self::Ssr,
            _ => Self::Ltp,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Main => "AAC Main",
            Self::Lc => "AAC LC",
            Self::Ssr => "AAC SSR",
            Self::Ltp => "AAC LTP",
        }
    }
}

/// 编解码器（总是比容器更具体）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Pcm,
    Vorbis,
    Opus,
    Mp3,
    Flac,
    Aac(AacProfile),
}

impl Codec {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pcm => "PCM",
            Self::Vorbis => "Vorbis",
            Self::Opus => "Opus",
            Self::Mp3 => "MP3",
            Self::Flac => "FLAC",
            Self::Aac(profile) => profile.label(),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Codec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// 时长的可信度
///
/// WAV/FLAC 由样本计数精确得出；MP3/Vorbis/Opus/AAC 为估算值。
/// 下游可能依赖估算语义，因此显式保留而不是统一。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationAccuracy {
    Exact,
    Estimated,
}

/// 音频元数据
///
/// 每次接入请求构造一次，不可变，直接返回给调用方。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioMetadata {
    pub container_format: ContainerFormat,
    pub codec: Codec,
    pub sample_rate_hz: u32,
    pub channel_count: u16,
    /// 源位深（报告值或假定值，如16）
    pub bit_depth: u16,
    pub duration_seconds: f64,
    pub duration_accuracy: DurationAccuracy,
    pub original_size_bytes: u64,
    /// 时长为0或未知时省略，避免除零
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_kbps: Option<u32>,
}

impl AudioMetadata {
    /// 创建元数据，比特率由文件大小与时长推导
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        container_format: ContainerFormat,
        codec: Codec,
        sample_rate_hz: u32,
        channel_count: u16,
        bit_depth: u16,
        duration_seconds: f64,
        duration_accuracy: DurationAccuracy,
        original_size_bytes: u64,
    ) -> Self {
        let duration_seconds = if duration_seconds.is_finite() && duration_seconds > 0.0 {
            duration_seconds
        } else {
            0.0
        };

        Self {
            container_format,
            codec,
            sample_rate_hz,
            channel_count,
            bit_depth,
            duration_seconds,
            duration_accuracy,
            original_size_bytes,
            bitrate_kbps: derive_bitrate_kbps(original_size_bytes, duration_seconds),
        }
    }

    /// 覆盖容器标签（分发器使用，防止子解码器用自己的默认值覆盖"OGG"）
    pub fn with_container(mut self, container_format: ContainerFormat) -> Self {
        self.container_format = container_format;
        self
    }

    /// 直接指定比特率（来自码流头声明的场景，如ADTS）
    pub fn with_bitrate_kbps(mut self, bitrate_kbps: Option<u32>) -> Self {
        if self.duration_seconds > 0.0 {
            self.bitrate_kbps = bitrate_kbps;
        }
        self
    }

    /// 时长是否为精确值
    pub fn is_exact_duration(&self) -> bool {
        self.duration_accuracy == DurationAccuracy::Exact
    }
}

/// 由文件大小与时长推导比特率（kbps），时长为0时返回None
pub fn derive_bitrate_kbps(size_bytes: u64, duration_seconds: f64) -> Option<u32> {
    if !(duration_seconds.is_finite() && duration_seconds > 0.0) {
        return None;
    }
    let kbps = (size_bytes as f64 * 8.0) / duration_seconds / 1000.0;
    Some(kbps.min(u32::MAX as f64) as u32)
}
