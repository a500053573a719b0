//! 格式处理器与分发器
//!
//! `FormatHandler` 是不携带状态的标签枚举，每个变体对应一个编解码器，
//! 提供元数据提取和样本转换两个能力。分发是从 (扩展名, 探测字节) 到
//! 变体的纯函数，同一文件的两次调用保证使用同一个变体。

use super::format::{AudioMetadata, ContainerFormat};
use super::probe::{self, OggCodec};
use super::{aac, flac, mp3, opus, vorbis, wav};
use crate::error::{AudioError, AudioResult};
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// 支持的文件扩展名（小写）
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "opus", "flac", "aac"];

/// 探测OGG首页时最多读取的字节数（页头 + 最大段表 + 最大负载）
pub const OGG_PROBE_BYTES: u64 = (27 + 255 + 255 * 255) as u64;

/// 编解码器处理器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatHandler {
    Wav,
    Mp3,
    Vorbis,
    Opus,
    Flac,
    Aac,
}

impl FormatHandler {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wav => "PCM-WAV",
            Self::Mp3 => "MP3",
            Self::Vorbis => "Vorbis",
            Self::Opus => "Opus",
            Self::Flac => "FLAC",
            Self::Aac => "AAC",
        }
    }

    /// 提取元数据（内部会把读取位置复位到开头）
    pub fn metadata(&self, file: &mut File, file_size: u64) -> AudioResult<AudioMetadata> {
        match self {
            Self::Wav => wav::metadata(file, file_size),
            Self::Mp3 => mp3::metadata(file, file_size),
            Self::Vorbis => vorbis::metadata(file, file_size),
            Self::Opus => opus::metadata(file, file_size),
            Self::Flac => flac::metadata(file, file_size),
            Self::Aac => aac::metadata(file, file_size),
        }
    }

    /// 解码为单声道目标采样率样本（内部会把读取位置复位到开头）
    pub fn convert(&self, file: &mut File, target_rate: u32) -> AudioResult<Vec<f32>> {
        match self {
            Self::Wav => wav::convert(file, target_rate),
            Self::Mp3 => mp3::convert(file, target_rate),
            Self::Vorbis => vorbis::convert(file, target_rate),
            Self::Opus => opus::convert(file, target_rate),
            Self::Flac => flac::convert(file, target_rate),
            Self::Aac => aac::convert(file, target_rate),
        }
    }
}

impl fmt::Display for FormatHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 分发结果：处理器 + 对外上报的容器标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerSelection {
    pub handler: FormatHandler,
    pub container: ContainerFormat,
}

impl HandlerSelection {
    fn new(handler: FormatHandler, container: ContainerFormat) -> Self {
        Self { handler, container }
    }

    /// 用分发器确定的容器标签覆盖子解码器的默认值
    pub fn label(&self, metadata: AudioMetadata) -> AudioMetadata {
        metadata.with_container(self.container)
    }
}

/// 提取小写扩展名
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// 扩展名是否受支持
pub fn is_supported_extension(extension: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
}

/// 扩展名是否需要探测负载才能确定编解码器
pub fn needs_probe(extension: &str) -> bool {
    extension.eq_ignore_ascii_case("ogg")
}

/// 🎯 纯函数分发：(扩展名, 探测字节) → 处理器
///
/// `sniffed` 仅在 `.ogg` 时使用，必须从文件开头读取；其余扩展名忽略该参数。
pub fn select_handler(extension: &str, sniffed: Option<&[u8]>) -> AudioResult<HandlerSelection> {
    let selection = match extension.to_ascii_lowercase().as_str() {
        "wav" => HandlerSelection::new(FormatHandler::Wav, ContainerFormat::Wav),
        "mp3" => HandlerSelection::new(FormatHandler::Mp3, ContainerFormat::Mp3),
        "flac" => HandlerSelection::new(FormatHandler::Flac, ContainerFormat::Flac),
        "aac" => HandlerSelection::new(FormatHandler::Aac, ContainerFormat::Aac),
        "opus" => HandlerSelection::new(FormatHandler::Opus, ContainerFormat::Ogg),
        "ogg" => {
            let bytes = sniffed.ok_or_else(|| {
                AudioError::InvalidInput("OGG文件需要提供首页字节用于探测".to_string())
            })?;
            let handler = match probe::probe_ogg_bytes(bytes)? {
                OggCodec::Vorbis => FormatHandler::Vorbis,
                OggCodec::Opus => FormatHandler::Opus,
            };
            HandlerSelection::new(handler, ContainerFormat::Ogg)
        }
        "" => {
            return Err(AudioError::UnsupportedFormat("文件缺少扩展名".to_string()));
        }
        other => {
            return Err(AudioError::UnsupportedFormat(format!(
                "不支持的文件扩展名: .{other}"
            )));
        }
    };

    tracing::debug!(extension, handler = %selection.handler, "已选择格式处理器");
    Ok(selection)
}

/// 为已打开的文件选择处理器
///
/// 需要探测时从开头读取至多一页OGG数据，返回前把读取位置复位到开头。
pub fn resolve_handler<R: Read + Seek>(
    reader: &mut R,
    extension: &str,
) -> AudioResult<HandlerSelection> {
    if !needs_probe(extension) {
        return select_handler(extension, None);
    }

    reader.seek(SeekFrom::Start(0))?;
    let mut sniffed = Vec::new();
    let read_result = reader.by_ref().take(OGG_PROBE_BYTES).read_to_end(&mut sniffed);
    reader.seek(SeekFrom::Start(0))?;
    read_result?;

    select_handler(extension, Some(sniffed.as_slice()))
}

/// 按路径选择处理器（自行打开文件，函数返回时关闭）
pub fn resolve_path(path: &Path) -> AudioResult<HandlerSelection> {
    let extension = extension_of(path).unwrap_or_default();
    if !needs_probe(&extension) {
        return select_handler(&extension, None);
    }
    let mut file = File::open(path)?;
    resolve_handler(&mut file, &extension)
}
