//! OGG容器探测模块
//!
//! 从原始字节判断OGG容器承载的是Vorbis还是Opus，不信任文件扩展名。

use super::ogg;
use crate::error::{AudioError, AudioResult};
use std::fmt;
use std::io::Read;

/// Vorbis标识头中的编解码器名（字节1-6，字节0为包类型）
pub const VORBIS_SIGNATURE: &[u8; 6] = b"vorbis";

/// Opus标识头魔数
pub const OPUS_SIGNATURE: &[u8; 8] = b"OpusHead";

/// OGG容器内可识别的编解码器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OggCodec {
    Vorbis,
    Opus,
}

impl fmt::Display for OggCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vorbis => f.write_str("Vorbis"),
            Self::Opus => f.write_str("Opus"),
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// 对首页负载做两级分类
///
/// 1. 锚定位置：字节1-6为 `vorbis`，或前8字节内出现 `OpusHead`
/// 2. 全负载无锚定子串搜索（容忍不规范的编码器）
pub fn classify_first_page(payload: &[u8]) -> Option<OggCodec> {
    if payload.len() > VORBIS_SIGNATURE.len() && &payload[1..7] == VORBIS_SIGNATURE {
        return Some(OggCodec::Vorbis);
    }
    if payload.len() >= OPUS_SIGNATURE.len() && payload[..OPUS_SIGNATURE.len()] == OPUS_SIGNATURE[..]
    {
        return Some(OggCodec::Opus);
    }

    // 锚定检查失败，回退到整页搜索
    if contains(payload, VORBIS_SIGNATURE) {
        return Some(OggCodec::Vorbis);
    }
    if contains(payload, OPUS_SIGNATURE) {
        return Some(OggCodec::Opus);
    }

    None
}

/// 从字节缓冲区探测（缓冲区必须以OGG页开头）
pub fn probe_ogg_bytes(bytes: &[u8]) -> AudioResult<OggCodec> {
    let mut cursor = std::io::Cursor::new(bytes);
    probe_ogg_reader(&mut cursor)
}

/// 从读取器当前位置读取首页并分类
///
/// 会消耗读取器中的字节，调用方负责复位。
pub fn probe_ogg_reader<R: Read>(reader: &mut R) -> AudioResult<OggCodec> {
    let page = ogg::read_page(reader)?
        .ok_or_else(|| AudioError::MalformedContainer("空文件，没有OGG页".to_string()))?;

    match classify_first_page(&page.payload) {
        Some(codec) => {
            tracing::debug!(%codec, payload_len = page.payload.len(), "OGG首页编解码器探测完成");
            Ok(codec)
        }
        None => {
            let preview_len = page.payload.len().min(32);
            tracing::debug!(
                header = ?page.header,
                preview = ?&page.payload[..preview_len],
                "OGG首页未找到编解码器签名"
            );
            Err(AudioError::UnknownCodec(format!(
                "未知的OGG编解码器 (首页负载{}字节)",
                page.payload.len()
            )))
        }
    }
}
