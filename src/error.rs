//! 统一错误处理框架
//!
//! 音频接入管线的核心错误类型定义。所有错误对当前请求都是终止性的，
//! 管线内部不做重试；唯一的局部恢复点是Opus逐帧解码（见 `audio::opus`）。

use std::fmt;
use std::io;

/// 音频接入相关的统一错误类型
#[derive(Debug)]
pub enum AudioError {
    /// 输入验证错误（配置、文件大小/时长上限）
    InvalidInput(String),

    /// 文件I/O错误
    IoError(io::Error),

    /// 扩展名或探测到的编解码器没有对应的处理器
    UnsupportedFormat(String),

    /// OGG页头结构校验失败（捕获模式错误、段表或负载截断）
    MalformedContainer(String),

    /// OGG页结构合法，但未找到已知的编解码器签名
    UnknownCodec(String),

    /// 编解码器相关的解码失败（RIFF头无效、Vorbis/FLAC流损坏等）
    DecodingError(String),

    /// Opus容器解析成功，但没有任何音频帧解码成功
    NoFramesDecoded(String),

    /// 明确未实现的能力（AAC样本转换）
    NotImplemented(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::InvalidInput(msg) => write!(f, "输入验证失败: {msg}"),
            AudioError::IoError(err) => write!(f, "文件I/O错误: {err}"),
            AudioError::UnsupportedFormat(msg) => write!(f, "不支持的音频格式: {msg}"),
            AudioError::MalformedContainer(msg) => write!(f, "容器结构损坏: {msg}"),
            AudioError::UnknownCodec(msg) => write!(f, "未知的编解码器: {msg}"),
            AudioError::DecodingError(msg) => write!(f, "音频解码失败: {msg}"),
            AudioError::NoFramesDecoded(msg) => write!(f, "未解码出任何音频帧: {msg}"),
            AudioError::NotImplemented(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for AudioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AudioError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AudioError {
    fn from(err: io::Error) -> Self {
        AudioError::IoError(err)
    }
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => AudioError::IoError(e),
            other => AudioError::DecodingError(format!("WAV解码错误: {other}")),
        }
    }
}

impl From<claxon::Error> for AudioError {
    fn from(err: claxon::Error) -> Self {
        match err {
            claxon::Error::IoError(e) => AudioError::IoError(e),
            other => AudioError::DecodingError(format!("FLAC解码错误: {other}")),
        }
    }
}

/// 音频处理操作的标准Result类型
pub type AudioResult<T> = Result<T, AudioError>;

// ==================== 错误转换Helper函数 ====================
// 消除重复的 .map_err(|e| AudioError::XXX(format!(...))) 模式

/// 创建解码错误的helper函数
#[inline]
pub fn decoding_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::DecodingError(format!("{context}: {err}"))
}

// ==================== 错误分类系统 ====================
// 用于CLI退出码映射和错误建议

/// 错误类别枚举
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum ErrorCategory {
    /// 格式相关错误（不支持的格式、容器损坏、未知编解码器、未实现能力）
    Format,
    /// 解码相关错误（解码器失败、没有可用音频帧）
    Decoding,
    /// 输入校验错误（配置非法、超出大小/时长上限）
    Input,
    /// I/O相关错误（文件不存在、权限不足等）
    Io,
}

impl ErrorCategory {
    /// 从AudioError提取错误类别
    pub fn from_audio_error(e: &AudioError) -> Self {
        match e {
            AudioError::UnsupportedFormat(_)
            | AudioError::MalformedContainer(_)
            | AudioError::UnknownCodec(_)
            | AudioError::NotImplemented(_) => Self::Format,
            AudioError::DecodingError(_) | AudioError::NoFramesDecoded(_) => Self::Decoding,
            AudioError::InvalidInput(_) => Self::Input,
            AudioError::IoError(_) => Self::Io,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Format => "格式错误",
            Self::Decoding => "解码错误",
            Self::Input => "输入错误",
            Self::Io => "I/O错误",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let cases = [
            (AudioError::UnsupportedFormat("x".into()), ErrorCategory::Format),
            (AudioError::MalformedContainer("x".into()), ErrorCategory::Format),
            (AudioError::UnknownCodec("x".into()), ErrorCategory::Format),
            (AudioError::NotImplemented("x".into()), ErrorCategory::Format),
            (AudioError::DecodingError("x".into()), ErrorCategory::Decoding),
            (AudioError::NoFramesDecoded("x".into()), ErrorCategory::Decoding),
            (AudioError::InvalidInput("x".into()), ErrorCategory::Input),
        ];
        for (err, expected) in cases {
            assert_eq!(ErrorCategory::from_audio_error(&err), expected, "{err}");
        }
    }

    #[test]
    fn test_not_implemented_message_is_verbatim() {
        let err = AudioError::NotImplemented("AAC audio decoding is not fully implemented".into());
        assert_eq!(err.to_string(), "AAC audio decoding is not fully implemented");
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error;
        let err = AudioError::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(err.source().is_some());
        assert_eq!(ErrorCategory::from_audio_error(&err), ErrorCategory::Io);
    }
}
