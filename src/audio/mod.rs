//! 音频格式模块
//!
//! 容器探测、逐编解码器的元数据提取与样本解码，以及统一的分发入口。
//!
//! **使用 [`handler::select_handler`] / [`handler::resolve_handler`]** 选择处理器，
//! 再在同一个 [`FormatHandler`] 上调用 `metadata` 与 `convert`。

pub mod format;
pub mod handler;
pub mod ogg;
pub mod probe;
pub mod streaming;

// 逐编解码器处理器（通过FormatHandler分发）
pub mod aac;
pub mod flac;
pub mod mp3;
pub mod opus;
pub mod vorbis;
pub mod wav;

pub use format::{AacProfile, AudioMetadata, Codec, ContainerFormat, DurationAccuracy};
pub use handler::{
    FormatHandler, HandlerSelection, SUPPORTED_EXTENSIONS, extension_of, is_supported_extension,
    resolve_handler, resolve_path, select_handler,
};
pub use probe::{OggCodec, classify_first_page, probe_ogg_bytes};
