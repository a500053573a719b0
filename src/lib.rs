//! Audio Ingest - 语音识别音频接入与归一化管线
//!
//! 接收任意受支持格式的音频文件，识别其真实容器与编解码器，提取元数据，
//! 并解码为单声道、目标采样率、[-1.0, 1.0] 范围内的浮点样本序列。
//!
//! ## 核心特性
//! - OGG容器负载探测（Vorbis / Opus），不信任扩展名
//! - WAV / MP3 / Vorbis / Opus / FLAC 解码，AAC仅元数据
//! - 声道平均下混 + 线性插值重采样
//! - 精确/估算时长显式区分

pub mod audio;
pub mod error;
pub mod pipeline;
pub mod processing;
pub mod tools;

// 重新导出核心类型
pub use audio::{
    AudioMetadata, Codec, ContainerFormat, DurationAccuracy, FormatHandler, HandlerSelection,
    OggCodec,
};
pub use error::{AudioError, AudioResult, ErrorCategory};
pub use pipeline::{IngestOutcome, IngestPipeline};
pub use tools::config::IngestConfig;
