//! 音频接入管线
//!
//! 单次请求的完整流程：大小检查 → 选择处理器（仅一次）→ 元数据 → 时长检查 → 样本转换。
//! 管线本身无可变状态，可在多个线程间共享；每次调用各自打开文件句柄，
//! 句柄在所有返回路径上随作用域关闭。

use crate::audio::{AudioMetadata, HandlerSelection, extension_of, resolve_handler};
use crate::error::{AudioError, AudioResult};
use crate::tools::config::IngestConfig;
use crate::tools::utils::extract_filename_lossy;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// 一次接入请求的结果
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub metadata: AudioMetadata,
    /// 单声道、目标采样率、[-1.0, 1.0] 范围内的样本
    #[serde(skip)]
    pub samples: Vec<f32>,
    pub target_sample_rate: u32,
}

impl IngestOutcome {
    /// 识别引擎实际看到的时长：样本数 ÷ 目标采样率
    pub fn sample_duration_seconds(&self) -> f64 {
        if self.target_sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.target_sample_rate as f64
    }

    /// 峰值绝对幅度
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

/// 已打开并完成分发的输入
struct OpenedInput {
    file: File,
    size: u64,
    selection: HandlerSelection,
}

/// 🎯 音频接入管线
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    config: IngestConfig,
}

impl IngestPipeline {
    /// 创建管线（配置非法时返回 `InvalidInput`）
    pub fn new(config: IngestConfig) -> AudioResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    fn open(&self, path: &Path) -> AudioResult<OpenedInput> {
        let mut file = File::open(path)?;
        let size = file.metadata()?.len();

        if let Some(limit) = self.config.max_file_size_bytes
            && size > limit
        {
            return Err(AudioError::InvalidInput(format!(
                "文件过大: {size} 字节，上限 {limit} 字节"
            )));
        }

        let extension = extension_of(path).unwrap_or_default();
        let selection = resolve_handler(&mut file, &extension)?;

        Ok(OpenedInput {
            file,
            size,
            selection,
        })
    }

    fn check_duration(&self, metadata: &AudioMetadata) -> AudioResult<()> {
        if let Some(limit) = self.config.max_duration_seconds
            && metadata.duration_seconds > limit
        {
            return Err(AudioError::InvalidInput(format!(
                "音频时长 {:.2}s 超出上限 {limit:.2}s",
                metadata.duration_seconds
            )));
        }
        Ok(())
    }

    fn read_metadata(input: &mut OpenedInput) -> AudioResult<AudioMetadata> {
        let metadata = input.selection.handler.metadata(&mut input.file, input.size)?;
        Ok(input.selection.label(metadata))
    }

    /// 仅提取元数据
    pub fn metadata(&self, path: &Path) -> AudioResult<AudioMetadata> {
        let _span = tracing::info_span!("metadata", file = %extract_filename_lossy(path)).entered();
        let mut input = self.open(path)?;
        let metadata = Self::read_metadata(&mut input)?;
        self.check_duration(&metadata)?;
        Ok(metadata)
    }

    /// 仅转换样本
    pub fn convert(&self, path: &Path) -> AudioResult<Vec<f32>> {
        let _span = tracing::info_span!("convert", file = %extract_filename_lossy(path)).entered();
        let mut input = self.open(path)?;
        input
            .selection
            .handler
            .convert(&mut input.file, self.config.target_sample_rate)
    }

    /// 完整接入：元数据与样本转换使用同一个处理器
    pub fn ingest(&self, path: &Path) -> AudioResult<IngestOutcome> {
        let _span = tracing::info_span!("ingest", file = %extract_filename_lossy(path)).entered();

        let mut input = self.open(path)?;
        let metadata = Self::read_metadata(&mut input)?;
        self.check_duration(&metadata)?;

        let samples = input
            .selection
            .handler
            .convert(&mut input.file, self.config.target_sample_rate)?;

        tracing::info!(
            handler = %input.selection.handler,
            container = %metadata.container_format,
            codec = %metadata.codec,
            samples = samples.len(),
            "接入完成"
        );

        Ok(IngestOutcome {
            metadata,
            samples,
            target_sample_rate: self.config.target_sample_rate,
        })
    }
}

impl Default for IngestPipeline {
    fn default() -> Self {
        Self {
            config: IngestConfig::default(),
        }
    }
}
