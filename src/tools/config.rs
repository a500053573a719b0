//! 接入配置模块
//!
//! `IngestConfig` 是管线使用的最终配置；`FileConfig` 对应可选的JSON配置文件，
//! 其 `audio` 段与服务端配置保持同样的字段名。命令行参数覆盖文件中的值。

use super::constants::{defaults, units};
use crate::error::{AudioError, AudioResult};
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// 管线配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// 目标采样率 (Hz)
    pub target_sample_rate: u32,
    /// 允许的最大文件大小（字节），None表示不限制
    pub max_file_size_bytes: Option<u64>,
    /// 允许的最大音频时长（秒），None表示不限制
    pub max_duration_seconds: Option<f64>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: defaults::TARGET_SAMPLE_RATE,
            max_file_size_bytes: None,
            max_duration_seconds: None,
        }
    }
}

impl IngestConfig {
    /// 校验配置
    pub fn validate(&self) -> AudioResult<()> {
        if self.target_sample_rate == 0 {
            return Err(AudioError::InvalidInput("目标采样率不能为0".to_string()));
        }
        if let Some(max) = self.max_duration_seconds
            && !(max.is_finite() && max > 0.0)
        {
            return Err(AudioError::InvalidInput(format!(
                "最大时长必须为正数: {max}"
            )));
        }
        Ok(())
    }

    /// 以配置文件的 `audio` 段覆盖默认值
    pub fn from_file_config(file: &FileConfig) -> Self {
        let mut config = Self::default();
        config.apply_audio_section(&file.audio);
        config
    }

    fn apply_audio_section(&mut self, audio: &AudioSection) {
        if let Some(rate) = audio.sample_rate {
            self.target_sample_rate = rate;
        }
        if let Some(mb) = audio.max_file_size_mb {
            self.max_file_size_bytes = Some(mb_to_bytes(mb));
        }
        if let Some(seconds) = audio.max_duration_seconds {
            self.max_duration_seconds = Some(seconds);
        }
    }
}

/// MB换算为字节（负值按0处理）
pub fn mb_to_bytes(mb: f64) -> u64 {
    (mb.max(0.0) * units::BYTES_PER_MB as f64) as u64
}

/// 配置文件中的 `audio` 段
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudioSection {
    pub sample_rate: Option<u32>,
    pub max_file_size_mb: Option<f64>,
    pub max_duration_seconds: Option<f64>,
}

/// JSON配置文件
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub audio: AudioSection,
}

/// 读取并解析JSON配置文件
pub fn load_file_config(path: &Path) -> anyhow::Result<FileConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
    Ok(config)
}
