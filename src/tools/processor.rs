//! 多文件处理模块
//!
//! 使用rayon实现文件级并行处理，结果按输入顺序返回。
//! 每个文件各自打开句柄、各自分配样本缓冲，互不共享可变状态。

use crate::audio::AudioMetadata;
use crate::error::{AudioError, AudioResult, ErrorCategory};
use crate::pipeline::IngestPipeline;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 单个文件的样本统计
#[derive(Debug, Clone, Serialize)]
pub struct SampleSummary {
    pub sample_count: usize,
    pub target_sample_rate: u32,
    pub sample_duration_seconds: f64,
    pub peak: f32,
}

/// 单个文件的处理报告
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub metadata: AudioMetadata,
    /// `--metadata-only` 时为None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<SampleSummary>,
}

/// 有序结果容器
pub struct ProcessedFile {
    pub path: PathBuf,
    pub result: AudioResult<FileReport>,
}

/// 处理单个文件
pub fn process_file(
    pipeline: &IngestPipeline,
    path: &Path,
    metadata_only: bool,
) -> AudioResult<FileReport> {
    if metadata_only {
        return Ok(FileReport {
            metadata: pipeline.metadata(path)?,
            samples: None,
        });
    }

    let outcome = pipeline.ingest(path)?;
    let summary = SampleSummary {
        sample_count: outcome.samples.len(),
        target_sample_rate: outcome.target_sample_rate,
        sample_duration_seconds: outcome.sample_duration_seconds(),
        peak: outcome.peak(),
    };
    Ok(FileReport {
        metadata: outcome.metadata,
        samples: Some(summary),
    })
}

/// 🚀 多文件并行处理
///
/// 使用独立的rayon线程池精确控制并发度，结果顺序与输入一致。
pub fn process_files_parallel(
    pipeline: &IngestPipeline,
    files: &[PathBuf],
    metadata_only: bool,
    parallel_degree: usize,
) -> AudioResult<Vec<ProcessedFile>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallel_degree.max(1))
        .thread_name(|i| format!("ingest-worker-{i}"))
        .build()
        .map_err(|e| AudioError::InvalidInput(format!("线程池创建失败: {e}")))?;

    let results = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let result = process_file(pipeline, path, metadata_only);
                if let Err(e) = &result {
                    tracing::warn!(file = %path.display(), error = %e, "文件处理失败");
                }
                ProcessedFile {
                    path: path.clone(),
                    result,
                }
            })
            .collect()
    });

    Ok(results)
}

/// 按错误类别统计失败文件
pub fn failure_summary(results: &[ProcessedFile]) -> HashMap<ErrorCategory, Vec<String>> {
    let mut stats: HashMap<ErrorCategory, Vec<String>> = HashMap::new();
    for processed in results {
        if let Err(e) = &processed.result {
            stats
                .entry(ErrorCategory::from_audio_error(e))
                .or_default()
                .push(super::utils::extract_filename_lossy(&processed.path));
        }
    }
    stats
}
