//! 文件扫描模块
//!
//! 把命令行输入展开为待处理文件列表：目录递归扫描受支持的扩展名，
//! 显式给出的文件原样保留（扩展名不受支持时由分发器报错）。

use super::utils;
use crate::audio::is_supported_extension;
use crate::error::{AudioError, AudioResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 扫描目录中的音频文件（递归，按路径排序）
pub fn scan_audio_files(dir_path: &Path) -> AudioResult<Vec<PathBuf>> {
    if !dir_path.exists() {
        return Err(AudioError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("目录不存在: {}", dir_path.display()),
        )));
    }

    if !dir_path.is_dir() {
        return Err(AudioError::InvalidInput(format!(
            "路径不是目录: {}",
            dir_path.display()
        )));
    }

    let mut audio_files: Vec<PathBuf> = WalkDir::new(dir_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "跳过无法访问的目录项");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(is_supported_extension)
        })
        .map(|entry| entry.into_path())
        .collect();

    audio_files.sort();
    Ok(audio_files)
}

/// 展开全部输入
pub fn collect_inputs(inputs: &[PathBuf]) -> AudioResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.exists() {
            return Err(AudioError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("输入路径不存在: {}", input.display()),
            )));
        }
        if input.is_dir() {
            let found = scan_audio_files(input)?;
            tracing::debug!(dir = %input.display(), count = found.len(), "目录扫描完成");
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

/// 显示文件扫描结果
pub fn show_scan_results(audio_files: &[PathBuf], verbose: bool) {
    if audio_files.is_empty() {
        println!("⚠️  没有找到支持的音频文件");
        println!("   支持的格式: WAV, MP3, OGG, OPUS, FLAC, AAC");
        return;
    }

    println!("🎵 找到 {} 个音频文件", audio_files.len());
    if verbose {
        for (i, file) in audio_files.iter().enumerate() {
            println!("   {}. {}", i + 1, utils::extract_filename_lossy(file));
        }
    }
    println!();
}
