//! 工具函数模块
//!
//! 文件路径处理等通用工具函数。

use std::path::Path;

/// 提取文件名（返回String，用于日志显示）
#[inline]
pub fn extract_filename_lossy(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// 字节数格式化为人类可读字符串
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}
