//! 输出格式化模块
//!
//! 把处理结果渲染为comfy-table表格或JSON。

use super::processor::{FileReport, ProcessedFile};
use super::utils;
use crate::error::ErrorCategory;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;
use std::collections::HashMap;

fn format_duration(report: &FileReport) -> String {
    let meta = &report.metadata;
    let marker = if meta.is_exact_duration() { "" } else { "~" };
    format!("{marker}{:.2}s", meta.duration_seconds)
}

/// 构建结果表格（失败的文件占一行，显示错误类别）
pub fn build_table(results: &[ProcessedFile]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "文件", "容器", "编解码器", "采样率", "声道", "位深", "时长", "码率", "大小", "样本数",
        "峰值",
    ]);

    for processed in results {
        let name = utils::extract_filename_lossy(&processed.path);
        match &processed.result {
            Ok(report) => {
                let meta = &report.metadata;
                let (samples, peak) = match &report.samples {
                    Some(s) => (s.sample_count.to_string(), format!("{:.4}", s.peak)),
                    None => ("-".to_string(), "-".to_string()),
                };
                table.add_row(vec![
                    Cell::new(name),
                    Cell::new(meta.container_format.label()),
                    Cell::new(meta.codec.label()),
                    Cell::new(format!("{} Hz", meta.sample_rate_hz)).set_alignment(CellAlignment::Right),
                    Cell::new(meta.channel_count).set_alignment(CellAlignment::Right),
                    Cell::new(meta.bit_depth).set_alignment(CellAlignment::Right),
                    Cell::new(format_duration(report)).set_alignment(CellAlignment::Right),
                    Cell::new(
                        meta.bitrate_kbps
                            .map_or_else(|| "-".to_string(), |kbps| format!("{kbps} kbps")),
                    )
                    .set_alignment(CellAlignment::Right),
                    Cell::new(utils::format_bytes(meta.original_size_bytes))
                        .set_alignment(CellAlignment::Right),
                    Cell::new(samples).set_alignment(CellAlignment::Right),
                    Cell::new(peak).set_alignment(CellAlignment::Right),
                ]);
            }
            Err(e) => {
                let category = ErrorCategory::from_audio_error(e);
                table.add_row(vec![
                    Cell::new(name),
                    Cell::new(format!("❌ {}", category.display_name())),
                    Cell::new(e.to_string()),
                ]);
            }
        }
    }

    table
}

/// 渲染结果表格
pub fn render_table(results: &[ProcessedFile]) -> String {
    build_table(results).to_string()
}

/// JSON输出中的单个条目
#[derive(Serialize)]
struct JsonEntry<'a> {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a FileReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
}

#[derive(Serialize)]
struct JsonError {
    category: &'static str,
    message: String,
}

/// 渲染JSON数组
pub fn render_json(results: &[ProcessedFile]) -> serde_json::Result<String> {
    let entries: Vec<JsonEntry<'_>> = results
        .iter()
        .map(|processed| {
            let file = processed.path.display().to_string();
            match &processed.result {
                Ok(report) => JsonEntry {
                    file,
                    report: Some(report),
                    error: None,
                },
                Err(e) => JsonEntry {
                    file,
                    report: None,
                    error: Some(JsonError {
                        category: ErrorCategory::from_audio_error(e).display_name(),
                        message: e.to_string(),
                    }),
                },
            }
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}

/// 渲染处理统计（失败时按类别列出文件）
pub fn render_summary(
    total: usize,
    failures: &HashMap<ErrorCategory, Vec<String>>,
) -> String {
    let failed: usize = failures.values().map(Vec::len).sum();
    let mut output = format!("📊 处理完成: 成功 {} / {total}", total - failed);

    if failed > 0 {
        let mut categories: Vec<_> = failures.iter().collect();
        categories.sort_by_key(|(category, _)| category.display_name());
        for (category, files) in categories {
            output.push_str(&format!(
                "\n   {}: {} 个 ({})",
                category.display_name(),
                files.len(),
                files.join(", ")
            ));
        }
    }
    output
}
