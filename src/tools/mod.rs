//! 工具模块集合
//!
//! 包含CLI、配置、文件扫描、并行处理和格式化等工具模块，支持main.rs的流程控制。

pub mod cli;
pub mod config;
pub mod constants;
pub mod formatter;
pub mod processor;
pub mod scanner;
pub mod utils;

// 重新导出主要的公共接口
pub use cli::{AppConfig, parse_args, show_startup_info};
pub use config::{FileConfig, IngestConfig, load_file_config};
pub use formatter::{render_json, render_summary, render_table};
pub use processor::{FileReport, ProcessedFile, failure_summary, process_file, process_files_parallel};
pub use scanner::{collect_inputs, scan_audio_files, show_scan_results};
