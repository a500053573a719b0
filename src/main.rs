//! Audio Ingest - 主程序入口
//!
//! 纯流程控制器，负责协调各个工具模块完成音频接入任务。

use audio_ingest::{
    audio::SUPPORTED_EXTENSIONS,
    error::{AudioError, ErrorCategory},
    pipeline::IngestPipeline,
    tools::{self, AppConfig},
};
use std::process;
use tracing_subscriber::EnvFilter;

/// 错误退出码定义
mod exit_codes {
    /// 通用错误（I/O等）
    pub const GENERAL_ERROR: i32 = 1;
    /// 格式错误
    pub const FORMAT_ERROR: i32 = 2;
    /// 解码失败
    pub const DECODING_ERROR: i32 = 3;
    /// 输入/配置错误
    pub const INPUT_ERROR: i32 = 4;
}

fn exit_code_for(category: ErrorCategory) -> i32 {
    match category {
        ErrorCategory::Format => exit_codes::FORMAT_ERROR,
        ErrorCategory::Decoding => exit_codes::DECODING_ERROR,
        ErrorCategory::Input => exit_codes::INPUT_ERROR,
        ErrorCategory::Io => exit_codes::GENERAL_ERROR,
    }
}

/// 获取错误建议文本
fn get_error_suggestion(error: &AudioError) -> &'static str {
    match error {
        AudioError::NotImplemented(_) => {
            "AAC仅支持元数据提取，可使用 --metadata-only / AAC is metadata-only, use --metadata-only"
        }
        _ => match ErrorCategory::from_audio_error(error) {
            ErrorCategory::Io => {
                "检查文件路径是否正确，文件是否存在且可读 / Check if file path is correct, file exists and is readable"
            }
            ErrorCategory::Format => {
                "确保输入文件为支持的格式 / Ensure input file is in a supported format"
            }
            ErrorCategory::Decoding => {
                "文件可能损坏或使用不支持的音频编码 / File may be corrupted or use unsupported audio encoding"
            }
            ErrorCategory::Input => {
                "检查命令行参数与配置文件，使用 --help 查看完整用法 / Check arguments and config file, use --help to see full usage"
            }
        },
    }
}

/// 错误处理和建议
fn handle_error(error: AudioError) -> ! {
    eprintln!("[ERROR] 错误 / Error: {error}");

    let category = ErrorCategory::from_audio_error(&error);
    eprintln!("[INFO] 建议 / Suggestion: {}", get_error_suggestion(&error));

    if matches!(category, ErrorCategory::Format) {
        let uppercase_formats: Vec<String> =
            SUPPORTED_EXTENSIONS.iter().map(|s| s.to_uppercase()).collect();
        eprintln!(
            "   Supported formats / 支持的格式: {}",
            uppercase_formats.join(", ")
        );
    }

    process::exit(exit_code_for(category));
}

/// 初始化日志：RUST_LOG优先，否则默认warn（--verbose时为debug）
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 合并配置文件与命令行参数
fn build_pipeline(config: &AppConfig) -> Result<IngestPipeline, AudioError> {
    let file_config = match &config.config_path {
        Some(path) => Some(
            tools::load_file_config(path)
                .map_err(|e| AudioError::InvalidInput(format!("{e:#}")))?,
        ),
        None => None,
    };

    let ingest = config.ingest_config(file_config.as_ref());
    tools::show_startup_info(config, &ingest);
    IngestPipeline::new(ingest)
}

/// 应用程序主逻辑，返回退出码
fn run(config: &AppConfig) -> Result<i32, AudioError> {
    let pipeline = build_pipeline(config)?;

    let files = tools::collect_inputs(&config.inputs)?;
    if !config.json {
        tools::show_scan_results(&files, config.verbose);
    }
    if files.is_empty() {
        return Ok(0);
    }

    // 单个文件失败直接按其错误类别退出
    if files.len() == 1 {
        let report = tools::process_file(&pipeline, &files[0], config.metadata_only)?;
        let results = vec![tools::ProcessedFile {
            path: files[0].clone(),
            result: Ok(report),
        }];
        print_results(config, &results)?;
        return Ok(0);
    }

    let results =
        tools::process_files_parallel(&pipeline, &files, config.metadata_only, config.parallel_files)?;
    print_results(config, &results)?;

    let failures = tools::failure_summary(&results);
    if !config.json {
        println!("{}", tools::render_summary(results.len(), &failures));
    }

    // 批量模式：全部失败时以首个失败的类别退出
    let all_failed = results.iter().all(|r| r.result.is_err());
    let first_failure = results.iter().find_map(|r| r.result.as_ref().err());
    match first_failure {
        Some(e) if all_failed => Ok(exit_code_for(ErrorCategory::from_audio_error(e))),
        _ => Ok(0),
    }
}

fn print_results(config: &AppConfig, results: &[tools::ProcessedFile]) -> Result<(), AudioError> {
    if config.json {
        let json = tools::render_json(results)
            .map_err(|e| AudioError::InvalidInput(format!("JSON序列化失败: {e}")))?;
        println!("{json}");
    } else {
        println!("{}", tools::render_table(results));
    }
    Ok(())
}

fn main() {
    let config = tools::parse_args();
    init_tracing(config.verbose);

    match run(&config) {
        Ok(0) => {
            if config.verbose && !config.json {
                println!("✅ 所有任务处理完成！");
            }
        }
        Ok(code) => process::exit(code),
        Err(error) => handle_error(error),
    }
}
