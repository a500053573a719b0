//! 命令行接口模块
//!
//! 负责命令行参数解析、配置合并和程序信息展示。

use super::config::{self, FileConfig, IngestConfig};
use super::constants::{defaults, parallel_limits};
use clap::{Arg, ArgAction, Command, value_parser};
use std::path::PathBuf;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// 应用程序配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 输入文件或目录
    pub inputs: Vec<PathBuf>,

    /// JSON配置文件路径
    pub config_path: Option<PathBuf>,

    /// 命令行指定的目标采样率（覆盖配置文件）
    pub sample_rate: Option<u32>,

    /// 命令行指定的最大文件大小 (MB)
    pub max_file_size_mb: Option<f64>,

    /// 命令行指定的最大时长 (秒)
    pub max_duration_seconds: Option<f64>,

    /// 以JSON输出结果
    pub json: bool,

    /// 只提取元数据，不做样本转换
    pub metadata_only: bool,

    /// 是否显示详细信息
    pub verbose: bool,

    /// 多文件并发度
    pub parallel_files: usize,
}

impl AppConfig {
    /// 合并配置：默认值 ← 配置文件 ← 命令行
    pub fn ingest_config(&self, file: Option<&FileConfig>) -> IngestConfig {
        let mut ingest = file.map(IngestConfig::from_file_config).unwrap_or_default();

        if let Some(rate) = self.sample_rate {
            ingest.target_sample_rate = rate;
        }
        if let Some(mb) = self.max_file_size_mb {
            ingest.max_file_size_bytes = Some(config::mb_to_bytes(mb));
        }
        if let Some(seconds) = self.max_duration_seconds {
            ingest.max_duration_seconds = Some(seconds);
        }
        ingest
    }
}

fn build_command() -> Command {
    Command::new("audio-ingest")
        .version(VERSION)
        .about(DESCRIPTION)
        .arg(
            Arg::new("INPUT")
                .help("音频文件或目录路径 (支持WAV, MP3, OGG, OPUS, FLAC, AAC)")
                .required(true)
                .num_args(1..)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("sample-rate")
                .long("sample-rate")
                .short('r')
                .help("目标采样率 (Hz)，默认16000")
                .value_name("HZ")
                .value_parser(value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("max-file-size-mb")
                .long("max-file-size-mb")
                .help("允许的最大文件大小 (MB)")
                .value_name("MB")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("max-duration")
                .long("max-duration")
                .help("允许的最大音频时长 (秒)")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("JSON配置文件（audio段: sample_rate, max_file_size_mb, max_duration_seconds）")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("以JSON格式输出结果")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("metadata-only")
                .long("metadata-only")
                .short('m')
                .help("只提取元数据，不解码样本")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("parallel-files")
                .long("parallel-files")
                .short('j')
                .help("多文件并发度 (1-16)，默认4")
                .value_name("N")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("显示详细处理信息")
                .action(ArgAction::SetTrue),
        )
}

/// 从给定参数解析配置
pub fn parse_from<I, T>(args: I) -> Result<AppConfig, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(args)?;

    let parallel_files = matches
        .get_one::<usize>("parallel-files")
        .copied()
        .unwrap_or(defaults::PARALLEL_FILES_DEGREE)
        .clamp(
            parallel_limits::MIN_PARALLEL_DEGREE,
            parallel_limits::MAX_PARALLEL_DEGREE,
        );

    Ok(AppConfig {
        inputs: matches
            .get_many::<PathBuf>("INPUT")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        config_path: matches.get_one::<PathBuf>("config").cloned(),
        sample_rate: matches.get_one::<u32>("sample-rate").copied(),
        max_file_size_mb: matches.get_one::<f64>("max-file-size-mb").copied(),
        max_duration_seconds: matches.get_one::<f64>("max-duration").copied(),
        json: matches.get_flag("json"),
        metadata_only: matches.get_flag("metadata-only"),
        verbose: matches.get_flag("verbose"),
        parallel_files,
    })
}

/// 解析命令行参数并创建配置（参数错误时由clap打印用法并退出）
pub fn parse_args() -> AppConfig {
    parse_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
}

/// 显示程序启动信息
pub fn show_startup_info(config: &AppConfig, ingest: &IngestConfig) {
    if config.json {
        return;
    }
    println!("🚀 Audio Ingest v{VERSION} 启动");
    println!("📝 {DESCRIPTION}");
    if config.verbose {
        println!("🎯 目标采样率: {} Hz", ingest.target_sample_rate);
        if let Some(limit) = ingest.max_file_size_bytes {
            println!("📦 文件大小上限: {limit} 字节");
        }
        if let Some(limit) = ingest.max_duration_seconds {
            println!("⏱️  时长上限: {limit:.1} 秒");
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multiple_inputs_and_flags() {
        let config = parse_from([
            "audio-ingest",
            "a.wav",
            "dir",
            "--sample-rate",
            "8000",
            "--json",
            "-m",
        ])
        .unwrap();
        assert_eq!(config.inputs, vec![PathBuf::from("a.wav"), PathBuf::from("dir")]);
        assert_eq!(config.sample_rate, Some(8000));
        assert!(config.json);
        assert!(config.metadata_only);
        assert_eq!(config.parallel_files, defaults::PARALLEL_FILES_DEGREE);
    }

    #[test]
    fn test_cli_overrides_file_config() {
        let config = parse_from(["audio-ingest", "a.wav", "--max-file-size-mb", "1"]).unwrap();
        let file = FileConfig {
            audio: config::AudioSection {
                sample_rate: Some(22050),
                max_file_size_mb: Some(50.0),
                max_duration_seconds: Some(10.0),
            },
        };
        let ingest = config.ingest_config(Some(&file));
        assert_eq!(ingest.target_sample_rate, 22050);
        assert_eq!(ingest.max_file_size_bytes, Some(1024 * 1024));
        assert_eq!(ingest.max_duration_seconds, Some(10.0));
    }

    #[test]
    fn test_parallel_degree_clamped() {
        let config = parse_from(["audio-ingest", "a.wav", "-j", "64"]).unwrap();
        assert_eq!(config.parallel_files, parallel_limits::MAX_PARALLEL_DEGREE);
    }

    #[test]
    fn test_missing_input_is_error() {
        assert!(parse_from(["audio-ingest"]).is_err());
        assert!(parse_from(["audio-ingest", "a.wav", "--sample-rate", "0"]).is_err());
    }
}
