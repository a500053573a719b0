//! 工具层集成测试
//!
//! 测试CLI、配置文件、文件扫描、并行处理和格式化输出等工具模块的集成功能。


use audio_ingest::IngestPipeline;
use audio_ingest::tools::{self, cli};
use audio_test_fixtures::{ensure_fixtures_generated, fixture_path, fixtures_dir};
use std::path::PathBuf;

// ============================================================================
// CLI与配置
// ============================================================================

#[test]
fn test_cli_overrides_config_file() {
    let dir = std::env::temp_dir().join(format!("audio_ingest_cfg_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let config_path = dir.join("ingest.json");
    std::fs::write(
        &config_path,
        r#"{ "audio": { "sample_rate": 8000, "max_file_size_mb": 2, "max_duration_seconds": 30 } }"#,
    )
    .unwrap();

    let file_config = tools::load_file_config(&config_path).unwrap();

    let app = cli::parse_from(["audio-ingest", "input.wav"]).unwrap();
    let ingest = app.ingest_config(Some(&file_config));
    assert_eq!(ingest.target_sample_rate, 8000);
    assert_eq!(ingest.max_file_size_bytes, Some(2 * 1024 * 1024));
    assert_eq!(ingest.max_duration_seconds, Some(30.0));

    let app = cli::parse_from(["audio-ingest", "--sample-rate", "22050", "input.wav"]).unwrap();
    let ingest = app.ingest_config(Some(&file_config));
    assert_eq!(ingest.target_sample_rate, 22050);
    assert_eq!(ingest.max_duration_seconds, Some(30.0));

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_broken_config_file_reports_path() {
    let dir = std::env::temp_dir().join(format!("audio_ingest_badcfg_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let config_path = dir.join("broken.json");
    std::fs::write(&config_path, "{ audio: ").unwrap();

    let err = tools::load_file_config(&config_path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.json"));

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_cli_requires_input() {
    assert!(cli::parse_from(["audio-ingest"]).is_err());
}

// ============================================================================
// 扫描
// ============================================================================

#[test]
fn test_scan_fixture_directory() {
    ensure_fixtures_generated();
    let files = tools::scan_audio_files(&fixtures_dir()).unwrap();

    assert!(files.contains(&fixture_path("mono_16k.wav")));
    assert!(files.contains(&fixture_path("stereo.opus")));
    assert!(files.contains(&fixture_path("lc_stereo.aac")));
    // 不受支持的扩展名与锁文件不会被扫描进来
    assert!(!files.contains(&fixture_path("voice.m4a")));
    assert!(files.iter().all(|p| p.extension().is_some()));

    let mut sorted = files.clone();
    sorted.sort();
    assert_eq!(files, sorted, "扫描结果应有序");
}

#[test]
fn test_explicit_files_kept_regardless_of_extension() {
    ensure_fixtures_generated();
    let inputs = vec![fixture_path("voice.m4a"), fixture_path("mono_16k.wav")];
    let files = tools::collect_inputs(&inputs).unwrap();
    assert_eq!(files, inputs);
}

#[test]
fn test_missing_input_is_error() {
    let inputs = vec![PathBuf::from("tests/fixtures/nope/missing.wav")];
    assert!(tools::collect_inputs(&inputs).is_err());
}

// ============================================================================
// 并行处理与输出
// ============================================================================

#[test]
fn test_parallel_results_keep_input_order() {
    ensure_fixtures_generated();
    let pipeline = IngestPipeline::default();
    let files = vec![
        fixture_path("stereo.opus"),
        fixture_path("voice.m4a"),
        fixture_path("mono_16k.wav"),
        fixture_path("lc_stereo.aac"),
        fixture_path("mono_16k.flac"),
    ];

    let results = tools::process_files_parallel(&pipeline, &files, false, 3).unwrap();
    let paths: Vec<_> = results.iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths, files);

    assert!(results[0].result.is_ok());
    assert!(results[1].result.is_err());
    assert!(results[2].result.is_ok());
    // AAC只能提取元数据
    assert!(results[3].result.is_err());
    assert!(results[4].result.is_ok());

    let wav = results[2].result.as_ref().unwrap();
    let summary = wav.samples.as_ref().unwrap();
    assert_eq!(summary.sample_count, 16000);
    assert_eq!(summary.target_sample_rate, 16000);

    let failures = tools::failure_summary(&results);
    let failed: usize = failures.values().map(Vec::len).sum();
    assert_eq!(failed, 2);
}

#[test]
fn test_metadata_only_mode_accepts_aac() {
    ensure_fixtures_generated();
    let pipeline = IngestPipeline::default();
    let report = tools::process_file(&pipeline, &fixture_path("lc_stereo.aac"), true).unwrap();
    assert!(report.samples.is_none());
    assert_eq!(report.metadata.sample_rate_hz, 44100);
}

#[test]
fn test_json_output_shape() {
    ensure_fixtures_generated();
    let pipeline = IngestPipeline::default();
    let files = vec![fixture_path("mono_16k.wav"), fixture_path("unknown_codec.ogg")];
    let results = tools::process_files_parallel(&pipeline, &files, false, 2).unwrap();

    let json = tools::render_json(&results).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let entries = value.as_array().unwrap();
    assert_eq!(entries.len(), 2);

    let metadata = &entries[0]["report"]["metadata"];
    assert_eq!(metadata["container_format"], "WAV");
    assert_eq!(metadata["sample_rate_hz"], 16000);
    assert_eq!(metadata["channel_count"], 1);
    assert_eq!(entries[0]["report"]["samples"]["sample_count"], 16000);

    assert!(entries[1]["report"].is_null());
    assert!(entries[1]["error"]["message"].is_string());
}

#[test]
fn test_table_output_lists_every_file() {
    ensure_fixtures_generated();
    let pipeline = IngestPipeline::default();
    let files = vec![fixture_path("stereo.opus"), fixture_path("fake_audio.wav")];
    let results = tools::process_files_parallel(&pipeline, &files, true, 2).unwrap();

    let mut table = tools::formatter::build_table(&results);
    table.set_content_arrangement(comfy_table::ContentArrangement::Disabled);
    let table = table.to_string();
    assert!(table.contains("stereo.opus"));
    assert!(table.contains("fake_audio.wav"));
}
