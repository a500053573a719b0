//! 错误处理测试
//!
//! 验证各类损坏/伪装/越界输入都以正确的错误类型终止，而不是panic或静默成功。


use audio_ingest::{AudioError, ErrorCategory, IngestConfig, IngestPipeline};
use audio_test_fixtures::{ensure_fixtures_generated, fixture_path};
use std::path::Path;

fn log(msg_zh: impl AsRef<str>, msg_en: impl AsRef<str>) {
    println!("{} / {}", msg_zh.as_ref(), msg_en.as_ref());
}

fn ingest_err(file: &str) -> AudioError {
    IngestPipeline::default()
        .ingest(&fixture_path(file))
        .expect_err("应该返回错误")
}

#[test]
fn test_empty_wav_is_decoding_error() {
    ensure_fixtures_generated();
    let err = ingest_err("empty.wav");
    log(format!("空文件错误: {err}"), format!("Empty file error: {err}"));
    assert!(matches!(err, AudioError::DecodingError(_)), "{err}");
}

#[test]
fn test_fake_wav_is_decoding_error() {
    ensure_fixtures_generated();
    let err = ingest_err("fake_audio.wav");
    assert!(matches!(err, AudioError::DecodingError(_)), "{err}");
    assert_eq!(ErrorCategory::from_audio_error(&err), ErrorCategory::Decoding);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = IngestPipeline::default()
        .ingest(Path::new("tests/fixtures/does_not_exist.wav"))
        .unwrap_err();
    assert!(matches!(err, AudioError::IoError(_)), "{err}");
    assert_eq!(ErrorCategory::from_audio_error(&err), ErrorCategory::Io);
}

#[test]
fn test_unsupported_and_unknown_are_format_errors() {
    ensure_fixtures_generated();
    for file in ["voice.m4a", "unknown_codec.ogg", "broken_capture.ogg"] {
        let err = ingest_err(file);
        assert_eq!(
            ErrorCategory::from_audio_error(&err),
            ErrorCategory::Format,
            "{file}: {err}"
        );
    }
}

#[test]
fn test_no_frames_is_decoding_category() {
    ensure_fixtures_generated();
    let err = ingest_err("headers_only.opus");
    assert!(matches!(err, AudioError::NoFramesDecoded(_)), "{err}");
    assert_eq!(ErrorCategory::from_audio_error(&err), ErrorCategory::Decoding);
}

#[test]
fn test_aac_not_implemented_is_format_category() {
    ensure_fixtures_generated();
    let err = ingest_err("lc_stereo.aac");
    assert_eq!(ErrorCategory::from_audio_error(&err), ErrorCategory::Format);
}

// ========== 大小与时长上限 ==========

#[test]
fn test_file_size_limit_rejects_before_decoding() {
    ensure_fixtures_generated();
    let config = IngestConfig {
        max_file_size_bytes: Some(1024),
        ..IngestConfig::default()
    };
    let pipeline = IngestPipeline::new(config).unwrap();

    let err = pipeline.ingest(&fixture_path("mono_16k.wav")).unwrap_err();
    assert!(matches!(err, AudioError::InvalidInput(_)), "{err}");

    // 大小检查先于分发与元数据提取
    let err = pipeline.metadata(&fixture_path("lc_stereo.aac")).unwrap_err();
    assert!(matches!(err, AudioError::InvalidInput(_)), "{err}");

    // 未超限的文件正常处理
    assert!(pipeline.metadata(&fixture_path("broken_capture.ogg")).is_err());
    assert!(pipeline.metadata(&fixture_path("opus_in_ogg.ogg")).is_ok());
}

#[test]
fn test_duration_limit_rejects_long_audio() {
    ensure_fixtures_generated();
    let config = IngestConfig {
        max_duration_seconds: Some(1.5),
        ..IngestConfig::default()
    };
    let pipeline = IngestPipeline::new(config).unwrap();

    let err = pipeline.ingest(&fixture_path("stereo_44k.wav")).unwrap_err();
    assert!(matches!(err, AudioError::InvalidInput(_)), "{err}");
    assert_eq!(ErrorCategory::from_audio_error(&err), ErrorCategory::Input);

    assert!(pipeline.ingest(&fixture_path("mono_16k.wav")).is_ok());
}

#[test]
fn test_invalid_config_rejected() {
    let err = IngestPipeline::new(IngestConfig {
        target_sample_rate: 0,
        ..IngestConfig::default()
    })
    .unwrap_err();
    assert!(matches!(err, AudioError::InvalidInput(_)), "{err}");

    let err = IngestPipeline::new(IngestConfig {
        max_duration_seconds: Some(-1.0),
        ..IngestConfig::default()
    })
    .unwrap_err();
    assert!(matches!(err, AudioError::InvalidInput(_)), "{err}");
}

#[test]
fn test_error_display_is_descriptive() {
    ensure_fixtures_generated();
    let err = ingest_err("voice.m4a");
    let message = err.to_string();
    assert!(message.contains("m4a"), "{message}");
    assert!(std::error::Error::source(&err).is_none());

    let io = AudioError::from(std::io::Error::other("disk gone"));
    assert!(std::error::Error::source(&io).is_some());
}
