//! WAV/PCM处理器
//!
//! 基于hound库读取RIFF/WAVE文件。整段交错PCM一次性读入，
//! 再经下混与重采样得到单声道目标采样率样本。

use super::format::{AudioMetadata, Codec, ContainerFormat, DurationAccuracy};
use crate::error::{AudioError, AudioResult};
use crate::processing::normalize_interleaved;
use crate::processing::sample_conversion::{I16_SCALE, clamp_normalized, int_scale};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Seek, SeekFrom};

/// 元数据中上报的位深（固定16位）
pub const REPORTED_BIT_DEPTH: u16 = 16;

fn open_reader(file: &mut File) -> AudioResult<hound::WavReader<BufReader<&mut File>>> {
    file.seek(SeekFrom::Start(0))?;
    let reader = hound::WavReader::new(BufReader::new(file)).map_err(|e| match e {
        // 头部不足以构成RIFF结构，属于格式损坏而非I/O故障
        hound::Error::IoError(io) if io.kind() == ErrorKind::UnexpectedEof => {
            AudioError::DecodingError(format!("WAV头不完整: {io}"))
        }
        other => AudioError::from(other),
    })?;

    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(AudioError::DecodingError(format!(
            "无效的WAV格式参数: {}Hz, {}声道",
            spec.sample_rate, spec.channels
        )));
    }
    Ok(reader)
}

/// 提取WAV元数据
///
/// 时长由hound自身的样本计数得出：`样本总数 ÷ 声道数 ÷ 采样率`，视为精确值。
pub fn metadata(file: &mut File, file_size: u64) -> AudioResult<AudioMetadata> {
    let reader = open_reader(file)?;
    let spec = reader.spec();

    let frames = reader.len() as f64 / spec.channels as f64;
    let duration = frames / spec.sample_rate as f64;

    tracing::debug!(
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits = spec.bits_per_sample,
        "WAV头解析完成"
    );

    Ok(AudioMetadata::new(
        ContainerFormat::Wav,
        Codec::Pcm,
        spec.sample_rate,
        spec.channels,
        REPORTED_BIT_DEPTH,
        duration,
        DurationAccuracy::Exact,
        file_size,
    ))
}

/// 解码WAV为单声道目标采样率样本
pub fn convert(file: &mut File, target_rate: u32) -> AudioResult<Vec<f32>> {
    let mut reader = open_reader(file)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| clamp_normalized(v as f32 * I16_SCALE)))
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, bits) if bits <= 8 => {
            let scale = int_scale(bits as u32);
            reader
                .samples::<i16>()
                .map(|s| s.map(|v| clamp_normalized(v as f32 * scale)))
                .collect::<Result<_, _>>()?
        }
        (hound::SampleFormat::Int, bits) if bits <= 32 => {
            let scale = int_scale(bits as u32);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| clamp_normalized((v as f64 * scale as f64) as f32)))
                .collect::<Result<_, _>>()?
        }
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map(clamp_normalized))
            .collect::<Result<_, _>>()?,
        (format, bits) => {
            return Err(AudioError::DecodingError(format!(
                "不支持的WAV样本格式: {format:?} {bits}位"
            )));
        }
    };

    Ok(normalize_interleaved(
        samples,
        spec.channels as usize,
        spec.sample_rate,
        target_rate,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_wav(spec: hound::WavSpec, samples: &[i32]) -> std::path::PathBuf {
        let dir = std::env::temp_dir();
        let path = dir.join(format!(
            "audio_ingest_wav_unit_{}_{}_{}.wav",
            std::process::id(),
            spec.bits_per_sample,
            spec.channels
        ));
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for &s in samples {
            match spec.bits_per_sample {
                16 => writer.write_sample(s as i16).unwrap(),
                _ => writer.write_sample(s).unwrap(),
            }
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_16bit_scaling_uses_fixed_factor() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let path = write_wav(spec, &[16384, -32768, 0, 32767]);
        let mut file = File::open(&path).unwrap();

        let samples = convert(&mut file, 8000).unwrap();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0.5);
        assert_eq!(samples[1], -1.0);
        assert!(samples[3] < 1.0);

        let size = file.metadata().unwrap().len();
        let meta = metadata(&mut file, size).unwrap();
        assert_eq!(meta.bit_depth, 16);
        assert!((meta.duration_seconds - 0.0005).abs() < 1e-9);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_24bit_stereo_downmix() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 16000,
            bits_per_sample: 24,
            sample_format: hound::SampleFormat::Int,
        };
        // 左声道 +0.5，右声道 0
        let path = write_wav(spec, &[4_194_304, 0, 4_194_304, 0]);
        let mut file = File::open(&path).unwrap();

        let samples = convert(&mut file, 16000).unwrap();
        assert_eq!(samples, vec![0.25, 0.25]);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_invalid_riff_is_decoding_error() {
        let path = std::env::temp_dir().join(format!(
            "audio_ingest_wav_unit_{}_bad.wav",
            std::process::id()
        ));
        File::create(&path)
            .unwrap()
            .write_all(b"RIFX\0\0\0\0not a wave file")
            .unwrap();
        let mut file = File::open(&path).unwrap();

        let err = metadata(&mut file, 24).unwrap_err();
        assert!(matches!(err, AudioError::DecodingError(_)), "{err}");
        std::fs::remove_file(path).ok();
    }
}
