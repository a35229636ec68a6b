use crate::error::{NarrationError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::{Path, PathBuf};

/// Reads the playing time of an audio artifact.
pub trait DurationProbe {
    fn duration_seconds(&self, path: &Path) -> Result<f64>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WavProbe;

impl DurationProbe for WavProbe {
    fn duration_seconds(&self, path: &Path) -> Result<f64> {
        wav_duration_seconds(path).map_err(|source| NarrationError::DurationProbe {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn wav_duration_seconds(path: &Path) -> std::result::Result<f64, hound::Error> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let samples = reader.len();
    let frames = samples as f64 / spec.channels as f64;
    let duration = frames / spec.sample_rate as f64;
    Ok(duration)
}

/// Joins WAV files end to end into `out`. Every part must share the first
/// part's spec.
pub fn concat_wavs(parts: &[PathBuf], out: &Path) -> Result<()> {
    let Some(first) = parts.first() else {
        return Err(NarrationError::synthesis(
            out.display().to_string(),
            "nothing to concatenate",
        ));
    };
    let spec = WavReader::open(first)?.spec();
    let mut writer = WavWriter::create(out, spec)?;

    for part in parts {
        let mut reader = WavReader::open(part)?;
        if !same_layout(reader.spec(), spec) {
            return Err(NarrationError::synthesis(
                out.display().to_string(),
                format!("{} does not match the format of {}", part.display(), first.display()),
            ));
        }
        match spec.sample_format {
            SampleFormat::Float => {
                for sample in reader.samples::<f32>() {
                    writer.write_sample(sample?)?;
                }
            }
            SampleFormat::Int => {
                for sample in reader.samples::<i32>() {
                    writer.write_sample(sample?)?;
                }
            }
        }
    }
    writer.finalize()?;
    Ok(())
}

fn same_layout(a: WavSpec, b: WavSpec) -> bool {
    a.channels == b.channels
        && a.sample_rate == b.sample_rate
        && a.bits_per_sample == b.bits_per_sample
        && a.sample_format == b.sample_format
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_tone(path: &Path, sample_rate: u32, frames: u32) {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            writer.write_sample((i % 128) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn probe_reads_header_duration() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tone.wav");
        write_tone(&path, 8000, 12000);
        assert_eq!(WavProbe.duration_seconds(&path).unwrap(), 1.5);
    }

    #[test]
    fn probe_failure_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.wav");
        match WavProbe.duration_seconds(&path) {
            Err(NarrationError::DurationProbe { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn concatenated_duration_is_sum_of_parts() {
        let dir = TempDir::new().unwrap();
        let parts: Vec<PathBuf> = [1000, 2500, 500]
            .iter()
            .enumerate()
            .map(|(i, frames)| {
                let p = dir.path().join(format!("0-{i}.part.wav"));
                write_tone(&p, 1000, *frames);
                p
            })
            .collect();
        let out = dir.path().join("0.wav");
        concat_wavs(&parts, &out).unwrap();
        assert!((wav_duration_seconds(&out).unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn concat_rejects_mismatched_parts() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        write_tone(&a, 1000, 10);
        write_tone(&b, 2000, 10);
        let err = concat_wavs(&[a, b], &dir.path().join("out.wav")).unwrap_err();
        assert!(matches!(err, NarrationError::Synthesis { .. }));
    }
}
