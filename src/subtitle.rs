use crate::assembler::NarrationManifest;
use regex::Regex;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

const COMMA_PAUSE: f64 = 0.2;
const SENTENCE_END_PAUSE: f64 = 0.4;
// Longer words take longer to say, but not proportionally.
const WORD_WEIGHT_ALPHA: f64 = 0.75;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w[\w'-]*)|([,.!?])").expect("word pattern is valid"));

#[derive(Debug, Clone, PartialEq)]
pub struct SrtEntry {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// One subtitle per word, timed by spreading each clip's duration over its
/// words after reserving fixed pauses for punctuation.
pub fn build_srt_entries(manifest: &NarrationManifest) -> Vec<SrtEntry> {
    let mut srt_entries = Vec::new();
    let mut cumulative_seconds = 0.0_f64;

    for item in &manifest.items {
        let start_of_clip = cumulative_seconds;
        let end_of_clip = cumulative_seconds + item.duration;
        let elements: Vec<&str> = WORD.find_iter(&item.text).map(|m| m.as_str()).collect();

        if elements.is_empty() {
            srt_entries.push(SrtEntry {
                start: start_of_clip,
                end: end_of_clip,
                text: item.text.clone(),
            });
            cumulative_seconds = end_of_clip;
            continue;
        }

        let mut total_pause_time = 0.0;
        let mut word_elements = Vec::new();
        for &element in &elements {
            match element {
                "," => total_pause_time += COMMA_PAUSE,
                "." | "!" | "?" => total_pause_time += SENTENCE_END_PAUSE,
                _ => word_elements.push(element),
            }
        }
        // Pauses that would not fit are squeezed instead of overrunning the clip.
        let pause_scale = if total_pause_time > item.duration && total_pause_time > 0.0 {
            item.duration / total_pause_time
        } else {
            1.0
        };
        let word_time_available = (item.duration - total_pause_time * pause_scale).max(0.0);
        let total_weight: f64 = word_elements
            .iter()
            .map(|w| (w.chars().count() as f64).powf(WORD_WEIGHT_ALPHA))
            .sum();

        let mut current = start_of_clip;
        for element in elements {
            match element {
                "," => current += COMMA_PAUSE * pause_scale,
                "." | "!" | "?" => current += SENTENCE_END_PAUSE * pause_scale,
                word => {
                    let weight = (word.chars().count() as f64).powf(WORD_WEIGHT_ALPHA);
                    let word_duration = if total_weight > 0.0 {
                        word_time_available * weight / total_weight
                    } else {
                        0.0
                    };
                    srt_entries.push(SrtEntry {
                        start: current,
                        end: current + word_duration,
                        text: word.to_string(),
                    });
                    current += word_duration;
                }
            }
        }
        cumulative_seconds = end_of_clip;
    }
    srt_entries
}

pub fn write_srt(path: &Path, entries: &[SrtEntry]) -> anyhow::Result<()> {
    let mut f = File::create(path)?;
    for (i, entry) in entries.iter().enumerate() {
        writeln!(f, "{}", i + 1)?;
        writeln!(
            f,
            "{} --> {}",
            format_srt_time(entry.start),
            format_srt_time(entry.end)
        )?;
        for line in wrap_text(&entry.text, 80) {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)?;
    }
    Ok(())
}

fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

fn wrap_text(s: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in s.split_whitespace() {
        if current.len() + word.len() + 1 > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{ItemKey, ManifestEntry};
    use std::path::PathBuf;

    fn manifest(items: &[(&str, f64)]) -> NarrationManifest {
        let items = items
            .iter()
            .enumerate()
            .map(|(i, (text, duration))| ManifestEntry {
                item: ItemKey::Comment(i),
                key: i.to_string(),
                path: PathBuf::from(format!("{i}.wav")),
                duration: *duration,
                text: text.to_string(),
            })
            .collect();
        NarrationManifest {
            thread_id: "t".to_string(),
            storage_dir: PathBuf::new(),
            items,
            total_duration: 0.0,
            last_comment: None,
        }
    }

    #[test]
    fn formats_srt_timestamps() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(3725.4567), "01:02:05,457");
    }

    #[test]
    fn words_stay_inside_their_clip() {
        let entries = build_srt_entries(&manifest(&[("Hello there, friend.", 3.0), ("Bye.", 1.0)]));
        let words: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(words, vec!["Hello", "there", "friend", "Bye"]);

        let first_clip_end = entries[2].end;
        assert!(first_clip_end <= 3.0 - SENTENCE_END_PAUSE + 1e-9);
        assert!((entries[3].start - 3.0).abs() < 1e-9);
        assert!(entries.windows(2).all(|w| w[0].end <= w[1].start + 1e-9));
    }

    #[test]
    fn wordless_text_gets_no_word_timing() {
        assert!(build_srt_entries(&manifest(&[("...", 0.5)])).is_empty());

        let entries = build_srt_entries(&manifest(&[("—", 2.0)]));
        assert_eq!(entries, vec![SrtEntry { start: 0.0, end: 2.0, text: "—".to_string() }]);
    }

    #[test]
    fn wraps_long_lines() {
        let long = "word ".repeat(30);
        let lines = wrap_text(&long, 20);
        assert!(lines.iter().all(|l| l.len() <= 20));
        assert_eq!(lines.join(" ").split_whitespace().count(), 30);
    }
}
