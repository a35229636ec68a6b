use crate::assembler::NarrationManifest;
use crate::subtitle::{build_srt_entries, write_srt};
use anyhow::Context;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::{error, info, warn};

/// Concatenates the manifest's clips into one narration track and lays it
/// over the background video with burned-in subtitles.
pub fn render_video(manifest: &NarrationManifest, background: &Path, out: &Path) -> anyhow::Result<()> {
    if manifest.items.is_empty() {
        anyhow::bail!("Nothing to render: the narration manifest is empty");
    }
    if !background.exists() {
        anyhow::bail!("Background video not found: {}", background.display());
    }
    let work_dir = manifest
        .storage_dir
        .parent()
        .unwrap_or(&manifest.storage_dir)
        .to_path_buf();

    let srt_path = work_dir.join("subs.srt");
    info!("Writing subtitles to {}", srt_path.display());
    write_srt(&srt_path, &build_srt_entries(manifest))?;

    let combined_path = concat_narration(manifest, &work_dir)?;

    info!("Merging audio and subtitles into final video {}", out.display());
    let filter = format!(
        "scale=1080:1920,subtitles={}:force_style='Fontsize=28,OutlineColour=&H000000&,Outline=3,Shadow=0'",
        srt_path.display()
    );
    let status = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(background)
        .arg("-i")
        .arg(&combined_path)
        .args(["-vf", &filter])
        .args(["-map", "0:v:0", "-map", "1:a:0"])
        .args(["-c:v", "libx264", "-c:a", "aac", "-r", "60", "-shortest"])
        .arg(out)
        .status()
        .context("Failed to start ffmpeg")?;
    if !status.success() {
        error!("ffmpeg failed to produce final video");
        anyhow::bail!("ffmpeg failed to produce final video");
    }
    info!("Final video written to {}", out.display());
    Ok(())
}

fn concat_narration(manifest: &NarrationManifest, work_dir: &Path) -> anyhow::Result<PathBuf> {
    let concat_list = work_dir.join("files.txt");
    {
        let mut f = File::create(&concat_list)
            .with_context(|| format!("Failed to create {}", concat_list.display()))?;
        for item in &manifest.items {
            let path = item
                .path
                .canonicalize()
                .with_context(|| format!("Missing narration clip {}", item.path.display()))?;
            writeln!(f, "file '{}'", path.display())?;
        }
    }

    let combined_path = work_dir.join("combined.wav");
    info!(
        "Concatenating {} clips into {}",
        manifest.items.len(),
        combined_path.display()
    );
    if !ffmpeg_concat(&concat_list, &combined_path, &["-c", "copy"])?.success() {
        warn!("ffmpeg concat with copy failed; retrying with re-encode");
        if !ffmpeg_concat(&concat_list, &combined_path, &["-c:a", "pcm_s16le"])?.success() {
            error!("ffmpeg failed to concatenate narration clips");
            anyhow::bail!("ffmpeg failed to concatenate narration clips");
        }
    }
    Ok(combined_path)
}

fn ffmpeg_concat(list: &Path, out: &Path, codec: &[&str]) -> anyhow::Result<ExitStatus> {
    Command::new("ffmpeg")
        .args(["-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(list)
        .args(codec)
        .arg(out)
        .status()
        .context("Failed to start ffmpeg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{ItemKey, ManifestEntry};

    fn manifest(dir: &Path, items: Vec<ManifestEntry>) -> NarrationManifest {
        NarrationManifest {
            thread_id: "t".to_string(),
            storage_dir: dir.join("t").join("audio"),
            items,
            total_duration: 0.0,
            last_comment: None,
        }
    }

    #[test]
    fn refuses_empty_manifest() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = render_video(&manifest(dir.path(), vec![]), dir.path(), &dir.path().join("o.mp4"))
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn refuses_missing_background() {
        let dir = tempfile::TempDir::new().unwrap();
        let entry = ManifestEntry {
            item: ItemKey::Title,
            key: "title".to_string(),
            path: dir.path().join("title.wav"),
            duration: 1.0,
            text: "Title".to_string(),
        };
        let err = render_video(
            &manifest(dir.path(), vec![entry]),
            &dir.path().join("missing.mp4"),
            &dir.path().join("o.mp4"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Background video not found"));
    }
}
