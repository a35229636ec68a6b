use crate::accountant::ClipAccountant;
use crate::audio::{DurationProbe, concat_wavs};
use crate::chunker::TextChunker;
use crate::config::NarrationSettings;
use crate::error::{NarrationError, Result};
use crate::text::TextPreparer;
use crate::thread::Thread;
use crate::tts::SpeechSynthesizer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const TITLE_KEY: &str = "title";
pub const POST_TEXT_KEY: &str = "posttext";

/// Which part of the thread an artifact narrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum ItemKey {
    Title,
    PostText,
    Comment(usize),
}

impl ItemKey {
    /// Artifact name the video compositor looks for.
    pub fn storage_key(&self) -> String {
        match self {
            ItemKey::Title => TITLE_KEY.to_string(),
            ItemKey::PostText => POST_TEXT_KEY.to_string(),
            ItemKey::Comment(idx) => idx.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub item: ItemKey,
    pub key: String,
    pub path: PathBuf,
    pub duration: f64,
    pub text: String,
}

/// Result of one narration run, in playback order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationManifest {
    pub thread_id: String,
    pub storage_dir: PathBuf,
    pub items: Vec<ManifestEntry>,
    /// Sum of the durations of `items`.
    pub total_duration: f64,
    /// Index of the last accepted comment, `None` if no comment made it.
    pub last_comment: Option<usize>,
}

impl NarrationManifest {
    pub fn accepted_comments(&self) -> Vec<usize> {
        self.items
            .iter()
            .filter_map(|e| match e.item {
                ItemKey::Comment(idx) => Some(idx),
                _ => None,
            })
            .collect()
    }

    pub fn has_post_text(&self) -> bool {
        self.items.iter().any(|e| e.item == ItemKey::PostText)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn read_json(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Title,
    Body,
    Comments,
    Stopped,
}

/// Turns a thread into per-item audio artifacts under
/// `<work_dir>/<thread id>/audio`, staying within the duration budget.
pub struct NarrationAssembler<S, P> {
    settings: NarrationSettings,
    synthesizer: S,
    probe: P,
    preparer: TextPreparer,
    chunker: TextChunker,
    work_dir: PathBuf,
    storage_dir: PathBuf,
    accountant: ClipAccountant,
    entries: Vec<ManifestEntry>,
    stage: Stage,
}

impl<S: SpeechSynthesizer, P: DurationProbe> NarrationAssembler<S, P> {
    pub fn new(
        settings: NarrationSettings,
        synthesizer: S,
        probe: P,
        preparer: TextPreparer,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        let chunker = TextChunker::new(settings.max_chars);
        let work_dir = work_dir.into();
        Self {
            settings,
            synthesizer,
            probe,
            preparer,
            chunker,
            storage_dir: work_dir.clone(),
            work_dir,
            accountant: ClipAccountant::new(),
            entries: Vec::new(),
            stage: Stage::Title,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn accountant(&self) -> &ClipAccountant {
        &self.accountant
    }

    pub fn run(&mut self, thread: &Thread) -> Result<NarrationManifest> {
        self.storage_dir = self.work_dir.join(thread.storage_id()).join("audio");
        fs::create_dir_all(&self.storage_dir).map_err(|source| NarrationError::Storage {
            path: self.storage_dir.clone(),
            source,
        })?;
        self.accountant = ClipAccountant::new();
        self.entries.clear();

        // A leftover body clip from an earlier run must not reach the video.
        self.discard(&self.artifact_path(POST_TEXT_KEY));

        info!(
            "Narrating thread {} into {} (budget {:.1}s)",
            thread.id,
            self.storage_dir.display(),
            self.settings.max_total_duration
        );

        self.enter(Stage::Title);
        let title = self.preparer.prepare(&thread.title);
        let (path, duration) = self.synthesize_unit(TITLE_KEY, &title)?;
        self.accept_direct(ItemKey::Title, path, duration, title);

        if self.settings.story_mode {
            self.enter(Stage::Body);
            let body = thread
                .body
                .as_deref()
                .map(|b| self.preparer.prepare(b))
                .unwrap_or_default();
            if body.is_empty() {
                debug!("Post has no narratable body");
            } else {
                match self.synthesize_unit(POST_TEXT_KEY, &body) {
                    Ok((path, duration)) => {
                        self.accept_direct(ItemKey::PostText, path, duration, body)
                    }
                    Err(e) => warn!("Skipping post body: {}", e),
                }
            }
        }

        self.enter(Stage::Comments);
        for (idx, comment) in thread.comments.iter().enumerate() {
            // Checked one comment late: the comment that crossed the budget is
            // evicted only once a later one comes up, so the thread's last
            // comment can leave the total above budget.
            if self.accountant.running_total() > self.settings.max_total_duration {
                self.evict_last_comment();
                break;
            }
            if comment.body.chars().count() > self.chunker.max_chars() {
                self.narrate_chunked(idx, &comment.body);
            } else {
                self.narrate_direct(idx, &comment.body);
            }
        }
        self.enter(Stage::Stopped);

        let manifest = NarrationManifest {
            thread_id: thread.id.clone(),
            storage_dir: self.storage_dir.clone(),
            items: self.entries.clone(),
            total_duration: self.accountant.running_total(),
            last_comment: self.entries.iter().rev().find_map(|e| match e.item {
                ItemKey::Comment(idx) => Some(idx),
                _ => None,
            }),
        };
        info!(
            "Narration finished: {} clips, {:.2}s, last comment {:?}",
            manifest.items.len(),
            manifest.total_duration,
            manifest.last_comment
        );
        Ok(manifest)
    }

    fn enter(&mut self, stage: Stage) {
        debug!("Narration stage {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    fn narrate_direct(&mut self, idx: usize, body: &str) {
        let text = self.preparer.prepare(body);
        if text.is_empty() {
            debug!("Comment {} is empty after cleanup, skipping", idx);
            return;
        }
        match self.synthesize_unit(&idx.to_string(), &text) {
            Ok((path, duration)) => self.accept_direct(ItemKey::Comment(idx), path, duration, text),
            Err(e) => warn!("Skipping comment {}: {}", idx, e),
        }
    }

    fn narrate_chunked(&mut self, idx: usize, body: &str) {
        let chunks = self
            .chunker
            .plan(idx, body, |piece| self.preparer.prepare(piece));
        if chunks.is_empty() {
            debug!("Comment {} is empty after cleanup, skipping", idx);
            return;
        }
        debug!("Comment {} split into {} chunks", idx, chunks.len());

        let mut parts = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            match self.synthesize_unit(&chunk.storage_key(), &chunk.text) {
                Ok((path, duration)) => {
                    self.accountant.record_speculative(duration);
                    parts.push(path);
                }
                Err(e) => {
                    let lost = self.accountant.rollback_speculative();
                    warn!(
                        "Abandoning comment {} at chunk {} ({:.2}s rolled back): {}",
                        idx, chunk.seq, lost, e
                    );
                    self.discard_all(&parts);
                    return;
                }
            }
        }

        let key = idx.to_string();
        let out = self.artifact_path(&key);
        let joined = concat_wavs(&parts, &out);
        self.discard_all(&parts);
        if let Err(e) = joined {
            let lost = self.accountant.rollback_speculative();
            warn!(
                "Abandoning comment {}, joining chunks failed ({:.2}s rolled back): {}",
                idx, lost, e
            );
            self.discard(&out);
            return;
        }

        let duration = self.accountant.commit_speculative();
        let text = chunks
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join(" ");
        self.push_entry(ItemKey::Comment(idx), out, duration, text);
    }

    fn accept_direct(&mut self, item: ItemKey, path: PathBuf, duration: f64, text: String) {
        self.accountant.record_direct(duration);
        self.push_entry(item, path, duration, text);
    }

    fn push_entry(&mut self, item: ItemKey, path: PathBuf, duration: f64, text: String) {
        info!(
            "Accepted {} ({:.2}s, total {:.2}s)",
            item.storage_key(),
            duration,
            self.accountant.running_total()
        );
        self.entries.push(ManifestEntry {
            item,
            key: item.storage_key(),
            path,
            duration,
            text,
        });
    }

    /// Title and body are never evicted; only a trailing comment is.
    fn evict_last_comment(&mut self) {
        let Some(last) = self.entries.last() else {
            return;
        };
        if !matches!(last.item, ItemKey::Comment(_)) {
            info!(
                "Budget of {:.1}s exhausted before any comment",
                self.settings.max_total_duration
            );
            return;
        }
        if let Some(evicted) = self.entries.pop() {
            let removed = self.accountant.rollback_last();
            info!(
                "Budget of {:.1}s exceeded, dropping comment {} ({:.2}s)",
                self.settings.max_total_duration, evicted.key, removed
            );
            self.discard(&evicted.path);
        }
    }

    fn artifact_path(&self, key: &str) -> PathBuf {
        self.storage_dir
            .join(format!("{}.{}", key, self.synthesizer.extension()))
    }

    /// Synthesizes one unit and measures it. Any failure leaves no file behind.
    fn synthesize_unit(&self, key: &str, text: &str) -> Result<(PathBuf, f64)> {
        let path = self.artifact_path(key);
        debug!("Synthesizing {} ({} chars)", key, text.chars().count());

        let measured = self
            .synthesizer
            .synthesize(text, &path)
            .and_then(|()| self.probe.duration_seconds(&path))
            .and_then(|duration| {
                if duration.is_finite() && duration >= 0.0 {
                    Ok(duration)
                } else {
                    Err(NarrationError::synthesis(
                        key,
                        format!("unusable duration {duration}"),
                    ))
                }
            });
        match measured {
            Ok(duration) => Ok((path, duration)),
            Err(e) => {
                self.discard(&path);
                Err(match e {
                    NarrationError::Synthesis { .. } => e,
                    other => NarrationError::synthesis(key, other),
                })
            }
        }
    }

    fn discard(&self, path: &Path) {
        if !path.exists() {
            return;
        }
        if let Err(e) = fs::remove_file(path) {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }

    fn discard_all(&self, paths: &[PathBuf]) {
        for path in paths {
            self.discard(path);
        }
    }
}
