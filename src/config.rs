use crate::args::Args;
use crate::error::NarrationError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default narration budget in seconds.
pub const DEFAULT_MAX_LENGTH: f64 = 50.0;
pub const DEFAULT_MAX_CHARS: usize = 250;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub narration: NarrationSettings,
    pub reddit: RedditSettings,
    pub tts: TtsSettings,
    pub output: OutputSettings,
}

/// Everything the narration core needs. Handed to the assembler by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationSettings {
    /// Total spoken duration budget in seconds.
    pub max_total_duration: f64,
    /// Comments longer than this are chunked before synthesis.
    pub max_chars: usize,
    /// Narrate the post body after the title.
    pub story_mode: bool,
    /// Target language for translation, `None` keeps the source text.
    pub post_lang: Option<String>,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            max_total_duration: DEFAULT_MAX_LENGTH,
            max_chars: DEFAULT_MAX_CHARS,
            story_mode: false,
            post_lang: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditSettings {
    pub subreddit: String,
    pub try_posts: usize,
    pub min_comments: u64,
    pub max_comments: usize,
    pub min_comment_length: usize,
    pub max_comment_length: usize,
    pub allow_nsfw: bool,
    pub used_posts: PathBuf,
}

impl Default for RedditSettings {
    fn default() -> Self {
        Self {
            subreddit: "AskReddit".to_string(),
            try_posts: 25,
            min_comments: 20,
            max_comments: 50,
            min_comment_length: 1,
            max_comment_length: 500,
            allow_nsfw: false,
            used_posts: PathBuf::from("./config/used_posts.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    pub piper_binary: String,
    pub piper_model: PathBuf,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            piper_binary: "piper".to_string(),
            piper_model: PathBuf::from("./tts/en_US-hfc_male-medium.onnx"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub work_dir: PathBuf,
    pub background: Option<PathBuf>,
    pub out: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("assets/temp"),
            background: None,
            out: PathBuf::from("out.mp4"),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Command line flags win over file values.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(subreddit) = &args.subreddit {
            self.reddit.subreddit = subreddit.clone();
        }
        if let Some(try_posts) = args.try_posts {
            self.reddit.try_posts = try_posts;
        }
        if let Some(work_dir) = &args.work_dir {
            self.output.work_dir = work_dir.clone();
        }
        if let Some(background) = &args.background {
            self.output.background = Some(background.clone());
        }
        if let Some(out) = &args.out {
            self.output.out = out.clone();
        }
        if let Some(model) = &args.piper_model {
            self.tts.piper_model = model.clone();
        }
        if let Some(max_duration) = args.max_duration {
            self.narration.max_total_duration = max_duration;
        }
        if let Some(chunk_chars) = args.chunk_chars {
            self.narration.max_chars = chunk_chars;
        }
        if args.story_mode {
            self.narration.story_mode = true;
        }
        if let Some(lang) = &args.post_lang {
            self.narration.post_lang = Some(lang.clone());
        }
    }

    pub fn validate(&self) -> Result<(), NarrationError> {
        self.narration.validate()
    }
}

impl NarrationSettings {
    pub fn validate(&self) -> Result<(), NarrationError> {
        if self.max_chars == 0 {
            return Err(NarrationError::Config(
                "narration.max_chars must be positive".to_string(),
            ));
        }
        if !self.max_total_duration.is_finite() || self.max_total_duration <= 0.0 {
            return Err(NarrationError::Config(format!(
                "narration.max_total_duration must be a positive number of seconds, got {}",
                self.max_total_duration
            )));
        }
        Ok(())
    }

    /// Empty language codes are treated as "no translation".
    pub fn target_language(&self) -> Option<&str> {
        self.post_lang
            .as_deref()
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.narration, NarrationSettings::default());
        assert_eq!(config.narration.max_chars, 250);
        assert_eq!(config.reddit.subreddit, "AskReddit");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::from_json(
            r#"{ "narration": { "story_mode": true, "post_lang": "de" }, "reddit": { "min_comments": 5 } }"#,
        )
        .unwrap();
        assert!(config.narration.story_mode);
        assert_eq!(config.narration.target_language(), Some("de"));
        assert_eq!(config.narration.max_total_duration, DEFAULT_MAX_LENGTH);
        assert_eq!(config.reddit.min_comments, 5);
        assert_eq!(config.reddit.max_comment_length, 500);
    }

    #[test]
    fn cli_flags_override_file_values() {
        let mut config = Config::from_json(r#"{ "narration": { "max_chars": 100 } }"#).unwrap();
        let args = Args::parse_from([
            "reddit-narrator",
            "--chunk-chars",
            "300",
            "--max-duration",
            "30.5",
            "--story-mode",
            "--subreddit",
            "AITAH",
        ]);
        config.apply_args(&args);
        assert_eq!(config.narration.max_chars, 300);
        assert_eq!(config.narration.max_total_duration, 30.5);
        assert!(config.narration.story_mode);
        assert_eq!(config.reddit.subreddit, "AITAH");
    }

    #[test]
    fn rejects_unusable_budgets() {
        let mut settings = NarrationSettings::default();
        settings.max_chars = 0;
        assert!(matches!(settings.validate(), Err(NarrationError::Config(_))));

        let mut settings = NarrationSettings::default();
        settings.max_total_duration = f64::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn blank_language_disables_translation() {
        let settings = NarrationSettings {
            post_lang: Some("  ".to_string()),
            ..NarrationSettings::default()
        };
        assert_eq!(settings.target_language(), None);
    }
}
