use clap::Parser;
use std::path::PathBuf;

/// Turn a reddit thread into narrated audio clips and a short video.
#[derive(Parser, Debug)]
#[command(name = "reddit-narrator")]
pub struct Args {
    /// JSON config file; flags below override its values
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Narrate a thread stored as JSON instead of fetching one from reddit
    #[clap(long)]
    pub thread_file: Option<PathBuf>,

    #[clap(long)]
    pub subreddit: Option<String>,

    #[clap(long)]
    pub try_posts: Option<usize>,

    /// Root directory for per-thread audio artifacts
    #[clap(long)]
    pub work_dir: Option<PathBuf>,

    #[clap(long)]
    pub background: Option<PathBuf>,

    #[clap(long)]
    pub out: Option<PathBuf>,

    #[clap(long)]
    pub piper_model: Option<PathBuf>,

    /// Maximum narration length in seconds
    #[clap(long)]
    pub max_duration: Option<f64>,

    /// Comments longer than this many characters are split before synthesis
    #[clap(long)]
    pub chunk_chars: Option<usize>,

    /// Also narrate the post body
    #[clap(long)]
    pub story_mode: bool,

    /// Translate narration into this language (e.g. "de")
    #[clap(long)]
    pub post_lang: Option<String>,

    /// Stop after writing the narration manifest
    #[clap(long)]
    pub skip_render: bool,
}
