use anyhow::Context;
use clap::Parser;
use reddit_narrator::args::Args;
use reddit_narrator::assembler::NarrationAssembler;
use reddit_narrator::audio::WavProbe;
use reddit_narrator::config::Config;
use reddit_narrator::reddit::fetch_thread;
use reddit_narrator::render::render_video;
use reddit_narrator::text::TextPreparer;
use reddit_narrator::thread::Thread;
use reddit_narrator::translate::GoogleTranslator;
use reddit_narrator::tts::PiperSynthesizer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply_args(&args);
    config.validate()?;

    info!("Starting reddit narration pipeline");

    let thread = match &args.thread_file {
        Some(path) => {
            info!("Reading thread from {}", path.display());
            Thread::load(path)?
        }
        None => {
            info!(
                "Fetching thread from r/{} (up to {} posts)",
                config.reddit.subreddit, config.reddit.try_posts
            );
            fetch_thread(&config.reddit).await?
        }
    };
    info!(
        "Using thread {} with {} comments: {:.120}",
        thread.id,
        thread.comments.len(),
        thread.title
    );

    // Synthesis and translation block; keep them off the async workers.
    let narration = config.narration.clone();
    let tts = config.tts.clone();
    let work_dir = config.output.work_dir.clone();
    let manifest = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let preparer = match narration.target_language() {
            Some(lang) => {
                info!("Narration will be translated to '{}'", lang);
                TextPreparer::with_translator(Box::new(GoogleTranslator::new(lang)?))
            }
            None => TextPreparer::new(),
        };
        let synthesizer = PiperSynthesizer::new(tts.piper_binary, tts.piper_model);
        let mut assembler =
            NarrationAssembler::new(narration, synthesizer, WavProbe, preparer, work_dir);
        Ok(assembler.run(&thread)?)
    })
    .await
    .context("Narration task panicked")??;

    let manifest_path = manifest.storage_dir.join("manifest.json");
    manifest.write_json(&manifest_path)?;
    info!("Manifest written to {}", manifest_path.display());

    match (&config.output.background, args.skip_render) {
        (_, true) => info!("Skipping render as requested"),
        (None, false) => warn!("No background video configured; skipping render"),
        (Some(background), false) => render_video(&manifest, background, &config.output.out)?,
    }

    println!(
        "{} clips, {:.1}s of narration, last comment {}",
        manifest.items.len(),
        manifest.total_duration,
        manifest
            .last_comment
            .map(|idx| idx.to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    Ok(())
}
