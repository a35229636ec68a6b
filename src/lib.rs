pub mod accountant;
pub mod args;
pub mod assembler;
pub mod audio;
pub mod chunker;
pub mod config;
pub mod error;
pub mod reddit;
pub mod render;
pub mod subtitle;
pub mod text;
pub mod thread;
pub mod translate;
pub mod tts;

pub use assembler::{ItemKey, ManifestEntry, NarrationAssembler, NarrationManifest};
pub use error::{NarrationError, Result};
