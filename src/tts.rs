use crate::error::{NarrationError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, error};

/// A speech backend. Writes one audio artifact per call.
pub trait SpeechSynthesizer {
    /// File extension of the artifacts this backend writes.
    fn extension(&self) -> &str {
        "wav"
    }

    fn synthesize(&self, text: &str, out_path: &Path) -> Result<()>;
}

/// Runs the `piper` binary, feeding the text on stdin.
#[derive(Debug, Clone)]
pub struct PiperSynthesizer {
    binary: String,
    model: PathBuf,
}

impl PiperSynthesizer {
    pub fn new(binary: impl Into<String>, model: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            model: model.into(),
        }
    }
}

impl SpeechSynthesizer for PiperSynthesizer {
    fn synthesize(&self, text: &str, out_path: &Path) -> Result<()> {
        let key = out_path.display().to_string();
        debug!("Calling Piper TTS for output file {}", key);

        let mut child = Command::new(&self.binary)
            .arg("--model")
            .arg(&self.model)
            .arg("--output_file")
            .arg(out_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| NarrationError::synthesis(&key, format!("failed to spawn piper: {e}")))?;

        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| NarrationError::synthesis(&key, "piper stdin unavailable"))?;
            stdin.write_all(text.as_bytes())?;
        }

        let status = child.wait()?;
        if !status.success() {
            error!("Piper TTS command failed for {}", key);
            return Err(NarrationError::synthesis(
                key,
                format!("piper exited with {status}"),
            ));
        }
        Ok(())
    }
}
