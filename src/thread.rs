use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A discussion thread as handed to the narration core. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub body: String,
}

impl Thread {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read thread file {}", path.display()))?;
        let thread: Thread = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse thread file {}", path.display()))?;
        Ok(thread)
    }

    /// The id reduced to characters that are safe in a directory name.
    pub fn storage_id(&self) -> String {
        let id: String = self
            .id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if id.is_empty() {
            "thread".to_string()
        } else {
            id
        }
    }
}
