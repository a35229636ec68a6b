use crate::translate::Translator;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)\S+|\b[a-z0-9.-]+\.(?:com|org|net|io|gov|edu)(?:/\S*)?")
        .expect("link pattern is valid")
});

// Symbols a voice would read out literally, plus quotes hugging whitespace.
static UNSPEAKABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s['’]|['’]\s|[\^_~@;#:\-%—“”‘"*/{}\[\]()\\|<>=]"#)
        .expect("symbol pattern is valid")
});

/// Cleans reddit text for speech.
pub fn sanitize_text(text: &str) -> String {
    let text = LINK.replace_all(text, " ");
    let text = text.replace('+', " plus ").replace('&', " and ");
    let text = UNSPEAKABLE.replace_all(&text, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitizes and, when a translator is set, translates narration text.
#[derive(Default)]
pub struct TextPreparer {
    translator: Option<Box<dyn Translator + Send + Sync>>,
}

impl TextPreparer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_translator(translator: Box<dyn Translator + Send + Sync>) -> Self {
        Self {
            translator: Some(translator),
        }
    }

    pub fn prepare(&self, text: &str) -> String {
        let sanitized = sanitize_text(text);
        let Some(translator) = &self.translator else {
            return sanitized;
        };
        if sanitized.is_empty() {
            return sanitized;
        }
        debug!("Translating {} chars", sanitized.chars().count());
        match translator.translate(text) {
            Ok(translated) => sanitize_text(&translated),
            Err(e) => {
                warn!("Translation failed, narrating source text: {}", e);
                sanitized
            }
        }
    }
}
