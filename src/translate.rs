use crate::error::{NarrationError, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub trait Translator {
    fn translate(&self, text: &str) -> Result<String>;
}

/// Free Google Translate endpoint used by browser extensions.
/// Blocking, because narration runs on a blocking task.
pub struct GoogleTranslator {
    client: reqwest::blocking::Client,
    target: String,
}

impl GoogleTranslator {
    const ENDPOINT: &'static str = "https://translate.googleapis.com/translate_a/single";

    pub fn new(target: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NarrationError::Translation(e.to_string()))?;
        Ok(Self {
            client,
            target: target.into(),
        })
    }
}

impl Translator for GoogleTranslator {
    fn translate(&self, text: &str) -> Result<String> {
        debug!("Requesting translation to '{}'", self.target);
        let body: Value = self
            .client
            .get(Self::ENDPOINT)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", self.target.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json())
            .map_err(|e| NarrationError::Translation(e.to_string()))?;
        parse_translation(&body)
    }
}

/// The response is `[[["translated", "source", ...], ...], ...]`, one inner
/// array per sentence.
fn parse_translation(body: &Value) -> Result<String> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| NarrationError::Translation("unexpected response shape".to_string()))?;
    let translated: String = sentences
        .iter()
        .filter_map(|s| s.get(0).and_then(Value::as_str))
        .collect();
    if translated.trim().is_empty() {
        return Err(NarrationError::Translation("empty translation".to_string()));
    }
    Ok(translated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_translated_sentences() {
        let body = json!([[["Hallo Welt. ", "Hello world. ", null], ["Wie geht's?", "How are you?", null]], null, "en"]);
        assert_eq!(parse_translation(&body).unwrap(), "Hallo Welt. Wie geht's?");
    }

    #[test]
    fn rejects_unexpected_payloads() {
        assert!(parse_translation(&json!({"error": 1})).is_err());
        assert!(parse_translation(&json!([[]])).is_err());
    }
}
