use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

// A sentence is everything up to and including a period, or the unterminated tail.
static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)[^.]*\.|[^.]+$").expect("sentence pattern is valid"));

/// One speakable piece of a longer item.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Index of the comment the chunk came from.
    pub item: usize,
    /// Gap-free position among the chunks that survived preparation.
    pub seq: usize,
    pub text: String,
}

impl Chunk {
    /// Storage key of the chunk artifact, e.g. `3-0.part`.
    pub fn storage_key(&self) -> String {
        format!("{}-{}.part", self.item, self.seq)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    max_chars: usize,
}

impl TextChunker {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Splits `text` into trimmed, contiguous pieces of at most `max_chars`
    /// characters, breaking after periods. Sentences are packed greedily; a
    /// single sentence longer than the limit is kept whole, so such a piece
    /// overshoots by the distance to its terminator. Runs of punctuation with
    /// no letters or digits are glued to the neighbouring piece.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Option<(usize, usize)> = None;

        for sentence in SENTENCE.find_iter(text) {
            current = match current {
                None => Some((sentence.start(), sentence.end())),
                Some((start, end)) => {
                    let joined = text[start..sentence.end()].trim().chars().count();
                    // Stray dots ("...") never stand alone; they ride with a neighbour.
                    let unspoken =
                        !is_speakable(sentence.as_str()) || !is_speakable(&text[start..end]);
                    if joined <= self.max_chars || unspoken {
                        Some((start, sentence.end()))
                    } else {
                        push_trimmed(&mut chunks, &text[start..end]);
                        Some((sentence.start(), sentence.end()))
                    }
                }
            };
        }
        if let Some((start, end)) = current {
            push_trimmed(&mut chunks, &text[start..end]);
        }

        debug!(
            "Split {} chars into {} chunks (max {})",
            text.chars().count(),
            chunks.len(),
            self.max_chars
        );
        chunks
    }

    /// Chunks the body of comment `item` and runs `prepare` over every piece.
    /// Pieces that come out empty are dropped and later pieces move up, so
    /// the returned `seq` numbers always run `0..len`.
    pub fn plan<F>(&self, item: usize, text: &str, prepare: F) -> Vec<Chunk>
    where
        F: Fn(&str) -> String,
    {
        let mut offset = 0;
        let mut planned = Vec::new();
        for (idy, piece) in self.chunk(text).iter().enumerate() {
            let prepared = prepare(piece);
            if prepared.trim().is_empty() {
                offset += 1;
                continue;
            }
            planned.push(Chunk {
                item,
                seq: idy - offset,
                text: prepared,
            });
        }
        planned
    }
}

fn is_speakable(piece: &str) -> bool {
    piece.chars().any(char::is_alphanumeric)
}

fn push_trimmed(chunks: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        chunks.push(piece.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_input_yield_nothing() {
        let chunker = TextChunker::new(20);
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t ").is_empty());
    }

    #[test]
    fn short_text_is_one_trimmed_chunk() {
        let chunker = TextChunker::new(100);
        assert_eq!(chunker.chunk("  Hello there. General Kenobi  "), vec![
            "Hello there. General Kenobi"
        ]);
    }

    #[test]
    fn packs_sentences_up_to_the_limit() {
        let chunker = TextChunker::new(27);
        let chunks = chunker.chunk("One two three. Four five six. Seven eight. Nine.");
        assert_eq!(chunks, vec![
            "One two three.",
            "Four five six. Seven eight.",
            "Nine."
        ]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 27));
    }

    #[test]
    fn chunks_are_contiguous_substrings() {
        let text = "First line.\nSecond line.   Third line without a stop";
        let chunker = TextChunker::new(15);
        for chunk in chunker.chunk(text) {
            assert!(text.contains(&chunk), "{chunk:?} is not a substring");
        }
    }

    #[test]
    fn overlong_sentence_runs_to_its_terminator() {
        let chunker = TextChunker::new(10);
        let chunks = chunker.chunk("This sentence is far too long for ten. Short.");
        assert_eq!(chunks, vec!["This sentence is far too long for ten.", "Short."]);
    }

    #[test]
    fn no_text_is_lost() {
        let text = "Alpha beta. Gamma delta epsilon. Zeta eta theta iota kappa. Lambda";
        let chunker = TextChunker::new(12);
        let rejoined: String = chunker.chunk(text).join(" ");
        let squash = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(squash(&rejoined), squash(text));
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let chunker = TextChunker::new(12);
        let chunks = chunker.chunk("Grüße dich. Ça va bien.");
        assert_eq!(chunks, vec!["Grüße dich.", "Ça va bien."]);
    }

    #[test]
    fn ellipsis_stays_with_its_sentence() {
        let chunker = TextChunker::new(5);
        assert_eq!(chunker.chunk("Wait... what"), vec!["Wait...", "what"]);
    }

    #[test]
    fn leading_dots_join_the_first_sentence() {
        let chunker = TextChunker::new(3);
        let chunks = chunker.chunk("... Hi. Yo.");
        assert_eq!(chunks, vec!["... Hi.", "Yo."]);
        assert!(chunks.iter().all(|c| c.chars().any(char::is_alphanumeric)));
    }

    #[test]
    fn plan_renumbers_around_dropped_pieces() {
        let chunker = TextChunker::new(10);
        let planned = chunker.plan(4, "Keep one. Drop me. Keep two.", |piece| {
            if piece.starts_with("Drop") {
                String::new()
            } else {
                piece.to_uppercase()
            }
        });
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].seq, 0);
        assert_eq!(planned[1].seq, 1);
        assert_eq!(planned[1].text, "KEEP TWO.");
        assert_eq!(planned[1].storage_key(), "4-1.part");
        assert!(planned.iter().all(|c| c.item == 4));
    }
}
