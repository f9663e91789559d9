// Sliding-window chunking over whitespace-delimited words
//
// chunk_size = 5, overlap = 2:
//   "A B C D E F G H" -> "A B C D E", "D E F G H"

use crate::errors::Result;
use crate::index::settings::IndexSettings;

/// Splits documents into overlapping word windows
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(settings: &IndexSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            chunk_size: settings.chunk_size,
            overlap: settings.chunk_overlap,
        })
    }

    /// Chunks in document order; empty text yields none
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let stride = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end == words.len() {
                break;
            }
            start += stride;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(chunk_size: usize, chunk_overlap: usize) -> Chunker {
        Chunker::new(&IndexSettings {
            chunk_size,
            chunk_overlap,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunker(256, 20).chunk("AML Monitoring Rules\n- Flag unusually large transactions");
        assert_eq!(chunks, vec!["AML Monitoring Rules - Flag unusually large transactions"]);
    }

    #[test]
    fn test_overlapping_windows() {
        let chunks = chunker(5, 2).chunk("A B C D E F G H");
        assert_eq!(chunks, vec!["A B C D E", "D E F G H"]);
    }

    #[test]
    fn test_trailing_partial_window() {
        let chunks = chunker(4, 1).chunk("a b c d e f g h i");
        assert_eq!(chunks, vec!["a b c d", "d e f g", "g h i"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(chunker(5, 2).chunk("  \n ").is_empty());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = IndexSettings {
            chunk_size: 3,
            chunk_overlap: 5,
            ..Default::default()
        };
        assert!(Chunker::new(&settings).is_err());
    }
}
