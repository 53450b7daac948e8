use serde::{Deserialize, Serialize};

/// Split text into chunks whose UTF-8 byte length stays within `max_bytes`,
/// breaking only on whitespace.
///
/// Greedy bin-packing: words accumulate into the current chunk, counting one
/// separator byte per word, and a word that would overflow the limit starts
/// the next chunk. A single word longer than `max_bytes` still gets its own
/// chunk rather than being dropped; the limit is a target, not a hard cap,
/// for that pathological case.
pub fn split_text(text: &str, max_bytes: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_size = 0usize;

    for word in text.split_whitespace() {
        // One byte for the space joining this word to the chunk.
        let word_size = word.len() + 1;
        if current_size + word_size > max_bytes {
            if !current.is_empty() {
                chunks.push(current.join(" "));
            }
            current = vec![word];
            current_size = word_size;
        } else {
            current.push(word);
            current_size += word_size;
        }
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

/// One transcription window: a half-open interval of the source audio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioWindow {
    /// Ordinal position, contiguous from 0.
    pub index: usize,
    /// Offset from the start of the audio, in seconds.
    pub offset: f64,
    /// Window length in seconds; the final window may be shorter.
    pub duration: f64,
}

/// Fixed-duration windowing plan over a decoded audio stream.
///
/// Windows are `[0, W), [W, 2W), ...` until the offset reaches the total
/// duration, so the plan always yields `ceil(total / window)` windows.
#[derive(Debug, Clone, Copy)]
pub struct WindowPlan {
    total_seconds: f64,
    window_seconds: f64,
}

impl WindowPlan {
    pub fn new(total_seconds: f64, window_seconds: f64) -> Self {
        assert!(window_seconds > 0.0, "window must be positive");
        Self {
            total_seconds: total_seconds.max(0.0),
            window_seconds,
        }
    }

    pub fn window_count(&self) -> usize {
        (self.total_seconds / self.window_seconds).ceil() as usize
    }

    pub fn windows(&self) -> impl Iterator<Item = AudioWindow> + '_ {
        (0..self.window_count()).map(move |index| {
            let offset = index as f64 * self.window_seconds;
            AudioWindow {
                index,
                offset,
                duration: self.window_seconds.min(self.total_seconds - offset),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_preserves_word_order_and_content() {
        let text = "the quick brown fox jumps over the lazy dog";
        let chunks = split_text(text, 20);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn split_collapses_whitespace_runs() {
        let chunks = split_text("hello   world\n\tfoo", 4500);
        assert_eq!(chunks, vec!["hello world foo"]);
    }

    #[test]
    fn no_chunk_exceeds_limit() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        for chunk in split_text(text, 15) {
            assert!(chunk.len() <= 15, "chunk {:?} over limit", chunk);
        }
    }

    #[test]
    fn oversized_word_is_kept_alone() {
        let long_word = "x".repeat(40);
        let text = format!("short {} tail", long_word);
        let chunks = split_text(&text, 10);
        assert!(chunks.contains(&long_word));
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn multibyte_words_never_split_mid_character() {
        let text = "жил был пёс который лаял на луну каждую ночь";
        let chunks = split_text(text, 25);
        assert_eq!(chunks.join(" "), text);
        for chunk in &chunks {
            // Joining back word-by-word means every chunk is valid UTF-8
            // on word boundaries; also respect the byte limit.
            assert!(chunk.len() <= 25);
        }
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(split_text("", 4500).is_empty());
        assert!(split_text("   \n ", 4500).is_empty());
    }

    #[test]
    fn nine_kilobyte_text_splits_into_two_chunks() {
        // 180 words of 49 bytes + separators ≈ 9000 bytes.
        let word = "w".repeat(49);
        let words: Vec<String> = (0..180).map(|_| word.clone()).collect();
        let text = words.join(" ");
        assert_eq!(text.len(), 180 * 49 + 179);

        let chunks = split_text(&text, 4500);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert!(chunk.len() <= 4500);
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn window_count_is_ceiling_of_duration_over_window() {
        assert_eq!(WindowPlan::new(65.0, 30.0).window_count(), 3);
        assert_eq!(WindowPlan::new(60.0, 30.0).window_count(), 2);
        assert_eq!(WindowPlan::new(29.9, 30.0).window_count(), 1);
        assert_eq!(WindowPlan::new(0.0, 30.0).window_count(), 0);
    }

    #[test]
    fn final_window_is_shortened() {
        let plan = WindowPlan::new(65.0, 30.0);
        let windows: Vec<AudioWindow> = plan.windows().collect();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].offset, 0.0);
        assert_eq!(windows[0].duration, 30.0);
        assert_eq!(windows[1].offset, 30.0);
        assert_eq!(windows[1].duration, 30.0);
        assert_eq!(windows[2].offset, 60.0);
        assert!((windows[2].duration - 5.0).abs() < 1e-9);
    }

    #[test]
    fn window_ordinals_are_contiguous_from_zero() {
        let plan = WindowPlan::new(100.0, 30.0);
        let indices: Vec<usize> = plan.windows().map(|w| w.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }
}
