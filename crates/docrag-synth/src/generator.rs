use docrag_core::Result;

/// A text-to-text model behind the synthesizer.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;

    /// Number of model input tokens `text` encodes to.
    fn count_tokens(&self, text: &str) -> usize;

    /// Longest prompt, in tokens, the model accepts.
    fn max_input_tokens(&self) -> usize;
}

/// Longest word-boundary prefix of `text` that fits in `budget` tokens.
pub fn truncate_to_budget<G: TextGenerator + ?Sized>(
    generator: &G,
    text: &str,
    budget: usize,
) -> String {
    if generator.count_tokens(text) <= budget {
        return text.to_string();
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    // Largest n with count_tokens(words[..n]) <= budget.
    let (mut lo, mut hi) = (0usize, words.len());
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        if generator.count_tokens(&words[..mid].join(" ")) <= budget {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    words[..lo].join(" ")
}
